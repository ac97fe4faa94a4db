//! Alert and enforcement scheduling.
//!
//! [`decide`] is a pure function of the issue, its schedule, the
//! enforcement policy and the clock. The auditor applies the returned
//! [`Decision`]; nothing here touches storage or the cloud.

use chrono::{DateTime, Utc};

use reqtags_core::config::{AlertSchedule, AuditorConfig, HumanDuration};
use reqtags_core::types::{ActionKind, Issue, IssueState};

/// Enforcement switches from the auditor config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnforcementPolicy {
    pub collect_only: bool,
    pub confirm_shutdown: bool,
}

impl EnforcementPolicy {
    pub fn from_config(config: &AuditorConfig) -> Self {
        Self {
            collect_only: config.is_collect_only(),
            confirm_shutdown: config.requires_confirmation(),
        }
    }
}

/// What the auditor should do with one issue on this run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Decision {
    /// A new scheduled alert offset elapsed since the last notice.
    pub alert: bool,
    /// Value `alerts_sent` should take. Never below the current value.
    pub alerts_due: u32,
    /// Action to execute now.
    pub action: Option<ActionKind>,
    /// Action that is due but held for operator confirmation.
    pub awaiting_confirmation: Option<ActionKind>,
    pub next_change: Option<DateTime<Utc>>,
}

/// Decide alerts and enforcement for `issue` at `now`.
///
/// `schedule` is `None` when no alert settings entry covers the issue's
/// resource type and account; such issues are only tracked.
pub fn decide(
    issue: &Issue,
    schedule: Option<&AlertSchedule>,
    policy: EnforcementPolicy,
    stop_supported: bool,
    now: DateTime<Utc>,
) -> Decision {
    let keep = Decision {
        alerts_due: issue.alerts_sent,
        ..Decision::default()
    };
    let Some(schedule) = schedule else {
        return keep;
    };
    if issue.state == IssueState::Removed {
        return keep;
    }

    let elapsed = elapsed_since(issue, now);
    let due = schedule.alerts_due(elapsed);
    let mut decision = Decision {
        alert: due > issue.alerts_sent,
        alerts_due: due.max(issue.alerts_sent),
        ..Decision::default()
    };

    let enforcing = !policy.collect_only;
    if enforcing {
        let stop_due =
            stop_supported && issue.state < IssueState::Stopped && elapsed >= schedule.stop;
        let remove_due = (issue.state == IssueState::Stopped || !stop_supported)
            && elapsed >= schedule.remove;

        let due_action = if remove_due {
            Some(ActionKind::Remove)
        } else if stop_due {
            Some(ActionKind::Stop)
        } else {
            None
        };

        match due_action {
            Some(action) if policy.confirm_shutdown && !issue.confirmed => {
                decision.awaiting_confirmation = Some(action);
            }
            action => decision.action = action,
        }
    }

    let mut upcoming: Vec<HumanDuration> = Vec::with_capacity(3);
    if let Some(next_alert) = schedule.next_alert_after(elapsed) {
        upcoming.push(next_alert);
    }
    if enforcing {
        if stop_supported && issue.state < IssueState::Stopped && schedule.stop > elapsed {
            upcoming.push(schedule.stop);
        }
        if schedule.remove > elapsed {
            upcoming.push(schedule.remove);
        }
    }
    // Offsets past the calendar range never arrive.
    decision.next_change = upcoming
        .into_iter()
        .filter_map(|offset| issue.created.checked_add_signed(offset.to_chrono()))
        .min();

    decision
}

fn elapsed_since(issue: &Issue, now: DateTime<Utc>) -> HumanDuration {
    let secs = issue.age(now).num_seconds();
    HumanDuration::from_secs(u64::try_from(secs).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use reqtags_core::types::{Resource, ResourceType};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn issue() -> Issue {
        let resource = Resource {
            id: "i-1".into(),
            resource_type: ResourceType::ec2_instance(),
            account_id: "111".into(),
            location: "us-east-1".into(),
            tags: vec![],
            created: t0() - Duration::days(30),
            state: None,
            properties: Default::default(),
        };
        Issue::open(&resource, vec!["owner".into()], vec![], t0())
    }

    const ENFORCE: EnforcementPolicy = EnforcementPolicy {
        collect_only: false,
        confirm_shutdown: false,
    };

    #[test]
    fn offsets_beyond_the_calendar_never_come_due() {
        let far = AlertSchedule {
            alert: vec![HumanDuration::ZERO],
            stop: HumanDuration::from_weeks(1_000_000_000),
            remove: HumanDuration::from_secs(i64::MAX as u64),
            scope: vec!["*".into()],
        };
        let d = decide(&issue(), Some(&far), ENFORCE, true, t0() + Duration::days(365));
        assert_eq!(d.action, None);
        assert_eq!(d.alerts_due, 1);
        assert_eq!(d.next_change, None);

        let later_alert = AlertSchedule {
            alert: vec![HumanDuration::ZERO, HumanDuration::from_days(3)],
            ..far
        };
        let d = decide(&issue(), Some(&later_alert), ENFORCE, true, t0());
        assert_eq!(d.next_change, Some(t0() + Duration::days(3)));
    }

    #[test]
    fn first_detection_fires_the_zero_offset_alert() {
        let d = decide(&issue(), Some(&AlertSchedule::default()), ENFORCE, true, t0());
        assert!(d.alert);
        assert_eq!(d.alerts_due, 1);
        assert_eq!(d.action, None);
        assert_eq!(d.next_change, Some(t0() + Duration::weeks(3)));
    }

    #[test]
    fn several_elapsed_offsets_make_one_alert() {
        let mut i = issue();
        i.alerts_sent = 1;
        let d = decide(&i, Some(&AlertSchedule::default()), ENFORCE, true, t0() + Duration::days(27));
        assert!(d.alert);
        assert_eq!(d.alerts_due, 3);
        assert_eq!(d.next_change, Some(t0() + Duration::weeks(4)));
    }

    #[test]
    fn stop_then_remove() {
        let schedule = AlertSchedule::default();
        let mut i = issue();
        i.alerts_sent = 3;

        let d = decide(&i, Some(&schedule), ENFORCE, true, t0() + Duration::weeks(4));
        assert_eq!(d.action, Some(ActionKind::Stop));
        assert_eq!(d.next_change, Some(t0() + Duration::weeks(12)));

        // Past the remove offset without having stopped: still stop first.
        let d = decide(&i, Some(&schedule), ENFORCE, true, t0() + Duration::weeks(13));
        assert_eq!(d.action, Some(ActionKind::Stop));

        i.state = IssueState::Stopped;
        let d = decide(&i, Some(&schedule), ENFORCE, true, t0() + Duration::weeks(13));
        assert_eq!(d.action, Some(ActionKind::Remove));
        assert_eq!(d.next_change, None);
    }

    #[test]
    fn stop_unsupported_goes_straight_to_remove() {
        let schedule = AlertSchedule::default();
        let d = decide(&issue(), Some(&schedule), ENFORCE, false, t0() + Duration::weeks(5));
        assert_eq!(d.action, None);
        assert_eq!(d.next_change, Some(t0() + Duration::weeks(12)));

        let d = decide(&issue(), Some(&schedule), ENFORCE, false, t0() + Duration::weeks(12));
        assert_eq!(d.action, Some(ActionKind::Remove));
    }

    #[test]
    fn collect_mode_never_acts() {
        let policy = EnforcementPolicy {
            collect_only: true,
            confirm_shutdown: false,
        };
        let d = decide(&issue(), Some(&AlertSchedule::default()), policy, true, t0() + Duration::weeks(20));
        assert_eq!(d.action, None);
        assert_eq!(d.awaiting_confirmation, None);
        assert_eq!(d.next_change, None);
    }

    #[test]
    fn confirmation_holds_the_action() {
        let policy = EnforcementPolicy {
            collect_only: false,
            confirm_shutdown: true,
        };
        let mut i = issue();
        let at = t0() + Duration::weeks(4);

        let d = decide(&i, Some(&AlertSchedule::default()), policy, true, at);
        assert_eq!(d.action, None);
        assert_eq!(d.awaiting_confirmation, Some(ActionKind::Stop));

        i.confirmed = true;
        let d = decide(&i, Some(&AlertSchedule::default()), policy, true, at);
        assert_eq!(d.action, Some(ActionKind::Stop));
        assert_eq!(d.awaiting_confirmation, None);
    }

    #[test]
    fn removed_and_unscheduled_issues_are_only_tracked() {
        let mut i = issue();
        i.alerts_sent = 2;
        let d = decide(&i, None, ENFORCE, true, t0() + Duration::weeks(20));
        assert_eq!(d, Decision { alerts_due: 2, ..Decision::default() });

        i.state = IssueState::Removed;
        let d = decide(&i, Some(&AlertSchedule::default()), ENFORCE, true, t0() + Duration::weeks(20));
        assert!(!d.alert);
        assert_eq!(d.action, None);
    }
}
