use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use reqtags_audit::{decide, EnforcementPolicy};
use reqtags_core::config::{AlertSchedule, HumanDuration};
use reqtags_core::types::{ActionKind, Issue, IssueState, ResourceType};

const DAY: u64 = 86_400;
const MAX_SECS: u64 = i64::MAX as u64;

/// Offsets across the whole parseable range, weighted toward realistic ones.
fn offset() -> impl Strategy<Value = u64> {
    prop_oneof![
        4 => 0u64..(60 * DAY),
        1 => 0u64..=MAX_SECS,
        1 => prop::sample::select(vec![MAX_SECS, MAX_SECS - 1, 1_000_000_000 * 7 * DAY]),
    ]
}

/// Elapsed time since detection; stays inside chrono's calendar.
fn elapsed() -> impl Strategy<Value = u64> {
    prop_oneof![
        4 => 0u64..(200 * DAY),
        1 => 0u64..(100_000 * 365 * DAY),
    ]
}

fn schedule() -> impl Strategy<Value = AlertSchedule> {
    (prop::collection::vec(offset(), 0..5), offset(), offset())
        .prop_map(|(mut alerts, stop, extra)| {
            alerts.sort_unstable();
            let stop = stop.max(1);
            AlertSchedule {
                alert: alerts.into_iter().map(HumanDuration::from_secs).collect(),
                stop: HumanDuration::from_secs(stop),
                remove: HumanDuration::from_secs(stop.saturating_add(extra).min(MAX_SECS)),
                scope: vec!["*".to_string()],
            }
        })
}

fn state() -> impl Strategy<Value = IssueState> {
    prop::sample::select(IssueState::ALL.to_vec())
}

fn issue(state: IssueState, alerts_sent: u32, confirmed: bool) -> Issue {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Issue {
        id: "reqtags-0000000000000000".to_string(),
        resource_id: "i-1".to_string(),
        resource_type: ResourceType::ec2_instance(),
        account_id: "111".to_string(),
        location: "us-west-2".to_string(),
        state,
        created,
        last_change: created,
        next_change: None,
        alerts_sent,
        confirmed,
        missing_tags: vec!["owner".to_string()],
        notes: Vec::new(),
    }
}

proptest! {
    #[test]
    fn collect_mode_plans_no_action(
        schedule in schedule(),
        state in state(),
        confirmed in any::<bool>(),
        stop_supported in any::<bool>(),
        elapsed in elapsed(),
    ) {
        let issue = issue(state, 0, confirmed);
        let now = issue.created + Duration::seconds(elapsed as i64);
        let policy = EnforcementPolicy { collect_only: true, confirm_shutdown: false };
        let d = decide(&issue, Some(&schedule), policy, stop_supported, now);
        prop_assert!(d.action.is_none());
        prop_assert!(d.awaiting_confirmation.is_none());
    }

    #[test]
    fn unconfirmed_issue_is_never_acted_on(
        schedule in schedule(),
        state in state(),
        stop_supported in any::<bool>(),
        elapsed in elapsed(),
    ) {
        let issue = issue(state, 0, false);
        let now = issue.created + Duration::seconds(elapsed as i64);
        let policy = EnforcementPolicy { collect_only: false, confirm_shutdown: true };
        let d = decide(&issue, Some(&schedule), policy, stop_supported, now);
        prop_assert!(d.action.is_none());
    }

    #[test]
    fn alerts_sent_never_decreases(
        schedule in schedule(),
        state in state(),
        alerts_sent in 0u32..10,
        elapsed in elapsed(),
        has_schedule in any::<bool>(),
    ) {
        let issue = issue(state, alerts_sent, true);
        let now = issue.created + Duration::seconds(elapsed as i64);
        let policy = EnforcementPolicy { collect_only: false, confirm_shutdown: false };
        let d = decide(&issue, has_schedule.then_some(&schedule), policy, true, now);
        prop_assert!(d.alerts_due >= alerts_sent);
    }

    #[test]
    fn remove_is_never_planned_before_stop(
        schedule in schedule(),
        state in state(),
        elapsed in elapsed(),
    ) {
        let issue = issue(state, 0, true);
        let now = issue.created + Duration::seconds(elapsed as i64);
        let policy = EnforcementPolicy { collect_only: false, confirm_shutdown: false };
        let d = decide(&issue, Some(&schedule), policy, true, now);
        if d.action == Some(ActionKind::Remove) {
            prop_assert_eq!(issue.state, IssueState::Stopped);
        }
    }

    #[test]
    fn stepping_through_time_stops_before_removing(
        schedule in schedule(),
        step_hours in 1i64..72,
    ) {
        let mut issue = issue(IssueState::Detected, 0, true);
        let policy = EnforcementPolicy { collect_only: false, confirm_shutdown: false };
        let mut actions = Vec::new();
        let mut now = issue.created;
        for _ in 0..200 {
            let d = decide(&issue, Some(&schedule), policy, true, now);
            issue.alerts_sent = d.alerts_due;
            if let Some(action) = d.action {
                actions.push(action);
                let target = match action {
                    ActionKind::Stop => IssueState::Stopped,
                    ActionKind::Remove => IssueState::Removed,
                };
                issue.transition(target, now);
            }
            if let Some(next) = d.next_change {
                prop_assert!(next > now);
            }
            now += Duration::hours(step_hours);
        }
        if let Some(pos) = actions.iter().position(|a| *a == ActionKind::Remove) {
            prop_assert!(actions[..pos].contains(&ActionKind::Stop));
        }
        prop_assert!(actions.len() <= 2);
    }

    #[test]
    fn next_change_is_always_in_the_future(
        schedule in schedule(),
        state in state(),
        alerts_sent in 0u32..6,
        confirmed in any::<bool>(),
        collect_only in any::<bool>(),
        stop_supported in any::<bool>(),
        elapsed in elapsed(),
    ) {
        let issue = issue(state, alerts_sent, confirmed);
        let now = issue.created + Duration::seconds(elapsed as i64);
        let policy = EnforcementPolicy { collect_only, confirm_shutdown: true };
        let d = decide(&issue, Some(&schedule), policy, stop_supported, now);
        if let Some(next) = d.next_change {
            prop_assert!(next > now);
        }
    }
}
