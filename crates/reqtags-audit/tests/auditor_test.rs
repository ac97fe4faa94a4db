//! End-to-end auditor runs against in-memory fakes and SQLite.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use reqtags_audit::{Collaborators, RequiredTagsAuditor};
use reqtags_core::config::{AlertSchedule, AlertSettings, AuditorConfig, HumanDuration};
use reqtags_core::constants::{
    DEFAULT_EMAIL_SUBJECT, DEFAULT_EMAIL_SUBJECT_FIXED, EVENT_CONFIRM, EVENT_ISSUE_REMOVED,
    EVENT_RUN_COMPLETE,
};
use reqtags_core::errors::{AuditError, StorageError};
use reqtags_core::events::{AuditEventHandler, IssueDetectedEvent, NotificationSentEvent};
use reqtags_core::traits::{CancellationToken, Cancellable, IssueStore};
use reqtags_core::types::{issue_id_for, ActionKind, ActionStatus, IssueState};
use reqtags_storage::SqliteStore;
use reqtags_test_fixtures::{
    account, ebs, ec2, s3, t0, with_tags, BucketState, FakeCloud, FakeInventory,
    RecordingNotifier,
};

struct Harness {
    inventory: Arc<FakeInventory>,
    cloud: Arc<FakeCloud>,
    notifier: Arc<RecordingNotifier>,
    store: Arc<SqliteStore>,
    auditor: RequiredTagsAuditor,
}

impl Harness {
    fn run(&self, at: DateTime<Utc>) -> reqtags_audit::RunReport {
        self.auditor
            .run(at, &CancellationToken::new())
            .expect("run succeeds")
    }

    fn issue_state(&self, resource_id: &str) -> Option<IssueState> {
        self.store
            .get_issue(&issue_id_for(resource_id))
            .unwrap()
            .map(|i| i.state)
    }
}

/// Alerts at detection and after one day, stop after two days, remove after five.
fn schedule() -> AlertSchedule {
    AlertSchedule {
        alert: vec![HumanDuration::ZERO, HumanDuration::from_days(1)],
        stop: HumanDuration::from_days(2),
        remove: HumanDuration::from_days(5),
        scope: vec!["*".to_string()],
    }
}

fn config(collect_only: bool, confirm_shutdown: bool) -> AuditorConfig {
    let mut schedules = BTreeMap::new();
    schedules.insert("*".to_string(), schedule());
    AuditorConfig {
        enabled: Some(true),
        audit_scope: Some(vec![
            "aws_ec2_instance".to_string(),
            "aws_s3_bucket".to_string(),
            "aws_ebs_volume".to_string(),
        ]),
        alert_settings: Some(AlertSettings::new(schedules)),
        collect_only: Some(collect_only),
        confirm_shutdown: Some(confirm_shutdown),
        permanent_recipient: Some(vec!["sec@example.com".to_string()]),
        ..Default::default()
    }
}

fn harness(config: AuditorConfig, resources: Vec<reqtags_core::types::Resource>) -> Harness {
    let inventory = Arc::new(FakeInventory::new(
        vec![account("111", "prod", &["ops@example.com"])],
        resources,
    ));
    let cloud = Arc::new(FakeCloud::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let auditor = RequiredTagsAuditor::new(
        config,
        Collaborators {
            inventory: inventory.clone(),
            cloud: cloud.clone(),
            notifier: notifier.clone(),
            store: store.clone(),
            trail: store.clone(),
        },
    )
    .unwrap();
    Harness {
        inventory,
        cloud,
        notifier,
        store,
        auditor,
    }
}

fn untagged_instance() -> reqtags_core::types::Resource {
    with_tags(ec2("i-1", "111"), &[("owner", "dev@example.com")])
}

fn compliant_instance() -> reqtags_core::types::Resource {
    with_tags(
        ec2("i-1", "111"),
        &[
            ("owner", "dev@example.com"),
            ("accounting", "cc-42"),
            ("name", "web"),
        ],
    )
}

#[test]
fn new_resource_opens_issue_and_notifies_everyone() {
    let h = harness(config(true, true), vec![untagged_instance()]);
    let report = h.run(t0());

    assert_eq!(report.resources_checked, 1);
    assert_eq!(report.new_issues, vec![issue_id_for("i-1")]);

    let issue = h.store.get_issue(&issue_id_for("i-1")).unwrap().unwrap();
    assert_eq!(issue.state, IssueState::Detected);
    assert_eq!(issue.alerts_sent, 1);
    assert_eq!(issue.missing_tags, vec!["accounting", "name"]);
    assert_eq!(issue.created, t0());

    for email in ["ops@example.com", "sec@example.com", "dev@example.com"] {
        let sent = h.notifier.sent_to(email);
        assert_eq!(sent.len(), 1, "{email}");
        assert_eq!(sent[0].subject, DEFAULT_EMAIL_SUBJECT);
        assert!(sent[0].body_text.contains("i-1"));
    }
}

#[test]
fn compliant_and_exempt_resources_open_nothing() {
    let exempt = with_tags(ec2("i-2", "111"), &[("cinq_ignore", "")]);
    let mut young = ec2("i-3", "111");
    young.created = t0() - Duration::hours(1);

    let h = harness(config(true, true), vec![compliant_instance(), exempt, young]);
    let report = h.run(t0());

    assert_eq!(report.resources_checked, 3);
    assert_eq!(report.exempt, 1);
    assert_eq!(report.in_grace_period, 1);
    assert!(report.new_issues.is_empty());
    assert!(h.store.load_issues().unwrap().is_empty());
    assert!(h.notifier.sent().is_empty());
}

#[test]
fn later_alert_offsets_notify_once_each() {
    let h = harness(config(true, true), vec![untagged_instance()]);
    h.run(t0());
    h.notifier.clear();

    let report = h.run(t0() + Duration::days(1));
    assert_eq!(report.updated_issues, vec![issue_id_for("i-1")]);
    assert_eq!(h.issue_state("i-1"), Some(IssueState::Alerted));
    assert_eq!(h.notifier.sent_to("ops@example.com").len(), 1);

    h.notifier.clear();
    let report = h.run(t0() + Duration::days(1) + Duration::hours(1));
    assert!(report.updated_issues.is_empty());
    assert!(h.notifier.sent().is_empty());

    let issue = h.store.get_issue(&issue_id_for("i-1")).unwrap().unwrap();
    assert_eq!(issue.alerts_sent, 2);
}

#[test]
fn collect_mode_never_acts() {
    let mut cfg = config(true, false);
    cfg.always_send_email = Some(false);
    let h = harness(cfg, vec![untagged_instance()]);

    h.run(t0());
    let report = h.run(t0() + Duration::days(30));

    assert!(report.actions.is_empty());
    assert!(h.cloud.calls().is_empty());
    assert_eq!(h.issue_state("i-1"), Some(IssueState::Alerted));
    assert!(h.notifier.sent().is_empty());
}

#[test]
fn instance_is_stopped_then_terminated_then_forgotten() {
    let h = harness(config(false, false), vec![untagged_instance()]);
    h.run(t0());

    let report = h.run(t0() + Duration::days(2));
    assert_eq!(report.actions.len(), 1);
    assert_eq!(report.actions[0].action, ActionKind::Stop);
    assert_eq!(report.actions[0].status, ActionStatus::Succeed);
    assert_eq!(h.issue_state("i-1"), Some(IssueState::Stopped));
    assert_eq!(h.cloud.instance_state_of("i-1").as_deref(), Some("stopped"));

    let report = h.run(t0() + Duration::days(5));
    assert_eq!(report.actions[0].action, ActionKind::Remove);
    assert_eq!(h.issue_state("i-1"), Some(IssueState::Removed));
    assert_eq!(h.cloud.instance_state_of("i-1").as_deref(), Some("terminated"));

    let records = h.store.enforcements_for("i-1").unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].metrics["instance_type"], "t3.micro");
    let logged = h
        .store
        .audit_entries_with_prefix("auditor_required_tags.aws_ec2_instance.")
        .unwrap();
    let events: Vec<&str> = logged.iter().map(|e| e.event.as_str()).collect();
    assert!(events.contains(&"auditor_required_tags.aws_ec2_instance.stop.succeed"));
    assert!(events.contains(&"auditor_required_tags.aws_ec2_instance.remove.succeed"));

    h.inventory.remove("i-1");
    h.notifier.clear();
    let report = h.run(t0() + Duration::days(6));
    assert_eq!(report.removed_issues, vec![issue_id_for("i-1")]);
    assert!(report.fixed_issues.is_empty());
    assert_eq!(h.issue_state("i-1"), None);
    assert!(h.notifier.sent().is_empty());
    assert_eq!(
        h.store.audit_entries_with_prefix(EVENT_ISSUE_REMOVED).unwrap().len(),
        1
    );
}

#[test]
fn confirmation_gates_enforcement() {
    let h = harness(config(false, true), vec![untagged_instance()]);
    h.run(t0());

    let report = h.run(t0() + Duration::days(2));
    assert_eq!(report.awaiting_confirmation, vec![issue_id_for("i-1")]);
    assert!(report.actions.is_empty());
    assert!(h.cloud.calls().is_empty());
    assert_eq!(h.issue_state("i-1"), Some(IssueState::AwaitingConfirmation));

    let issue = h
        .auditor
        .confirm_enforcement(&issue_id_for("i-1"), "alice", t0() + Duration::days(2))
        .unwrap();
    assert!(issue.confirmed);
    let confirms = h.store.audit_entries_with_prefix(EVENT_CONFIRM).unwrap();
    assert_eq!(confirms.len(), 1);
    assert_eq!(confirms[0].actor, "alice");

    let report = h.run(t0() + Duration::days(2) + Duration::hours(1));
    assert_eq!(report.actions.len(), 1);
    assert_eq!(h.issue_state("i-1"), Some(IssueState::Stopped));
}

#[test]
fn confirming_unknown_issue_fails() {
    let h = harness(config(false, true), vec![]);
    let err = h
        .auditor
        .confirm_enforcement("nope", "alice", t0())
        .unwrap_err();
    assert!(matches!(
        err,
        AuditError::Storage(StorageError::IssueNotFound { .. })
    ));
}

#[test]
fn failed_action_is_retried_next_run() {
    let h = harness(config(false, false), vec![untagged_instance()]);
    h.run(t0());
    h.cloud.fail_resource("i-1", true);

    let report = h.run(t0() + Duration::days(2));
    assert_eq!(report.actions[0].status, ActionStatus::Failed);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(h.issue_state("i-1"), Some(IssueState::Alerted));
    assert!(h.store.enforcements_for("i-1").unwrap().is_empty());

    h.cloud.fail_resource("i-1", false);
    let report = h.run(t0() + Duration::days(2) + Duration::hours(1));
    assert_eq!(report.actions[0].status, ActionStatus::Succeed);
    assert_eq!(h.issue_state("i-1"), Some(IssueState::Stopped));
}

#[test]
fn bucket_with_objects_is_locked_down() {
    let bucket = s3("bucket-1", "111");
    let h = harness(config(false, false), vec![bucket]);
    h.cloud.set_bucket(
        "bucket-1",
        BucketState {
            has_objects: true,
            ..Default::default()
        },
    );
    h.run(t0());

    let report = h.run(t0() + Duration::days(2));
    assert!(report.actions.is_empty(), "buckets are never stopped");

    let report = h.run(t0() + Duration::days(5));
    assert_eq!(report.actions[0].action, ActionKind::Remove);
    assert_eq!(h.issue_state("bucket-1"), Some(IssueState::Removed));

    let state = h.cloud.bucket("bucket-1").unwrap();
    assert!(state.policy.unwrap().contains("cinqDenyObjectUploads"));
    assert_eq!(state.lifecycle_rule_ids, vec!["cloudInquisitor"]);

    // Removed issues take no further action while the bucket drains.
    let report = h.run(t0() + Duration::days(6));
    assert!(report.actions.is_empty());
}

#[test]
fn empty_bucket_and_volume_are_deleted() {
    let h = harness(
        config(false, false),
        vec![s3("bucket-2", "111"), ebs("vol-1", "111")],
    );
    h.cloud.set_bucket("bucket-2", BucketState::default());
    h.run(t0());
    h.run(t0() + Duration::days(5));

    let calls = h.cloud.calls();
    assert!(calls.contains(&"delete_bucket:bucket-2".to_string()));
    assert!(calls.contains(&"delete_volume:vol-1".to_string()));
    assert_eq!(h.issue_state("vol-1"), Some(IssueState::Removed));
}

#[test]
fn tagged_resource_is_reported_fixed() {
    let h = harness(config(true, true), vec![untagged_instance()]);
    h.run(t0());
    h.notifier.clear();

    h.inventory.upsert(compliant_instance());
    let report = h.run(t0() + Duration::hours(2));

    assert_eq!(report.fixed_issues, vec![issue_id_for("i-1")]);
    assert_eq!(h.issue_state("i-1"), None);
    let sent = h.notifier.sent_to("dev@example.com");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, DEFAULT_EMAIL_SUBJECT_FIXED);
}

#[test]
fn inventory_failure_keeps_existing_issues() {
    let h = harness(config(true, true), vec![untagged_instance()]);
    h.run(t0());

    h.inventory.fail_type("aws_ec2_instance", true);
    let report = h.run(t0() + Duration::hours(1));

    assert_eq!(report.errors.len(), 1);
    assert!(report.fixed_issues.is_empty());
    assert_eq!(h.issue_state("i-1"), Some(IssueState::Detected));
}

#[test]
fn notification_failure_does_not_stop_other_recipients() {
    let h = harness(config(true, true), vec![untagged_instance()]);
    h.notifier.reject("ops@example.com");

    let report = h.run(t0());

    assert_eq!(report.errors.len(), 1);
    assert_eq!(h.notifier.sent_to("sec@example.com").len(), 1);
    assert_eq!(report.notifications_sent, 2);
}

#[test]
fn cancelled_run_returns_error() {
    let h = harness(config(true, true), vec![untagged_instance()]);
    let token = CancellationToken::new();
    token.cancel();

    let err = h.auditor.run(t0(), &token).unwrap_err();
    assert!(matches!(err, AuditError::Cancelled));
    assert!(h.store.load_issues().unwrap().is_empty());
}

/// Requests a stop from the `after`-th poll on.
struct StopAfterPolls {
    polls: AtomicUsize,
    after: usize,
}

impl StopAfterPolls {
    fn new(after: usize) -> Self {
        Self {
            polls: AtomicUsize::new(0),
            after,
        }
    }
}

impl Cancellable for StopAfterPolls {
    fn is_cancelled(&self) -> bool {
        self.polls.fetch_add(1, Ordering::SeqCst) + 1 >= self.after
    }
}

#[test]
fn stop_while_saving_issues_still_sends_their_notices() {
    let second = with_tags(ec2("i-2", "111"), &[("owner", "dev@example.com")]);
    let h = harness(config(true, true), vec![untagged_instance(), second]);

    // Two polls while evaluating, then one per finding: stop before i-2.
    let err = h.auditor.run(t0(), &StopAfterPolls::new(4)).unwrap_err();
    assert!(matches!(err, AuditError::Cancelled));

    let stored = h.store.load_issues().unwrap();
    assert_eq!(stored.len(), 1);
    let sent = h.notifier.sent();
    for issue in stored.iter().filter(|i| i.alerts_sent > 0) {
        assert!(
            sent.iter().any(|n| n.body_text.contains(&issue.resource_id)),
            "{} alerted without a notice",
            issue.id
        );
    }
    assert_eq!(h.notifier.sent_to("ops@example.com").len(), 1);
    assert!(h.store.audit_entries_with_prefix(EVENT_RUN_COMPLETE).unwrap().is_empty());

    // The next run picks up the rest without re-alerting i-1.
    h.notifier.clear();
    let report = h.run(t0() + Duration::minutes(30));
    assert_eq!(report.new_issues, vec![issue_id_for("i-2")]);
    let sent = h.notifier.sent_to("ops@example.com");
    assert_eq!(sent.len(), 1);
    assert!(sent[0].body_text.contains("i-2"));
    assert!(!sent[0].body_text.contains("i-1"));
}

#[test]
fn run_completion_is_audit_logged() {
    let h = harness(config(true, true), vec![untagged_instance()]);
    h.run(t0());

    let entries = h.store.audit_entries_with_prefix(EVENT_RUN_COMPLETE).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].data["new_issues"], 1);
}

#[test]
fn invalid_config_is_rejected() {
    let mut cfg = config(true, true);
    cfg.interval = Some(0);
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let result = RequiredTagsAuditor::new(
        cfg,
        Collaborators {
            inventory: Arc::new(FakeInventory::default()),
            cloud: Arc::new(FakeCloud::new()),
            notifier: Arc::new(RecordingNotifier::new()),
            store: store.clone(),
            trail: store,
        },
    );
    assert!(result.is_err());
}

#[derive(Default)]
struct DetectedCounter(AtomicUsize);

impl AuditEventHandler for DetectedCounter {
    fn on_issue_detected(&self, _event: &IssueDetectedEvent) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn handlers_observe_detections() {
    let mut h = harness(
        config(true, true),
        vec![untagged_instance(), ec2("i-9", "111")],
    );
    let counter = Arc::new(DetectedCounter::default());
    h.auditor.register_handler(counter.clone());

    h.run(t0());
    h.run(t0() + Duration::hours(1));

    assert_eq!(counter.0.load(Ordering::SeqCst), 2);
}

#[derive(Default)]
struct DeliveryLog(std::sync::Mutex<Vec<String>>);

impl AuditEventHandler for DeliveryLog {
    fn on_notification_sent(&self, event: &NotificationSentEvent) {
        self.0.lock().unwrap().push(event.recipient.clone());
    }
}

#[test]
fn sent_events_skip_recipients_whose_delivery_failed() {
    let mut h = harness(config(true, true), vec![untagged_instance()]);
    let log = Arc::new(DeliveryLog::default());
    h.auditor.register_handler(log.clone());
    h.notifier.reject("ops@example.com");

    let report = h.run(t0());

    assert_eq!(report.notifications_sent, 2);
    let mut recipients = log.0.lock().unwrap().clone();
    recipients.sort();
    assert_eq!(recipients, vec!["dev@example.com", "sec@example.com"]);
}
