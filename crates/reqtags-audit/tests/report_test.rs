//! Issue listing and export.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqtags_audit::{export_issues, list_issues, Collaborators, ListQuery, RequiredTagsAuditor};
use reqtags_core::config::AuditorConfig;
use reqtags_core::errors::{AuditError, InventoryError};
use reqtags_core::traits::CancellationToken;
use reqtags_core::types::IssueState;
use reqtags_storage::SqliteStore;
use reqtags_test_fixtures::{
    account, ec2, s3, t0, with_tags, FakeCloud, FakeInventory, RecordingNotifier,
};

fn populated() -> (Arc<SqliteStore>, Arc<FakeInventory>, AuditorConfig) {
    let mut east = ec2("i-2", "222");
    east.location = "us-east-1".to_string();
    let inventory = Arc::new(FakeInventory::new(
        vec![
            account("111", "prod", &["ops@example.com"]),
            account("222", "staging", &[]),
        ],
        vec![
            with_tags(ec2("i-1", "111"), &[("Name", "web <1>")]),
            east,
            s3("b-1", "111"),
        ],
    ));
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let config = AuditorConfig {
        audit_scope: Some(vec!["aws_ec2_instance".into(), "aws_s3_bucket".into()]),
        ..Default::default()
    };
    let auditor = RequiredTagsAuditor::new(
        config.clone(),
        Collaborators {
            inventory: inventory.clone(),
            cloud: Arc::new(FakeCloud::new()),
            notifier: Arc::new(RecordingNotifier::new()),
            store: store.clone(),
            trail: store.clone(),
        },
    )
    .unwrap();
    auditor.run(t0(), &CancellationToken::new()).unwrap();
    (store, inventory, config)
}

#[test]
fn lists_all_issues_with_required_tags() {
    let (store, inventory, config) = populated();
    let listing =
        list_issues(store.as_ref(), inventory.as_ref(), &config, &ListQuery::default()).unwrap();

    assert_eq!(listing.issue_count, 3);
    assert_eq!(listing.issues.len(), 3);
    assert_eq!(listing.required_tags, vec!["owner", "accounting", "name"]);

    let json = serde_json::to_value(&listing).unwrap();
    assert_eq!(json["issueCount"], 3);
    assert!(json["requiredTags"].is_array());
}

#[test]
fn filters_by_account_name_region_and_type() {
    let (store, inventory, config) = populated();

    let by_name = ListQuery {
        accounts: vec!["staging".into()],
        ..Default::default()
    };
    let listing = list_issues(store.as_ref(), inventory.as_ref(), &config, &by_name).unwrap();
    assert_eq!(listing.issue_count, 1);
    assert_eq!(listing.issues[0].resource_id, "i-2");

    let by_region_and_type = ListQuery {
        regions: vec!["us-west-2".into()],
        resource_types: vec!["aws_s3_bucket".into()],
        state: Some(IssueState::Detected),
        ..Default::default()
    };
    let listing =
        list_issues(store.as_ref(), inventory.as_ref(), &config, &by_region_and_type).unwrap();
    assert_eq!(listing.issue_count, 1);
    assert_eq!(listing.issues[0].resource_id, "b-1");

    let stopped = ListQuery {
        state: Some(IssueState::Stopped),
        ..Default::default()
    };
    assert_eq!(
        list_issues(store.as_ref(), inventory.as_ref(), &config, &stopped)
            .unwrap()
            .issue_count,
        0
    );
}

#[test]
fn pages_through_issues() {
    let (store, inventory, config) = populated();
    let query = ListQuery {
        page: 2,
        count: 2,
        ..Default::default()
    };
    let listing = list_issues(store.as_ref(), inventory.as_ref(), &config, &query).unwrap();
    assert_eq!(listing.issue_count, 3);
    assert_eq!(listing.issues.len(), 1);
}

#[test]
fn unknown_account_is_rejected() {
    let (store, inventory, config) = populated();
    let query = ListQuery {
        accounts: vec!["nope".into()],
        ..Default::default()
    };
    let err = list_issues(store.as_ref(), inventory.as_ref(), &config, &query).unwrap_err();
    assert!(matches!(
        err,
        AuditError::Inventory(InventoryError::UnknownAccount(ref a)) if a == "nope"
    ));
}

#[test]
fn export_is_base64_pretty_json() {
    let (store, inventory, _) = populated();
    let query = ListQuery {
        accounts: vec!["111".into()],
        resource_types: vec!["aws_ec2_instance".into()],
        ..Default::default()
    };

    let encoded = export_issues(store.as_ref(), inventory.as_ref(), &query).unwrap();
    let text = String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap();
    assert!(text.contains("\n    {\n        \"resourceId\""));

    let rows: serde_json::Value = serde_json::from_str(&text).unwrap();
    let row = &rows[0];
    assert_eq!(row["resourceId"], "i-1");
    assert_eq!(row["resourceType"], "aws_ec2_instance");
    assert_eq!(row["accountName"], "prod");
    assert_eq!(row["regionName"], "us-west-2");
    assert_eq!(row["tags"]["Name"], "web <1>");
    assert_eq!(row["state"], "detected");
    assert_eq!(row["missingTags"], serde_json::json!(["accounting", "owner"]));
    assert!(row["nextChange"].is_string());
    assert!(row["created"].as_str().unwrap().starts_with("2024-01-01"));
}

#[test]
fn export_survives_a_failed_inventory_listing() {
    let (store, inventory, _) = populated();
    inventory.fail_type("aws_s3_bucket", true);

    let encoded = export_issues(store.as_ref(), inventory.as_ref(), &ListQuery::default()).unwrap();
    let text = String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap();
    let rows: Vec<serde_json::Value> = serde_json::from_str(&text).unwrap();
    assert_eq!(rows.len(), 3);

    let bucket = rows.iter().find(|r| r["resourceId"] == "b-1").unwrap();
    assert_eq!(bucket["tags"], serde_json::json!({}));
    let instance = rows.iter().find(|r| r["resourceId"] == "i-1").unwrap();
    assert_eq!(instance["tags"]["Name"], "web <1>");
}
