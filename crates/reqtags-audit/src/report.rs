//! Issue listing and export for the host's UI.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Serialize;

use reqtags_core::config::AuditorConfig;
use reqtags_core::constants::DEFAULT_PAGE_SIZE;
use reqtags_core::errors::{AuditError, InventoryError};
use reqtags_core::traits::{IssueStore, ResourceInventory};
use reqtags_core::types::{
    Account, Issue, IssueFilter, IssueState, Page, Resource, ResourceType,
};

/// Listing request. Empty lists do not filter; `accounts` takes ids or names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub accounts: Vec<String>,
    pub regions: Vec<String>,
    pub state: Option<IssueState>,
    pub resource_types: Vec<String>,
    pub page: u32,
    pub count: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            accounts: Vec::new(),
            regions: Vec::new(),
            state: None,
            resource_types: Vec::new(),
            page: 1,
            count: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueListing {
    pub issues: Vec<Issue>,
    pub required_tags: Vec<String>,
    /// Total matches across all pages.
    pub issue_count: u64,
}

/// One exported row.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportRow<'a> {
    resource_id: &'a str,
    resource_type: &'a str,
    account_name: &'a str,
    region_name: &'a str,
    missing_tags: &'a [String],
    notes: &'a [String],
    tags: BTreeMap<&'a str, &'a str>,
    state: IssueState,
    last_change: DateTime<Utc>,
    next_change: Option<DateTime<Utc>>,
    created: DateTime<Utc>,
}

/// One page of issues matching `query`.
pub fn list_issues(
    store: &dyn IssueStore,
    inventory: &dyn ResourceInventory,
    config: &AuditorConfig,
    query: &ListQuery,
) -> Result<IssueListing, AuditError> {
    let filter = build_filter(inventory, query)?;
    let page = store.search_issues(&filter, Page::new(query.page, query.count))?;
    Ok(IssueListing {
        issues: page.issues,
        required_tags: config.effective_required_tags(),
        issue_count: page.total,
    })
}

/// Every issue matching `query` (paging ignored) as base64-encoded JSON,
/// indented by four spaces, with the resource's current tags. A resource type
/// the inventory cannot list exports with empty tags.
pub fn export_issues(
    store: &dyn IssueStore,
    inventory: &dyn ResourceInventory,
    query: &ListQuery,
) -> Result<String, AuditError> {
    let filter = build_filter(inventory, query)?;
    let issues = store.search_issues(&filter, Page::all())?.issues;

    let accounts: HashMap<String, Account> = inventory
        .accounts()
        .into_iter()
        .map(|a| (a.id.clone(), a))
        .collect();

    let types: BTreeSet<&ResourceType> = issues.iter().map(|i| &i.resource_type).collect();
    let mut resources: HashMap<String, Resource> = HashMap::new();
    for resource_type in types {
        match inventory.resources(resource_type) {
            Ok(found) => resources.extend(found.into_iter().map(|r| (r.id.clone(), r))),
            Err(e) => {
                tracing::warn!(resource_type = %resource_type, error = %e, "exporting issues without current tags");
            }
        }
    }

    let rows: Vec<ExportRow<'_>> = issues
        .iter()
        .map(|issue| ExportRow {
            resource_id: &issue.resource_id,
            resource_type: issue.resource_type.as_str(),
            account_name: accounts
                .get(&issue.account_id)
                .map_or(issue.account_id.as_str(), |a| a.name.as_str()),
            region_name: &issue.location,
            missing_tags: &issue.missing_tags,
            notes: &issue.notes,
            tags: resources
                .get(&issue.resource_id)
                .map(|r| {
                    r.tags
                        .iter()
                        .map(|t| (t.key.as_str(), t.value.as_str()))
                        .collect()
                })
                .unwrap_or_default(),
            state: issue.state,
            last_change: issue.last_change,
            next_change: issue.next_change,
            created: issue.created,
        })
        .collect();

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    rows.serialize(&mut serializer)
        .map_err(|e| AuditError::Export(e.to_string()))?;

    tracing::info!(issues = rows.len(), "exported required tags issues");
    Ok(STANDARD.encode(buf))
}

fn build_filter(
    inventory: &dyn ResourceInventory,
    query: &ListQuery,
) -> Result<IssueFilter, InventoryError> {
    let account_ids = if query.accounts.is_empty() {
        Vec::new()
    } else {
        let known = inventory.accounts();
        query
            .accounts
            .iter()
            .map(|wanted| {
                known
                    .iter()
                    .find(|a| a.id == *wanted || a.name == *wanted)
                    .map(|a| a.id.clone())
                    .ok_or_else(|| InventoryError::UnknownAccount(wanted.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?
    };

    Ok(IssueFilter {
        account_ids,
        locations: query.regions.clone(),
        states: query.state.into_iter().collect(),
        resource_types: query
            .resource_types
            .iter()
            .map(|t| ResourceType::new(t.as_str()))
            .collect(),
    })
}
