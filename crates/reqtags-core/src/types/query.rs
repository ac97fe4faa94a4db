//! Issue search filters and pagination.

use serde::{Deserialize, Serialize};

use super::{Issue, IssueState, ResourceType};
use crate::constants::DEFAULT_PAGE_SIZE;

/// Filters for issue searches. Empty lists do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueFilter {
    pub account_ids: Vec<String>,
    pub locations: Vec<String>,
    pub states: Vec<IssueState>,
    pub resource_types: Vec<ResourceType>,
}

impl IssueFilter {
    pub fn matches(&self, issue: &Issue) -> bool {
        (self.account_ids.is_empty() || self.account_ids.contains(&issue.account_id))
            && (self.locations.is_empty() || self.locations.contains(&issue.location))
            && (self.states.is_empty() || self.states.contains(&issue.state))
            && (self.resource_types.is_empty()
                || self.resource_types.contains(&issue.resource_type))
    }
}

/// One-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page: u32,
    pub count: u32,
}

impl Page {
    pub fn new(page: u32, count: u32) -> Self {
        Self {
            page: page.max(1),
            count: count.max(1),
        }
    }

    /// Everything on one page.
    pub fn all() -> Self {
        Self {
            page: 1,
            count: u32::MAX,
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.count)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// A page of issues plus the total number of matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuePage {
    pub total: u64,
    pub issues: Vec<Issue>,
}

impl IssuePage {
    pub fn has_more(&self, page: &Page) -> bool {
        page.offset() + (self.issues.len() as u64) < self.total
    }
}
