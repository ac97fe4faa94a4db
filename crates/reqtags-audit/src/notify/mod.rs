//! Notices: per-recipient aggregation of new and fixed issues, rendering,
//! and delivery through the host's notifier.

pub mod render;

use std::collections::BTreeMap;

use reqtags_core::constants::SUBSYSTEM_NAME;
use reqtags_core::errors::NotifyError;
use reqtags_core::events::{AuditEventDispatcher, NotificationSentEvent};
use reqtags_core::traits::{Notification, Notifier};
use reqtags_core::types::{Contact, Issue, Tag};

/// One issue as it appears in a notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeItem {
    pub issue: Issue,
    pub account_name: String,
    pub tags: Vec<Tag>,
}

/// Everything one recipient is told about in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub contact: Contact,
    pub issues: Vec<NoticeItem>,
    pub fixed: Vec<NoticeItem>,
}

/// Merge recipient lists in order, keeping the first occurrence of each
/// email address (compared case-insensitively). Non-email contacts are dropped.
pub fn merge_recipients<'a>(lists: impl IntoIterator<Item = &'a [Contact]>) -> Vec<Contact> {
    let mut merged: Vec<Contact> = Vec::new();
    for contact in lists.into_iter().flatten() {
        if !contact.is_email() || contact.value.trim().is_empty() {
            continue;
        }
        if !merged
            .iter()
            .any(|c| c.value.eq_ignore_ascii_case(&contact.value))
        {
            merged.push(contact.clone());
        }
    }
    merged
}

/// Groups new and fixed issues per recipient.
#[derive(Debug, Default)]
pub struct NoticeBuilder {
    notices: BTreeMap<String, Notice>,
}

impl NoticeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_issue(&mut self, recipients: &[Contact], item: &NoticeItem) {
        for contact in recipients {
            self.entry(contact).issues.push(item.clone());
        }
    }

    pub fn add_fixed(&mut self, recipients: &[Contact], item: &NoticeItem) {
        for contact in recipients {
            self.entry(contact).fixed.push(item.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn build(self) -> Vec<Notice> {
        self.notices.into_values().collect()
    }

    fn entry(&mut self, contact: &Contact) -> &mut Notice {
        self.notices
            .entry(contact.value.to_lowercase())
            .or_insert_with(|| Notice {
                contact: contact.clone(),
                issues: Vec::new(),
                fixed: Vec::new(),
            })
    }
}

/// Subjects for the two notice kinds.
#[derive(Debug, Clone)]
pub struct Subjects {
    pub issues: String,
    pub fixed: String,
}

/// Render and send each notice: one message for new issues, one for fixed
/// issues, skipping empty groups. Delivery failures are returned, not raised;
/// the sent event counts only delivered messages.
pub fn send_notices(
    notifier: &dyn Notifier,
    notices: &[Notice],
    subjects: &Subjects,
    events: &AuditEventDispatcher,
) -> (usize, Vec<NotifyError>) {
    let mut sent = 0;
    let mut errors = Vec::new();

    for notice in notices {
        let groups = [
            (&notice.issues, subjects.issues.as_str(), false),
            (&notice.fixed, subjects.fixed.as_str(), true),
        ];
        let mut delivered = NotificationSentEvent {
            recipient: notice.contact.value.clone(),
            issues: 0,
            fixed: 0,
        };
        for (items, subject, fixed) in groups {
            if items.is_empty() {
                continue;
            }
            let notification = Notification {
                subsystem: SUBSYSTEM_NAME.to_string(),
                recipients: vec![notice.contact.clone()],
                subject: subject.to_string(),
                body_text: render::render_text(items, fixed),
                body_html: render::render_html(subject, items, fixed),
            };
            match notifier.send(&notification) {
                Ok(()) => {
                    sent += 1;
                    if fixed {
                        delivered.fixed = items.len();
                    } else {
                        delivered.issues = items.len();
                    }
                }
                Err(e) => {
                    tracing::warn!(recipient = %notice.contact.value, error = %e, "notification failed");
                    errors.push(e);
                }
            }
        }

        if delivered.issues + delivered.fixed > 0 {
            events.emit_notification_sent(&delivered);
        }
    }

    (sent, errors)
}
