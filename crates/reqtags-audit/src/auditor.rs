//! The required tags auditor run.
//!
//! One run: load resources in scope, evaluate them, open or advance issues,
//! execute due enforcement actions, resolve fixed issues, send notices.
//! Storage failures and stop requests abort the run, after the notices for
//! already saved issues are sent; inventory, action and notification
//! failures are collected in the [`RunReport`].

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::json;

use reqtags_core::config::{AlertSettings, AuditorConfig};
use reqtags_core::constants::{EVENT_CONFIRM, EVENT_ISSUE_REMOVED, EVENT_RUN_COMPLETE, NAMESPACE};
use reqtags_core::errors::{AuditError, ConfigError, ReqTagsErrorCode, RunErrors, StorageError};
use reqtags_core::events::{
    ActionAppliedEvent, ActionFailedEvent, AlertSentEvent, AuditEventDispatcher, AuditEventHandler,
    AwaitingConfirmationEvent, ErrorEvent, IssueDetectedEvent, IssueFixedEvent, IssueRemovedEvent,
    IssueUpdatedEvent, RunCompleteEvent, RunStartedEvent,
};
use reqtags_core::traits::{
    AuditTrail, Cancellable, CloudClient, IssueStore, Notifier, ResourceInventory,
};
use reqtags_core::types::{
    issue_id_for, Account, ActionKind, ActionStatus, AuditLogEntry, Contact, Issue, IssueState,
    Resource, ResourceType,
};

use crate::compliance::{owner_emails, Compliance, TagEvaluator};
use crate::enforcement::ActionExecutor;
use crate::notify::{self, merge_recipients, NoticeBuilder, NoticeItem, Subjects};
use crate::schedule::{decide, EnforcementPolicy};

/// Host-provided collaborators.
pub struct Collaborators {
    pub inventory: Arc<dyn ResourceInventory>,
    pub cloud: Arc<dyn CloudClient>,
    pub notifier: Arc<dyn Notifier>,
    pub store: Arc<dyn IssueStore>,
    pub trail: Arc<dyn AuditTrail>,
}

/// One enforcement attempt made during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionTaken {
    pub issue_id: String,
    pub resource_id: String,
    pub action: ActionKind,
    pub status: ActionStatus,
}

/// Summary of one auditor run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub resources_checked: usize,
    pub exempt: usize,
    pub in_grace_period: usize,
    pub new_issues: Vec<String>,
    pub updated_issues: Vec<String>,
    pub fixed_issues: Vec<String>,
    /// Issues of removed resources, deleted without a notice.
    pub removed_issues: Vec<String>,
    pub awaiting_confirmation: Vec<String>,
    pub actions: Vec<ActionTaken>,
    pub notifications_sent: usize,
    pub audit_log_purged: u64,
    pub errors: RunErrors,
    pub duration_ms: u64,
}

/// A non-compliant resource found in this run.
struct Finding<'a> {
    resource: &'a Resource,
    missing_tags: Vec<String>,
    notes: Vec<String>,
}

pub struct RequiredTagsAuditor {
    config: AuditorConfig,
    evaluator: TagEvaluator,
    settings: AlertSettings,
    policy: EnforcementPolicy,
    inventory: Arc<dyn ResourceInventory>,
    store: Arc<dyn IssueStore>,
    trail: Arc<dyn AuditTrail>,
    notifier: Arc<dyn Notifier>,
    executor: ActionExecutor,
    events: AuditEventDispatcher,
}

impl RequiredTagsAuditor {
    /// Build an auditor; the configuration is validated first.
    pub fn new(config: AuditorConfig, deps: Collaborators) -> Result<Self, ConfigError> {
        AuditorConfig::validate(&config)?;
        Ok(Self {
            evaluator: TagEvaluator::from_config(&config),
            settings: config.effective_alert_settings(),
            policy: EnforcementPolicy::from_config(&config),
            executor: ActionExecutor::new(deps.cloud, Arc::clone(&deps.trail)),
            inventory: deps.inventory,
            store: deps.store,
            trail: deps.trail,
            notifier: deps.notifier,
            events: AuditEventDispatcher::new(),
            config,
        })
    }

    pub fn config(&self) -> &AuditorConfig {
        &self.config
    }

    pub fn register_handler(&mut self, handler: Arc<dyn AuditEventHandler>) {
        self.events.register(handler);
    }

    pub fn executor_mut(&mut self) -> &mut ActionExecutor {
        &mut self.executor
    }

    /// Execute one audit run at `now`.
    pub fn run(&self, now: DateTime<Utc>, cancel: &dyn Cancellable) -> Result<RunReport, AuditError> {
        let start = Instant::now();
        let span = tracing::info_span!("required_tags_run", collect_only = self.policy.collect_only);
        let _enter = span.enter();

        let mut report = RunReport::default();
        let scope = self.config.effective_audit_scope();
        self.events.emit_run_started(&RunStartedEvent {
            resource_types: scope.clone(),
            collect_only: self.policy.collect_only,
        });

        // Load every resource type in scope. A failed listing leaves that
        // type's issues untouched for this run.
        let mut resources: Vec<Resource> = Vec::new();
        let mut scanned: BTreeSet<String> = BTreeSet::new();
        for type_name in &scope {
            match self.inventory.resources(&ResourceType::new(type_name.as_str())) {
                Ok(found) => {
                    scanned.insert(type_name.clone());
                    resources.extend(found);
                }
                Err(e) => {
                    tracing::warn!(resource_type = %type_name, error = %e, "inventory listing failed");
                    self.emit_error(&e);
                    report.errors.push(e);
                }
            }
        }

        let mut findings: BTreeMap<String, Finding<'_>> = BTreeMap::new();
        for resource in &resources {
            cancel.ensure_running()?;
            report.resources_checked += 1;
            match self.evaluator.evaluate(resource, now) {
                Compliance::Exempt => report.exempt += 1,
                Compliance::InGracePeriod => report.in_grace_period += 1,
                Compliance::Compliant => {}
                Compliance::NonCompliant {
                    missing_tags,
                    notes,
                } => {
                    findings.insert(
                        issue_id_for(&resource.id),
                        Finding {
                            resource,
                            missing_tags,
                            notes,
                        },
                    );
                }
            }
        }

        let existing: BTreeMap<String, Issue> = self
            .store
            .load_issues()?
            .into_iter()
            .map(|issue| (issue.id.clone(), issue))
            .collect();

        // Saved issues have advanced alert counts; their notices go out
        // even when reconciling stops early.
        let mut notices = NoticeBuilder::new();
        let reconciled = self.reconcile(
            &resources,
            &findings,
            &existing,
            &scanned,
            now,
            cancel,
            &mut notices,
            &mut report,
        );
        if self.sends_notices() {
            self.deliver(notices, &mut report);
        }
        if let Err(e) = reconciled {
            tracing::warn!(
                error = %e,
                saved_issues = report.new_issues.len() + report.updated_issues.len(),
                "run stopped while reconciling issues"
            );
            return Err(e);
        }

        report.audit_log_purged = self
            .trail
            .purge_events(self.config.effective_audit_log_retention_days(), now)?;

        report.duration_ms = start.elapsed().as_millis() as u64;
        self.trail.record_event(&AuditLogEntry::new(
            EVENT_RUN_COMPLETE,
            NAMESPACE,
            json!({
                "resources_checked": report.resources_checked,
                "new_issues": report.new_issues.len(),
                "fixed_issues": report.fixed_issues.len(),
                "actions": report.actions.len(),
                "errors": report.errors.len(),
            }),
            now,
        ))?;
        self.events.emit_run_complete(&RunCompleteEvent {
            resources_checked: report.resources_checked,
            new_issues: report.new_issues.len(),
            fixed_issues: report.fixed_issues.len(),
            actions_taken: report.actions.len(),
            error_count: report.errors.len(),
            duration_ms: report.duration_ms,
        });
        tracing::info!(
            resources_checked = report.resources_checked,
            new_issues = report.new_issues.len(),
            fixed_issues = report.fixed_issues.len(),
            run_duration_ms = report.duration_ms,
            "required tags run complete"
        );

        Ok(report)
    }

    /// Record an operator's confirmation that `issue_id` may be enforced.
    /// Confirming twice is harmless.
    pub fn confirm_enforcement(
        &self,
        issue_id: &str,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<Issue, AuditError> {
        let mut issue = self
            .store
            .get_issue(issue_id)?
            .ok_or_else(|| StorageError::IssueNotFound {
                id: issue_id.to_string(),
            })?;

        if !issue.confirmed {
            issue.confirmed = true;
            self.store.save_issue(&issue)?;
        }
        self.trail.record_event(&AuditLogEntry::new(
            EVENT_CONFIRM,
            actor,
            json!({
                "issue_id": issue.id,
                "resource_id": issue.resource_id,
                "state": issue.state.as_str(),
            }),
            now,
        ))?;
        tracing::info!(issue_id, actor, "enforcement confirmed");
        Ok(issue)
    }

    /// Open or advance the issue for one finding. Returns the issue when it
    /// belongs in this run's notices.
    fn process_finding(
        &self,
        existing: Option<&Issue>,
        finding: &Finding<'_>,
        account: Option<&Account>,
        now: DateTime<Utc>,
        report: &mut RunReport,
    ) -> Result<Option<Issue>, AuditError> {
        let is_new = existing.is_none();
        let mut issue = match existing {
            Some(issue) => issue.clone(),
            None => Issue::open(
                finding.resource,
                finding.missing_tags.clone(),
                finding.notes.clone(),
                now,
            ),
        };
        let before_state = issue.state;
        let mut changed = is_new;
        let mut notify = is_new;

        if !is_new {
            changed |= issue.refresh_findings(finding.missing_tags.clone(), finding.notes.clone());
        }

        let resource_type = issue.resource_type.as_str().to_string();
        let schedule = self.settings.schedule_for(
            &resource_type,
            &issue.account_id,
            account.map(|a| a.name.as_str()),
        );
        let stop_supported = self.executor.supports(&resource_type, ActionKind::Stop);
        let decision = decide(&issue, schedule, self.policy, stop_supported, now);

        if decision.alert {
            notify = true;
            if !is_new && issue.state == IssueState::Detected {
                issue.transition(IssueState::Alerted, now);
            }
            self.events.emit_alert_sent(&AlertSentEvent {
                issue_id: issue.id.clone(),
                alert_number: decision.alerts_due,
            });
        }
        changed |= issue.alerts_sent != decision.alerts_due || issue.next_change != decision.next_change;
        issue.alerts_sent = decision.alerts_due;
        issue.next_change = decision.next_change;

        if let Some(action) = decision.awaiting_confirmation {
            if issue.state < IssueState::AwaitingConfirmation
                && issue.transition(IssueState::AwaitingConfirmation, now)
            {
                notify = true;
                report.awaiting_confirmation.push(issue.id.clone());
                self.events.emit_awaiting_confirmation(&AwaitingConfirmationEvent {
                    issue_id: issue.id.clone(),
                    action,
                });
            }
        }

        if let Some(action) = decision.action {
            let result = self
                .executor
                .process_action(finding.resource, action, NAMESPACE, now)?;
            report.actions.push(ActionTaken {
                issue_id: issue.id.clone(),
                resource_id: issue.resource_id.clone(),
                action,
                status: result.status,
            });

            if result.status.is_settled() {
                let target = match action {
                    ActionKind::Stop => IssueState::Stopped,
                    ActionKind::Remove => IssueState::Removed,
                };
                issue.transition(target, now);
                issue.next_change = decide(&issue, schedule, self.policy, stop_supported, now).next_change;
                notify = true;
                self.events.emit_action_applied(&ActionAppliedEvent {
                    issue_id: issue.id.clone(),
                    resource_id: issue.resource_id.clone(),
                    action,
                    status: result.status,
                });
            }
            if let Some(e) = result.error {
                self.events.emit_action_failed(&ActionFailedEvent {
                    issue_id: issue.id.clone(),
                    resource_id: issue.resource_id.clone(),
                    action,
                    message: e.to_string(),
                });
                self.emit_error(&e);
                report.errors.push(e);
            }
        }

        if issue.state != before_state {
            changed = true;
            if !is_new {
                self.events.emit_issue_updated(&IssueUpdatedEvent {
                    issue_id: issue.id.clone(),
                    from: before_state,
                    to: issue.state,
                });
            }
        }

        if is_new {
            tracing::info!(issue_id = %issue.id, resource_id = %issue.resource_id, "new issue");
            self.events.emit_issue_detected(&IssueDetectedEvent {
                issue_id: issue.id.clone(),
                resource_id: issue.resource_id.clone(),
                resource_type,
                missing_tags: issue.missing_tags.clone(),
            });
            report.new_issues.push(issue.id.clone());
        } else if changed {
            report.updated_issues.push(issue.id.clone());
        }

        if changed {
            self.store.save_issue(&issue)?;
        }
        Ok(notify.then_some(issue))
    }

    /// Open, advance and resolve issues against this run's findings,
    /// queueing notices as it goes.
    #[allow(clippy::too_many_arguments)]
    fn reconcile<'r>(
        &self,
        resources: &'r [Resource],
        findings: &BTreeMap<String, Finding<'r>>,
        existing: &BTreeMap<String, Issue>,
        scanned: &BTreeSet<String>,
        now: DateTime<Utc>,
        cancel: &dyn Cancellable,
        notices: &mut NoticeBuilder,
        report: &mut RunReport,
    ) -> Result<(), AuditError> {
        let mut accounts: HashMap<String, Option<Account>> = HashMap::new();

        for (issue_id, finding) in findings {
            cancel.ensure_running()?;
            let account = self.account(&finding.resource.account_id, &mut accounts);
            let notify_issue =
                self.process_finding(existing.get(issue_id), finding, account.as_ref(), now, report)?;
            if let Some(issue) = notify_issue {
                let recipients = self.recipients(account.as_ref(), Some(finding.resource));
                notices.add_issue(&recipients, &notice_item(issue, account.as_ref(), Some(finding.resource)));
            }
        }

        let by_id: HashMap<&str, &Resource> = resources.iter().map(|r| (r.id.as_str(), r)).collect();
        for (issue_id, issue) in existing {
            if findings.contains_key(issue_id) || !scanned.contains(issue.resource_type.as_str()) {
                continue;
            }
            cancel.ensure_running()?;
            self.store.delete_issue(issue_id)?;

            if issue.state == IssueState::Removed {
                self.trail.record_event(&AuditLogEntry::new(
                    EVENT_ISSUE_REMOVED,
                    NAMESPACE,
                    json!({
                        "issue_id": issue.id,
                        "resource_id": issue.resource_id,
                        "account_id": issue.account_id,
                    }),
                    now,
                ))?;
                self.events.emit_issue_removed(&IssueRemovedEvent {
                    issue_id: issue.id.clone(),
                    resource_id: issue.resource_id.clone(),
                });
                report.removed_issues.push(issue.id.clone());
                continue;
            }

            tracing::info!(issue_id = %issue.id, resource_id = %issue.resource_id, "issue fixed");
            self.events.emit_issue_fixed(&IssueFixedEvent {
                issue_id: issue.id.clone(),
                resource_id: issue.resource_id.clone(),
            });
            report.fixed_issues.push(issue.id.clone());

            let account = self.account(&issue.account_id, &mut accounts);
            let resource = by_id.get(issue.resource_id.as_str()).copied();
            let recipients = self.recipients(account.as_ref(), resource);
            notices.add_fixed(&recipients, &notice_item(issue.clone(), account.as_ref(), resource));
        }
        Ok(())
    }

    fn deliver(&self, notices: NoticeBuilder, report: &mut RunReport) {
        let subjects = Subjects {
            issues: self.config.effective_email_subject().to_string(),
            fixed: self.config.effective_email_subject_fixed().to_string(),
        };
        let (sent, errors) =
            notify::send_notices(self.notifier.as_ref(), &notices.build(), &subjects, &self.events);
        report.notifications_sent = sent;
        for e in errors {
            self.emit_error(&e);
            report.errors.push(e);
        }
    }

    fn sends_notices(&self) -> bool {
        !self.policy.collect_only || self.config.sends_email_in_collect_mode()
    }

    fn account(
        &self,
        account_id: &str,
        cache: &mut HashMap<String, Option<Account>>,
    ) -> Option<Account> {
        cache
            .entry(account_id.to_string())
            .or_insert_with(|| {
                let found = self.inventory.account(account_id);
                if found.is_none() {
                    tracing::warn!(account_id, "account not found in inventory");
                }
                found
            })
            .clone()
    }

    fn recipients(&self, account: Option<&Account>, resource: Option<&Resource>) -> Vec<Contact> {
        let account_contacts = account.map(|a| a.contacts.clone()).unwrap_or_default();
        let permanent: Vec<Contact> = self
            .config
            .effective_permanent_recipients()
            .iter()
            .map(Contact::email)
            .collect();
        let owners: Vec<Contact> = resource
            .map(|r| owner_emails(r, self.evaluator.partial_owner_match()))
            .unwrap_or_default()
            .into_iter()
            .map(Contact::email)
            .collect();
        merge_recipients([
            account_contacts.as_slice(),
            permanent.as_slice(),
            owners.as_slice(),
        ])
    }

    fn emit_error<E: ReqTagsErrorCode + std::fmt::Display>(&self, error: &E) {
        self.events.emit_error(&ErrorEvent {
            message: error.to_string(),
            error_code: error.error_code().to_string(),
        });
    }
}

fn notice_item(issue: Issue, account: Option<&Account>, resource: Option<&Resource>) -> NoticeItem {
    NoticeItem {
        account_name: account
            .map(|a| a.name.clone())
            .unwrap_or_else(|| issue.account_id.clone()),
        tags: resource.map(|r| r.tags.clone()).unwrap_or_default(),
        issue,
    }
}
