//! V001: issues table.

pub const MIGRATION_SQL: &str = r#"
-- One row per non-compliant resource. Timestamps are RFC 3339 UTC text with
-- fixed nanosecond precision, so text order is time order.
CREATE TABLE IF NOT EXISTS issues (
    id TEXT PRIMARY KEY,
    resource_id TEXT NOT NULL,
    resource_type TEXT NOT NULL,
    account_id TEXT NOT NULL,
    location TEXT NOT NULL,
    state TEXT NOT NULL,
    created TEXT NOT NULL,
    last_change TEXT NOT NULL,
    next_change TEXT,
    alerts_sent INTEGER NOT NULL DEFAULT 0,
    confirmed INTEGER NOT NULL DEFAULT 0,
    missing_tags TEXT NOT NULL DEFAULT '[]',
    notes TEXT NOT NULL DEFAULT '[]'
) STRICT;

CREATE INDEX IF NOT EXISTS idx_issues_account ON issues(account_id);
CREATE INDEX IF NOT EXISTS idx_issues_location ON issues(location);
CREATE INDEX IF NOT EXISTS idx_issues_state ON issues(state);
CREATE UNIQUE INDEX IF NOT EXISTS idx_issues_resource ON issues(resource_id);
"#;
