//! V003: enforcement history.

pub const MIGRATION_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS enforcements (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id TEXT NOT NULL,
    resource_id TEXT NOT NULL,
    resource_type TEXT NOT NULL,
    action TEXT NOT NULL,
    status TEXT NOT NULL,
    metrics TEXT NOT NULL DEFAULT '{}',
    created TEXT NOT NULL
) STRICT;

CREATE INDEX IF NOT EXISTS idx_enforcements_resource ON enforcements(resource_id);
CREATE INDEX IF NOT EXISTS idx_enforcements_created ON enforcements(created);
"#;
