//! V002: audit log.

pub const MIGRATION_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS audit_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    event TEXT NOT NULL,
    actor TEXT NOT NULL,
    data TEXT NOT NULL DEFAULT '{}',
    created TEXT NOT NULL
) STRICT;

CREATE INDEX IF NOT EXISTS idx_audit_log_created ON audit_log(created);
CREATE INDEX IF NOT EXISTS idx_audit_log_event ON audit_log(event);
"#;
