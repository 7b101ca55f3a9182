/// Schema for local state tables.
pub const SCHEMA: &str = r#"
-- One login session per notice service
CREATE TABLE IF NOT EXISTS sessions (
    server_key TEXT PRIMARY KEY,
    server_url TEXT NOT NULL,
    username TEXT NOT NULL,
    token TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;
