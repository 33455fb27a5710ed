//! SQL DDL for the repository entry store.

/// SQLite schema with:
/// - `id` INTEGER PRIMARY KEY holding the hosting service's repository id
/// - `owner` / `name` copied out of the document for indexed lookups
/// - `document` the full entry as JSON
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS repos (
    id INTEGER PRIMARY KEY,
    owner TEXT NULL,
    name TEXT NULL,
    document TEXT NOT NULL, -- JSON, see RepoEntry
    updated_at TEXT NOT NULL -- RFC3339
);

CREATE INDEX IF NOT EXISTS idx_repos_owner ON repos(owner);
"#;
