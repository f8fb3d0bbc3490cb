//! SQLite schema for board storage

/// Schema version for migrations
pub const SCHEMA_VERSION: u32 = 1;

/// SQLite schema definition
pub struct Schema;

impl Schema {
    /// Get the complete schema SQL
    pub fn create_tables() -> &'static str {
        r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Containers (projects/boards). AUTOINCREMENT keeps deleted ids from being reused.
CREATE TABLE IF NOT EXISTS containers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    version INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Items (tasks). storage_index keeps the stored array order, which only
-- matters for ties left behind by a bulk replacement.
CREATE TABLE IF NOT EXISTS items (
    id TEXT PRIMARY KEY,
    container_id INTEGER NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    date TEXT NOT NULL,
    tags TEXT NOT NULL DEFAULT '[]',
    flag INTEGER NOT NULL DEFAULT 0,
    position INTEGER NOT NULL,
    sort_order INTEGER NOT NULL,
    storage_index INTEGER NOT NULL,
    updated_at TEXT NOT NULL,
    FOREIGN KEY (container_id) REFERENCES containers(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_items_container ON items(container_id, storage_index);
"#
    }

    /// Get migration SQL for a specific version
    pub fn migration(from_version: u32, to_version: u32) -> Option<&'static str> {
        match (from_version, to_version) {
            // (1, 2) => Some("ALTER TABLE ..."),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_sql_valid() {
        let sql = Schema::create_tables();
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS containers"));
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS items"));
        assert!(sql.contains("ON DELETE CASCADE"));
    }

    #[test]
    fn test_no_migrations_yet() {
        assert!(Schema::migration(0, SCHEMA_VERSION).is_none());
    }
}
