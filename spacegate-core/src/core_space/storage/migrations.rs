//! Database migrations for the space/group schema
//!
//! Each migration is applied atomically and tracked in the
//! space_schema_version table.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::time::{SystemTime, UNIX_EPOCH};

/// Current schema version
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Migration descriptor
pub struct Migration {
    pub version: i32,
    pub description: &'static str,
    pub up_sql: &'static str,
}

/// All available migrations in order
pub fn get_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial spaces, groups and memberships schema",
        up_sql: r#"
            -- Spaces (access-scoping containers for workspace resources)
            CREATE TABLE IF NOT EXISTS spaces (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                workspace_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                kind TEXT NOT NULL CHECK(kind IN ('system', 'global', 'conversations', 'public', 'regular')),
                deleted_at INTEGER,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            -- Name uniqueness is only enforced among live spaces; a
            -- soft-deleted space releases its name.
            CREATE UNIQUE INDEX IF NOT EXISTS idx_spaces_workspace_name
                ON spaces(workspace_id, name) WHERE deleted_at IS NULL;
            CREATE INDEX IF NOT EXISTS idx_spaces_workspace_kind ON spaces(workspace_id, kind);

            -- Groups (grant units on spaces)
            CREATE TABLE IF NOT EXISTS groups (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                workspace_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                kind TEXT NOT NULL CHECK(kind IN ('system', 'global', 'regular')),
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_groups_workspace_kind ON groups(workspace_id, kind);

            -- Space <-> group associations
            CREATE TABLE IF NOT EXISTS group_spaces (
                group_id INTEGER NOT NULL,
                space_id INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                PRIMARY KEY (group_id, space_id),
                FOREIGN KEY (group_id) REFERENCES groups(id),
                FOREIGN KEY (space_id) REFERENCES spaces(id)
            );

            CREATE INDEX IF NOT EXISTS idx_group_spaces_space ON group_spaces(space_id);

            -- Group memberships
            CREATE TABLE IF NOT EXISTS group_memberships (
                group_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                PRIMARY KEY (group_id, user_id),
                FOREIGN KEY (group_id) REFERENCES groups(id)
            );

            -- Workspace members, resolved during membership replacement
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                workspace_id INTEGER NOT NULL,
                full_name TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
        "#,
    }]
}

fn get_current_version(pool: &Pool<SqliteConnectionManager>) -> Result<i32, rusqlite::Error> {
    let conn = pool.get().map_err(|e| {
        rusqlite::Error::ToSqlConversionFailure(Box::new(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("Failed to get connection: {}", e),
        )))
    })?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS space_schema_version (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let version: Result<i32, _> = conn.query_row(
        "SELECT version FROM space_schema_version ORDER BY version DESC LIMIT 1",
        [],
        |row| row.get(0),
    );

    Ok(version.unwrap_or(0))
}

/// Run all pending migrations
pub fn migrate(pool: &Pool<SqliteConnectionManager>) -> Result<(), rusqlite::Error> {
    let current_version = get_current_version(pool)?;

    let pending: Vec<_> = get_migrations()
        .into_iter()
        .filter(|m| m.version > current_version)
        .collect();

    if pending.is_empty() {
        return Ok(());
    }

    let conn = pool.get().map_err(|e| {
        rusqlite::Error::ToSqlConversionFailure(Box::new(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("Failed to get connection: {}", e),
        )))
    })?;

    for migration in pending {
        let tx = conn.unchecked_transaction()?;

        tx.execute_batch(migration.up_sql)?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards")
            .as_millis() as i64;

        tx.execute(
            "INSERT INTO space_schema_version (version, applied_at) VALUES (?, ?)",
            params![migration.version, now],
        )?;

        tx.commit()?;

        tracing::debug!(
            version = migration.version,
            description = migration.description,
            "applied space schema migration"
        );
    }

    Ok(())
}
