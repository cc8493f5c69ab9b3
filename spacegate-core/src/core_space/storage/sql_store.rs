//! SQLite-backed storage for spaces, groups and memberships

use super::super::group::{Group, GroupKind, User};
use super::super::space::{Space, SpaceKind};
use super::super::store::{
    GroupStore, NewSpace, SpaceStore, StoreError, StoreResult, UserDirectory,
};
use super::super::types::{parse_user_sid, GroupId, SpaceId, Timestamp, UserId, WorkspaceId};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, Row};
use std::path::Path;

/// SQLite-backed store implementing [`SpaceStore`], [`GroupStore`] and
/// [`UserDirectory`]
pub struct SqliteSpaceStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteSpaceStore {
    /// Create a store over an existing connection pool, running migrations
    pub fn new(pool: Pool<SqliteConnectionManager>) -> Result<Self, rusqlite::Error> {
        super::migrations::migrate(&pool)?;
        Ok(Self { pool })
    }

    /// Open (or create) a database file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, rusqlite::Error> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::new(manager).map_err(pool_init_error)?;
        Self::new(pool)
    }

    /// Create an in-memory store.
    ///
    /// The pool is capped at a single connection: every pooled connection to
    /// `:memory:` would otherwise open its own empty database.
    pub fn memory() -> Result<Self, rusqlite::Error> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_init_error)?;
        Self::new(pool)
    }

    fn conn(&self) -> StoreResult<PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|e| StoreError::Pool(e.to_string()))
    }

    /// Insert a workspace member. Users are normally provisioned by the
    /// platform's account layer; this exists for bootstrap and tests.
    pub fn insert_user(&self, workspace_id: WorkspaceId, full_name: &str) -> StoreResult<User> {
        let conn = self.conn()?;
        let now = Timestamp::now().as_millis() as i64;
        conn.execute(
            "INSERT INTO users (workspace_id, full_name, created_at) VALUES (?, ?, ?)",
            params![workspace_id.0, full_name, now],
        )?;
        Ok(User {
            id: UserId(conn.last_insert_rowid()),
            workspace_id,
            full_name: full_name.to_string(),
        })
    }

    fn get_space(
        &self,
        conn: &rusqlite::Connection,
        workspace_id: WorkspaceId,
        id: SpaceId,
        include_deleted: bool,
    ) -> StoreResult<Option<Space>> {
        let deleted_filter = if include_deleted {
            ""
        } else {
            " AND deleted_at IS NULL"
        };
        let sql = format!(
            "SELECT id, workspace_id, name, kind, deleted_at, created_at, updated_at
             FROM spaces WHERE id = ? AND workspace_id = ?{}",
            deleted_filter
        );

        let space = conn
            .query_row(&sql, params![id.0, workspace_id.0], space_from_row)
            .optional()?;

        match space {
            Some(mut space) => {
                space.groups = load_groups(conn, space.id)?;
                Ok(Some(space))
            }
            None => Ok(None),
        }
    }

    fn list_spaces_where(
        &self,
        conn: &rusqlite::Connection,
        workspace_id: WorkspaceId,
        extra_filter: &str,
    ) -> StoreResult<Vec<Space>> {
        let sql = format!(
            "SELECT id, workspace_id, name, kind, deleted_at, created_at, updated_at
             FROM spaces WHERE workspace_id = ? AND deleted_at IS NULL{} ORDER BY id",
            extra_filter
        );

        let mut stmt = conn.prepare(&sql)?;
        let mut spaces = stmt
            .query_map(params![workspace_id.0], space_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        for space in &mut spaces {
            space.groups = load_groups(conn, space.id)?;
        }

        Ok(spaces)
    }
}

fn pool_init_error(e: r2d2::Error) -> rusqlite::Error {
    rusqlite::Error::ToSqlConversionFailure(Box::new(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("Failed to create pool: {}", e),
    )))
}

/// Constraint violations become `Conflict`; everything else stays a
/// database error.
fn map_sqlite_err(e: rusqlite::Error) -> StoreError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &e {
        if failure.code == rusqlite::ErrorCode::ConstraintViolation {
            return StoreError::Conflict(e.to_string());
        }
    }
    StoreError::Database(e)
}

fn space_from_row(row: &Row<'_>) -> rusqlite::Result<Space> {
    let kind_str: String = row.get(3)?;
    let kind = SpaceKind::parse(&kind_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown space kind {:?}", kind_str).into(),
        )
    })?;

    Ok(Space {
        id: SpaceId(row.get(0)?),
        workspace_id: WorkspaceId(row.get(1)?),
        name: row.get(2)?,
        kind,
        deleted_at: row
            .get::<_, Option<i64>>(4)?
            .map(|ms| Timestamp::from_millis(ms.max(0) as u64)),
        created_at: Timestamp::from_millis(row.get::<_, i64>(5)?.max(0) as u64),
        updated_at: Timestamp::from_millis(row.get::<_, i64>(6)?.max(0) as u64),
        groups: Vec::new(),
    })
}

fn group_from_row(row: &Row<'_>) -> rusqlite::Result<Group> {
    let kind_str: String = row.get(3)?;
    let kind = GroupKind::parse(&kind_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown group kind {:?}", kind_str).into(),
        )
    })?;

    Ok(Group {
        id: GroupId(row.get(0)?),
        workspace_id: WorkspaceId(row.get(1)?),
        name: row.get(2)?,
        kind,
        created_at: Timestamp::from_millis(row.get::<_, i64>(4)?.max(0) as u64),
        updated_at: Timestamp::from_millis(row.get::<_, i64>(5)?.max(0) as u64),
    })
}

fn load_groups(conn: &rusqlite::Connection, space_id: SpaceId) -> StoreResult<Vec<Group>> {
    let mut stmt = conn.prepare(
        "SELECT g.id, g.workspace_id, g.name, g.kind, g.created_at, g.updated_at
         FROM groups g
         JOIN group_spaces gs ON gs.group_id = g.id
         WHERE gs.space_id = ?
         ORDER BY g.id",
    )?;

    let groups = stmt
        .query_map(params![space_id.0], group_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(groups)
}

#[async_trait::async_trait]
impl SpaceStore for SqliteSpaceStore {
    async fn create_space(&self, blob: NewSpace, group_ids: &[GroupId]) -> StoreResult<Space> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;
        let now = Timestamp::now().as_millis() as i64;

        tx.execute(
            "INSERT INTO spaces (workspace_id, name, kind, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
            params![
                blob.workspace_id.0,
                &blob.name,
                blob.kind.as_str(),
                now,
                now
            ],
        )
        .map_err(map_sqlite_err)?;

        let space_id = SpaceId(tx.last_insert_rowid());

        for group_id in group_ids {
            tx.execute(
                "INSERT INTO group_spaces (group_id, space_id, created_at) VALUES (?, ?, ?)",
                params![group_id.0, space_id.0, now],
            )
            .map_err(map_sqlite_err)?;
        }

        tx.commit()?;

        self.get_space(&conn, blob.workspace_id, space_id, false)?
            .ok_or_else(|| StoreError::NotFound(format!("space {}", space_id)))
    }

    async fn find_space(
        &self,
        workspace_id: WorkspaceId,
        id: SpaceId,
        include_deleted: bool,
    ) -> StoreResult<Option<Space>> {
        let conn = self.conn()?;
        self.get_space(&conn, workspace_id, id, include_deleted)
    }

    async fn find_space_by_name(
        &self,
        workspace_id: WorkspaceId,
        name: &str,
    ) -> StoreResult<Option<Space>> {
        let conn = self.conn()?;

        let space = conn
            .query_row(
                "SELECT id, workspace_id, name, kind, deleted_at, created_at, updated_at
                 FROM spaces WHERE workspace_id = ? AND name = ? AND deleted_at IS NULL",
                params![workspace_id.0, name],
                space_from_row,
            )
            .optional()?;

        match space {
            Some(mut space) => {
                space.groups = load_groups(&conn, space.id)?;
                Ok(Some(space))
            }
            None => Ok(None),
        }
    }

    async fn list_spaces(
        &self,
        workspace_id: WorkspaceId,
        kinds: Option<&[SpaceKind]>,
    ) -> StoreResult<Vec<Space>> {
        let conn = self.conn()?;

        // Kind names are static strings, so inlining them is safe.
        let filter = match kinds {
            Some(kinds) if !kinds.is_empty() => {
                let list = kinds
                    .iter()
                    .map(|k| format!("'{}'", k.as_str()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(" AND kind IN ({})", list)
            }
            Some(_) => return Ok(Vec::new()),
            None => String::new(),
        };

        self.list_spaces_where(&conn, workspace_id, &filter)
    }

    async fn list_spaces_for_groups(
        &self,
        workspace_id: WorkspaceId,
        group_ids: &[GroupId],
    ) -> StoreResult<Vec<Space>> {
        if group_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn()?;
        let list = group_ids
            .iter()
            .map(|g| g.0.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let filter = format!(
            " AND id IN (SELECT space_id FROM group_spaces WHERE group_id IN ({}))",
            list
        );

        self.list_spaces_where(&conn, workspace_id, &filter)
    }

    async fn rename_space(
        &self,
        workspace_id: WorkspaceId,
        id: SpaceId,
        new_name: &str,
    ) -> StoreResult<()> {
        let conn = self.conn()?;
        let now = Timestamp::now().as_millis() as i64;

        let updated = conn
            .execute(
                "UPDATE spaces SET name = ?, updated_at = ?
                 WHERE id = ? AND workspace_id = ? AND deleted_at IS NULL",
                params![new_name, now, id.0, workspace_id.0],
            )
            .map_err(map_sqlite_err)?;

        if updated == 0 {
            return Err(StoreError::NotFound(format!("space {}", id)));
        }
        Ok(())
    }

    async fn attach_group(&self, space_id: SpaceId, group_id: GroupId) -> StoreResult<()> {
        let conn = self.conn()?;
        let now = Timestamp::now().as_millis() as i64;

        conn.execute(
            "INSERT INTO group_spaces (group_id, space_id, created_at) VALUES (?, ?, ?)",
            params![group_id.0, space_id.0, now],
        )
        .map_err(map_sqlite_err)?;

        Ok(())
    }

    async fn detach_group(&self, space_id: SpaceId, group_id: GroupId) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute(
            "DELETE FROM group_spaces WHERE group_id = ? AND space_id = ?",
            params![group_id.0, space_id.0],
        )?;

        Ok(())
    }

    async fn delete_space(
        &self,
        workspace_id: WorkspaceId,
        id: SpaceId,
        hard_delete: bool,
    ) -> StoreResult<()> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "DELETE FROM group_spaces WHERE space_id = ?",
            params![id.0],
        )?;

        let removed = if hard_delete {
            tx.execute(
                "DELETE FROM spaces WHERE id = ? AND workspace_id = ?",
                params![id.0, workspace_id.0],
            )?
        } else {
            let now = Timestamp::now().as_millis() as i64;
            tx.execute(
                "UPDATE spaces SET deleted_at = ?, updated_at = ?
                 WHERE id = ? AND workspace_id = ? AND deleted_at IS NULL",
                params![now, now, id.0, workspace_id.0],
            )?
        };

        if removed == 0 {
            return Err(StoreError::NotFound(format!("space {}", id)));
        }

        tx.commit()?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl GroupStore for SqliteSpaceStore {
    async fn create_group(
        &self,
        workspace_id: WorkspaceId,
        name: &str,
        kind: GroupKind,
    ) -> StoreResult<Group> {
        let conn = self.conn()?;
        let now = Timestamp::now().as_millis() as i64;

        conn.execute(
            "INSERT INTO groups (workspace_id, name, kind, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
            params![workspace_id.0, name, kind.as_str(), now, now],
        )
        .map_err(map_sqlite_err)?;

        Ok(Group {
            id: GroupId(conn.last_insert_rowid()),
            workspace_id,
            name: name.to_string(),
            kind,
            created_at: Timestamp::from_millis(now as u64),
            updated_at: Timestamp::from_millis(now as u64),
        })
    }

    async fn find_group(
        &self,
        workspace_id: WorkspaceId,
        id: GroupId,
    ) -> StoreResult<Option<Group>> {
        let conn = self.conn()?;

        let group = conn
            .query_row(
                "SELECT id, workspace_id, name, kind, created_at, updated_at
                 FROM groups WHERE id = ? AND workspace_id = ?",
                params![id.0, workspace_id.0],
                group_from_row,
            )
            .optional()?;

        Ok(group)
    }

    async fn find_global_group(&self, workspace_id: WorkspaceId) -> StoreResult<Group> {
        let conn = self.conn()?;

        conn.query_row(
            "SELECT id, workspace_id, name, kind, created_at, updated_at
             FROM groups WHERE workspace_id = ? AND kind = 'global'",
            params![workspace_id.0],
            group_from_row,
        )
        .optional()?
        .ok_or_else(|| StoreError::NotFound(format!("global group for workspace {}", workspace_id)))
    }

    async fn find_system_group(&self, workspace_id: WorkspaceId) -> StoreResult<Group> {
        let conn = self.conn()?;

        conn.query_row(
            "SELECT id, workspace_id, name, kind, created_at, updated_at
             FROM groups WHERE workspace_id = ? AND kind = 'system'",
            params![workspace_id.0],
            group_from_row,
        )
        .optional()?
        .ok_or_else(|| StoreError::NotFound(format!("system group for workspace {}", workspace_id)))
    }

    async fn set_members(&self, group_id: GroupId, user_ids: &[UserId]) -> StoreResult<()> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;
        let now = Timestamp::now().as_millis() as i64;

        tx.execute(
            "DELETE FROM group_memberships WHERE group_id = ?",
            params![group_id.0],
        )?;

        for user_id in user_ids {
            tx.execute(
                "INSERT INTO group_memberships (group_id, user_id, created_at) VALUES (?, ?, ?)",
                params![group_id.0, user_id.0, now],
            )
            .map_err(map_sqlite_err)?;
        }

        tx.commit()?;
        Ok(())
    }

    async fn members(&self, group_id: GroupId) -> StoreResult<Vec<UserId>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT user_id FROM group_memberships WHERE group_id = ? ORDER BY user_id",
        )?;

        let members = stmt
            .query_map(params![group_id.0], |row| Ok(UserId(row.get(0)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(members)
    }
}

#[async_trait::async_trait]
impl UserDirectory for SqliteSpaceStore {
    async fn fetch_by_sids(
        &self,
        workspace_id: WorkspaceId,
        sids: &[String],
    ) -> StoreResult<Vec<User>> {
        let ids: Vec<i64> = sids
            .iter()
            .filter_map(|sid| parse_user_sid(sid))
            .filter(|(ws, _)| *ws == workspace_id)
            .map(|(_, id)| id.0)
            .collect();

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn()?;
        let list = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT id, workspace_id, full_name FROM users
             WHERE workspace_id = ? AND id IN ({}) ORDER BY id",
            list
        );

        let mut stmt = conn.prepare(&sql)?;
        let users = stmt
            .query_map(params![workspace_id.0], |row| {
                Ok(User {
                    id: UserId(row.get(0)?),
                    workspace_id: WorkspaceId(row.get(1)?),
                    full_name: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(users)
    }
}
