use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use super::schema::{Schema, SCHEMA_VERSION};
use crate::collection::OrderedCollection;
use crate::container::Container;
use crate::error::{BoardError, PersistenceError, Result};
use crate::ids::{ContainerId, ItemId};
use crate::item::Item;
use crate::store::BoardStore;

const ITEM_COLUMNS: &str =
    "id, container_id, title, description, date, tags, flag, position, sort_order, updated_at";

/// SQLite-backed implementation of the BoardStore trait.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init_with_connection(conn)
    }

    /// Create an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_with_connection(conn)
    }

    fn init_with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create tables on a fresh database, or migrate an older one
    fn initialize(conn: &Connection) -> Result<()> {
        let current_version = Self::get_schema_version(conn).unwrap_or(0);

        if current_version == 0 {
            conn.execute_batch(Schema::create_tables())?;
            Self::set_schema_version(conn, SCHEMA_VERSION)?;
        } else if current_version < SCHEMA_VERSION {
            for version in current_version..SCHEMA_VERSION {
                if let Some(migration) = Schema::migration(version, version + 1) {
                    conn.execute_batch(migration)?;
                }
            }
            Self::set_schema_version(conn, SCHEMA_VERSION)?;
        } else if current_version > SCHEMA_VERSION {
            return Err(PersistenceError::SchemaVersionMismatch {
                expected: SCHEMA_VERSION,
                actual: current_version,
            }
            .into());
        }

        Ok(())
    }

    fn get_schema_version(conn: &Connection) -> Option<u32> {
        conn.query_row(
            "SELECT version FROM schema_version ORDER BY rowid DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .ok()
    }

    fn set_schema_version(conn: &Connection, version: u32) -> Result<()> {
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [version],
        )?;
        Ok(())
    }

    // ==================== Reads ====================

    fn read_container(conn: &Connection, id: ContainerId) -> Result<Container> {
        let row = conn
            .query_row(
                "SELECT title, version, created_at, updated_at FROM containers WHERE id = ?1",
                [id.0],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, u64>(1)?,
                        parse_timestamp(row, 2)?,
                        parse_timestamp(row, 3)?,
                    ))
                },
            )
            .optional()?;
        let (title, version, created_at, updated_at) =
            row.ok_or_else(|| BoardError::container_not_found(id))?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM items WHERE container_id = ?1 ORDER BY storage_index",
            ITEM_COLUMNS
        ))?;
        let items = stmt
            .query_map([id.0], row_to_item)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Container {
            id,
            title,
            tasks: OrderedCollection::from_items(id, items),
            created_at,
            updated_at,
            version,
        })
    }

    // ==================== Writes ====================

    fn check_version(tx: &Transaction<'_>, container: &Container) -> Result<()> {
        let stored: Option<u64> = tx
            .query_row(
                "SELECT version FROM containers WHERE id = ?1",
                [container.id.0],
                |row| row.get(0),
            )
            .optional()?;
        match stored {
            None => Err(BoardError::container_not_found(container.id)),
            Some(actual) if actual != container.version => Err(BoardError::Conflict {
                container: container.id.to_string(),
                expected: container.version,
                actual,
            }),
            Some(_) => Ok(()),
        }
    }

    /// Write several containers in one transaction. Every container's old
    /// items are cleared before any new ones are inserted, so an item moving
    /// between two of them never collides with its old row.
    fn write_containers(conn: &mut Connection, containers: &[&Container]) -> Result<()> {
        let tx = conn.transaction()?;

        for container in containers {
            Self::check_version(&tx, container)?;
            tx.execute(
                "UPDATE containers SET title = ?1, version = ?2, updated_at = ?3 WHERE id = ?4",
                params![
                    container.title,
                    container.version + 1,
                    container.updated_at.to_rfc3339(),
                    container.id.0,
                ],
            )?;
            tx.execute("DELETE FROM items WHERE container_id = ?1", [container.id.0])?;
        }

        {
            let mut insert = tx.prepare(
                "INSERT INTO items
                 (id, container_id, title, description, date, tags, flag, position, sort_order, storage_index, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;
            for container in containers {
                for (index, item) in container.tasks.iter().enumerate() {
                    let tags = serde_json::to_string(&item.tags)?;
                    insert.execute(params![
                        item.id.to_string(),
                        container.id.0,
                        item.title,
                        item.description,
                        item.date,
                        tags,
                        item.flag,
                        item.position,
                        item.sort_order,
                        index,
                        item.updated_at.to_rfc3339(),
                    ])?;
                }
            }
        }

        tx.commit()?;
        Ok(())
    }
}

impl BoardStore for SqliteStore {
    fn list_containers(&self) -> Result<Vec<Container>> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare("SELECT id FROM containers ORDER BY id DESC")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, u64>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        ids.into_iter()
            .map(|id| Self::read_container(&conn, ContainerId(id)))
            .collect()
    }

    fn create_container(&self, title: &str) -> Result<Container> {
        // Validate before touching the database.
        let draft = Container::new(ContainerId(0), title)?;

        let conn = self.conn.lock()?;
        conn.execute(
            "INSERT INTO containers (title, version, created_at, updated_at) VALUES (?1, 0, ?2, ?3)",
            params![
                draft.title,
                draft.created_at.to_rfc3339(),
                draft.updated_at.to_rfc3339(),
            ],
        )?;
        let rowid = conn.last_insert_rowid();
        let id = u64::try_from(rowid)
            .map(ContainerId)
            .map_err(|_| PersistenceError::Corrupt(format!("negative container id {}", rowid)))?;
        tracing::debug!(container = %id, "created container in sqlite");
        Self::read_container(&conn, id)
    }

    fn load_container(&self, id: ContainerId) -> Result<Container> {
        let conn = self.conn.lock()?;
        Self::read_container(&conn, id)
    }

    fn save_container(&self, container: &Container) -> Result<()> {
        let mut conn = self.conn.lock()?;
        Self::write_containers(&mut conn, &[container])
    }

    fn save_containers(&self, containers: &[&Container]) -> Result<()> {
        let mut conn = self.conn.lock()?;
        Self::write_containers(&mut conn, containers)
    }

    fn delete_container(&self, id: ContainerId) -> Result<Container> {
        let mut conn = self.conn.lock()?;
        let existing = Self::read_container(&conn, id)?;

        let tx = conn.transaction()?;
        tx.execute("DELETE FROM items WHERE container_id = ?1", [id.0])?;
        tx.execute("DELETE FROM containers WHERE id = ?1", [id.0])?;
        tx.commit()?;

        Ok(existing)
    }

    fn load_item(&self, id: ItemId) -> Result<Item> {
        let conn = self.conn.lock()?;
        conn.query_row(
            &format!("SELECT {} FROM items WHERE id = ?1", ITEM_COLUMNS),
            [id.to_string()],
            row_to_item,
        )
        .optional()?
        .ok_or_else(|| BoardError::item_not_found(id))
    }
}

fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<Item> {
    let id_str: String = row.get(0)?;
    let tags_json: String = row.get(5)?;

    Ok(Item {
        id: ItemId::parse(&id_str).map_err(|e| conversion_error(0, Type::Text, e))?,
        container_id: ContainerId(row.get(1)?),
        title: row.get(2)?,
        description: row.get(3)?,
        date: row.get(4)?,
        tags: serde_json::from_str(&tags_json).map_err(|e| conversion_error(5, Type::Text, e))?,
        flag: row.get(6)?,
        position: row.get(7)?,
        sort_order: row.get(8)?,
        updated_at: parse_timestamp(row, 9)?,
    })
}

fn parse_timestamp(row: &rusqlite::Row, index: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(index)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(index, Type::Text, e))
}

fn conversion_error(
    index: usize,
    ty: Type,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, ty, Box::new(err))
}
