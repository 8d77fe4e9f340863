use rusqlite::{Connection, OptionalExtension};
use std::marker::PhantomData;

use chatter_types::{Comment, Like, Post, Profile, User};

use super::entity::Entity;
use super::Database;
use crate::error::StoreResult;

pub type UserRepository = Repository<User>;
pub type ProfileRepository = Repository<Profile>;
pub type PostRepository = Repository<Post>;
pub type CommentRepository = Repository<Comment>;
pub type LikeRepository = Repository<Like>;

/// Create/read/delete operations for one entity table
pub struct Repository<E: Entity> {
    db: Database,
    _entity: PhantomData<E>,
}

impl<E: Entity> Repository<E> {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }

    /// Insert a single record and return it as stored
    pub fn create(&self, new: &E::New) -> StoreResult<E> {
        let conn = self.db.connection()?;
        let id = E::insert(&conn, new)?;
        tracing::debug!("Created {} {}", E::NAME, id);
        load(&conn, id)
    }

    /// Insert every payload in one transaction. Either all rows are written
    /// or none are.
    pub fn bulk_create(&self, records: &[E::New]) -> StoreResult<Vec<E>> {
        let mut conn = self.db.connection()?;
        let tx = conn.transaction()?;

        let mut created = Vec::with_capacity(records.len());
        for new in records {
            let id = E::insert(&tx, new)?;
            created.push(load(&tx, id)?);
        }

        tx.commit()?;
        tracing::debug!("Bulk created {} {} records", created.len(), E::NAME);
        Ok(created)
    }

    /// Fetch a record by primary key; `None` when absent
    pub fn find_by_pk(&self, id: i64) -> StoreResult<Option<E>> {
        let conn = self.db.connection()?;
        find(&conn, id)
    }

    /// All records ordered by primary key
    pub fn find_all(&self) -> StoreResult<Vec<E>> {
        let conn = self.db.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} ORDER BY id",
            E::COLUMNS.join(", "),
            E::TABLE
        ))?;

        let records = stmt
            .query_map([], E::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    pub fn count(&self) -> StoreResult<i64> {
        let conn = self.db.connection()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", E::TABLE),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete a record; returns whether a row was removed
    pub fn destroy(&self, id: i64) -> StoreResult<bool> {
        let conn = self.db.connection()?;
        let rows_affected = conn.execute(
            &format!("DELETE FROM {} WHERE id = ?", E::TABLE),
            [id],
        )?;
        if rows_affected > 0 {
            tracing::debug!("Destroyed {} {}", E::NAME, id);
        }
        Ok(rows_affected > 0)
    }
}

/// Fetch by primary key on an already checked-out connection
pub(crate) fn find<E: Entity>(conn: &Connection, id: i64) -> StoreResult<Option<E>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM {} WHERE id = ?",
        E::COLUMNS.join(", "),
        E::TABLE
    ))?;
    let record = stmt.query_row([id], E::from_row).optional()?;
    Ok(record)
}

/// Fetch a row that was just written by this connection
fn load<E: Entity>(conn: &Connection, id: i64) -> StoreResult<E> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM {} WHERE id = ?",
        E::COLUMNS.join(", "),
        E::TABLE
    ))?;
    Ok(stmt.query_row([id], E::from_row)?)
}
