use rusqlite::{Connection, OptionalExtension};

use super::entity::Entity;
use super::relations::{BelongsTo, BelongsToMany, HasMany, HasOne, Relation};
use super::repository::find;
use super::Database;
use crate::error::{StoreError, StoreResult};

/// Relations that own a collection of targets
pub trait CollectionRelation: Relation {
    /// Link `target_id` into the owner's collection; returns rows written
    fn link(&self, conn: &Connection, owner_id: i64, target_id: i64) -> rusqlite::Result<usize>;

    /// Remove `target_id` from the owner's collection; returns rows touched
    fn unlink(&self, conn: &Connection, owner_id: i64, target_id: i64)
        -> rusqlite::Result<usize>;

    /// Query selecting the owner's targets, with one `?` for the owner id
    fn select_sql(&self) -> String;

    fn count_sql(&self) -> String;
}

impl<O: Entity, T: Entity> CollectionRelation for HasMany<O, T> {
    fn link(&self, conn: &Connection, owner_id: i64, target_id: i64) -> rusqlite::Result<usize> {
        conn.execute(
            &format!("UPDATE {} SET {} = ? WHERE id = ?", T::TABLE, self.foreign_key),
            [owner_id, target_id],
        )
    }

    fn unlink(&self, conn: &Connection, owner_id: i64, target_id: i64) -> rusqlite::Result<usize> {
        conn.execute(
            &format!(
                "UPDATE {table} SET {fk} = NULL WHERE id = ? AND {fk} = ?",
                table = T::TABLE,
                fk = self.foreign_key
            ),
            [target_id, owner_id],
        )
    }

    fn select_sql(&self) -> String {
        format!(
            "SELECT {} FROM {} WHERE {} = ? ORDER BY id",
            T::COLUMNS.join(", "),
            T::TABLE,
            self.foreign_key
        )
    }

    fn count_sql(&self) -> String {
        format!("SELECT COUNT(*) FROM {} WHERE {} = ?", T::TABLE, self.foreign_key)
    }
}

impl<O: Entity, T: Entity> CollectionRelation for BelongsToMany<O, T> {
    // The join table's composite key makes re-adding a pair a no-op
    fn link(&self, conn: &Connection, owner_id: i64, target_id: i64) -> rusqlite::Result<usize> {
        conn.execute(
            &format!(
                "INSERT OR IGNORE INTO {} ({}, {}) VALUES (?, ?)",
                self.join_table, self.owner_key, self.target_key
            ),
            [owner_id, target_id],
        )
    }

    fn unlink(&self, conn: &Connection, owner_id: i64, target_id: i64) -> rusqlite::Result<usize> {
        conn.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ? AND {} = ?",
                self.join_table, self.owner_key, self.target_key
            ),
            [owner_id, target_id],
        )
    }

    fn select_sql(&self) -> String {
        format!(
            "SELECT {columns} FROM {target} \
             INNER JOIN {join} ON {join}.{target_key} = {target}.id \
             WHERE {join}.{owner_key} = ? \
             ORDER BY {target}.id",
            columns = T::select_list(),
            target = T::TABLE,
            join = self.join_table,
            target_key = self.target_key,
            owner_key = self.owner_key,
        )
    }

    fn count_sql(&self) -> String {
        format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ?",
            self.join_table, self.owner_key
        )
    }
}

/// Typed get/set/add operations over declared relations.
///
/// Records passed in are never mutated; operations that change a foreign key
/// return the record as stored afterwards.
#[derive(Clone)]
pub struct Associations {
    db: Database,
}

impl Associations {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    // ===== One-to-one =====

    /// The target currently linked to `owner`, if any
    pub fn get_one<O: Entity, T: Entity>(
        &self,
        rel: &HasOne<O, T>,
        owner: &O,
    ) -> StoreResult<Option<T>> {
        let conn = self.db.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} WHERE {} = ? ORDER BY id LIMIT 1",
            T::COLUMNS.join(", "),
            T::TABLE,
            rel.foreign_key
        ))?;
        let target = stmt.query_row([owner.id()], T::from_row).optional()?;
        Ok(target)
    }

    /// Make `target` the sole record linked to `owner`. A previously linked
    /// record is detached (its foreign key cleared), not deleted.
    pub fn set_one<O: Entity, T: Entity>(
        &self,
        rel: &HasOne<O, T>,
        owner: &O,
        target: &T,
    ) -> StoreResult<T> {
        let mut conn = self.db.connection()?;
        let tx = conn.transaction()?;
        ensure_exists::<O>(&tx, owner.id())?;
        ensure_exists::<T>(&tx, target.id())?;

        let detached = tx.execute(
            &format!(
                "UPDATE {table} SET {fk} = NULL WHERE {fk} = ? AND id != ?",
                table = T::TABLE,
                fk = rel.foreign_key
            ),
            [owner.id(), target.id()],
        )?;
        tx.execute(
            &format!("UPDATE {} SET {} = ? WHERE id = ?", T::TABLE, rel.foreign_key),
            [owner.id(), target.id()],
        )?;
        let updated = fetch::<T>(&tx, target.id())?;
        tx.commit()?;

        tracing::debug!(
            "Set {} {} {} -> {} {} (detached {})",
            O::NAME,
            owner.id(),
            rel.name,
            T::NAME,
            target.id(),
            detached
        );
        Ok(updated)
    }

    /// Detach whatever is linked to `owner`; returns whether anything was linked
    pub fn unset_one<O: Entity, T: Entity>(
        &self,
        rel: &HasOne<O, T>,
        owner: &O,
    ) -> StoreResult<bool> {
        let conn = self.db.connection()?;
        let rows_affected = conn.execute(
            &format!(
                "UPDATE {table} SET {fk} = NULL WHERE {fk} = ?",
                table = T::TABLE,
                fk = rel.foreign_key
            ),
            [owner.id()],
        )?;
        Ok(rows_affected > 0)
    }

    // ===== Many-to-one =====

    /// The record `owner` points at through its foreign key
    pub fn get_parent<O: Entity, T: Entity>(
        &self,
        rel: &BelongsTo<O, T>,
        owner: &O,
    ) -> StoreResult<Option<T>> {
        let conn = self.db.connection()?;
        let parent_id: Option<Option<i64>> = conn
            .query_row(
                &format!("SELECT {} FROM {} WHERE id = ?", rel.foreign_key, O::TABLE),
                [owner.id()],
                |row| row.get(0),
            )
            .optional()?;
        match parent_id.flatten() {
            Some(id) => find::<T>(&conn, id),
            None => Ok(None),
        }
    }

    /// Point `owner` at `target`, or clear the link with `None`
    pub fn set_parent<O: Entity, T: Entity>(
        &self,
        rel: &BelongsTo<O, T>,
        owner: &O,
        target: Option<&T>,
    ) -> StoreResult<O> {
        let mut conn = self.db.connection()?;
        let tx = conn.transaction()?;
        ensure_exists::<O>(&tx, owner.id())?;
        if let Some(target) = target {
            ensure_exists::<T>(&tx, target.id())?;
        }
        tx.execute(
            &format!("UPDATE {} SET {} = ? WHERE id = ?", O::TABLE, rel.foreign_key),
            rusqlite::params![target.map(|t| t.id()), owner.id()],
        )?;
        let updated = fetch::<O>(&tx, owner.id())?;
        tx.commit()?;
        Ok(updated)
    }

    // ===== Collections (one-to-many, many-to-many) =====

    /// Add `target` to the owner's collection
    pub fn add<R: CollectionRelation>(
        &self,
        rel: &R,
        owner: &R::Owner,
        target: &R::Target,
    ) -> StoreResult<()> {
        let mut conn = self.db.connection()?;
        let tx = conn.transaction()?;
        ensure_exists::<R::Owner>(&tx, owner.id())?;
        ensure_exists::<R::Target>(&tx, target.id())?;
        let written = rel.link(&tx, owner.id(), target.id())?;
        tx.commit()?;
        tracing::debug!(
            "Added {} {} to {} {} {} ({} rows)",
            <R::Target as Entity>::NAME,
            target.id(),
            <R::Owner as Entity>::NAME,
            owner.id(),
            rel.name(),
            written
        );
        Ok(())
    }

    /// Add several targets in one transaction
    pub fn add_all<R: CollectionRelation>(
        &self,
        rel: &R,
        owner: &R::Owner,
        targets: &[R::Target],
    ) -> StoreResult<()> {
        let mut conn = self.db.connection()?;
        let tx = conn.transaction()?;
        ensure_exists::<R::Owner>(&tx, owner.id())?;
        for target in targets {
            ensure_exists::<R::Target>(&tx, target.id())?;
            rel.link(&tx, owner.id(), target.id())?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Every target currently in the owner's collection, ordered by id
    pub fn get_all<R: CollectionRelation>(
        &self,
        rel: &R,
        owner: &R::Owner,
    ) -> StoreResult<Vec<R::Target>> {
        let conn = self.db.connection()?;
        let mut stmt = conn.prepare(&rel.select_sql())?;
        let targets = stmt
            .query_map([owner.id()], <R::Target as Entity>::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(targets)
    }

    /// Remove `target` from the owner's collection; the target record itself
    /// is kept. Returns whether a link existed.
    pub fn remove<R: CollectionRelation>(
        &self,
        rel: &R,
        owner: &R::Owner,
        target: &R::Target,
    ) -> StoreResult<bool> {
        let conn = self.db.connection()?;
        let rows_affected = rel.unlink(&conn, owner.id(), target.id())?;
        Ok(rows_affected > 0)
    }

    pub fn count<R: CollectionRelation>(&self, rel: &R, owner: &R::Owner) -> StoreResult<i64> {
        let conn = self.db.connection()?;
        let count: i64 = conn.query_row(&rel.count_sql(), [owner.id()], |row| row.get(0))?;
        Ok(count)
    }
}

fn ensure_exists<E: Entity>(conn: &Connection, id: i64) -> StoreResult<()> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {} WHERE id = ?", E::TABLE),
        [id],
        |row| row.get(0),
    )?;
    if count == 0 {
        return Err(StoreError::NotFound {
            entity: E::NAME,
            id,
        });
    }
    Ok(())
}

fn fetch<E: Entity>(conn: &Connection, id: i64) -> StoreResult<E> {
    find::<E>(conn, id)?.ok_or(StoreError::NotFound {
        entity: E::NAME,
        id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::relations::{
        LIKE_USERS, POST_AUTHOR, POST_COMMENTS, PROFILE_USER, USER_LIKED, USER_LIKES,
        USER_PROFILE,
    };
    use crate::db::repository::Repository;
    use crate::db::SyncOptions;
    use chatter_types::{
        Comment, Like, NewComment, NewLike, NewPost, NewProfile, NewUser, Post, Profile,
        Reaction, User,
    };

    struct Fixture {
        db: Database,
        assoc: Associations,
    }

    impl Fixture {
        fn new() -> Self {
            let db = Database::in_memory().expect("Failed to create test database");
            db.sync(SyncOptions::force()).expect("Failed to sync schema");
            let assoc = Associations::new(db.clone());
            Self { db, assoc }
        }

        fn user(&self, username: &str) -> User {
            Repository::<User>::new(self.db.clone())
                .create(&NewUser {
                    id: None,
                    username: username.to_string(),
                    email: format!("{username}@example.com"),
                })
                .unwrap()
        }

        fn profile(&self, bio: &str) -> Profile {
            Repository::<Profile>::new(self.db.clone())
                .create(&NewProfile {
                    id: None,
                    bio: bio.to_string(),
                    profile_picture: None,
                    birthday: None,
                    user_id: None,
                })
                .unwrap()
        }

        fn post(&self, title: &str) -> Post {
            Repository::<Post>::new(self.db.clone())
                .create(&NewPost {
                    id: None,
                    title: title.to_string(),
                    body: "body".to_string(),
                    created_at: "2023-07-01T12:00:00Z".parse().unwrap(),
                    user_id: None,
                })
                .unwrap()
        }

        fn comment(&self, body: &str) -> Comment {
            Repository::<Comment>::new(self.db.clone())
                .create(&NewComment {
                    id: None,
                    body: body.to_string(),
                    created_at: "2023-07-01T12:00:00Z".parse().unwrap(),
                    post_id: None,
                    user_id: None,
                })
                .unwrap()
        }

        fn like(&self) -> Like {
            Repository::<Like>::new(self.db.clone())
                .create(&NewLike {
                    id: None,
                    reaction_type: Reaction::ThumbsUp,
                    created_at: "2023-07-01T12:00:00Z".parse().unwrap(),
                    post_id: None,
                    user_id: None,
                })
                .unwrap()
        }
    }

    #[test]
    fn test_set_one_last_set_wins() {
        let fx = Fixture::new();
        let user = fx.user("alice");
        let first = fx.profile("first");
        let second = fx.profile("second");

        assert_eq!(fx.assoc.get_one(&USER_PROFILE, &user).unwrap(), None);

        let linked = fx.assoc.set_one(&USER_PROFILE, &user, &first).unwrap();
        assert_eq!(linked.user_id, Some(user.id));

        fx.assoc.set_one(&USER_PROFILE, &user, &second).unwrap();
        let current = fx.assoc.get_one(&USER_PROFILE, &user).unwrap().unwrap();
        assert_eq!(current.id, second.id);

        // Replaced profile survives, detached
        let detached = Repository::<Profile>::new(fx.db.clone())
            .find_by_pk(first.id)
            .unwrap()
            .unwrap();
        assert_eq!(detached.user_id, None);
    }

    #[test]
    fn test_set_one_same_target_twice_is_stable() {
        let fx = Fixture::new();
        let user = fx.user("alice");
        let profile = fx.profile("only");
        fx.assoc.set_one(&USER_PROFILE, &user, &profile).unwrap();
        fx.assoc.set_one(&USER_PROFILE, &user, &profile).unwrap();
        let current = fx.assoc.get_one(&USER_PROFILE, &user).unwrap().unwrap();
        assert_eq!(current.id, profile.id);
    }

    #[test]
    fn test_moving_profile_between_users() {
        let fx = Fixture::new();
        let alice = fx.user("alice");
        let bob = fx.user("bob");
        let profile = fx.profile("shared");

        fx.assoc.set_one(&USER_PROFILE, &alice, &profile).unwrap();
        fx.assoc.set_one(&USER_PROFILE, &bob, &profile).unwrap();

        assert_eq!(fx.assoc.get_one(&USER_PROFILE, &alice).unwrap(), None);
        let owner = fx.assoc.get_parent(&PROFILE_USER, &profile).unwrap();
        assert_eq!(owner.map(|u| u.id), Some(bob.id));
    }

    #[test]
    fn test_unset_one() {
        let fx = Fixture::new();
        let user = fx.user("alice");
        let profile = fx.profile("bio");
        assert!(!fx.assoc.unset_one(&USER_PROFILE, &user).unwrap());
        fx.assoc.set_one(&USER_PROFILE, &user, &profile).unwrap();
        assert!(fx.assoc.unset_one(&USER_PROFILE, &user).unwrap());
        assert_eq!(fx.assoc.get_one(&USER_PROFILE, &user).unwrap(), None);
    }

    #[test]
    fn test_set_one_missing_target_is_not_found() {
        let fx = Fixture::new();
        let user = fx.user("alice");
        let mut ghost = fx.profile("ghost");
        ghost.id = 999;
        let err = fx.assoc.set_one(&USER_PROFILE, &user, &ghost).unwrap_err();
        assert!(matches!(
            err,
            StoreError::NotFound {
                entity: "Profile",
                id: 999
            }
        ));
    }

    #[test]
    fn test_has_many_accumulates() {
        let fx = Fixture::new();
        let user = fx.user("alice");
        let likes = [fx.like(), fx.like(), fx.like()];

        for like in &likes {
            fx.assoc.add(&USER_LIKES, &user, like).unwrap();
        }
        // Re-adding an already linked child keeps one link
        fx.assoc.add(&USER_LIKES, &user, &likes[0]).unwrap();

        let linked = fx.assoc.get_all(&USER_LIKES, &user).unwrap();
        assert_eq!(linked.len(), 3);
        assert_eq!(fx.assoc.count(&USER_LIKES, &user).unwrap(), 3);
        assert!(linked.iter().all(|like| like.user_id == Some(user.id)));
    }

    #[test]
    fn test_has_many_remove_keeps_child() {
        let fx = Fixture::new();
        let post = fx.post("hello");
        let comment = fx.comment("nice");
        fx.assoc.add(&POST_COMMENTS, &post, &comment).unwrap();

        assert!(fx.assoc.remove(&POST_COMMENTS, &post, &comment).unwrap());
        assert!(!fx.assoc.remove(&POST_COMMENTS, &post, &comment).unwrap());
        assert!(fx.assoc.get_all(&POST_COMMENTS, &post).unwrap().is_empty());
        assert!(Repository::<Comment>::new(fx.db.clone())
            .find_by_pk(comment.id)
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_many_to_many_both_sides() {
        let fx = Fixture::new();
        let like = fx.like();
        let alice = fx.user("alice");
        let bob = fx.user("bob");

        fx.assoc.add(&LIKE_USERS, &like, &alice).unwrap();
        fx.assoc.add(&LIKE_USERS, &like, &bob).unwrap();

        let users = fx.assoc.get_all(&LIKE_USERS, &like).unwrap();
        assert_eq!(users, vec![alice.clone(), bob.clone()]);

        let liked = fx.assoc.get_all(&USER_LIKED, &alice).unwrap();
        assert_eq!(liked.len(), 1);
        assert_eq!(liked[0].id, like.id);
    }

    #[test]
    fn test_many_to_many_duplicate_add_is_idempotent() {
        let fx = Fixture::new();
        let like = fx.like();
        let alice = fx.user("alice");
        fx.assoc.add(&LIKE_USERS, &like, &alice).unwrap();
        fx.assoc.add(&USER_LIKED, &alice, &like).unwrap();
        assert_eq!(fx.assoc.count(&LIKE_USERS, &like).unwrap(), 1);
    }

    #[test]
    fn test_add_all_is_atomic() {
        let fx = Fixture::new();
        let like = fx.like();
        let alice = fx.user("alice");
        let mut ghost = fx.user("ghost");
        ghost.id = 404;

        let err = fx
            .assoc
            .add_all(&LIKE_USERS, &like, &[alice.clone(), ghost])
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "User", .. }));
        assert_eq!(fx.assoc.count(&LIKE_USERS, &like).unwrap(), 0);

        fx.assoc.add_all(&LIKE_USERS, &like, &[alice]).unwrap();
        assert_eq!(fx.assoc.count(&LIKE_USERS, &like).unwrap(), 1);
    }

    #[test]
    fn test_belongs_to_set_and_clear() {
        let fx = Fixture::new();
        let author = fx.user("alice");
        let post = fx.post("hello");

        assert_eq!(fx.assoc.get_parent(&POST_AUTHOR, &post).unwrap(), None);
        let updated = fx.assoc.set_parent(&POST_AUTHOR, &post, Some(&author)).unwrap();
        assert_eq!(updated.user_id, Some(author.id));
        assert_eq!(
            fx.assoc.get_parent(&POST_AUTHOR, &post).unwrap(),
            Some(author)
        );

        let cleared = fx.assoc.set_parent(&POST_AUTHOR, &post, None).unwrap();
        assert_eq!(cleared.user_id, None);
    }

    #[test]
    fn test_add_with_missing_owner_links_nothing() {
        let fx = Fixture::new();
        let like = fx.like();
        let mut ghost = fx.user("ghost");
        ghost.id = 404;

        let err = fx.assoc.add(&USER_LIKES, &ghost, &like).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "User", id: 404 }));
        let stored = Repository::<Like>::new(fx.db.clone())
            .find_by_pk(like.id)
            .unwrap()
            .unwrap();
        assert_eq!(stored.user_id, None);
    }

    #[test]
    fn test_set_parent_missing_target_leaves_owner_unchanged() {
        let fx = Fixture::new();
        let author = fx.user("alice");
        let post = fx.post("hello");
        fx.assoc.set_parent(&POST_AUTHOR, &post, Some(&author)).unwrap();

        let mut ghost = author.clone();
        ghost.id = 404;
        let err = fx
            .assoc
            .set_parent(&POST_AUTHOR, &post, Some(&ghost))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "User", id: 404 }));
        assert_eq!(
            fx.assoc.get_parent(&POST_AUTHOR, &post).unwrap(),
            Some(author)
        );
    }

    #[test]
    fn test_destroying_owner_cascades_join_rows() {
        let fx = Fixture::new();
        let like = fx.like();
        let alice = fx.user("alice");
        fx.assoc.add(&LIKE_USERS, &like, &alice).unwrap();

        Repository::<User>::new(fx.db.clone()).destroy(alice.id).unwrap();
        assert_eq!(fx.assoc.count(&LIKE_USERS, &like).unwrap(), 0);
    }
}
