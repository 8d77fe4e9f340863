//! Relation descriptors for the social schema.
//!
//! Each descriptor names the owner and target entity types and the key that
//! links them. The [`Associations`](super::Associations) manager consumes
//! them to offer typed `get`/`set`/`add` operations.

use std::fmt;
use std::marker::PhantomData;

use chatter_types::{Comment, Like, Post, Profile, User};

use super::entity::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl Cardinality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cardinality::OneToOne => "one-to-one",
            Cardinality::OneToMany => "one-to-many",
            Cardinality::ManyToOne => "many-to-one",
            Cardinality::ManyToMany => "many-to-many",
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common view over every descriptor kind
pub trait Relation {
    type Owner: Entity;
    type Target: Entity;

    fn name(&self) -> &'static str;
    fn cardinality(&self) -> Cardinality;
}

/// Owner has at most one target; the foreign key lives on the target table.
pub struct HasOne<O, T> {
    pub name: &'static str,
    pub foreign_key: &'static str,
    _types: PhantomData<fn() -> (O, T)>,
}

/// Owner has a collection of targets; the foreign key lives on the target table.
pub struct HasMany<O, T> {
    pub name: &'static str,
    pub foreign_key: &'static str,
    _types: PhantomData<fn() -> (O, T)>,
}

/// Owner points at one target through its own foreign key column.
pub struct BelongsTo<O, T> {
    pub name: &'static str,
    pub foreign_key: &'static str,
    _types: PhantomData<fn() -> (O, T)>,
}

/// Owner and target are linked through a join table keyed by both ids.
pub struct BelongsToMany<O, T> {
    pub name: &'static str,
    pub join_table: &'static str,
    /// Join column holding the owner's id
    pub owner_key: &'static str,
    /// Join column holding the target's id
    pub target_key: &'static str,
    _types: PhantomData<fn() -> (O, T)>,
}

impl<O, T> HasOne<O, T> {
    pub const fn new(name: &'static str, foreign_key: &'static str) -> Self {
        Self {
            name,
            foreign_key,
            _types: PhantomData,
        }
    }
}

impl<O, T> HasMany<O, T> {
    pub const fn new(name: &'static str, foreign_key: &'static str) -> Self {
        Self {
            name,
            foreign_key,
            _types: PhantomData,
        }
    }
}

impl<O, T> BelongsTo<O, T> {
    pub const fn new(name: &'static str, foreign_key: &'static str) -> Self {
        Self {
            name,
            foreign_key,
            _types: PhantomData,
        }
    }
}

impl<O, T> BelongsToMany<O, T> {
    pub const fn new(
        name: &'static str,
        join_table: &'static str,
        owner_key: &'static str,
        target_key: &'static str,
    ) -> Self {
        Self {
            name,
            join_table,
            owner_key,
            target_key,
            _types: PhantomData,
        }
    }

    /// The same join table seen from the target's side
    pub const fn inverse(&self, name: &'static str) -> BelongsToMany<T, O> {
        BelongsToMany::new(name, self.join_table, self.target_key, self.owner_key)
    }
}

macro_rules! impl_relation {
    ($kind:ident, $cardinality:expr) => {
        impl<O: Entity, T: Entity> Relation for $kind<O, T> {
            type Owner = O;
            type Target = T;

            fn name(&self) -> &'static str {
                self.name
            }

            fn cardinality(&self) -> Cardinality {
                $cardinality
            }
        }
    };
}

impl_relation!(HasOne, Cardinality::OneToOne);
impl_relation!(HasMany, Cardinality::OneToMany);
impl_relation!(BelongsTo, Cardinality::ManyToOne);
impl_relation!(BelongsToMany, Cardinality::ManyToMany);

// ============================================================================
// Declared relations
// ============================================================================

pub const USER_PROFILE: HasOne<User, Profile> = HasOne::new("profile", "user_id");
pub const PROFILE_USER: BelongsTo<Profile, User> = BelongsTo::new("user", "user_id");

pub const USER_POSTS: HasMany<User, Post> = HasMany::new("posts", "user_id");
pub const POST_AUTHOR: BelongsTo<Post, User> = BelongsTo::new("author", "user_id");

pub const POST_COMMENTS: HasMany<Post, Comment> = HasMany::new("comments", "post_id");
pub const COMMENT_POST: BelongsTo<Comment, Post> = BelongsTo::new("post", "post_id");
pub const USER_COMMENTS: HasMany<User, Comment> = HasMany::new("comments", "user_id");

pub const USER_LIKES: HasMany<User, Like> = HasMany::new("likes", "user_id");
pub const POST_LIKES: HasMany<Post, Like> = HasMany::new("likes", "post_id");
pub const LIKE_POST: BelongsTo<Like, Post> = BelongsTo::new("post", "post_id");

pub const LIKE_USERS: BelongsToMany<Like, User> =
    BelongsToMany::new("users", "like_users", "like_id", "user_id");
pub const USER_LIKED: BelongsToMany<User, Like> = LIKE_USERS.inverse("liked");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_swaps_join_keys() {
        assert_eq!(USER_LIKED.join_table, "like_users");
        assert_eq!(USER_LIKED.owner_key, "user_id");
        assert_eq!(USER_LIKED.target_key, "like_id");
    }

    #[test]
    fn test_cardinalities() {
        assert_eq!(USER_PROFILE.cardinality(), Cardinality::OneToOne);
        assert_eq!(USER_LIKES.cardinality(), Cardinality::OneToMany);
        assert_eq!(POST_AUTHOR.cardinality(), Cardinality::ManyToOne);
        assert_eq!(LIKE_USERS.cardinality().to_string(), "many-to-many");
    }
}
