//! Per-entity accessors (`user.set_profile(..)`, `like.add_user(..)`) layered
//! over the generic [`Associations`] manager.

use chatter_types::{Comment, Like, Post, Profile, User};

use super::associations::Associations;
use super::relations::{
    COMMENT_POST, LIKE_USERS, POST_AUTHOR, POST_COMMENTS, POST_LIKES, PROFILE_USER,
    USER_COMMENTS, USER_LIKED, USER_LIKES, USER_POSTS, USER_PROFILE,
};
use super::Database;
use crate::error::StoreResult;

fn assoc(db: &Database) -> Associations {
    Associations::new(db.clone())
}

pub trait UserAssociations {
    fn get_profile(&self, db: &Database) -> StoreResult<Option<Profile>>;
    /// Returns the profile as stored after linking
    fn set_profile(&self, db: &Database, profile: &Profile) -> StoreResult<Profile>;
    fn get_posts(&self, db: &Database) -> StoreResult<Vec<Post>>;
    fn add_post(&self, db: &Database, post: &Post) -> StoreResult<()>;
    fn get_comments(&self, db: &Database) -> StoreResult<Vec<Comment>>;
    fn add_comment(&self, db: &Database, comment: &Comment) -> StoreResult<()>;
    fn get_likes(&self, db: &Database) -> StoreResult<Vec<Like>>;
    fn add_like(&self, db: &Database, like: &Like) -> StoreResult<()>;
    fn remove_like(&self, db: &Database, like: &Like) -> StoreResult<bool>;
    /// Likes this user takes part in through the like/user join table
    fn get_liked(&self, db: &Database) -> StoreResult<Vec<Like>>;
}

impl UserAssociations for User {
    fn get_profile(&self, db: &Database) -> StoreResult<Option<Profile>> {
        assoc(db).get_one(&USER_PROFILE, self)
    }

    fn set_profile(&self, db: &Database, profile: &Profile) -> StoreResult<Profile> {
        assoc(db).set_one(&USER_PROFILE, self, profile)
    }

    fn get_posts(&self, db: &Database) -> StoreResult<Vec<Post>> {
        assoc(db).get_all(&USER_POSTS, self)
    }

    fn add_post(&self, db: &Database, post: &Post) -> StoreResult<()> {
        assoc(db).add(&USER_POSTS, self, post)
    }

    fn get_comments(&self, db: &Database) -> StoreResult<Vec<Comment>> {
        assoc(db).get_all(&USER_COMMENTS, self)
    }

    fn add_comment(&self, db: &Database, comment: &Comment) -> StoreResult<()> {
        assoc(db).add(&USER_COMMENTS, self, comment)
    }

    fn get_likes(&self, db: &Database) -> StoreResult<Vec<Like>> {
        assoc(db).get_all(&USER_LIKES, self)
    }

    fn add_like(&self, db: &Database, like: &Like) -> StoreResult<()> {
        assoc(db).add(&USER_LIKES, self, like)
    }

    fn remove_like(&self, db: &Database, like: &Like) -> StoreResult<bool> {
        assoc(db).remove(&USER_LIKES, self, like)
    }

    fn get_liked(&self, db: &Database) -> StoreResult<Vec<Like>> {
        assoc(db).get_all(&USER_LIKED, self)
    }
}

pub trait ProfileAssociations {
    fn get_user(&self, db: &Database) -> StoreResult<Option<User>>;
}

impl ProfileAssociations for Profile {
    fn get_user(&self, db: &Database) -> StoreResult<Option<User>> {
        assoc(db).get_parent(&PROFILE_USER, self)
    }
}

pub trait PostAssociations {
    fn get_author(&self, db: &Database) -> StoreResult<Option<User>>;
    fn set_author(&self, db: &Database, author: &User) -> StoreResult<Post>;
    fn get_comments(&self, db: &Database) -> StoreResult<Vec<Comment>>;
    fn add_comment(&self, db: &Database, comment: &Comment) -> StoreResult<()>;
    fn get_likes(&self, db: &Database) -> StoreResult<Vec<Like>>;
    fn add_like(&self, db: &Database, like: &Like) -> StoreResult<()>;
}

impl PostAssociations for Post {
    fn get_author(&self, db: &Database) -> StoreResult<Option<User>> {
        assoc(db).get_parent(&POST_AUTHOR, self)
    }

    fn set_author(&self, db: &Database, author: &User) -> StoreResult<Post> {
        assoc(db).set_parent(&POST_AUTHOR, self, Some(author))
    }

    fn get_comments(&self, db: &Database) -> StoreResult<Vec<Comment>> {
        assoc(db).get_all(&POST_COMMENTS, self)
    }

    fn add_comment(&self, db: &Database, comment: &Comment) -> StoreResult<()> {
        assoc(db).add(&POST_COMMENTS, self, comment)
    }

    fn get_likes(&self, db: &Database) -> StoreResult<Vec<Like>> {
        assoc(db).get_all(&POST_LIKES, self)
    }

    fn add_like(&self, db: &Database, like: &Like) -> StoreResult<()> {
        assoc(db).add(&POST_LIKES, self, like)
    }
}

pub trait CommentAssociations {
    fn get_post(&self, db: &Database) -> StoreResult<Option<Post>>;
}

impl CommentAssociations for Comment {
    fn get_post(&self, db: &Database) -> StoreResult<Option<Post>> {
        assoc(db).get_parent(&COMMENT_POST, self)
    }
}

pub trait LikeAssociations {
    fn get_users(&self, db: &Database) -> StoreResult<Vec<User>>;
    fn add_user(&self, db: &Database, user: &User) -> StoreResult<()>;
    fn add_users(&self, db: &Database, users: &[User]) -> StoreResult<()>;
    fn remove_user(&self, db: &Database, user: &User) -> StoreResult<bool>;
    fn count_users(&self, db: &Database) -> StoreResult<i64>;
}

impl LikeAssociations for Like {
    fn get_users(&self, db: &Database) -> StoreResult<Vec<User>> {
        assoc(db).get_all(&LIKE_USERS, self)
    }

    fn add_user(&self, db: &Database, user: &User) -> StoreResult<()> {
        assoc(db).add(&LIKE_USERS, self, user)
    }

    fn add_users(&self, db: &Database, users: &[User]) -> StoreResult<()> {
        assoc(db).add_all(&LIKE_USERS, self, users)
    }

    fn remove_user(&self, db: &Database, user: &User) -> StoreResult<bool> {
        assoc(db).remove(&LIKE_USERS, self, user)
    }

    fn count_users(&self, db: &Database) -> StoreResult<i64> {
        assoc(db).count(&LIKE_USERS, self)
    }
}
