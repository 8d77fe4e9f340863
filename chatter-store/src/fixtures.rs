//! Seed records used to populate a freshly synced database.

use serde::de::DeserializeOwned;
use std::path::Path;

use chatter_types::{
    Comment, Like, NewComment, NewLike, NewPost, NewProfile, NewUser, Post, Profile, User,
};

use crate::db::relations::{COMMENT_POST, LIKE_POST, LIKE_USERS, POST_AUTHOR, USER_PROFILE};
use crate::db::{Associations, Database, Repository};
use crate::error::{StoreError, StoreResult};

const USERS_JSON: &str = include_str!("../seed/users.json");
const PROFILES_JSON: &str = include_str!("../seed/profiles.json");
const POSTS_JSON: &str = include_str!("../seed/posts.json");
const COMMENTS_JSON: &str = include_str!("../seed/comments.json");
const LIKES_JSON: &str = include_str!("../seed/likes.json");

/// Insert payloads for every entity, in fixture file order
#[derive(Debug, Clone, Default)]
pub struct Fixtures {
    pub users: Vec<NewUser>,
    pub profiles: Vec<NewProfile>,
    pub posts: Vec<NewPost>,
    pub comments: Vec<NewComment>,
    pub likes: Vec<NewLike>,
}

/// Records written by [`Fixtures::seed`]
#[derive(Debug, Default)]
pub struct Seeded {
    pub users: Vec<User>,
    pub profiles: Vec<Profile>,
    pub posts: Vec<Post>,
    pub comments: Vec<Comment>,
    pub likes: Vec<Like>,
    /// Number of associations created by linking
    pub links: usize,
}

impl Seeded {
    pub fn total_records(&self) -> usize {
        self.users.len()
            + self.profiles.len()
            + self.posts.len()
            + self.comments.len()
            + self.likes.len()
    }
}

impl Fixtures {
    /// The fixture set compiled into the crate
    pub fn bundled() -> StoreResult<Self> {
        Ok(Self {
            users: parse("users.json", USERS_JSON)?,
            profiles: parse("profiles.json", PROFILES_JSON)?,
            posts: parse("posts.json", POSTS_JSON)?,
            comments: parse("comments.json", COMMENTS_JSON)?,
            likes: parse("likes.json", LIKES_JSON)?,
        })
    }

    /// Load `users.json`, `profiles.json`, ... from a directory. Missing files
    /// yield empty sets.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> StoreResult<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(StoreError::Fixture(format!(
                "fixture directory not found: {}",
                dir.display()
            )));
        }
        Ok(Self {
            users: read_file(dir, "users.json")?,
            profiles: read_file(dir, "profiles.json")?,
            posts: read_file(dir, "posts.json")?,
            comments: read_file(dir, "comments.json")?,
            likes: read_file(dir, "likes.json")?,
        })
    }

    /// Bulk insert every set, parents first. With `link`, records at the same
    /// position are associated: profile N and post N to user N, comment N and
    /// like N to post N, and user N joined to like N.
    pub fn seed(&self, db: &Database, link: bool) -> StoreResult<Seeded> {
        let mut seeded = Seeded {
            users: Repository::<User>::new(db.clone()).bulk_create(&self.users)?,
            profiles: Repository::<Profile>::new(db.clone()).bulk_create(&self.profiles)?,
            posts: Repository::<Post>::new(db.clone()).bulk_create(&self.posts)?,
            comments: Repository::<Comment>::new(db.clone()).bulk_create(&self.comments)?,
            likes: Repository::<Like>::new(db.clone()).bulk_create(&self.likes)?,
            links: 0,
        };

        if link {
            seeded.links = link_by_position(db, &mut seeded)?;
        }

        tracing::info!(
            "Seeded {} records ({} links)",
            seeded.total_records(),
            seeded.links
        );
        Ok(seeded)
    }
}

fn link_by_position(db: &Database, seeded: &mut Seeded) -> StoreResult<usize> {
    let assoc = Associations::new(db.clone());
    let mut links = 0;

    for (user, profile) in seeded.users.iter().zip(seeded.profiles.iter_mut()) {
        *profile = assoc.set_one(&USER_PROFILE, user, &*profile)?;
        links += 1;
    }
    for (user, post) in seeded.users.iter().zip(seeded.posts.iter_mut()) {
        *post = assoc.set_parent(&POST_AUTHOR, &*post, Some(user))?;
        links += 1;
    }
    for (post, comment) in seeded.posts.iter().zip(seeded.comments.iter_mut()) {
        *comment = assoc.set_parent(&COMMENT_POST, &*comment, Some(post))?;
        links += 1;
    }
    for (post, like) in seeded.posts.iter().zip(seeded.likes.iter_mut()) {
        *like = assoc.set_parent(&LIKE_POST, &*like, Some(post))?;
        links += 1;
    }
    for (like, user) in seeded.likes.iter().zip(seeded.users.iter()) {
        assoc.add(&LIKE_USERS, like, user)?;
        links += 1;
    }

    Ok(links)
}

fn parse<T: DeserializeOwned>(name: &str, json: &str) -> StoreResult<Vec<T>> {
    serde_json::from_str(json).map_err(|e| StoreError::Fixture(format!("{name}: {e}")))
}

fn read_file<T: DeserializeOwned>(dir: &Path, name: &str) -> StoreResult<Vec<T>> {
    let path = dir.join(name);
    if !path.exists() {
        tracing::debug!("No fixture file at {}", path.display());
        return Ok(Vec::new());
    }
    let json = std::fs::read_to_string(&path)?;
    parse(name, &json)
}
