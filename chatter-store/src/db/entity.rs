use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};

use chatter_types::{
    Comment, Like, NewComment, NewLike, NewPost, NewProfile, NewUser, Post, Profile, Reaction,
    User,
};

/// A record type mapped to one table.
///
/// Rows are always selected with [`Entity::COLUMNS`] in declaration order, so
/// `from_row` can read by index.
pub trait Entity: Sized {
    /// Insert payload
    type New;

    /// Human readable name, used in errors and logs
    const NAME: &'static str;
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    fn id(&self) -> i64;

    /// Insert one payload and return the assigned primary key
    fn insert(conn: &Connection, new: &Self::New) -> rusqlite::Result<i64>;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Column list qualified with the table name, for joins
    fn select_list() -> String {
        Self::COLUMNS
            .iter()
            .map(|column| format!("{}.{}", Self::TABLE, column))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Entity for User {
    type New = NewUser;

    const NAME: &'static str = "User";
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &["id", "username", "email"];

    fn id(&self) -> i64 {
        self.id
    }

    fn insert(conn: &Connection, new: &NewUser) -> rusqlite::Result<i64> {
        conn.execute(
            "INSERT INTO users (id, username, email) VALUES (?, ?, ?)",
            params![new.id, new.username, new.email],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
        })
    }
}

impl Entity for Profile {
    type New = NewProfile;

    const NAME: &'static str = "Profile";
    const TABLE: &'static str = "profiles";
    const COLUMNS: &'static [&'static str] =
        &["id", "bio", "profile_picture", "birthday", "user_id"];

    fn id(&self) -> i64 {
        self.id
    }

    fn insert(conn: &Connection, new: &NewProfile) -> rusqlite::Result<i64> {
        conn.execute(
            "INSERT INTO profiles (id, bio, profile_picture, birthday, user_id)
             VALUES (?, ?, ?, ?, ?)",
            params![
                new.id,
                new.bio,
                new.profile_picture,
                new.birthday,
                new.user_id
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Profile {
            id: row.get(0)?,
            bio: row.get(1)?,
            profile_picture: row.get(2)?,
            birthday: row.get(3)?,
            user_id: row.get(4)?,
        })
    }
}

impl Entity for Post {
    type New = NewPost;

    const NAME: &'static str = "Post";
    const TABLE: &'static str = "posts";
    const COLUMNS: &'static [&'static str] = &["id", "title", "body", "created_at", "user_id"];

    fn id(&self) -> i64 {
        self.id
    }

    fn insert(conn: &Connection, new: &NewPost) -> rusqlite::Result<i64> {
        conn.execute(
            "INSERT INTO posts (id, title, body, created_at, user_id) VALUES (?, ?, ?, ?, ?)",
            params![new.id, new.title, new.body, new.created_at, new.user_id],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Post {
            id: row.get(0)?,
            title: row.get(1)?,
            body: row.get(2)?,
            created_at: row.get(3)?,
            user_id: row.get(4)?,
        })
    }
}

impl Entity for Comment {
    type New = NewComment;

    const NAME: &'static str = "Comment";
    const TABLE: &'static str = "comments";
    const COLUMNS: &'static [&'static str] = &["id", "body", "created_at", "post_id", "user_id"];

    fn id(&self) -> i64 {
        self.id
    }

    fn insert(conn: &Connection, new: &NewComment) -> rusqlite::Result<i64> {
        conn.execute(
            "INSERT INTO comments (id, body, created_at, post_id, user_id) VALUES (?, ?, ?, ?, ?)",
            params![new.id, new.body, new.created_at, new.post_id, new.user_id],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Comment {
            id: row.get(0)?,
            body: row.get(1)?,
            created_at: row.get(2)?,
            post_id: row.get(3)?,
            user_id: row.get(4)?,
        })
    }
}

impl Entity for Like {
    type New = NewLike;

    const NAME: &'static str = "Like";
    const TABLE: &'static str = "likes";
    const COLUMNS: &'static [&'static str] =
        &["id", "reaction_type", "created_at", "post_id", "user_id"];

    fn id(&self) -> i64 {
        self.id
    }

    fn insert(conn: &Connection, new: &NewLike) -> rusqlite::Result<i64> {
        conn.execute(
            "INSERT INTO likes (id, reaction_type, created_at, post_id, user_id)
             VALUES (?, ?, ?, ?, ?)",
            params![
                new.id,
                new.reaction_type.as_str(),
                new.created_at,
                new.post_id,
                new.user_id
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let reaction: String = row.get(1)?;
        Ok(Like {
            id: row.get(0)?,
            reaction_type: parse_reaction(1, &reaction)?,
            created_at: row.get(2)?,
            post_id: row.get(3)?,
            user_id: row.get(4)?,
        })
    }
}

fn parse_reaction(index: usize, value: &str) -> rusqlite::Result<Reaction> {
    Reaction::parse(value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            Type::Text,
            format!("unknown reaction {value:?}").into(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_list_is_qualified() {
        assert_eq!(User::select_list(), "users.id, users.username, users.email");
        assert!(Like::select_list().starts_with("likes.id, likes.reaction_type"));
    }

    #[test]
    fn test_unknown_reaction_is_a_conversion_error() {
        let err = parse_reaction(1, "🦀").unwrap_err();
        assert!(matches!(
            err,
            rusqlite::Error::FromSqlConversionFailure(1, Type::Text, _)
        ));
    }
}
