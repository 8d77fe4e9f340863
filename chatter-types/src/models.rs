use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::Reaction;

// Timestamps travel as RFC3339 strings in fixtures and exports
mod datetime_format {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = date.to_rfc3339();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<DateTime<Utc>>().map_err(serde::de::Error::custom)
    }
}

/// Containment check used by the `PartialEq<NewX>` impls: a payload field left
/// unset matches whatever the stored record holds.
fn opt_matches<T: PartialEq>(requested: &Option<T>, stored: &T) -> bool {
    requested.as_ref().map_or(true, |value| value == stored)
}

fn opt_link_matches(requested: &Option<i64>, stored: &Option<i64>) -> bool {
    requested.is_none() || requested == stored
}

// ============================================================================
// Stored records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: i64,
    pub bio: String,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub birthday: Option<NaiveDate>,
    /// Owning user, if the profile has been attached to one
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub body: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub body: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub post_id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: i64,
    pub reaction_type: Reaction,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub post_id: Option<i64>,
    /// User that owns this like through the user -> likes collection
    #[serde(default)]
    pub user_id: Option<i64>,
}

// ============================================================================
// Insert payloads (fixture shape)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    /// Explicit primary key; assigned by storage when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub bio: String,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub birthday: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    pub body: String,
    #[serde(with = "datetime_format", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub body: String,
    #[serde(with = "datetime_format", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLike {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub reaction_type: Reaction,
    #[serde(with = "datetime_format", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

// ============================================================================
// Stored record contains payload
// ============================================================================

impl PartialEq<NewUser> for User {
    fn eq(&self, new: &NewUser) -> bool {
        opt_matches(&new.id, &self.id) && self.username == new.username && self.email == new.email
    }
}

impl PartialEq<NewProfile> for Profile {
    fn eq(&self, new: &NewProfile) -> bool {
        opt_matches(&new.id, &self.id)
            && self.bio == new.bio
            && self.profile_picture == new.profile_picture
            && self.birthday == new.birthday
            && opt_link_matches(&new.user_id, &self.user_id)
    }
}

impl PartialEq<NewPost> for Post {
    fn eq(&self, new: &NewPost) -> bool {
        opt_matches(&new.id, &self.id)
            && self.title == new.title
            && self.body == new.body
            && self.created_at == new.created_at
            && opt_link_matches(&new.user_id, &self.user_id)
    }
}

impl PartialEq<NewComment> for Comment {
    fn eq(&self, new: &NewComment) -> bool {
        opt_matches(&new.id, &self.id)
            && self.body == new.body
            && self.created_at == new.created_at
            && opt_link_matches(&new.post_id, &self.post_id)
            && opt_link_matches(&new.user_id, &self.user_id)
    }
}

impl PartialEq<NewLike> for Like {
    fn eq(&self, new: &NewLike) -> bool {
        opt_matches(&new.id, &self.id)
            && self.reaction_type == new.reaction_type
            && self.created_at == new.created_at
            && opt_link_matches(&new.post_id, &self.post_id)
            && opt_link_matches(&new.user_id, &self.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_reads_camel_case_fixture() {
        let json = r#"{"bio":"hi","profilePicture":"pic.png","birthday":"1990-05-14"}"#;
        let profile: NewProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.profile_picture.as_deref(), Some("pic.png"));
        assert_eq!(profile.birthday, NaiveDate::from_ymd_opt(1990, 5, 14));
        assert_eq!(profile.id, None);
    }

    #[test]
    fn test_stored_record_contains_payload() {
        let created_at = "2023-07-01T12:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let new = NewPost {
            id: None,
            title: "Hello".to_string(),
            body: "World".to_string(),
            created_at,
            user_id: None,
        };
        let stored = Post {
            id: 7,
            title: "Hello".to_string(),
            body: "World".to_string(),
            created_at,
            user_id: Some(3),
        };
        assert_eq!(stored, new);

        let pinned = NewPost { id: Some(8), ..new.clone() };
        assert_ne!(stored, pinned);

        let other_author = NewPost { user_id: Some(4), ..new };
        assert_ne!(stored, other_author);
    }

    #[test]
    fn test_timestamps_serialize_as_rfc3339() {
        let like = Like {
            id: 1,
            reaction_type: Reaction::ThumbsUp,
            created_at: "2023-07-01T12:00:00Z".parse().unwrap(),
            post_id: None,
            user_id: None,
        };
        let value = serde_json::to_value(&like).unwrap();
        assert_eq!(value["createdAt"], "2023-07-01T12:00:00+00:00");
        assert_eq!(value["reactionType"], "👍");
    }
}
