use serde::{Deserialize, Serialize};

/// Reaction carried by a like. Serialized (and stored) as its emoji.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Reaction {
    #[default]
    #[serde(rename = "👍")]
    ThumbsUp,
    #[serde(rename = "❤️")]
    Heart,
    #[serde(rename = "😂")]
    Laugh,
    #[serde(rename = "😮")]
    Wow,
    #[serde(rename = "😢")]
    Sad,
    #[serde(rename = "😡")]
    Angry,
}

impl Reaction {
    pub const ALL: [Reaction; 6] = [
        Reaction::ThumbsUp,
        Reaction::Heart,
        Reaction::Laugh,
        Reaction::Wow,
        Reaction::Sad,
        Reaction::Angry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Reaction::ThumbsUp => "👍",
            Reaction::Heart => "❤️",
            Reaction::Laugh => "😂",
            Reaction::Wow => "😮",
            Reaction::Sad => "😢",
            Reaction::Angry => "😡",
        }
    }

    /// Accepts the emoji or a lowercase name ("like", "love", ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "👍" | "like" | "thumbs_up" => Some(Reaction::ThumbsUp),
            "❤️" | "❤" | "love" | "heart" => Some(Reaction::Heart),
            "😂" | "laugh" => Some(Reaction::Laugh),
            "😮" | "wow" => Some(Reaction::Wow),
            "😢" | "sad" => Some(Reaction::Sad),
            "😡" | "angry" => Some(Reaction::Angry),
            _ => None,
        }
    }
}

impl std::fmt::Display for Reaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
