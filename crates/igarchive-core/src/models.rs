//! Domain models for ingested export records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a media record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Post,
    Story,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Post => "post",
            MediaKind::Story => "story",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MediaKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(MediaKind::Post),
            "story" => Ok(MediaKind::Story),
            other => Err(crate::Error::Other(format!("unknown media kind '{other}'"))),
        }
    }
}

/// Category of a social-graph edge between the owner and a subject.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Follower,
    Following,
    Contact,
    Blocked,
    CloseFriend,
    RequestReceived,
    StoryHiddenFrom,
    RequestSent,
    RequestSentPermanent,
    Unfollowed,
    SuggestionRemoved,
    Restricted,
    FollowedHashtag,
}

/// What an upsert does when the natural key already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// First write wins.
    Ignore,
    /// Overwrite the stored event time with the incoming one.
    RefreshTimestamp,
    /// Overwrite the stored contact info, keep the first timestamp.
    UpdateContactInfo,
}

impl RelationKind {
    pub const ALL: [RelationKind; 13] = [
        RelationKind::Follower,
        RelationKind::Following,
        RelationKind::Contact,
        RelationKind::Blocked,
        RelationKind::CloseFriend,
        RelationKind::RequestReceived,
        RelationKind::StoryHiddenFrom,
        RelationKind::RequestSent,
        RelationKind::RequestSentPermanent,
        RelationKind::Unfollowed,
        RelationKind::SuggestionRemoved,
        RelationKind::Restricted,
        RelationKind::FollowedHashtag,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RelationKind::Follower => "follower",
            RelationKind::Following => "following",
            RelationKind::Contact => "contact",
            RelationKind::Blocked => "blocked",
            RelationKind::CloseFriend => "close_friend",
            RelationKind::RequestReceived => "request_received",
            RelationKind::StoryHiddenFrom => "story_hidden_from",
            RelationKind::RequestSent => "request_sent",
            RelationKind::RequestSentPermanent => "request_sent_permanent",
            RelationKind::Unfollowed => "unfollowed",
            RelationKind::SuggestionRemoved => "suggestion_removed",
            RelationKind::Restricted => "restricted",
            RelationKind::FollowedHashtag => "followed_hashtag",
        }
    }

    pub fn conflict_policy(self) -> ConflictPolicy {
        match self {
            RelationKind::Follower | RelationKind::Following => ConflictPolicy::Ignore,
            RelationKind::Contact => ConflictPolicy::UpdateContactInfo,
            RelationKind::Blocked
            | RelationKind::CloseFriend
            | RelationKind::RequestReceived
            | RelationKind::StoryHiddenFrom
            | RelationKind::RequestSent
            | RelationKind::RequestSentPermanent
            | RelationKind::Unfollowed
            | RelationKind::SuggestionRemoved
            | RelationKind::Restricted
            | RelationKind::FollowedHashtag => ConflictPolicy::RefreshTimestamp,
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RelationKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RelationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| crate::Error::Other(format!("unknown relation kind '{s}'")))
    }
}

/// A post or story, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFact {
    pub user_id: i64,
    pub uri: String,
    pub caption: String,
    pub taken_at: DateTime<Utc>,
    pub kind: MediaKind,
}

/// A relationship edge, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationFact {
    pub user_id: i64,
    /// Username, contact display name or hashtag name, depending on kind.
    pub subject: String,
    pub kind: RelationKind,
    pub timestamp: DateTime<Utc>,
    /// Only set for `contact`.
    pub contact_info: Option<String>,
}

/// Canonical output of normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fact {
    Media(MediaFact),
    Relation(RelationFact),
}

/// A stored media row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: i64,
    pub user_id: i64,
    pub uri: String,
    pub caption: String,
    pub taken_at: DateTime<Utc>,
    pub media_type: MediaKind,
}

/// A stored connection row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub connection_type: RelationKind,
    pub timestamp: DateTime<Utc>,
    pub contact_info: Option<String>,
}

/// A stored followed-hashtag row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowedHashtag {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub timestamp: DateTime<Utc>,
}

/// Convert epoch seconds from the export into a UTC timestamp.
pub fn timestamp_from_epoch(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;
