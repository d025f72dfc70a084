//! Known export entry paths.

use crate::models::{MediaKind, RelationKind};

/// What an export entry contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Media(MediaKind),
    Relation(RelationKind),
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::Media(kind) => f.write_str(kind.as_str()),
            EntryKind::Relation(kind) => f.write_str(kind.as_str()),
        }
    }
}

/// JSON layout of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `[ {"media": [..]} ]`
    MediaWrappers,
    /// `{"<key>": [ {uri, title, creation_timestamp} ]}`
    KeyedMedia(&'static str),
    /// `{"<key>": [ {"string_map_data": {..}} ]}`
    KeyedContacts(&'static str),
    /// `[ {"string_list_data": [..]} ]`
    LabeledList,
    /// `{"<key>": [ {"string_list_data": [..]} ]}`
    KeyedLabeledList(&'static str),
    /// Single-key object whose key is not known ahead of time.
    AnyKeyLabeledList,
    /// `{"<key>": [ {"title", "string_list_data": [..]} ]}`, labeled by title.
    KeyedTitledList(&'static str),
}

/// Byte encoding of an entry's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    /// Single-byte Latin-1 family; transcoded before JSON parsing.
    Latin1,
}

/// One row of the entry table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryRule {
    pub path: &'static str,
    pub kind: EntryKind,
    pub shape: Shape,
    pub encoding: TextEncoding,
}

const fn relation(path: &'static str, kind: RelationKind, shape: Shape) -> EntryRule {
    EntryRule {
        path,
        kind: EntryKind::Relation(kind),
        shape,
        encoding: TextEncoding::Utf8,
    }
}

pub const ENTRY_TABLE: &[EntryRule] = &[
    EntryRule {
        path: "your_instagram_activity/media/posts_1.json",
        kind: EntryKind::Media(MediaKind::Post),
        shape: Shape::MediaWrappers,
        encoding: TextEncoding::Latin1,
    },
    EntryRule {
        path: "your_instagram_activity/media/stories.json",
        kind: EntryKind::Media(MediaKind::Story),
        shape: Shape::KeyedMedia("ig_stories"),
        encoding: TextEncoding::Latin1,
    },
    relation(
        "connections/contacts/synced_contacts.json",
        RelationKind::Contact,
        Shape::KeyedContacts("contacts_contact_info"),
    ),
    relation(
        "connections/followers_and_following/followers_1.json",
        RelationKind::Follower,
        Shape::LabeledList,
    ),
    relation(
        "connections/followers_and_following/following.json",
        RelationKind::Following,
        Shape::AnyKeyLabeledList,
    ),
    relation(
        "connections/followers_and_following/blocked_profiles.json",
        RelationKind::Blocked,
        Shape::KeyedTitledList("relationships_blocked_users"),
    ),
    relation(
        "connections/followers_and_following/close_friends.json",
        RelationKind::CloseFriend,
        Shape::KeyedLabeledList("relationships_close_friends"),
    ),
    relation(
        "connections/followers_and_following/follow_requests_you've_received.json",
        RelationKind::RequestReceived,
        Shape::KeyedLabeledList("relationships_follow_requests_received"),
    ),
    relation(
        "connections/followers_and_following/hide_story_from.json",
        RelationKind::StoryHiddenFrom,
        Shape::KeyedLabeledList("relationships_hide_stories_from"),
    ),
    relation(
        "connections/followers_and_following/following_hashtags.json",
        RelationKind::FollowedHashtag,
        Shape::KeyedLabeledList("relationships_following_hashtags"),
    ),
    relation(
        "connections/followers_and_following/pending_follow_requests.json",
        RelationKind::RequestSent,
        Shape::KeyedLabeledList("relationships_follow_requests_sent"),
    ),
    relation(
        "connections/followers_and_following/recent_follow_requests.json",
        RelationKind::RequestSentPermanent,
        Shape::KeyedLabeledList("relationships_permanent_follow_requests"),
    ),
    relation(
        "connections/followers_and_following/recently_unfollowed_profiles.json",
        RelationKind::Unfollowed,
        Shape::KeyedLabeledList("relationships_unfollowed_users"),
    ),
    relation(
        "connections/followers_and_following/removed_suggestions.json",
        RelationKind::SuggestionRemoved,
        Shape::KeyedLabeledList("relationships_dismissed_suggested_users"),
    ),
    relation(
        "connections/followers_and_following/restricted_profiles.json",
        RelationKind::Restricted,
        Shape::KeyedLabeledList("relationships_restricted_users"),
    ),
];

/// Look up an entry path. Matching is exact and case-sensitive; `None`
/// means the entry is not part of any supported export file.
pub fn classify(path: &str) -> Option<&'static EntryRule> {
    ENTRY_TABLE.iter().find(|rule| rule.path == path)
}
