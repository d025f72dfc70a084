//! Unit tests for domain models.

use super::*;

#[cfg(test)]
mod relation_kind_tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn display_matches_stored_strings() {
        assert_eq!(RelationKind::Follower.to_string(), "follower");
        assert_eq!(RelationKind::CloseFriend.to_string(), "close_friend");
        assert_eq!(
            RelationKind::RequestSentPermanent.to_string(),
            "request_sent_permanent"
        );
        assert_eq!(RelationKind::StoryHiddenFrom.to_string(), "story_hidden_from");
        assert_eq!(RelationKind::SuggestionRemoved.to_string(), "suggestion_removed");
    }

    #[test]
    fn from_str_accepts_every_stored_string() {
        for kind in RelationKind::ALL {
            assert_eq!(RelationKind::from_str(kind.as_str()).expect("parse"), kind);
        }
    }

    #[test]
    fn from_str_rejects_unknown() {
        assert!(RelationKind::from_str("close_friends").is_err());
        assert!(RelationKind::from_str("Follower").is_err());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&RelationKind::RequestReceived).expect("serialize");
        assert_eq!(json, "\"request_received\"");
    }

    #[test]
    fn follower_and_following_ignore_conflicts() {
        assert_eq!(
            RelationKind::Follower.conflict_policy(),
            ConflictPolicy::Ignore
        );
        assert_eq!(
            RelationKind::Following.conflict_policy(),
            ConflictPolicy::Ignore
        );
    }

    #[test]
    fn contact_updates_contact_info() {
        assert_eq!(
            RelationKind::Contact.conflict_policy(),
            ConflictPolicy::UpdateContactInfo
        );
    }

    #[test]
    fn state_kinds_refresh_timestamp() {
        for kind in [
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
        ] {
            assert_eq!(kind.conflict_policy(), ConflictPolicy::RefreshTimestamp);
        }
    }
}

#[cfg(test)]
mod media_kind_tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn round_trips_through_str() {
        assert_eq!(MediaKind::from_str("post").expect("post"), MediaKind::Post);
        assert_eq!(MediaKind::from_str("story").expect("story"), MediaKind::Story);
        assert!(MediaKind::from_str("reel").is_err());
    }
}

#[cfg(test)]
mod timestamp_tests {
    use super::*;

    #[test]
    fn converts_epoch_seconds() {
        let ts = timestamp_from_epoch(1_000);
        assert_eq!(ts.timestamp(), 1_000);
    }

    #[test]
    fn out_of_range_falls_back_to_epoch() {
        let ts = timestamp_from_epoch(i64::MAX);
        assert_eq!(ts.timestamp(), 0);
    }
}
