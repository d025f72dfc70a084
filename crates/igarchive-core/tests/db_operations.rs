//! Integration tests for database operations.

use igarchive_core::Database;
use igarchive_core::models::{MediaFact, MediaKind, RelationFact, RelationKind, timestamp_from_epoch};
use uuid::Uuid;

fn temp_db_path() -> std::path::PathBuf {
    let mut path = std::env::temp_dir();
    let filename = format!("igarchive-test-{}.db", Uuid::new_v4());
    path.push(filename);
    path
}

fn media(user_id: i64, uri: &str, caption: &str, ts: i64, kind: MediaKind) -> MediaFact {
    MediaFact {
        user_id,
        uri: uri.to_string(),
        caption: caption.to_string(),
        taken_at: timestamp_from_epoch(ts),
        kind,
    }
}

fn relation(user_id: i64, subject: &str, kind: RelationKind, ts: i64) -> RelationFact {
    RelationFact {
        user_id,
        subject: subject.to_string(),
        kind,
        timestamp: timestamp_from_epoch(ts),
        contact_info: None,
    }
}

// ============================================================================
// Media
// ============================================================================

#[tokio::test]
async fn write_media_inserts_once() {
    let db = Database::open(&temp_db_path()).await.expect("open db");

    let first = media(1, "a.jpg", "first", 100, MediaKind::Post);
    assert_eq!(db.write_media(&first).await.expect("write"), 1);

    let second = media(1, "a.jpg", "edited", 200, MediaKind::Story);
    assert_eq!(db.write_media(&second).await.expect("write"), 0);

    let items = db.list_media(1).await.expect("list");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].caption, "first");
    assert_eq!(items[0].taken_at.timestamp(), 100);
    assert_eq!(items[0].media_type, MediaKind::Post);
}

#[tokio::test]
async fn same_uri_for_different_users_is_two_rows() {
    let db = Database::open(&temp_db_path()).await.expect("open db");

    db.write_media(&media(1, "a.jpg", "", 1, MediaKind::Post))
        .await
        .expect("write");
    db.write_media(&media(2, "a.jpg", "", 1, MediaKind::Post))
        .await
        .expect("write");

    assert_eq!(db.count_media(1, None).await.expect("count"), 1);
    assert_eq!(db.count_media(2, None).await.expect("count"), 1);
}

#[tokio::test]
async fn list_media_is_newest_first() {
    let db = Database::open(&temp_db_path()).await.expect("open db");

    for (uri, ts) in [("old.jpg", 10), ("new.jpg", 30), ("mid.jpg", 20)] {
        db.write_media(&media(1, uri, "", ts, MediaKind::Post))
            .await
            .expect("write");
    }

    let uris: Vec<_> = db
        .list_media(1)
        .await
        .expect("list")
        .into_iter()
        .map(|item| item.uri)
        .collect();
    assert_eq!(uris, vec!["new.jpg", "mid.jpg", "old.jpg"]);
}

// ============================================================================
// Relations
// ============================================================================

#[tokio::test]
async fn following_conflict_keeps_first_row() {
    let db = Database::open(&temp_db_path()).await.expect("open db");

    db.write_relation(&relation(1, "carol", RelationKind::Following, 100))
        .await
        .expect("write");
    let affected = db
        .write_relation(&relation(1, "carol", RelationKind::Following, 900))
        .await
        .expect("write");
    assert_eq!(affected, 0);

    let row = db
        .get_connection(1, "carol", RelationKind::Following)
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(row.timestamp.timestamp(), 100);
}

#[tokio::test]
async fn refresh_kinds_overwrite_timestamp() {
    let db = Database::open(&temp_db_path()).await.expect("open db");

    for kind in [
        RelationKind::CloseFriend,
        RelationKind::RequestReceived,
        RelationKind::StoryHiddenFrom,
        RelationKind::RequestSent,
        RelationKind::RequestSentPermanent,
        RelationKind::Unfollowed,
        RelationKind::SuggestionRemoved,
        RelationKind::Restricted,
    ] {
        db.write_relation(&relation(1, "dave", kind, 300))
            .await
            .expect("write");
        db.write_relation(&relation(1, "dave", kind, 100))
            .await
            .expect("write");

        let row = db
            .get_connection(1, "dave", kind)
            .await
            .expect("get")
            .expect("exists");
        assert_eq!(row.timestamp.timestamp(), 100, "{kind}");
    }

    assert_eq!(db.count_connections(1, None).await.expect("count"), 8);
}

#[tokio::test]
async fn same_subject_under_different_kinds_is_distinct() {
    let db = Database::open(&temp_db_path()).await.expect("open db");

    db.write_relation(&relation(1, "erin", RelationKind::Follower, 1))
        .await
        .expect("write");
    db.write_relation(&relation(1, "erin", RelationKind::Following, 1))
        .await
        .expect("write");

    assert_eq!(db.count_connections(1, None).await.expect("count"), 2);
    assert_eq!(
        db.count_connections(1, Some(RelationKind::Follower))
            .await
            .expect("count"),
        1
    );
}

#[tokio::test]
async fn contact_conflict_updates_info_only() {
    let db = Database::open(&temp_db_path()).await.expect("open db");

    let mut contact = relation(1, "Ada Lovelace", RelationKind::Contact, 100);
    contact.contact_info = Some("old".to_string());
    db.write_relation(&contact).await.expect("write");

    contact.timestamp = timestamp_from_epoch(999);
    contact.contact_info = Some(String::new());
    db.write_relation(&contact).await.expect("write");

    let row = db
        .get_connection(1, "Ada Lovelace", RelationKind::Contact)
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(row.contact_info.as_deref(), Some(""));
    assert_eq!(row.timestamp.timestamp(), 100);
}

#[tokio::test]
async fn list_connections_filters_by_kind() {
    let db = Database::open(&temp_db_path()).await.expect("open db");

    db.write_relation(&relation(1, "b", RelationKind::Blocked, 1))
        .await
        .expect("write");
    db.write_relation(&relation(1, "a", RelationKind::Follower, 1))
        .await
        .expect("write");
    db.write_relation(&relation(2, "z", RelationKind::Follower, 1))
        .await
        .expect("write");

    let all = db.list_connections(1, None).await.expect("list");
    assert_eq!(all.len(), 2);

    let followers = db
        .list_connections(1, Some(RelationKind::Follower))
        .await
        .expect("list");
    assert_eq!(followers.len(), 1);
    assert_eq!(followers[0].username, "a");
    assert_eq!(followers[0].connection_type, RelationKind::Follower);
}

#[tokio::test]
async fn get_connection_returns_none_for_missing() {
    let db = Database::open(&temp_db_path()).await.expect("open db");

    let result = db
        .get_connection(1, "nobody", RelationKind::Follower)
        .await
        .expect("get");
    assert!(result.is_none());
}

// ============================================================================
// Hashtags
// ============================================================================

#[tokio::test]
async fn hashtags_upsert_by_name_and_sort() {
    let db = Database::open(&temp_db_path()).await.expect("open db");

    for (name, ts) in [("zig", 1), ("rust", 2), ("rust", 3)] {
        db.write_relation(&relation(1, name, RelationKind::FollowedHashtag, ts))
            .await
            .expect("write");
    }

    let tags = db.list_hashtags(1).await.expect("list");
    let names: Vec<_> = tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["rust", "zig"]);
    assert_eq!(tags[0].timestamp.timestamp(), 3);
    assert_eq!(db.count_hashtags(1).await.expect("count"), 2);
}
