//! Decoded entries to canonical facts.

use chrono::{DateTime, Utc};

use super::classify::{EntryKind, EntryRule};
use super::decode::{ContactItem, Decoded, LabeledItem, MediaEntry};
use crate::error::{Error, Result};
use crate::models::{Fact, MediaFact, MediaKind, RelationFact, RelationKind, timestamp_from_epoch};

/// Turn a decoded entry into facts owned by `user_id`.
///
/// `now` stands in for the event time of records whose source carries no
/// timestamp (contacts). Items without a usable label are dropped.
pub fn normalize(
    rule: &EntryRule,
    decoded: Decoded,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<Vec<Fact>> {
    let facts = match (rule.kind, decoded) {
        (EntryKind::Media(kind), Decoded::Media(entries)) => media_facts(entries, kind, user_id),
        (EntryKind::Relation(kind), Decoded::Labeled(items)) => {
            labeled_facts(items, kind, user_id)
        }
        (EntryKind::Relation(kind), Decoded::Titled(items)) => titled_facts(items, kind, user_id),
        (EntryKind::Relation(RelationKind::Contact), Decoded::Contacts(items)) => {
            contact_facts(items, user_id, now)
        }
        (kind, _) => {
            return Err(Error::Other(format!(
                "'{}' decoded to a shape that does not fit kind '{kind}'",
                rule.path
            )));
        }
    };
    Ok(facts)
}

fn media_facts(entries: Vec<MediaEntry>, kind: MediaKind, user_id: i64) -> Vec<Fact> {
    entries
        .into_iter()
        .map(|entry| {
            Fact::Media(MediaFact {
                user_id,
                uri: entry.uri,
                caption: entry.title,
                taken_at: timestamp_from_epoch(entry.creation_timestamp),
                kind,
            })
        })
        .collect()
}

fn labeled_facts(items: Vec<LabeledItem>, kind: RelationKind, user_id: i64) -> Vec<Fact> {
    items
        .into_iter()
        .flat_map(|item| item.string_list_data)
        .filter(|data| !data.value.trim().is_empty())
        .map(|data| {
            Fact::Relation(RelationFact {
                user_id,
                subject: data.value,
                kind,
                timestamp: timestamp_from_epoch(data.timestamp),
                contact_info: None,
            })
        })
        .collect()
}

fn titled_facts(items: Vec<LabeledItem>, kind: RelationKind, user_id: i64) -> Vec<Fact> {
    items
        .into_iter()
        .filter(|item| !item.title.trim().is_empty())
        .filter_map(|item| {
            let first = item.string_list_data.first()?.timestamp;
            Some(Fact::Relation(RelationFact {
                user_id,
                subject: item.title,
                kind,
                timestamp: timestamp_from_epoch(first),
                contact_info: None,
            }))
        })
        .collect()
}

fn contact_facts(items: Vec<ContactItem>, user_id: i64, now: DateTime<Utc>) -> Vec<Fact> {
    items
        .into_iter()
        .filter_map(|item| {
            let fields = item.string_map_data;
            let name = format!("{} {}", fields.first_name.value, fields.last_name.value);
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some(Fact::Relation(RelationFact {
                user_id,
                subject: name.to_string(),
                kind: RelationKind::Contact,
                timestamp: now,
                contact_info: Some(fields.contact_information.value),
            }))
        })
        .collect()
}
