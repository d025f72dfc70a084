//! Export file decoders.
//!
//! Each [`Shape`] has its own serde layout. The decoded items are kept close
//! to the export format; [`super::normalize`] turns them into facts.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use super::classify::{EntryRule, Shape, TextEncoding};
use crate::error::{Error, Result};

/// A post or story item.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MediaEntry {
    pub uri: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    pub creation_timestamp: i64,
}

#[derive(Debug, Deserialize)]
struct MediaWrapper {
    #[serde(default, deserialize_with = "null_as_default")]
    media: Vec<MediaEntry>,
}

/// One `string_list_data` element.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct LabeledValue {
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: i64,
}

/// An item carrying a `string_list_data` list, optionally titled.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct LabeledItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub string_list_data: Vec<LabeledValue>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct MapValue {
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ContactFields {
    #[serde(rename = "First Name", default, deserialize_with = "null_as_default")]
    pub first_name: MapValue,
    #[serde(rename = "Last Name", default, deserialize_with = "null_as_default")]
    pub last_name: MapValue,
    #[serde(
        rename = "Contact Information",
        default,
        deserialize_with = "null_as_default"
    )]
    pub contact_information: MapValue,
}

/// A synced address-book contact.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ContactItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub string_map_data: ContactFields,
}

/// Optional export fields may be absent or `null`; both read as the default.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Result of decoding one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Media(Vec<MediaEntry>),
    /// Items labeled by their inner `value`s.
    Labeled(Vec<LabeledItem>),
    /// Items labeled by their outer `title`.
    Titled(Vec<LabeledItem>),
    Contacts(Vec<ContactItem>),
}

/// Decode the raw bytes of an entry according to its rule.
pub fn decode(rule: &EntryRule, bytes: &[u8]) -> Result<Decoded> {
    let text = transcode(rule, bytes)?;
    let malformed = |err: serde_json::Error| Error::MalformedSchema {
        path: rule.path.to_string(),
        reason: err.to_string(),
    };

    let decoded = match rule.shape {
        Shape::MediaWrappers => {
            let wrappers: Vec<MediaWrapper> = serde_json::from_str(&text).map_err(malformed)?;
            Decoded::Media(wrappers.into_iter().flat_map(|w| w.media).collect())
        }
        Shape::KeyedMedia(key) => Decoded::Media(keyed(rule, &text, key)?),
        Shape::KeyedContacts(key) => Decoded::Contacts(keyed(rule, &text, key)?),
        Shape::LabeledList => Decoded::Labeled(serde_json::from_str(&text).map_err(malformed)?),
        Shape::KeyedLabeledList(key) => Decoded::Labeled(keyed(rule, &text, key)?),
        Shape::AnyKeyLabeledList => {
            let map: BTreeMap<String, Vec<LabeledItem>> =
                serde_json::from_str(&text).map_err(malformed)?;
            // One key is expected; its name varies between exports.
            let items = map.into_values().next().ok_or_else(|| Error::MalformedSchema {
                path: rule.path.to_string(),
                reason: "expected a single top-level key, found none".to_string(),
            })?;
            Decoded::Labeled(items)
        }
        Shape::KeyedTitledList(key) => Decoded::Titled(keyed(rule, &text, key)?),
    };
    Ok(decoded)
}

fn transcode<'a>(rule: &EntryRule, bytes: &'a [u8]) -> Result<Cow<'a, str>> {
    match rule.encoding {
        // Byte-for-code-point ISO-8859-1, so double-encoded UTF-8 stays reversible.
        TextEncoding::Latin1 => Ok(encoding_rs::mem::decode_latin1(bytes)),
        TextEncoding::Utf8 => std::str::from_utf8(bytes)
            .map(Cow::Borrowed)
            .map_err(|err| Error::MalformedSchema {
                path: rule.path.to_string(),
                reason: format!("invalid UTF-8: {err}"),
            }),
    }
}

/// Decode `{"<key>": [..]}`, ignoring any sibling keys.
fn keyed<T: DeserializeOwned>(rule: &EntryRule, text: &str, key: &str) -> Result<Vec<T>> {
    let mut map: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(text).map_err(|err| Error::MalformedSchema {
            path: rule.path.to_string(),
            reason: err.to_string(),
        })?;
    let value = map.remove(key).ok_or_else(|| Error::MalformedSchema {
        path: rule.path.to_string(),
        reason: format!("missing top-level key '{key}'"),
    })?;
    serde_json::from_value(value).map_err(|err| Error::MalformedSchema {
        path: rule.path.to_string(),
        reason: format!("'{key}': {err}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::classify;

    fn rule(path: &str) -> &'static EntryRule {
        classify(path).expect("known path")
    }

    const POSTS: &str = "your_instagram_activity/media/posts_1.json";
    const STORIES: &str = "your_instagram_activity/media/stories.json";
    const FOLLOWERS: &str = "connections/followers_and_following/followers_1.json";
    const FOLLOWING: &str = "connections/followers_and_following/following.json";
    const BLOCKED: &str = "connections/followers_and_following/blocked_profiles.json";
    const CONTACTS: &str = "connections/contacts/synced_contacts.json";
    const CLOSE_FRIENDS: &str = "connections/followers_and_following/close_friends.json";

    #[test]
    fn posts_flatten_all_wrappers() {
        let body = br#"[
            {"media": [{"uri": "a.jpg", "title": "hi", "creation_timestamp": 500}]},
            {"media": [{"uri": "b.jpg", "creation_timestamp": 600},
                       {"uri": "c.jpg", "title": "", "creation_timestamp": 700}]}
        ]"#;
        let Decoded::Media(entries) = decode(rule(POSTS), body).expect("decode") else {
            panic!("expected media");
        };
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].title, "hi");
        assert_eq!(entries[1].title, "");
        assert_eq!(entries[2].creation_timestamp, 700);
    }

    #[test]
    fn posts_transcode_latin1_caption() {
        let mut body = br#"[{"media":[{"uri":"a.jpg","title":"caf"#.to_vec();
        body.push(0xE9);
        body.extend_from_slice(b" \xFCber\",\"creation_timestamp\":1}]}]");
        let Decoded::Media(entries) = decode(rule(POSTS), &body).expect("decode") else {
            panic!("expected media");
        };
        assert_eq!(entries[0].title, "café über");
    }

    #[test]
    fn posts_keep_c1_bytes_as_their_own_code_points() {
        // UTF-8 for U+2019 read as Latin-1.
        let body = b"[{\"media\":[{\"uri\":\"a.jpg\",\"title\":\"it\xE2\x80\x99s\",\"creation_timestamp\":1}]}]";
        let Decoded::Media(entries) = decode(rule(POSTS), body).expect("decode") else {
            panic!("expected media");
        };
        assert_eq!(entries[0].title, "it\u{e2}\u{80}\u{99}s");

        let bytes: Vec<u8> = entries[0]
            .title
            .chars()
            .map(|c| u8::try_from(u32::from(c)).expect("latin-1 range"))
            .collect();
        assert_eq!(String::from_utf8(bytes).expect("utf-8"), "it\u{2019}s");
    }

    #[test]
    fn null_title_keeps_sibling_posts() {
        let body = br#"[{"media":[
            {"uri":"a.jpg","title":"ok","creation_timestamp":1},
            {"uri":"b.jpg","title":null,"creation_timestamp":2}
        ]}]"#;
        let Decoded::Media(entries) = decode(rule(POSTS), body).expect("decode") else {
            panic!("expected media");
        };
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "ok");
        assert_eq!(entries[1].title, "");
    }

    #[test]
    fn null_fields_in_lists_read_as_empty() {
        let body = br#"[
            {"title": null, "string_list_data": [{"value": "alice", "timestamp": null}]},
            {"string_list_data": null},
            {"string_list_data": [{"value": null, "timestamp": 3}]}
        ]"#;
        let Decoded::Labeled(items) = decode(rule(FOLLOWERS), body).expect("decode") else {
            panic!("expected labeled");
        };
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].string_list_data[0].value, "alice");
        assert_eq!(items[0].string_list_data[0].timestamp, 0);
        assert!(items[1].string_list_data.is_empty());
        assert_eq!(items[2].string_list_data[0].value, "");
    }

    #[test]
    fn null_contact_fields_read_as_empty() {
        let body = br#"{"contacts_contact_info": [{"string_map_data": {
            "First Name": {"value": "Ada"},
            "Last Name": null,
            "Contact Information": {"value": null}
        }}]}"#;
        let Decoded::Contacts(items) = decode(rule(CONTACTS), body).expect("decode") else {
            panic!("expected contacts");
        };
        let fields = &items[0].string_map_data;
        assert_eq!(fields.first_name.value, "Ada");
        assert_eq!(fields.last_name.value, "");
        assert_eq!(fields.contact_information.value, "");
    }

    #[test]
    fn stories_use_ig_stories_key() {
        let body = br#"{"ig_stories": [{"uri": "s.mp4", "title": "x", "creation_timestamp": 9}]}"#;
        let Decoded::Media(entries) = decode(rule(STORIES), body).expect("decode") else {
            panic!("expected media");
        };
        assert_eq!(entries[0].uri, "s.mp4");
    }

    #[test]
    fn media_without_uri_is_malformed() {
        let body = br#"[{"media": [{"title": "x", "creation_timestamp": 1}]}]"#;
        assert!(matches!(
            decode(rule(POSTS), body),
            Err(Error::MalformedSchema { .. })
        ));
    }

    #[test]
    fn followers_top_level_list() {
        let body = br#"[{"title": "", "string_list_data": [{"href": "https://x/alice", "value": "alice", "timestamp": 1000}]}]"#;
        let decoded = decode(rule(FOLLOWERS), body).expect("decode");
        assert_eq!(
            decoded,
            Decoded::Labeled(vec![LabeledItem {
                title: String::new(),
                string_list_data: vec![LabeledValue {
                    value: "alice".to_string(),
                    timestamp: 1000,
                }],
            }])
        );
    }

    #[test]
    fn following_accepts_any_single_key() {
        for key in ["relationships_following", "relaciones_seguidos"] {
            let body = format!(
                r#"{{"{key}": [{{"string_list_data": [{{"value": "bob", "timestamp": 5}}]}}]}}"#
            );
            let Decoded::Labeled(items) = decode(rule(FOLLOWING), body.as_bytes()).expect("decode")
            else {
                panic!("expected labeled");
            };
            assert_eq!(items[0].string_list_data[0].value, "bob");
        }
    }

    #[test]
    fn following_empty_object_is_malformed() {
        assert!(matches!(
            decode(rule(FOLLOWING), b"{}"),
            Err(Error::MalformedSchema { .. })
        ));
    }

    #[test]
    fn keyed_list_requires_its_key() {
        let body = br#"{"relationships_something_else": []}"#;
        let err = decode(rule(CLOSE_FRIENDS), body).expect_err("missing key");
        assert!(err.to_string().contains("relationships_close_friends"));
    }

    #[test]
    fn blocked_decodes_as_titled() {
        let body = br#"{"relationships_blocked_users": [{"title": "troll", "string_list_data": [{"timestamp": 42}]}]}"#;
        let Decoded::Titled(items) = decode(rule(BLOCKED), body).expect("decode") else {
            panic!("expected titled");
        };
        assert_eq!(items[0].title, "troll");
        assert_eq!(items[0].string_list_data[0].timestamp, 42);
    }

    #[test]
    fn contacts_read_string_map_data() {
        let body = br#"{"contacts_contact_info": [{"title": "", "string_map_data": {
            "First Name": {"value": "Ada"},
            "Last Name": {"value": "Lovelace"},
            "Contact Information": {"value": "+44 1234"}
        }}]}"#;
        let Decoded::Contacts(items) = decode(rule(CONTACTS), body).expect("decode") else {
            panic!("expected contacts");
        };
        let fields = &items[0].string_map_data;
        assert_eq!(fields.first_name.value, "Ada");
        assert_eq!(fields.last_name.value, "Lovelace");
        assert_eq!(fields.contact_information.value, "+44 1234");
    }

    #[test]
    fn invalid_utf8_in_relation_file_is_malformed() {
        let body = b"[{\"string_list_data\":[{\"value\":\"\xFF\",\"timestamp\":1}]}]";
        assert!(matches!(
            decode(rule(FOLLOWERS), body),
            Err(Error::MalformedSchema { .. })
        ));
    }

    #[test]
    fn wrong_shape_is_malformed() {
        assert!(decode(rule(FOLLOWERS), br#"{"not": "a list"}"#).is_err());
        assert!(decode(rule(POSTS), b"not json").is_err());
    }
}
