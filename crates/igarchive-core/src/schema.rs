//! Database schema for igarchive.

/// SQL schema, applied on every open. Natural keys back the upsert
/// conflict targets used by the writer.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS media_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    uri TEXT NOT NULL,
    caption TEXT NOT NULL DEFAULT '',
    taken_at INTEGER NOT NULL,
    media_type TEXT NOT NULL CHECK (media_type IN ('post', 'story')),
    UNIQUE (user_id, uri)
);

CREATE INDEX IF NOT EXISTS idx_media_items_user_taken
    ON media_items (user_id, taken_at);

CREATE TABLE IF NOT EXISTS connections (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    username TEXT NOT NULL,
    connection_type TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    contact_info TEXT,
    UNIQUE (user_id, username, connection_type)
);

CREATE INDEX IF NOT EXISTS idx_connections_user_type
    ON connections (user_id, connection_type);

CREATE TABLE IF NOT EXISTS followed_hashtags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    UNIQUE (user_id, name)
);
"#;
