//! Database operations for igarchive.

use crate::error::Result;
use crate::models::{
    ConflictPolicy, Connection, FollowedHashtag, MediaFact, MediaItem, MediaKind, RelationFact,
    RelationKind, timestamp_from_epoch,
};
use crate::schema::SCHEMA;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;

/// Database handle for igarchive.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open or create a database at the given path.
    pub async fn open(path: &Path) -> Result<Self> {
        let parent = path.parent().unwrap_or(Path::new("."));
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.init().await?;
        Ok(db)
    }

    /// Initialize schema.
    async fn init(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Get the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database.
    pub async fn close(self) {
        self.pool.close().await;
    }

    // =========================================================================
    // Writer
    // =========================================================================

    /// Insert a media fact. An existing (user, uri) row is left untouched.
    pub async fn write_media(&self, fact: &MediaFact) -> Result<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO media_items (user_id, uri, caption, taken_at, media_type)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(user_id, uri) DO NOTHING
            "#,
        )
        .bind(fact.user_id)
        .bind(&fact.uri)
        .bind(&fact.caption)
        .bind(fact.taken_at.timestamp())
        .bind(fact.kind.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Upsert a relation fact using the conflict policy of its kind.
    pub async fn write_relation(&self, fact: &RelationFact) -> Result<u64> {
        if fact.kind == RelationKind::FollowedHashtag {
            return self.write_hashtag(fact).await;
        }

        let on_conflict = match fact.kind.conflict_policy() {
            ConflictPolicy::Ignore => "DO NOTHING",
            ConflictPolicy::RefreshTimestamp => "DO UPDATE SET timestamp = excluded.timestamp",
            ConflictPolicy::UpdateContactInfo => {
                "DO UPDATE SET contact_info = excluded.contact_info"
            }
        };
        let sql = format!(
            r#"
            INSERT INTO connections (user_id, username, connection_type, timestamp, contact_info)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(user_id, username, connection_type) {on_conflict}
            "#
        );

        let result = sqlx::query(&sql)
            .bind(fact.user_id)
            .bind(&fact.subject)
            .bind(fact.kind.as_str())
            .bind(fact.timestamp.timestamp())
            .bind(&fact.contact_info)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn write_hashtag(&self, fact: &RelationFact) -> Result<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO followed_hashtags (user_id, name, timestamp)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id, name) DO UPDATE SET timestamp = excluded.timestamp
            "#,
        )
        .bind(fact.user_id)
        .bind(&fact.subject)
        .bind(fact.timestamp.timestamp())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    // =========================================================================
    // Media
    // =========================================================================

    /// List a user's media, newest first.
    pub async fn list_media(&self, user_id: i64) -> Result<Vec<MediaItem>> {
        let rows = sqlx::query(
            "SELECT id, user_id, uri, caption, taken_at, media_type FROM media_items WHERE user_id = ? ORDER BY taken_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(media_from_row).collect()
    }

    /// Count a user's media, optionally restricted to one kind.
    pub async fn count_media(&self, user_id: i64, kind: Option<MediaKind>) -> Result<i64> {
        let count: (i64,) = match kind {
            Some(kind) => {
                sqlx::query_as(
                    "SELECT COUNT(*) FROM media_items WHERE user_id = ? AND media_type = ?",
                )
                .bind(user_id)
                .bind(kind.as_str())
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as("SELECT COUNT(*) FROM media_items WHERE user_id = ?")
                    .bind(user_id)
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(count.0)
    }

    // =========================================================================
    // Connections
    // =========================================================================

    /// List a user's connections, optionally filtered by kind.
    pub async fn list_connections(
        &self,
        user_id: i64,
        kind: Option<RelationKind>,
    ) -> Result<Vec<Connection>> {
        let mut sql = String::from(
            "SELECT id, user_id, username, connection_type, timestamp, contact_info FROM connections WHERE user_id = ?",
        );
        if kind.is_some() {
            sql.push_str(" AND connection_type = ?");
        }
        sql.push_str(" ORDER BY connection_type, username");

        let mut query = sqlx::query(&sql).bind(user_id);
        if let Some(kind) = kind {
            query = query.bind(kind.as_str());
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(connection_from_row).collect()
    }

    /// Get one connection by its natural key.
    pub async fn get_connection(
        &self,
        user_id: i64,
        username: &str,
        kind: RelationKind,
    ) -> Result<Option<Connection>> {
        let row = sqlx::query(
            "SELECT id, user_id, username, connection_type, timestamp, contact_info FROM connections WHERE user_id = ? AND username = ? AND connection_type = ?",
        )
        .bind(user_id)
        .bind(username)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(connection_from_row).transpose()
    }

    /// Count a user's connections, optionally restricted to one kind.
    pub async fn count_connections(&self, user_id: i64, kind: Option<RelationKind>) -> Result<i64> {
        let count: (i64,) = match kind {
            Some(kind) => {
                sqlx::query_as(
                    "SELECT COUNT(*) FROM connections WHERE user_id = ? AND connection_type = ?",
                )
                .bind(user_id)
                .bind(kind.as_str())
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as("SELECT COUNT(*) FROM connections WHERE user_id = ?")
                    .bind(user_id)
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(count.0)
    }

    // =========================================================================
    // Hashtags
    // =========================================================================

    /// List a user's followed hashtags by name.
    pub async fn list_hashtags(&self, user_id: i64) -> Result<Vec<FollowedHashtag>> {
        let rows = sqlx::query(
            "SELECT id, user_id, name, timestamp FROM followed_hashtags WHERE user_id = ? ORDER BY name ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| FollowedHashtag {
                id: row.get("id"),
                user_id: row.get("user_id"),
                name: row.get("name"),
                timestamp: timestamp_from_epoch(row.get("timestamp")),
            })
            .collect())
    }

    /// Count a user's followed hashtags.
    pub async fn count_hashtags(&self, user_id: i64) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM followed_hashtags WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }
}

fn media_from_row(row: &SqliteRow) -> Result<MediaItem> {
    Ok(MediaItem {
        id: row.get("id"),
        user_id: row.get("user_id"),
        uri: row.get("uri"),
        caption: row.get("caption"),
        taken_at: timestamp_from_epoch(row.get("taken_at")),
        media_type: MediaKind::from_str(row.get::<&str, _>("media_type"))?,
    })
}

fn connection_from_row(row: &SqliteRow) -> Result<Connection> {
    Ok(Connection {
        id: row.get("id"),
        user_id: row.get("user_id"),
        username: row.get("username"),
        connection_type: RelationKind::from_str(row.get::<&str, _>("connection_type"))?,
        timestamp: timestamp_from_epoch(row.get("timestamp")),
        contact_info: row.get("contact_info"),
    })
}
