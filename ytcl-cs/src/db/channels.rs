//! Channel database operations
//!
//! Channels are created on first reference (a vote, an override, or
//! submitted metadata) and keyed externally by their normalized identifier.
//! Metadata merges never let a placeholder value clobber real data.

use serde::Deserialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;
use ytcl_common::{ident, Error, Result};

/// Channel record
#[derive(Debug, Clone)]
pub struct Channel {
    pub id: Uuid,
    pub identifier: String,
    pub handle: Option<String>,
    pub channel_title: Option<String>,
    pub description: Option<String>,
    pub sample_video_id: Option<String>,
    pub sample_thumbnail: Option<String>,
    pub sample_title: Option<String>,
    pub sample_description: Option<String>,
}

/// Optional channel metadata submitted alongside a vote
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelMetadata {
    pub handle: Option<String>,
    pub channel_title: Option<String>,
    pub description: Option<String>,
    pub sample_video_id: Option<String>,
    pub sample_thumbnail: Option<String>,
    pub sample_title: Option<String>,
    pub sample_description: Option<String>,
}

impl Channel {
    /// Copy of this channel with every metadata field run through
    /// [`clean_metadata_value`], for display surfaces
    pub fn cleaned(mut self) -> Channel {
        self.handle = self.handle.as_deref().and_then(clean_metadata_value);
        self.channel_title = self.channel_title.as_deref().and_then(clean_metadata_value);
        self.description = self.description.as_deref().and_then(clean_metadata_value);
        self.sample_video_id = self.sample_video_id.as_deref().and_then(clean_metadata_value);
        self.sample_thumbnail = self.sample_thumbnail.as_deref().and_then(clean_metadata_value);
        self.sample_title = self.sample_title.as_deref().and_then(clean_metadata_value);
        self.sample_description = self
            .sample_description
            .as_deref()
            .and_then(clean_metadata_value);
        self
    }
}

impl ChannelMetadata {
    /// Copy with every field cleaned; placeholder values become None
    pub fn cleaned(&self) -> ChannelMetadata {
        ChannelMetadata {
            handle: self.handle.as_deref().and_then(clean_metadata_value),
            channel_title: self.channel_title.as_deref().and_then(clean_metadata_value),
            description: self.description.as_deref().and_then(clean_metadata_value),
            sample_video_id: self.sample_video_id.as_deref().and_then(clean_metadata_value),
            sample_thumbnail: self.sample_thumbnail.as_deref().and_then(clean_metadata_value),
            sample_title: self.sample_title.as_deref().and_then(clean_metadata_value),
            sample_description: self
                .sample_description
                .as_deref()
                .and_then(clean_metadata_value),
        }
    }
}

/// Clean a scraped metadata value
///
/// Upstream scrapers emit literal placeholders when a field was missing from
/// the page; those must never be stored as if they were data. Returns None
/// for blank strings, "(unknown)" (any case), "null", and "undefined".
pub fn clean_metadata_value(value: &str) -> Option<String> {
    let cleaned = value.trim();
    if cleaned.is_empty() {
        return None;
    }
    if cleaned.eq_ignore_ascii_case("(unknown)") || cleaned == "null" || cleaned == "undefined" {
        return None;
    }
    Some(cleaned.to_string())
}

fn channel_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Channel> {
    let id_str: String = row.get("id");
    let id = Uuid::parse_str(&id_str)
        .map_err(|e| Error::Internal(format!("Invalid channel UUID '{}': {}", id_str, e)))?;

    Ok(Channel {
        id,
        identifier: row.get("identifier"),
        handle: row.get("handle"),
        channel_title: row.get("channel_title"),
        description: row.get("description"),
        sample_video_id: row.get("sample_video_id"),
        sample_thumbnail: row.get("sample_thumbnail"),
        sample_title: row.get("sample_title"),
        sample_description: row.get("sample_description"),
    })
}

const CHANNEL_COLUMNS: &str = "id, identifier, handle, channel_title, description, \
     sample_video_id, sample_thumbnail, sample_title, sample_description";

/// Load channel by internal ID
pub async fn get_by_id(pool: &SqlitePool, id: &Uuid) -> Result<Option<Channel>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM channels WHERE id = ?",
        CHANNEL_COLUMNS
    ))
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(channel_from_row).transpose()
}

/// Load channel by normalized identifier or handle
///
/// The handle column holds display casing and usually a leading '@'; the
/// comparison strips handle decoration and lowercases so a normalized key
/// matches either column.
pub async fn get_by_identifier_or_handle(
    pool: &SqlitePool,
    key: &str,
) -> Result<Option<Channel>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM channels WHERE identifier = ? OR LOWER(LTRIM(handle, '@/ ')) = ? LIMIT 1",
        CHANNEL_COLUMNS
    ))
    .bind(key)
    .bind(key)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(channel_from_row).transpose()
}

/// Get or create a channel record keyed by normalized identifier
///
/// Idempotent: concurrent callers racing on the same identifier both end up
/// with the single row the UNIQUE constraint admits. Submitted metadata is
/// merged into the row either way.
pub async fn get_or_create(
    pool: &SqlitePool,
    raw_identifier: &str,
    metadata: Option<&ChannelMetadata>,
) -> Result<Channel> {
    let identifier = ident::normalize(raw_identifier);
    if identifier.is_empty() {
        return Err(Error::Validation(format!(
            "unusable channel identifier: {:?}",
            raw_identifier
        )));
    }

    let existing = get_by_identifier_or_handle(pool, &identifier).await?;

    let channel = match existing {
        Some(channel) => channel,
        None => {
            let id = Uuid::new_v4();
            // INSERT OR IGNORE absorbs the create/create race; whoever lost
            // re-reads the winner's row below
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO channels (id, identifier)
                VALUES (?, ?)
                "#,
            )
            .bind(id.to_string())
            .bind(&identifier)
            .execute(pool)
            .await?;

            get_by_identifier_or_handle(pool, &identifier)
                .await?
                .ok_or_else(|| {
                    Error::Internal(format!("channel '{}' vanished after insert", identifier))
                })?
        }
    };

    match metadata {
        Some(metadata) => merge_metadata(pool, &channel.id, metadata).await,
        None => Ok(channel),
    }
}

/// Merge submitted metadata into a channel row
///
/// Each field updates only when the incoming value survives cleaning; a
/// present value is never replaced by an absent or placeholder one.
pub async fn merge_metadata(
    pool: &SqlitePool,
    id: &Uuid,
    metadata: &ChannelMetadata,
) -> Result<Channel> {
    let cleaned = metadata.cleaned();

    sqlx::query(
        r#"
        UPDATE channels SET
            handle = COALESCE(?, handle),
            channel_title = COALESCE(?, channel_title),
            description = COALESCE(?, description),
            sample_video_id = COALESCE(?, sample_video_id),
            sample_thumbnail = COALESCE(?, sample_thumbnail),
            sample_title = COALESCE(?, sample_title),
            sample_description = COALESCE(?, sample_description),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(&cleaned.handle)
    .bind(&cleaned.channel_title)
    .bind(&cleaned.description)
    .bind(&cleaned.sample_video_id)
    .bind(&cleaned.sample_thumbnail)
    .bind(&cleaned.sample_title)
    .bind(&cleaned.sample_description)
    .bind(id.to_string())
    .execute(pool)
    .await?;

    get_by_id(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("channel {}", id)))
}

/// Batch of channels the given voter has not voted on yet
///
/// Bounded candidate pool for the labeling queue; the caller picks randomly
/// within the batch.
pub async fn candidate_batch(
    pool: &SqlitePool,
    voter_id: &str,
    limit: i64,
) -> Result<Vec<Channel>> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {} FROM channels
        WHERE id NOT IN (
            SELECT DISTINCT channel_id FROM channel_votes WHERE voter_id = ?
        )
        LIMIT ?
        "#,
        CHANNEL_COLUMNS
    ))
    .bind(voter_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(channel_from_row).collect()
}
