//! Labeling queue endpoint
//!
//! GET /labeler/next hands the calling voter a channel they have not voted
//! on yet. An exhausted queue is reported as `{ok:false, error:"empty_queue"}`
//! with a 200 status so clients can back off and poll, distinct from real
//! failures which use non-2xx statuses.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::db::channels::Channel;
use crate::AppState;
use ytcl_common::ident;

#[derive(Debug, Deserialize)]
pub struct NextCandidateParams {
    pub voter_id: Option<String>,
}

/// Queue item shape handed to the labeling UI
#[derive(Debug, Serialize)]
pub struct CandidateItem {
    /// Internal channel ID, used when voting on this item
    pub id: String,
    pub identifier: String,
    /// Canonical channel URL for the labeling UI
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NextCandidateResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<CandidateItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CandidateItem {
    fn from_channel(channel: Channel) -> CandidateItem {
        // Sample fields fall back to the channel-level ones so the UI
        // always has something to show
        let sample_title = channel.sample_title.or_else(|| channel.channel_title.clone());
        let sample_description = channel.sample_description.or_else(|| channel.description.clone());

        // Handles make prettier URLs than lowercased identifiers
        let url = ident::channel_url(
            channel.handle.as_deref().unwrap_or(&channel.identifier),
        );

        CandidateItem {
            id: channel.id.to_string(),
            identifier: channel.identifier,
            url,
            handle: channel.handle,
            title: channel.channel_title,
            sample_video_id: channel.sample_video_id,
            sample_thumbnail: channel.sample_thumbnail,
            sample_title,
            sample_description,
        }
    }
}

/// GET /labeler/next?voter_id=<id>
pub async fn next_candidate(
    State(state): State<AppState>,
    Query(params): Query<NextCandidateParams>,
) -> (StatusCode, Json<NextCandidateResponse>) {
    let voter_id = match params.voter_id.as_deref().map(str::trim) {
        Some(voter_id) if !voter_id.is_empty() => voter_id.to_string(),
        _ => {
            return error_response(StatusCode::BAD_REQUEST, "missing voter_id");
        }
    };

    match state.queue.next(&voter_id).await {
        Ok(Some(channel)) => (
            StatusCode::OK,
            Json(NextCandidateResponse {
                ok: true,
                item: Some(CandidateItem::from_channel(channel)),
                error: None,
            }),
        ),
        Ok(None) => (
            StatusCode::OK,
            Json(NextCandidateResponse {
                ok: false,
                item: None,
                error: Some("empty_queue".to_string()),
            }),
        ),
        Err(e) => {
            error!("Candidate lookup failed for {}: {}", voter_id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

fn error_response(
    status: StatusCode,
    message: &str,
) -> (StatusCode, Json<NextCandidateResponse>) {
    (
        status,
        Json(NextCandidateResponse {
            ok: false,
            item: None,
            error: Some(message.to_string()),
        }),
    )
}
