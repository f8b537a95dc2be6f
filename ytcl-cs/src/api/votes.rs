//! Vote submission endpoint
//!
//! POST /labeler/vote records one voter's verdict and returns the weight it
//! was assigned. Unlike classification reads, failures here are loud: a
//! silently dropped vote would corrupt the consensus without anyone
//! noticing, so every error surfaces to the caller as a retryable failure.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::error;
use ytcl_common::Error;

use crate::db::channels::ChannelMetadata;
use crate::engine::VoteRequest;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitVoteBody {
    /// Internal channel ID of an existing channel (from the queue)
    pub channel_id: Option<String>,
    /// Raw identifier, resolved or created on demand (manual entry)
    pub identifier: Option<String>,
    pub voter_id: Option<String>,
    pub is_ai: Option<bool>,
    pub metadata: Option<ChannelMetadata>,
}

#[derive(Debug, Serialize)]
pub struct SubmitVoteResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_assigned: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /labeler/vote
pub async fn submit_vote(
    State(state): State<AppState>,
    Json(body): Json<SubmitVoteBody>,
) -> (StatusCode, Json<SubmitVoteResponse>) {
    let is_ai = match body.is_ai {
        Some(is_ai) => is_ai,
        None => return error_response(StatusCode::BAD_REQUEST, "is_ai is required"),
    };
    let voter_id = match body.voter_id.as_deref().map(str::trim) {
        Some(voter_id) if !voter_id.is_empty() => voter_id.to_string(),
        _ => return error_response(StatusCode::BAD_REQUEST, "voter_id is required"),
    };

    let request = VoteRequest {
        channel_id: body.channel_id,
        identifier: body.identifier,
        voter_id,
        is_ai,
        metadata: body.metadata,
    };

    match state.engine.submit_vote(&request).await {
        Ok(weight) => (
            StatusCode::OK,
            Json(SubmitVoteResponse {
                success: true,
                weight_assigned: Some(weight),
                error: None,
            }),
        ),
        Err(e) => {
            let status = match &e {
                Error::Validation(_) => StatusCode::BAD_REQUEST,
                Error::NotFound(_) => StatusCode::NOT_FOUND,
                _ => {
                    error!("Vote submission failed: {}", e);
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            error_response(status, &e.to_string())
        }
    }
}

fn error_response(
    status: StatusCode,
    message: &str,
) -> (StatusCode, Json<SubmitVoteResponse>) {
    (
        status,
        Json(SubmitVoteResponse {
            success: false,
            weight_assigned: None,
            error: Some(message.to_string()),
        }),
    )
}
