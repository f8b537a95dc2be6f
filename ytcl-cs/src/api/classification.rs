//! Classification endpoints for the host client
//!
//! GET /classification is the remote half of the client's hide decision:
//! it runs the tiered resolver and reports the verdict, "unknown" included.
//! GET /channels/flagged lists the newest AI-flagged channels for review.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use ytcl_common::Classification;

use crate::db::predictions::{self, FlaggedChannel};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ClassificationParams {
    pub identifier: Option<String>,
    pub channel_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClassificationResponse {
    pub classification: Classification,
}

/// GET /classification?identifier=<id>&channel_id=<optional>
///
/// Resolution never fails once inputs are present; outages inside the
/// chain surface as "unknown", which the client treats as "do not hide".
pub async fn get_classification(
    State(state): State<AppState>,
    Query(params): Query<ClassificationParams>,
) -> Result<Json<ClassificationResponse>, (StatusCode, Json<serde_json::Value>)> {
    let identifier = params.identifier.as_deref().unwrap_or_default();
    let channel_id = params.channel_id.as_deref();

    if identifier.trim().is_empty() && channel_id.map_or(true, |id| id.trim().is_empty()) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "identifier or channel_id is required"})),
        ));
    }

    let classification = state.resolver.resolve(identifier, channel_id).await;

    Ok(Json(ClassificationResponse { classification }))
}

#[derive(Debug, Deserialize)]
pub struct FlaggedParams {
    pub limit: Option<i64>,
    pub min_confidence: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct FlaggedChannelsResponse {
    pub channels: Vec<FlaggedChannel>,
}

/// GET /channels/flagged?limit=<n>&min_confidence=<f>
pub async fn list_flagged_channels(
    State(state): State<AppState>,
    Query(params): Query<FlaggedParams>,
) -> Result<Json<FlaggedChannelsResponse>, (StatusCode, Json<serde_json::Value>)> {
    let limit = params.limit.unwrap_or(100).clamp(1, 1000);
    let min_confidence = params.min_confidence.unwrap_or(0.0).clamp(0.0, 1.0);

    match predictions::list_flagged(&state.db, limit, min_confidence).await {
        Ok(channels) => Ok(Json(FlaggedChannelsResponse { channels })),
        Err(e) => {
            error!("Failed to list flagged channels: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            ))
        }
    }
}
