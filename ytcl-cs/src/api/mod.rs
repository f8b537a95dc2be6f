//! HTTP API handlers for ytcl-cs

pub mod auth;
pub mod candidates;
pub mod classification;
pub mod health;
pub mod votes;

pub use auth::auth_middleware;
pub use candidates::next_candidate;
pub use classification::{get_classification, list_flagged_channels};
pub use health::health_routes;
pub use votes::submit_vote;
