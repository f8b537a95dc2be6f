//! API token management and validation
//!
//! Protected endpoints require a static shared token in the
//! `x-labeler-token` request header. The token is stored in the database
//! settings table; on first run it is seeded from the `YTCL_API_TOKEN`
//! environment variable, or generated randomly when the variable is unset.
//! An empty token disables auth checking (used by tests).
//!
//! This module contains only pure functions and database operations - no
//! HTTP framework dependencies. The Axum middleware lives with the service.

use crate::db::settings::{get_setting, set_setting};
use crate::{Error, Result};
use sqlx::SqlitePool;

/// Request header carrying the shared token
pub const TOKEN_HEADER: &str = "x-labeler-token";

/// Settings table key holding the shared token
pub const TOKEN_SETTING_KEY: &str = "labeler_api_token";

/// Environment variable consulted when seeding a fresh database
pub const TOKEN_ENV_VAR: &str = "YTCL_API_TOKEN";

/// Length of a generated token
const GENERATED_TOKEN_LEN: usize = 40;

/// Load the shared API token from database settings
///
/// Generates and stores a token if none is present yet.
pub async fn load_api_token(db: &SqlitePool) -> Result<String> {
    match get_setting::<String>(db, TOKEN_SETTING_KEY).await? {
        Some(token) => Ok(token),
        None => initialize_api_token(db).await,
    }
}

/// Initialize the shared API token if not present
///
/// Prefers `YTCL_API_TOKEN` from the environment; otherwise generates a
/// random alphanumeric token.
pub async fn initialize_api_token(db: &SqlitePool) -> Result<String> {
    let token = match std::env::var(TOKEN_ENV_VAR) {
        Ok(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => generate_token(),
    };

    set_setting(db, TOKEN_SETTING_KEY, token.clone()).await?;

    Ok(token)
}

/// Generate a random alphanumeric token
pub fn generate_token() -> String {
    use rand::distributions::Alphanumeric;
    use rand::Rng;

    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Validate a request token against the expected one
///
/// An empty expected token disables auth checking entirely.
pub fn validate_token(expected: &str, provided: Option<&str>) -> Result<()> {
    if expected.is_empty() {
        return Ok(());
    }

    match provided {
        Some(token) if token == expected => Ok(()),
        Some(_) => Err(Error::Auth("invalid labeler token".to_string())),
        None => Err(Error::Auth("missing labeler token".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();

        crate::db::init::create_settings_table(&pool).await.unwrap();

        pool
    }

    #[tokio::test]
    async fn test_token_generated_and_persisted() {
        let db = setup_test_db().await;

        let first = load_api_token(&db).await.unwrap();
        assert!(!first.is_empty());

        // Second load returns the stored token, not a fresh one
        let second = load_api_token(&db).await.unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_generated_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), GENERATED_TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));

        // Vanishingly unlikely to collide
        assert_ne!(token, generate_token());
    }

    #[test]
    fn test_validate_token() {
        assert!(validate_token("secret", Some("secret")).is_ok());
        assert!(validate_token("secret", Some("wrong")).is_err());
        assert!(validate_token("secret", None).is_err());
    }

    #[test]
    fn test_empty_expected_token_disables_auth() {
        assert!(validate_token("", None).is_ok());
        assert!(validate_token("", Some("anything")).is_ok());
    }
}
