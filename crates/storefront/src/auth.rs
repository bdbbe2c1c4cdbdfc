//! Shopper session.
//!
//! Shoppers sign in through the API's Google redirect flow: the browser is
//! sent to [`StoreClient::google_login_url`], Google bounces back to the
//! app with a `token` query parameter, and [`parse_oauth_callback`] pulls
//! it out. Installing that token (profile still unknown) is the login;
//! the session store hydrates the profile from `GET /profile` afterwards.

use thiserror::Error;

use cityfashion_core::session::{AuthBackend, ProfileError, SessionStore};
use cityfashion_core::storage::SharedStorage;

use crate::api::{ApiError, ShopperProfile, StoreClient};

/// Storage key for the persisted shopper session.
pub const SHOPPER_SESSION_KEY: &str = "cityfashion_auth_v1";

/// The shopper-flavoured session store.
pub type ShopperSession = SessionStore<ShopperAuthBackend>;

/// Build the shopper session store. Call `load()` on the result to pick up
/// a persisted session.
#[must_use]
pub fn shopper_session(client: StoreClient, storage: SharedStorage) -> ShopperSession {
    SessionStore::new(ShopperAuthBackend { client }, storage, SHOPPER_SESSION_KEY)
}

/// Auth backend over the storefront API.
pub struct ShopperAuthBackend {
    client: StoreClient,
}

impl AuthBackend for ShopperAuthBackend {
    type Profile = ShopperProfile;

    async fn fetch_profile(&self, token: &str) -> Result<ShopperProfile, ProfileError> {
        self.client.get_profile(token).await.map_err(profile_error)
    }

    async fn revoke(&self, token: &str) -> Result<(), ProfileError> {
        self.client.sign_out(token).await.map_err(profile_error)
    }
}

fn profile_error(err: ApiError) -> ProfileError {
    if err.is_unauthorized() {
        ProfileError::Unauthorized
    } else {
        ProfileError::Transient(err.to_string())
    }
}

/// Failure modes of the OAuth callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OAuthCallbackError {
    /// The API reported a provider-side failure (`oauth_failed`,
    /// `missing_code`, ...).
    #[error("google sign-in failed: {0}")]
    Provider(String),

    /// The callback carried neither a token nor an error code.
    #[error("callback did not include a token")]
    MissingToken,
}

/// Extract the bearer token from an OAuth callback query string.
///
/// Accepts the query with or without the leading `?`. A `token` parameter
/// wins over an `error` parameter, matching the API's redirect contract.
///
/// # Errors
///
/// Returns [`OAuthCallbackError`] when the callback reports a failure or
/// carries no token.
pub fn parse_oauth_callback(query: &str) -> Result<String, OAuthCallbackError> {
    let trimmed = query.trim_start_matches('?');
    let mut token = None;
    let mut error = None;
    for (key, value) in url::form_urlencoded::parse(trimmed.as_bytes()) {
        match key.as_ref() {
            "token" => token = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(token) = token.filter(|t| !t.is_empty()) {
        return Ok(token);
    }
    match error {
        Some(code) => Err(OAuthCallbackError::Provider(code)),
        None => Err(OAuthCallbackError::MissingToken),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_callback_with_token() {
        assert_eq!(
            parse_oauth_callback("?token=abc123").unwrap(),
            "abc123"
        );
        assert_eq!(parse_oauth_callback("token=abc123").unwrap(), "abc123");
    }

    #[test]
    fn test_callback_token_wins_over_error() {
        assert_eq!(
            parse_oauth_callback("?error=oauth_failed&token=abc").unwrap(),
            "abc"
        );
    }

    #[test]
    fn test_callback_error_code() {
        assert_eq!(
            parse_oauth_callback("?error=missing_code"),
            Err(OAuthCallbackError::Provider("missing_code".into()))
        );
    }

    #[test]
    fn test_callback_empty_query() {
        assert_eq!(
            parse_oauth_callback(""),
            Err(OAuthCallbackError::MissingToken)
        );
        assert_eq!(
            parse_oauth_callback("?token="),
            Err(OAuthCallbackError::MissingToken)
        );
    }

    #[test]
    fn test_callback_decodes_percent_encoding() {
        assert_eq!(
            parse_oauth_callback("?token=a%2Bb%3D").unwrap(),
            "a+b="
        );
    }

    #[test]
    fn test_profile_error_mapping() {
        let unauthorized = ApiError::Status {
            status: StatusCode::UNAUTHORIZED,
            message: "expired".into(),
        };
        assert!(matches!(
            profile_error(unauthorized),
            ProfileError::Unauthorized
        ));

        let flaky = ApiError::Status {
            status: StatusCode::BAD_GATEWAY,
            message: "upstream".into(),
        };
        assert!(matches!(profile_error(flaky), ProfileError::Transient(_)));
    }
}
