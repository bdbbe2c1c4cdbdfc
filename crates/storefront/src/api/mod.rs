//! CityFashion storefront API client.
//!
//! Plain REST/JSON over `reqwest`. Authenticated calls take the bearer
//! token explicitly; the client itself holds no session state (the session
//! store owns that).
//!
//! # Errors
//!
//! Non-2xx responses become [`ApiError::Status`] with a human-readable
//! message pulled from the body: a JSON `{"message"}` field when present,
//! else the raw body text, else the status line.

mod types;

pub use types::*;

use std::sync::Arc;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use cityfashion_core::{OrderId, ProductId};

use crate::config::StorefrontConfig;

/// Errors that can occur when calling the storefront API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("API error ({}): {message}", .status.as_u16())]
    Status {
        status: StatusCode,
        message: String,
    },

    /// A URL could not be built from the configured base.
    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Whether the API rejected the bearer token (401/403).
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::Status { status, .. }
                if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
        )
    }
}

/// Client for the CityFashion storefront API.
#[derive(Clone)]
pub struct StoreClient {
    inner: Arc<StoreClientInner>,
}

struct StoreClientInner {
    http: reqwest::Client,
    base_url: String,
}

impl StoreClient {
    /// Create a client from configuration.
    #[must_use]
    pub fn new(config: &StorefrontConfig) -> Self {
        Self::from_base_url(config.api_base_url.clone())
    }

    /// Create a client against an explicit base URL (tests, tooling).
    #[must_use]
    pub fn from_base_url(base_url: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(StoreClientInner {
                http: reqwest::Client::new(),
                base_url: base_url.into(),
            }),
        }
    }

    /// The configured API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Auth
    // ─────────────────────────────────────────────────────────────────────

    /// URL that starts the Google sign-in redirect flow.
    ///
    /// The API sends the browser to Google and back to `redirect` with a
    /// `token` (or `error`) query parameter; feed that query string to
    /// [`parse_oauth_callback`](crate::auth::parse_oauth_callback).
    ///
    /// # Errors
    ///
    /// Returns an error if the configured base URL cannot be extended.
    pub fn google_login_url(&self, redirect: &str) -> Result<String, ApiError> {
        let mut url = Url::parse(&self.endpoint("/auth/google/redirect"))?;
        url.query_pairs_mut().append_pair("redirect", redirect);
        Ok(url.into())
    }

    /// Best-effort shopper sign-out: server-side token invalidation plus
    /// revocation of any single-sign-on auto-select state.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; callers treat this as
    /// advisory and log it.
    pub async fn sign_out(&self, token: &str) -> Result<(), ApiError> {
        let response = self
            .inner
            .http
            .post(self.endpoint("/auth/logout"))
            .bearer_auth(token)
            .send()
            .await?;
        expect_success(response).await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Profile
    // ─────────────────────────────────────────────────────────────────────

    /// Fetch the signed-in shopper's profile.
    ///
    /// # Errors
    ///
    /// `ApiError::Status` with 401/403 means the token is no longer valid.
    pub async fn get_profile(&self, token: &str) -> Result<ShopperProfile, ApiError> {
        let response = self
            .inner
            .http
            .get(self.endpoint("/profile"))
            .bearer_auth(token)
            .send()
            .await?;
        json_body(response).await
    }

    /// Update the shopper's profile, returning the stored result.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects the update.
    pub async fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<ShopperProfile, ApiError> {
        let response = self
            .inner
            .http
            .put(self.endpoint("/profile"))
            .bearer_auth(token)
            .json(update)
            .send()
            .await?;
        json_body(response).await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Catalog
    // ─────────────────────────────────────────────────────────────────────

    /// One page of the product listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn products(&self, query: &ProductQuery) -> Result<ProductPage, ApiError> {
        let response = self
            .inner
            .http
            .get(self.endpoint("/store/products"))
            .query(&query.to_pairs())
            .send()
            .await?;
        json_body(response).await
    }

    /// Fetch specific products by id. Used by the cart to refresh stock for
    /// its current lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, ApiError> {
        let joined = ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let response = self
            .inner
            .http
            .get(self.endpoint("/store/products"))
            .query(&[("ids", joined)])
            .send()
            .await?;
        let page: ProductPage = json_body(response).await?;
        Ok(page.products)
    }

    /// Fetch a single product by slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the product is unknown.
    pub async fn product_by_slug(&self, slug: &str) -> Result<Product, ApiError> {
        let response = self
            .inner
            .http
            .get(self.endpoint(&format!("/store/products/{slug}")))
            .send()
            .await?;
        json_body(response).await
    }

    /// Products related to the given one.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn related_products(&self, id: ProductId) -> Result<Vec<Product>, ApiError> {
        let response = self
            .inner
            .http
            .get(self.endpoint(&format!("/store/products/related/{id}")))
            .send()
            .await?;
        json_body(response).await
    }

    /// All store categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        let response = self
            .inner
            .http
            .get(self.endpoint("/store/categories"))
            .send()
            .await?;
        json_body(response).await
    }

    /// One category with its products.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the category is unknown.
    pub async fn category_by_slug(&self, slug: &str) -> Result<Category, ApiError> {
        let response = self
            .inner
            .http
            .get(self.endpoint(&format!("/store/categories/{slug}")))
            .send()
            .await?;
        json_body(response).await
    }

    /// Active hero carousel slides.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn hero_slides(&self) -> Result<Vec<HeroSlide>, ApiError> {
        let response = self
            .inner
            .http
            .get(self.endpoint("/store/hero"))
            .send()
            .await?;
        json_body(response).await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Orders & payment
    // ─────────────────────────────────────────────────────────────────────

    /// The shopper's order history, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn my_orders(&self, token: &str) -> Result<Vec<Order>, ApiError> {
        let response = self
            .inner
            .http
            .get(self.endpoint("/orders"))
            .bearer_auth(token)
            .send()
            .await?;
        json_body(response).await
    }

    /// Create a pending order and a matching payment-gateway order.
    ///
    /// The returned handle drives the external payment widget; the cart is
    /// cleared by the checkout flow only once the payment is confirmed.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects the cart.
    pub async fn create_payment_order(
        &self,
        token: &str,
        request: &CheckoutRequest,
    ) -> Result<PaymentOrder, ApiError> {
        let response = self
            .inner
            .http
            .post(self.endpoint("/payments/razorpay/order"))
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;
        json_body(response).await
    }

    /// Cancel a pending order whose payment was abandoned or failed.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; the checkout flow logs and
    /// moves on.
    pub async fn cancel_order(&self, token: &str, id: OrderId) -> Result<(), ApiError> {
        let response = self
            .inner
            .http
            .post(self.endpoint(&format!("/orders/{id}/cancel")))
            .bearer_auth(token)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        expect_success(response).await
    }
}

/// Decode a JSON body after checking the status.
async fn json_body<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    if !response.status().is_success() {
        return Err(error_from_response(response).await);
    }
    Ok(response.json().await?)
}

/// Check the status and discard the body (204-style endpoints).
async fn expect_success(response: Response) -> Result<(), ApiError> {
    if !response.status().is_success() {
        return Err(error_from_response(response).await);
    }
    Ok(())
}

async fn error_from_response(response: Response) -> ApiError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    ApiError::Status {
        status,
        message: error_message(status, &body),
    }
}

/// Extract the most useful message from an error body: a JSON `message`
/// field, else the body text, else the status line.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value.get("message").and_then(serde_json::Value::as_str)
            && !message.is_empty()
        {
            return message.to_owned();
        }
        if let Some(message) = value.as_str()
            && !message.is_empty()
        {
            return message.to_owned();
        }
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_owned();
    }
    status
        .canonical_reason()
        .unwrap_or("Unknown error")
        .to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_json_message_field() {
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"message":"Out of stock"}"#),
            "Out of stock"
        );
    }

    #[test]
    fn test_error_message_accepts_json_string_body() {
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#""plain failure""#),
            "plain failure"
        );
    }

    #[test]
    fn test_error_message_falls_back_to_raw_body() {
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "upstream exploded"),
            "upstream exploded"
        );
    }

    #[test]
    fn test_error_message_falls_back_to_status_line() {
        assert_eq!(error_message(StatusCode::NOT_FOUND, ""), "Not Found");
        assert_eq!(error_message(StatusCode::NOT_FOUND, "   "), "Not Found");
    }

    #[test]
    fn test_error_display_format() {
        let err = ApiError::Status {
            status: StatusCode::CONFLICT,
            message: "already exists".into(),
        };
        assert_eq!(err.to_string(), "API error (409): already exists");
    }

    #[test]
    fn test_is_unauthorized() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            assert!(
                ApiError::Status {
                    status,
                    message: String::new(),
                }
                .is_unauthorized()
            );
        }
        assert!(
            !ApiError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: String::new(),
            }
            .is_unauthorized()
        );
    }

    #[test]
    fn test_google_login_url_encodes_redirect() {
        let client = StoreClient::from_base_url("http://localhost:4000");
        let url = client
            .google_login_url("http://localhost:5173/oauth/callback")
            .unwrap();
        assert_eq!(
            url,
            "http://localhost:4000/auth/google/redirect?redirect=http%3A%2F%2Flocalhost%3A5173%2Foauth%2Fcallback"
        );
    }
}
