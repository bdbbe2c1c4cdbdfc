//! CityFashion admin API client.
//!
//! Every management call takes the admin bearer token explicitly; the
//! session store owns token state. Error bodies are decoded the same way
//! as on the storefront side (`{"message"}`, else raw text, else the
//! status line), prefixed so admin failures are recognisable in logs.

mod types;

pub use types::*;

use std::sync::Arc;

use reqwest::{Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;

use cityfashion_core::{CategoryId, CustomerId, HeroSlideId, OrderId, OrderStatus, ProductId};

use crate::config::AdminConfig;

/// Errors that can occur when calling the admin API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("Admin API error ({}): {message}", .status.as_u16())]
    Status {
        status: StatusCode,
        message: String,
    },
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

/// Client for the CityFashion admin API.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    http: reqwest::Client,
    base_url: String,
}

impl AdminClient {
    /// Create a client from configuration.
    #[must_use]
    pub fn new(config: &AdminConfig) -> Self {
        Self::from_base_url(config.api_base_url.clone())
    }

    /// Create a client against an explicit base URL (tests, tooling).
    #[must_use]
    pub fn from_base_url(base_url: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(AdminClientInner {
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

    /// Exchange credentials for a token via `POST /auth/admin/login`.
    ///
    /// # Errors
    ///
    /// A non-2xx response surfaces as [`ApiError::Status`] carrying the
    /// server's message (wrong password, unknown user, ...).
    pub async fn login(
        &self,
        user_id: &str,
        password: &SecretString,
    ) -> Result<LoginResponse, ApiError> {
        let response = self
            .inner
            .http
            .post(self.endpoint("/auth/admin/login"))
            .json(&json!({
                "userId": user_id,
                "password": password.expose_secret(),
            }))
            .send()
            .await?;
        json_body(response).await
    }

    /// The signed-in administrator's profile.
    ///
    /// # Errors
    ///
    /// `ApiError::Status` with 401/403 means the token is no longer valid.
    pub async fn me(&self, token: &str) -> Result<AdminProfile, ApiError> {
        let response = self
            .inner
            .http
            .get(self.endpoint("/admin/me"))
            .bearer_auth(token)
            .send()
            .await?;
        json_body(response).await
    }

    /// Best-effort server-side logout.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; callers log and move on.
    pub async fn sign_out(&self, token: &str) -> Result<(), ApiError> {
        let response = self
            .inner
            .http
            .post(self.endpoint("/auth/admin/logout"))
            .bearer_auth(token)
            .send()
            .await?;
        expect_success(response).await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Products
    // ─────────────────────────────────────────────────────────────────────

    /// All products, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn products(&self, token: &str) -> Result<Vec<AdminProduct>, ApiError> {
        self.get_json(token, "/admin/products").await
    }

    /// One product by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the id is unknown.
    pub async fn product(&self, token: &str, id: ProductId) -> Result<AdminProduct, ApiError> {
        self.get_json(token, &format!("/admin/products/{id}")).await
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or validation rejects it.
    pub async fn create_product(
        &self,
        token: &str,
        input: &ProductInput,
    ) -> Result<AdminProduct, ApiError> {
        self.post_json(token, "/admin/products", input).await
    }

    /// Update a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or validation rejects it.
    pub async fn update_product(
        &self,
        token: &str,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<AdminProduct, ApiError> {
        self.put_json(token, &format!("/admin/products/{id}"), input)
            .await
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete_product(&self, token: &str, id: ProductId) -> Result<(), ApiError> {
        self.delete(token, &format!("/admin/products/{id}")).await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Categories
    // ─────────────────────────────────────────────────────────────────────

    /// All categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn categories(&self, token: &str) -> Result<Vec<AdminCategory>, ApiError> {
        self.get_json(token, "/admin/categories").await
    }

    /// One category by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the id is unknown.
    pub async fn category(&self, token: &str, id: CategoryId) -> Result<AdminCategory, ApiError> {
        self.get_json(token, &format!("/admin/categories/{id}"))
            .await
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or validation rejects it.
    pub async fn create_category(
        &self,
        token: &str,
        input: &CategoryInput,
    ) -> Result<AdminCategory, ApiError> {
        self.post_json(token, "/admin/categories", input).await
    }

    /// Update a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or validation rejects it.
    pub async fn update_category(
        &self,
        token: &str,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<AdminCategory, ApiError> {
        self.put_json(token, &format!("/admin/categories/{id}"), input)
            .await
    }

    /// Delete a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete_category(&self, token: &str, id: CategoryId) -> Result<(), ApiError> {
        self.delete(token, &format!("/admin/categories/{id}")).await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Hero slides
    // ─────────────────────────────────────────────────────────────────────

    /// All hero slides, including inactive ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn hero_slides(&self, token: &str) -> Result<Vec<AdminHeroSlide>, ApiError> {
        self.get_json(token, "/admin/hero").await
    }

    /// One hero slide by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the id is unknown.
    pub async fn hero_slide(
        &self,
        token: &str,
        id: HeroSlideId,
    ) -> Result<AdminHeroSlide, ApiError> {
        self.get_json(token, &format!("/admin/hero/{id}")).await
    }

    /// Create a hero slide.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or validation rejects it.
    pub async fn create_hero_slide(
        &self,
        token: &str,
        input: &HeroSlideInput,
    ) -> Result<AdminHeroSlide, ApiError> {
        self.post_json(token, "/admin/hero", input).await
    }

    /// Update a hero slide.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or validation rejects it.
    pub async fn update_hero_slide(
        &self,
        token: &str,
        id: HeroSlideId,
        input: &HeroSlideInput,
    ) -> Result<AdminHeroSlide, ApiError> {
        self.put_json(token, &format!("/admin/hero/{id}"), input)
            .await
    }

    /// Delete a hero slide.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete_hero_slide(&self, token: &str, id: HeroSlideId) -> Result<(), ApiError> {
        self.delete(token, &format!("/admin/hero/{id}")).await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Orders
    // ─────────────────────────────────────────────────────────────────────

    /// One page of orders matching the filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn orders(
        &self,
        token: &str,
        filter: &OrderFilter,
    ) -> Result<AdminOrderPage, ApiError> {
        let response = self
            .inner
            .http
            .get(self.endpoint("/admin/orders"))
            .bearer_auth(token)
            .query(&filter.to_pairs())
            .send()
            .await?;
        json_body(response).await
    }

    /// One order by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the id is unknown.
    pub async fn order(&self, token: &str, id: OrderId) -> Result<AdminOrder, ApiError> {
        self.get_json(token, &format!("/admin/orders/{id}")).await
    }

    /// Move an order to a new status.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the transition is invalid.
    pub async fn update_order_status(
        &self,
        token: &str,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<AdminOrder, ApiError> {
        self.put_json(
            token,
            &format!("/admin/orders/{id}/status"),
            &json!({ "status": status }),
        )
        .await
    }

    /// Attach or update tracking details on an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn update_order_tracking(
        &self,
        token: &str,
        id: OrderId,
        tracking: &TrackingUpdate,
    ) -> Result<AdminOrder, ApiError> {
        self.put_json(token, &format!("/admin/orders/{id}/tracking"), tracking)
            .await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Customers & stats
    // ─────────────────────────────────────────────────────────────────────

    /// All customers.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn customers(&self, token: &str) -> Result<Vec<AdminCustomer>, ApiError> {
        self.get_json(token, "/admin/customers").await
    }

    /// One customer by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the id is unknown.
    pub async fn customer(&self, token: &str, id: CustomerId) -> Result<AdminCustomer, ApiError> {
        self.get_json(token, &format!("/admin/customers/{id}"))
            .await
    }

    /// A customer's order history.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn customer_orders(
        &self,
        token: &str,
        id: CustomerId,
    ) -> Result<Vec<AdminOrder>, ApiError> {
        self.get_json(token, &format!("/admin/customers/{id}/orders"))
            .await
    }

    /// Dashboard stats.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn stats(&self, token: &str) -> Result<AdminStats, ApiError> {
        self.get_json(token, "/admin/stats").await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Image upload
    // ─────────────────────────────────────────────────────────────────────

    /// Upload an image via the signed-URL flow and return its public URL.
    ///
    /// Asks the API for a signed upload slot, PUTs the bytes there, and
    /// hands back the final image URL for use in product/hero inputs.
    ///
    /// # Errors
    ///
    /// Returns an error if either step fails.
    pub async fn upload_image(
        &self,
        token: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ApiError> {
        let signed: SignedUpload = self
            .post_json(token, "/upload/image", &json!({ "fileType": content_type }))
            .await?;

        let response = self
            .inner
            .http
            .put(&signed.upload_url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;
        expect_success(response).await?;

        Ok(signed.image_url)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Request plumbing
    // ─────────────────────────────────────────────────────────────────────

    async fn get_json<T: DeserializeOwned>(&self, token: &str, path: &str) -> Result<T, ApiError> {
        let response = self
            .inner
            .http
            .get(self.endpoint(path))
            .bearer_auth(token)
            .send()
            .await?;
        json_body(response).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        body: &impl serde::Serialize,
    ) -> Result<T, ApiError> {
        let response = self
            .inner
            .http
            .post(self.endpoint(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        json_body(response).await
    }

    async fn put_json<T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        body: &impl serde::Serialize,
    ) -> Result<T, ApiError> {
        let response = self
            .inner
            .http
            .put(self.endpoint(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        json_body(response).await
    }

    async fn delete(&self, token: &str, path: &str) -> Result<(), ApiError> {
        let response = self
            .inner
            .http
            .delete(self.endpoint(path))
            .bearer_auth(token)
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
            error_message(StatusCode::UNAUTHORIZED, r#"{"message":"Invalid password"}"#),
            "Invalid password"
        );
    }

    #[test]
    fn test_error_message_falls_back_to_body_then_status() {
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "upstream down"),
            "upstream down"
        );
        assert_eq!(error_message(StatusCode::NOT_FOUND, ""), "Not Found");
    }

    #[test]
    fn test_error_display_is_prefixed() {
        let err = ApiError::Status {
            status: StatusCode::UNAUTHORIZED,
            message: "Invalid password".into(),
        };
        assert_eq!(
            err.to_string(),
            "Admin API error (401): Invalid password"
        );
    }
}
