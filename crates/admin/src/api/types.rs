//! Wire types for the admin management API.
//!
//! Field names mirror the API's camelCase JSON.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cityfashion_core::{CategoryId, CustomerId, HeroSlideId, OrderId, OrderStatus, ProductId, UserId};

/// Response of `POST /auth/admin/login`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    /// May be omitted; the session hydrates it from `/admin/me` later.
    #[serde(default)]
    pub user: Option<AdminProfile>,
}

/// The signed-in administrator, from login or `/admin/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    #[serde(default)]
    pub id: Option<UserId>,
    /// Login identifier, distinct from the display name.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// A product as listed in the admin console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProduct {
    pub id: ProductId,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub product_images: Vec<AdminProductImage>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// An image attached to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProductImage {
    pub url: String,
}

/// Create/update payload for a product.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    /// Image URLs, typically produced by the signed upload flow.
    #[serde(default)]
    pub images: Vec<String>,
    pub active: bool,
}

/// A category as managed in the admin console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCategory {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Create/update payload for a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A hero carousel slide as managed in the admin console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminHeroSlide {
    pub id: HeroSlideId,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub badge: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    pub image: String,
    #[serde(default)]
    pub cta: Option<HeroCta>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub sort_order: Option<i32>,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// Call-to-action on a hero slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroCta {
    pub label: String,
    pub href: String,
}

/// Create/update payload for a hero slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct HeroSlideInput {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cta: Option<HeroCta>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
    pub active: bool,
}

/// Customer reference embedded in an order row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRef {
    #[serde(default)]
    pub id: Option<CustomerId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// One order row in the admin console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrder {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: OrderStatus,
    pub total_amount: Decimal,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub customer: Option<CustomerRef>,
    #[serde(default)]
    pub tracking_code: Option<String>,
    #[serde(default)]
    pub tracking_carrier: Option<String>,
}

/// One page of the admin order listing (`{"data": [...], "total": n}`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AdminOrderPage {
    #[serde(default)]
    pub data: Vec<AdminOrder>,
    #[serde(default)]
    pub total: u64,
}

/// Filters for the admin order listing.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl OrderFilter {
    pub(crate) fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.to_string()));
        }
        if let Some(from) = self.from {
            pairs.push(("from", from.to_string()));
        }
        if let Some(to) = self.to {
            pairs.push(("to", to.to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            pairs.push(("pageSize", page_size.to_string()));
        }
        pairs
    }
}

/// Tracking details for `PUT /admin/orders/{id}/tracking`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TrackingUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_carrier: Option<String>,
}

/// A customer as shown in the admin console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCustomer {
    pub id: CustomerId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address_line: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Dashboard stats from `/admin/stats`.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    #[serde(default)]
    pub total_products: u64,
    #[serde(default)]
    pub total_orders: u64,
    #[serde(default)]
    pub total_customers: u64,
    #[serde(default)]
    pub total_revenue: Decimal,
    #[serde(default)]
    pub pending_orders: u64,
    #[serde(default)]
    pub recent_orders: Vec<AdminOrder>,
}

/// Response of `POST /upload/image`: where to PUT the bytes, and the
/// public URL the image will have afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUpload {
    pub upload_url: String,
    pub image_url: String,
}

fn default_true() -> bool {
    true
}
