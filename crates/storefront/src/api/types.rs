//! Wire types for the storefront API.
//!
//! Field names mirror the API's camelCase JSON. Fields the server may omit
//! are `Option` or defaulted so older payloads keep deserialising.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cityfashion_core::{CategoryId, HeroSlideId, OrderId, OrderStatus, ProductId};

/// A catalog product as served by `/store/products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Unit price in whole rupees.
    pub price: Decimal,
    /// Available inventory; `None` means unknown / unbounded.
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub category: Option<CategoryRef>,
    #[serde(default)]
    pub product_images: Vec<ProductImage>,
}

impl Product {
    /// URL of the primary product image, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.product_images.first().map(|image| image.url.as_str())
    }
}

/// A product image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub url: String,
}

/// Category reference embedded in a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

/// One page of the paginated product listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    #[serde(default)]
    pub products: Vec<Product>,
    /// Total page count; the server reports at least one page.
    #[serde(default = "one")]
    pub pages: u32,
}

fn one() -> u32 {
    1
}

/// Filters for the product listing.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    /// Free-text search.
    pub q: Option<String>,
    /// Minimum price in rupees.
    pub min: Option<Decimal>,
    /// Maximum price in rupees.
    pub max: Option<Decimal>,
    /// Category slug.
    pub category: Option<String>,
    /// Sort key as understood by the API.
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ProductQuery {
    pub(crate) fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(q) = &self.q {
            pairs.push(("q", q.clone()));
        }
        if let Some(min) = self.min {
            pairs.push(("min", min.to_string()));
        }
        if let Some(max) = self.max {
            pairs.push(("max", max.to_string()));
        }
        if let Some(category) = &self.category {
            pairs.push(("category", category.clone()));
        }
        if let Some(sort) = &self.sort {
            pairs.push(("sort", sort.clone()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

/// A store category, with its products when fetched by slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub products: Vec<Product>,
}

/// A hero carousel slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroSlide {
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

fn default_true() -> bool {
    true
}

/// Call-to-action on a hero slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroCta {
    pub label: String,
    pub href: String,
}

/// The signed-in shopper's profile from `/profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ShopperProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address_line1: Option<String>,
    #[serde(default)]
    pub address_line2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Editable profile fields for `PUT /profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// One order in the shopper's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_method: Option<String>,
    pub total_amount: Decimal,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub razorpay_order_id: Option<String>,
    #[serde(default)]
    pub razorpay_signature: Option<String>,
    #[serde(default)]
    pub tracking_code: Option<String>,
    #[serde(default)]
    pub tracking_carrier: Option<String>,
}

/// Line item sent when creating a payment order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Shipping contact details collected at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ShippingContact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Body of `POST /payments/razorpay/order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Always `INR` today; kept explicit because the API requires it.
    pub currency: String,
    /// Client-generated receipt reference.
    pub receipt: String,
    pub items: Vec<CheckoutItem>,
    #[serde(flatten)]
    pub contact: ShippingContact,
}

/// The gateway order handle returned when a payment is initiated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrder {
    pub order: GatewayOrder,
    /// Public key for the payment widget.
    pub key_id: String,
    /// The pending order created on our side; cancel it if the payment is
    /// abandoned.
    pub local_order_id: OrderId,
}

/// The order as known to the payment gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayOrder {
    pub id: String,
    /// Amount in the gateway's smallest unit (paise).
    pub amount: i64,
    pub currency: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_tolerates_missing_optionals() {
        let product: Product = serde_json::from_str(
            r#"{"id":7,"title":"Linen Shirt","slug":"linen-shirt","price":1299}"#,
        )
        .unwrap();
        assert_eq!(product.id, ProductId::new(7));
        assert_eq!(product.price, Decimal::from(1299));
        assert_eq!(product.stock, None);
        assert!(product.product_images.is_empty());
        assert_eq!(product.primary_image(), None);
    }

    #[test]
    fn test_product_reads_camel_case() {
        let product: Product = serde_json::from_str(
            r#"{
                "id": 3,
                "title": "Kurta",
                "slug": "kurta",
                "price": 899,
                "stock": 12,
                "productImages": [{"url": "https://cdn.example/kurta.jpg"}]
            }"#,
        )
        .unwrap();
        assert_eq!(product.stock, Some(12));
        assert_eq!(product.primary_image(), Some("https://cdn.example/kurta.jpg"));
    }

    #[test]
    fn test_product_query_pairs() {
        let query = ProductQuery {
            q: Some("shirt".into()),
            category: Some("men".into()),
            page: Some(2),
            ..ProductQuery::default()
        };
        let pairs = query.to_pairs();
        assert_eq!(
            pairs,
            vec![
                ("q", "shirt".to_string()),
                ("category", "men".to_string()),
                ("page", "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_checkout_request_flattens_contact() {
        let request = CheckoutRequest {
            currency: "INR".into(),
            receipt: "cf-1".into(),
            items: vec![CheckoutItem {
                product_id: ProductId::new(5),
                quantity: 2,
            }],
            contact: ShippingContact {
                name: Some("Asha".into()),
                city: Some("Maddur".into()),
                ..ShippingContact::default()
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["items"][0]["productId"], 5);
        assert_eq!(value["name"], "Asha");
        assert_eq!(value["city"], "Maddur");
        assert!(value.get("phone").is_none());
    }

    #[test]
    fn test_order_status_defaults_pending() {
        let order: Order = serde_json::from_str(
            r#"{"id":11,"createdAt":"2026-02-01T09:00:00Z","totalAmount":2800}"#,
        )
        .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount, Decimal::from(2800));
    }
}
