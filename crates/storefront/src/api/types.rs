//! Wire types for the commerce backend API.
//!
//! Shapes mirror the backend's JSON exactly; money amounts travel as decimal
//! strings and deserialize into [`Decimal`]. Display concerns (currency
//! conversion, grouping) live in [`crate::currency`], not here.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use driftmarket_core::{AddressId, CategoryId, OrderId, OrderStatus, PaymentStatus, ProductId, UserId};

// =============================================================================
// Catalog
// =============================================================================

/// A product category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub parent: Option<CategoryId>,
}

/// A full product as served by the catalog endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub base_price: Decimal,
    pub sku: String,
    #[serde(default)]
    pub images: Option<String>,
    #[serde(default)]
    pub gallery: Vec<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub shipping_time_min_days: Option<u32>,
    #[serde(default)]
    pub shipping_time_max_days: Option<u32>,
    #[serde(default)]
    pub avg_rating: Option<f64>,
}

/// Slim product reference embedded in cart lines, order items, and wishlists.
///
/// Display-only: the cart does not own product data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: ProductId,
    pub sku: String,
    pub title: String,
    #[serde(default)]
    pub primary_image: Option<String>,
}

// =============================================================================
// Cart
// =============================================================================

/// One cart line: a product reference plus quantity and a price snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: ProductRef,
    pub quantity: u32,
    /// Unit price at the time of the last server fetch. Only used
    /// client-side for optimistic total estimates.
    #[serde(with = "rust_decimal::serde::str")]
    pub unit_price: Decimal,
}

impl CartLine {
    /// Line subtotal (unit price x quantity).
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// The cart as served by `GET /cart/` and every cart mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CartSnapshot {
    #[serde(default)]
    pub items: Vec<CartLine>,
    /// Server-computed total. May be absent, in which case it is derived.
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub total: Option<Decimal>,
}

impl CartSnapshot {
    /// An empty cart.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: None,
        }
    }

    /// Sum of line subtotals.
    #[must_use]
    pub fn derived_total(&self) -> Decimal {
        self.items.iter().map(CartLine::subtotal).sum()
    }

    /// The server total when present, otherwise the derived total.
    #[must_use]
    pub fn total_or_derived(&self) -> Decimal {
        self.total.unwrap_or_else(|| self.derived_total())
    }

    /// Find the line for a product, if present.
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.items.iter().find(|l| l.product.id == product_id)
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|l| l.quantity).sum()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Body for `POST /cart/` and `PATCH /cart/`.
#[derive(Debug, Serialize)]
pub struct CartLinePayload {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body for `DELETE /cart/`.
#[derive(Debug, Serialize)]
pub struct CartRemovePayload {
    pub product_id: ProductId,
}

// =============================================================================
// Addresses
// =============================================================================

/// A saved address as returned by `GET /addresses/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl Address {
    /// Whether the five required fields are all non-blank.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        required_fields_complete(
            &self.address_line1,
            &self.city,
            &self.state,
            &self.postal_code,
            &self.country,
        )
    }
}

/// An inline address draft entered during checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AddressDraft {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl AddressDraft {
    /// Whether the five required fields are all non-blank.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        required_fields_complete(
            &self.address_line1,
            &self.city,
            &self.state,
            &self.postal_code,
            &self.country,
        )
    }
}

fn required_fields_complete(
    line1: &str,
    city: &str,
    state: &str,
    postal_code: &str,
    country: &str,
) -> bool {
    [line1, city, state, postal_code, country]
        .iter()
        .all(|f| !f.trim().is_empty())
}

// =============================================================================
// Authentication
// =============================================================================

/// The signed-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub is_staff: Option<bool>,
}

// =============================================================================
// Checkout & Payment
// =============================================================================

/// Supported payment providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    #[default]
    Stripe,
    Paypal,
    Esewa,
    Khalti,
}

impl PaymentProvider {
    /// All providers, in display order.
    pub const ALL: [Self; 4] = [Self::Stripe, Self::Paypal, Self::Esewa, Self::Khalti];
}

impl std::fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Stripe => "stripe",
            Self::Paypal => "paypal",
            Self::Esewa => "esewa",
            Self::Khalti => "khalti",
        };
        f.write_str(s)
    }
}

/// Off-site payment hop via an auto-submitted form POST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentForm {
    pub url: String,
    #[serde(default)]
    pub method: Option<String>,
    /// Hidden input name/value pairs. `BTreeMap` keeps rendering order stable.
    #[serde(default)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl PaymentForm {
    /// The HTTP method, defaulting to POST.
    #[must_use]
    pub fn method(&self) -> String {
        self.method
            .as_deref()
            .map_or_else(|| "POST".to_string(), str::to_uppercase)
    }
}

/// Payment instructions returned by order creation. Read-only to the client.
///
/// At most one of `payment_url` / `payment_form` is present; both absent
/// means the order is finalized without further action.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PaymentIntent {
    #[serde(default)]
    pub provider: Option<PaymentProvider>,
    #[serde(default)]
    pub payment_url: Option<String>,
    #[serde(default)]
    pub payment_form: Option<PaymentForm>,
}

/// Shipping/billing reference in the order-creation payload: a saved address
/// id, or the inline draft itself.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AddressPayload {
    Saved(AddressId),
    Inline(AddressDraft),
}

/// Body for `POST /checkout/`.
#[derive(Debug, Serialize)]
pub struct CheckoutPayload {
    pub shipping_address: AddressPayload,
    pub billing_address: AddressPayload,
    pub provider: PaymentProvider,
    /// Passed through unvalidated; the backend owns coupon semantics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
}

/// Response from `POST /checkout/`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutResponse {
    pub order_id: OrderId,
    #[serde(default)]
    pub payment_intent: Option<PaymentIntent>,
}

// =============================================================================
// Orders
// =============================================================================

/// One line of a placed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub product: ProductRef,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub unit_price: Decimal,
}

/// A placed order as served by `GET /orders/` and order tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_amount: Decimal,
    pub placed_at: DateTime<Utc>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

// =============================================================================
// Wishlist
// =============================================================================

/// One wishlist entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WishlistItem {
    pub product: ProductRef,
    #[serde(default)]
    pub added_at: Option<DateTime<Utc>>,
}

/// The signed-in user's wishlist.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Wishlist {
    #[serde(default)]
    pub items: Vec<WishlistItem>,
}

// =============================================================================
// Envelopes
// =============================================================================

/// DRF-style pagination envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Some list endpoints return a bare array, others a pagination envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope<T> {
    Paginated(Paginated<T>),
    Plain(Vec<T>),
}

impl<T> ListEnvelope<T> {
    /// Flatten either shape into the item list.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Paginated(page) => page.results,
            Self::Plain(items) => items,
        }
    }
}
