//! Account-scoped endpoints: addresses, orders, wishlist.

use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use driftmarket_core::{OrderId, ProductId};

use super::types::{Address, AddressDraft, ListEnvelope, Order, Paginated, Wishlist};
use super::{ApiClient, ApiError};

/// Body for `POST /order-tracking/`.
#[derive(Serialize)]
struct TrackOrderPayload<'a> {
    order_id: OrderId,
    email: &'a str,
}

/// Body for `POST /wishlist/`.
#[derive(Serialize)]
struct WishlistAddPayload {
    product_id: ProductId,
}

impl ApiClient {
    // =========================================================================
    // Addresses
    // =========================================================================

    /// Fetch the signed-in user's saved addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn addresses(&self) -> Result<Vec<Address>, ApiError> {
        let envelope: ListEnvelope<Address> = self.get_json("addresses/").await?;
        Ok(envelope.into_vec())
    }

    /// Save a new address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, draft))]
    pub async fn create_address(&self, draft: &AddressDraft) -> Result<Address, ApiError> {
        self.request_json(Method::POST, "addresses/", draft).await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Fetch the signed-in user's order history.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn orders(&self) -> Result<Paginated<Order>, ApiError> {
        self.get_json("orders/").await
    }

    /// Look up an order by id and purchase email (works for guests).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` when the pair does not match an order.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn track_order(&self, order_id: OrderId, email: &str) -> Result<Order, ApiError> {
        self.request_json(
            Method::POST,
            "order-tracking/",
            &TrackOrderPayload { order_id, email },
        )
        .await
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    /// Fetch the signed-in user's wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn wishlist(&self) -> Result<Wishlist, ApiError> {
        self.get_json("wishlist/").await
    }

    /// Add a product to the wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_to_wishlist(&self, product_id: ProductId) -> Result<Wishlist, ApiError> {
        self.request_json(Method::POST, "wishlist/", &WishlistAddPayload { product_id })
            .await
    }

    /// Remove a product from the wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_from_wishlist(&self, product_id: ProductId) -> Result<(), ApiError> {
        self.request_empty::<()>(
            Method::DELETE,
            &format!("wishlist/items/{product_id}/"),
            None,
        )
        .await
    }
}
