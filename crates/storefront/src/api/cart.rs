//! Cart endpoints (not cached - mutable state).
//!
//! These are the raw server calls; the optimistic protocol lives in
//! [`crate::cart::CartStore`], which is the only caller of the mutation
//! endpoints.

use reqwest::Method;
use tracing::instrument;

use driftmarket_core::ProductId;

use super::types::{CartLinePayload, CartRemovePayload, CartSnapshot};
use super::{ApiClient, ApiError};

impl ApiClient {
    /// Fetch the authoritative cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn fetch_cart(&self) -> Result<CartSnapshot, ApiError> {
        self.get_json("cart/").await
    }

    /// Add a line (or bump its quantity server-side).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id, quantity))]
    pub async fn add_cart_line(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartSnapshot, ApiError> {
        self.request_json(
            Method::POST,
            "cart/",
            &CartLinePayload {
                product_id,
                quantity,
            },
        )
        .await
    }

    /// Set a line's quantity.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id, quantity))]
    pub async fn update_cart_line(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartSnapshot, ApiError> {
        self.request_json(
            Method::PATCH,
            "cart/",
            &CartLinePayload {
                product_id,
                quantity,
            },
        )
        .await
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_cart_line(&self, product_id: ProductId) -> Result<CartSnapshot, ApiError> {
        self.request_json(Method::DELETE, "cart/", &CartRemovePayload { product_id })
            .await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<CartSnapshot, ApiError> {
        self.request_json(Method::POST, "cart/clear/", &serde_json::json!({}))
            .await
    }

    /// Merge the anonymous cart into the signed-in user's cart.
    ///
    /// Called after login so items picked before signing in survive.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn merge_cart(&self) -> Result<CartSnapshot, ApiError> {
        self.request_json(Method::POST, "cart/merge/", &serde_json::json!({}))
            .await
    }
}
