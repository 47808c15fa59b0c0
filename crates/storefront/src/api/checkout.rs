//! Order creation endpoint.

use reqwest::Method;
use tracing::instrument;

use super::types::{CheckoutPayload, CheckoutResponse};
use super::{ApiClient, ApiError};

impl ApiClient {
    /// Create an order from the current cart.
    ///
    /// The backend snapshots the cart, prices it, and returns payment
    /// instructions. The cart itself is consumed server-side on success.
    ///
    /// # Errors
    ///
    /// Returns an error if the order cannot be created (empty cart, stock
    /// changes, payment provider rejection).
    #[instrument(skip(self, payload), fields(provider = %payload.provider))]
    pub async fn create_order(
        &self,
        payload: &CheckoutPayload,
    ) -> Result<CheckoutResponse, ApiError> {
        self.request_json(Method::POST, "checkout/", payload).await
    }
}
