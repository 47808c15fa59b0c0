//! Optimistic cart store.
//!
//! The cart cache is process-wide shared state: the UI renders from it, and
//! every mutation goes through the capture/apply/dispatch/resolve protocol in
//! [`CartStore::mutate`] rather than writing to it directly. That keeps
//! rollback correct no matter which call site mutates.
//!
//! Protocol, per mutation:
//!
//! 1. **Capture** the current snapshot (the rollback point).
//! 2. **Apply** the mutation to the captured snapshot and write the result
//!    into the cache before any network activity.
//! 3. **Dispatch** the server request.
//! 4. **Resolve**: on success the server snapshot replaces the cache (the
//!    server may know about price changes or stock adjustments the local
//!    guess did not); on failure the captured snapshot is restored exactly.
//! 5. **Reconcile**: fetch the authoritative cart regardless of outcome to
//!    catch drift from concurrent mutations in other tabs or devices.
//!
//! Concurrent mutations each capture their own snapshot; the last resolution
//! wins and the reconciliation fetch corrects any residue. Mutations are not
//! serialized - responsiveness is preferred over a brief window of visual
//! inconsistency.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::instrument;

use driftmarket_core::ProductId;

use crate::api::types::{CartLine, CartSnapshot};
use crate::api::{ApiClient, ApiError};
use crate::error::add_breadcrumb;

/// Shared handle to the cart cache.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    api: ApiClient,
    cache: RwLock<CartSnapshot>,
}

impl CartStore {
    /// Create a store with an empty cache.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            inner: Arc::new(CartStoreInner {
                api,
                cache: RwLock::new(CartSnapshot::empty()),
            }),
        }
    }

    /// The current cached cart. This is what the UI renders from.
    pub async fn snapshot(&self) -> CartSnapshot {
        self.inner.cache.read().await.clone()
    }

    /// Hydrate the cache from the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails; the cache is left untouched.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<CartSnapshot, ApiError> {
        let cart = self.inner.api.fetch_cart().await?;
        *self.inner.cache.write().await = cart.clone();
        Ok(cart)
    }

    /// Add a product to the cart.
    ///
    /// Not optimistic: a new line needs the server's price snapshot, so the
    /// cache is only updated from the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id, quantity))]
    pub async fn add(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartSnapshot, ApiError> {
        add_breadcrumb(
            "cart",
            "Added product to cart",
            Some(&[("product_id", &product_id.to_string())]),
        );

        let result = self.inner.api.add_cart_line(product_id, quantity).await;
        if let Ok(cart) = &result {
            *self.inner.cache.write().await = cart.clone();
        }
        self.reconcile().await;

        match result {
            Ok(_) => Ok(self.snapshot().await),
            Err(error) => Err(error),
        }
    }

    /// Set a line's quantity optimistically. A quantity of 0 removes the line.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the mutation; the cache has
    /// then already been rolled back to its pre-mutation state.
    #[instrument(skip(self), fields(product_id = %product_id, quantity))]
    pub async fn update_quantity(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartSnapshot, ApiError> {
        add_breadcrumb(
            "cart",
            "Updated line quantity",
            Some(&[("product_id", &product_id.to_string())]),
        );

        let api = self.inner.api.clone();
        self.mutate(
            |cart| apply_quantity(cart, product_id, quantity),
            async move { api.update_cart_line(product_id, quantity).await },
        )
        .await
    }

    /// Remove a line optimistically.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the mutation; the cache has
    /// then already been rolled back to its pre-mutation state.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove(&self, product_id: ProductId) -> Result<CartSnapshot, ApiError> {
        add_breadcrumb(
            "cart",
            "Removed product from cart",
            Some(&[("product_id", &product_id.to_string())]),
        );

        let api = self.inner.api.clone();
        self.mutate(
            |cart| apply_remove(cart, product_id),
            async move { api.remove_cart_line(product_id).await },
        )
        .await
    }

    /// Empty the cart on the server and locally.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<CartSnapshot, ApiError> {
        let cart = self.inner.api.clear_cart().await?;
        *self.inner.cache.write().await = cart.clone();
        Ok(cart)
    }

    /// Merge the anonymous cart into the signed-in user's cart, then adopt
    /// the merged result.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn merge(&self) -> Result<CartSnapshot, ApiError> {
        let cart = self.inner.api.merge_cart().await?;
        *self.inner.cache.write().await = cart.clone();
        Ok(cart)
    }

    /// Drop the local cache without touching the server (logout).
    pub(crate) async fn clear_local(&self) {
        *self.inner.cache.write().await = CartSnapshot::empty();
    }

    // =========================================================================
    // Protocol core
    // =========================================================================

    /// Run one mutation through capture/apply/dispatch/resolve/reconcile.
    ///
    /// `apply` computes the optimistic state from the captured snapshot;
    /// rollback is automatic via that snapshot, so call sites cannot drift
    /// from the protocol.
    async fn mutate<Apply, Fut>(&self, apply: Apply, request: Fut) -> Result<CartSnapshot, ApiError>
    where
        Apply: FnOnce(&CartSnapshot) -> CartSnapshot,
        Fut: Future<Output = Result<CartSnapshot, ApiError>>,
    {
        // Capture: rollback point.
        let previous = self.inner.cache.read().await.clone();

        // Apply locally before the network call resolves.
        let optimistic = apply(&previous);
        *self.inner.cache.write().await = optimistic;

        // Dispatch and resolve.
        let result = request.await;
        match &result {
            Ok(server) => {
                *self.inner.cache.write().await = server.clone();
            }
            Err(error) => {
                tracing::warn!(%error, "Cart mutation failed, rolling back");
                *self.inner.cache.write().await = previous;
            }
        }

        // Reconcile regardless of outcome.
        self.reconcile().await;

        match result {
            Ok(_) => Ok(self.snapshot().await),
            Err(error) => Err(error),
        }
    }

    /// Follow-up fetch of the authoritative cart. A failure here is logged
    /// and ignored; the resolved state stands until the next fetch.
    async fn reconcile(&self) {
        match self.inner.api.fetch_cart().await {
            Ok(cart) => *self.inner.cache.write().await = cart,
            Err(error) => {
                tracing::debug!(%error, "Cart reconciliation fetch failed");
            }
        }
    }
}

// =============================================================================
// Pure mutation appliers
// =============================================================================

/// New cart state with `product_id`'s quantity set (0 drops the line).
fn apply_quantity(cart: &CartSnapshot, product_id: ProductId, quantity: u32) -> CartSnapshot {
    let items: Vec<CartLine> = cart
        .items
        .iter()
        .filter_map(|line| {
            if line.product.id == product_id {
                (quantity > 0).then(|| CartLine {
                    quantity,
                    ..line.clone()
                })
            } else {
                Some(line.clone())
            }
        })
        .collect();

    with_derived_total(items)
}

/// New cart state with `product_id`'s line dropped.
fn apply_remove(cart: &CartSnapshot, product_id: ProductId) -> CartSnapshot {
    let items: Vec<CartLine> = cart
        .items
        .iter()
        .filter(|line| line.product.id != product_id)
        .cloned()
        .collect();

    with_derived_total(items)
}

fn with_derived_total(items: Vec<CartLine>) -> CartSnapshot {
    let total: Decimal = items.iter().map(CartLine::subtotal).sum();
    CartSnapshot {
        items,
        total: Some(total),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::types::ProductRef;
    use std::collections::HashSet;

    fn line(id: i32, quantity: u32, unit_price: &str) -> CartLine {
        CartLine {
            product: ProductRef {
                id: ProductId::new(id),
                sku: format!("SKU-{id}"),
                title: format!("Product {id}"),
                primary_image: None,
            },
            quantity,
            unit_price: unit_price.parse().unwrap(),
        }
    }

    fn cart(lines: Vec<CartLine>) -> CartSnapshot {
        CartSnapshot {
            items: lines,
            total: None,
        }
    }

    #[test]
    fn test_apply_quantity_updates_line_and_total() {
        let cart = cart(vec![line(7, 2, "10.00"), line(8, 1, "3.00")]);
        let next = apply_quantity(&cart, ProductId::new(7), 3);

        assert_eq!(next.line(ProductId::new(7)).unwrap().quantity, 3);
        assert_eq!(next.line(ProductId::new(8)).unwrap().quantity, 1);
        assert_eq!(next.total.unwrap().to_string(), "33.00");
    }

    #[test]
    fn test_apply_quantity_zero_drops_line() {
        let cart = cart(vec![line(7, 2, "10.00"), line(8, 1, "3.00")]);
        let next = apply_quantity(&cart, ProductId::new(7), 0);

        assert!(next.line(ProductId::new(7)).is_none());
        assert_eq!(next.items.len(), 1);
        assert_eq!(next.total.unwrap().to_string(), "3.00");
    }

    #[test]
    fn test_apply_quantity_unknown_product_is_noop_on_lines() {
        let before = cart(vec![line(7, 2, "10.00")]);
        let next = apply_quantity(&before, ProductId::new(99), 5);

        assert_eq!(next.items, before.items);
        assert_eq!(next.total.unwrap().to_string(), "20.00");
    }

    #[test]
    fn test_apply_remove_drops_only_matching_line() {
        let cart = cart(vec![line(7, 2, "10.00"), line(8, 4, "2.50")]);
        let next = apply_remove(&cart, ProductId::new(8));

        assert_eq!(next.items.len(), 1);
        assert!(next.line(ProductId::new(8)).is_none());
        assert_eq!(next.total.unwrap().to_string(), "20.00");
    }

    #[test]
    fn test_appliers_preserve_no_duplicate_lines() {
        let cart = cart(vec![line(1, 1, "1.00"), line(2, 2, "2.00"), line(3, 3, "3.00")]);

        for next in [
            apply_quantity(&cart, ProductId::new(2), 9),
            apply_quantity(&cart, ProductId::new(3), 0),
            apply_remove(&cart, ProductId::new(1)),
        ] {
            let ids: HashSet<_> = next.items.iter().map(|l| l.product.id).collect();
            assert_eq!(ids.len(), next.items.len());
        }
    }

    #[test]
    fn test_optimistic_total_matches_sum_of_lines() {
        let cart = cart(vec![line(1, 3, "19.99"), line(2, 1, "0.01")]);
        let next = apply_quantity(&cart, ProductId::new(1), 2);

        assert_eq!(next.total.unwrap(), next.derived_total());
        assert_eq!(next.total.unwrap().to_string(), "40.00");
    }
}
