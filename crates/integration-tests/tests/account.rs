//! Account surface tests: current user, addresses, wishlist, and the
//! cached catalog reads.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::Ordering;

use driftmarket_core::ProductId;
use driftmarket_integration_tests::MockBackend;
use driftmarket_storefront::api::ProductQuery;
use driftmarket_storefront::services::auth::AuthError;
use secrecy::SecretString;

const EMAIL: &str = "shopper@example.com";
const PASSWORD: &str = "correct-horse-battery";

#[tokio::test]
async fn test_current_user_requires_authentication() {
    let backend = MockBackend::start().await;
    backend.state.enforce_auth.store(true, Ordering::SeqCst);

    let storefront = backend.storefront();
    let result = storefront.auth().current_user().await;
    assert!(matches!(result, Err(AuthError::Api(_))));
}

#[tokio::test]
async fn test_current_user_after_login() {
    let backend = MockBackend::start().await;
    backend.state.enforce_auth.store(true, Ordering::SeqCst);
    backend.seed_account(EMAIL, PASSWORD);

    let storefront = backend.storefront();
    storefront
        .auth()
        .login(EMAIL, &SecretString::from(PASSWORD))
        .await
        .unwrap();

    let user = storefront.auth().current_user().await.unwrap();
    assert_eq!(user.email, EMAIL);
}

#[tokio::test]
async fn test_addresses_list() {
    let backend = MockBackend::start().await;
    backend.seed_address(3);
    backend.seed_address(4);

    let storefront = backend.storefront();
    let addresses = storefront.api().addresses().await.unwrap();

    assert_eq!(addresses.len(), 2);
    assert!(addresses.iter().all(driftmarket_storefront::api::types::Address::is_complete));
}

#[tokio::test]
async fn test_wishlist_roundtrip() {
    let backend = MockBackend::start().await;
    backend.seed_product(7, "10.00");

    let storefront = backend.storefront();

    let wishlist = storefront
        .api()
        .add_to_wishlist(ProductId::new(7))
        .await
        .unwrap();
    assert_eq!(wishlist.items.len(), 1);
    assert_eq!(wishlist.items[0].product.id, ProductId::new(7));

    storefront
        .api()
        .remove_from_wishlist(ProductId::new(7))
        .await
        .unwrap();

    let wishlist = storefront.api().wishlist().await.unwrap();
    assert!(wishlist.items.is_empty());
}

// ============================================================================
// Catalog caching
// ============================================================================

#[tokio::test]
async fn test_product_list_served_from_cache() {
    let backend = MockBackend::start().await;
    backend.seed_product(7, "10.00");
    backend.seed_product(8, "4.50");

    let storefront = backend.storefront();
    let query = ProductQuery::default();

    let first = storefront.api().products(&query).await.unwrap();
    assert_eq!(first.results.len(), 2);
    let second = storefront.api().products(&query).await.unwrap();
    assert_eq!(second.results.len(), 2);

    // Second read came from the cache.
    assert_eq!(backend.state.catalog_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_search_queries_bypass_cache() {
    let backend = MockBackend::start().await;
    backend.seed_product(7, "10.00");

    let storefront = backend.storefront();
    let query = ProductQuery {
        search: Some("sneaker".to_string()),
        ..ProductQuery::default()
    };

    storefront.api().products(&query).await.unwrap();
    storefront.api().products(&query).await.unwrap();

    assert_eq!(backend.state.catalog_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_product_detail_cache_and_invalidation() {
    let backend = MockBackend::start().await;
    backend.seed_product(7, "10.00");

    let storefront = backend.storefront();

    let product = storefront.api().product("product-7").await.unwrap();
    assert_eq!(product.base_price.to_string(), "10.00");
    storefront.api().product("product-7").await.unwrap();
    assert_eq!(backend.state.catalog_calls.load(Ordering::SeqCst), 1);

    storefront.api().invalidate_product("product-7").await;
    storefront.api().product("product-7").await.unwrap();
    assert_eq!(backend.state.catalog_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_product_recommendations_exclude_self() {
    let backend = MockBackend::start().await;
    backend.seed_product(7, "10.00");
    backend.seed_product(8, "4.50");

    let storefront = backend.storefront();
    let recommended = storefront
        .api()
        .product_recommendations("product-7")
        .await
        .unwrap();

    assert_eq!(recommended.len(), 1);
    assert_eq!(recommended[0].id, ProductId::new(8));
}

#[tokio::test]
async fn test_search_suggestions() {
    let backend = MockBackend::start().await;

    let storefront = backend.storefront();
    let suggestions = storefront.api().search_suggestions("sneak").await.unwrap();

    assert_eq!(suggestions, vec!["sneakers", "sneaker socks"]);
}
