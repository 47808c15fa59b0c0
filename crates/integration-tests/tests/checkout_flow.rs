//! Checkout flow tests: guest fallback, validation gating, address
//! pre-selection, payload shapes, and payment redirects.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::Ordering;

use driftmarket_core::AddressId;
use driftmarket_integration_tests::MockBackend;
use driftmarket_storefront::Storefront;
use driftmarket_storefront::api::types::{AddressDraft, PaymentProvider};
use driftmarket_storefront::checkout::{
    AddressSelection, CheckoutError, CheckoutOutcome, CheckoutSession, CheckoutStep,
};
use secrecy::SecretString;
use serde_json::json;

const EMAIL: &str = "shopper@example.com";
const PASSWORD: &str = "correct-horse-battery";

fn complete_draft() -> AddressDraft {
    AddressDraft {
        address_line1: "12 Hill Road".to_string(),
        city: "Kathmandu".to_string(),
        state: "Bagmati".to_string(),
        postal_code: "44600".to_string(),
        country: "NP".to_string(),
        ..AddressDraft::default()
    }
}

async fn signed_in_storefront(backend: &MockBackend) -> Storefront {
    backend.seed_account(EMAIL, PASSWORD);
    let storefront = backend.storefront();
    storefront
        .auth()
        .login(EMAIL, &SecretString::from(PASSWORD))
        .await
        .unwrap();
    storefront
}

/// Walk an authenticated session with a valid address up to REVIEW.
async fn drive_to_review(session: &mut CheckoutSession) {
    if session.shipping().is_none() {
        session.set_shipping_draft(complete_draft());
    }
    assert_eq!(session.advance().await.unwrap(), CheckoutStep::Shipping);
    assert_eq!(session.advance().await.unwrap(), CheckoutStep::Payment);
    assert_eq!(session.advance().await.unwrap(), CheckoutStep::Review);
}

// ============================================================================
// Account step
// ============================================================================

#[tokio::test]
async fn test_sign_in_advances_to_address() {
    let backend = MockBackend::start().await;
    backend.seed_account(EMAIL, PASSWORD);

    let storefront = backend.storefront();
    let mut session = storefront.begin_checkout().await;
    assert_eq!(session.step(), CheckoutStep::Account);

    session
        .sign_in(EMAIL, &SecretString::from(PASSWORD))
        .await
        .unwrap();

    assert_eq!(session.step(), CheckoutStep::Address);
    assert!(storefront.credentials().is_authenticated().await);
}

#[tokio::test]
async fn test_guest_conflict_falls_back_to_login() {
    let backend = MockBackend::start().await;
    // The guest's email is already registered, with this password.
    backend.seed_account(EMAIL, PASSWORD);

    let storefront = backend.storefront();
    let mut session = storefront.begin_checkout().await;

    session
        .continue_as_guest("Asha Gurung", EMAIL, &SecretString::from(PASSWORD))
        .await
        .unwrap();

    // Registration conflicted, login succeeded: credentials stored and the
    // session reached ADDRESS.
    assert_eq!(session.step(), CheckoutStep::Address);
    assert!(storefront.credentials().is_authenticated().await);
    assert_eq!(backend.state.register_calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.state.login_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_guest_conflict_with_wrong_password_surfaces_login_error() {
    let backend = MockBackend::start().await;
    backend.seed_account(EMAIL, PASSWORD);

    let storefront = backend.storefront();
    let mut session = storefront.begin_checkout().await;

    let result = session
        .continue_as_guest("Asha Gurung", EMAIL, &SecretString::from("wrong-password"))
        .await;

    assert!(matches!(result, Err(CheckoutError::Auth(_))));
    assert_eq!(session.step(), CheckoutStep::Account);
    assert!(session.error().is_some());
    assert!(!storefront.credentials().is_authenticated().await);
}

#[tokio::test]
async fn test_guest_with_new_email_registers_then_signs_in() {
    let backend = MockBackend::start().await;

    let storefront = backend.storefront();
    let mut session = storefront.begin_checkout().await;

    session
        .continue_as_guest(
            "Asha Gurung",
            "new-shopper@example.com",
            &SecretString::from(PASSWORD),
        )
        .await
        .unwrap();

    assert_eq!(session.step(), CheckoutStep::Address);
    assert!(storefront.credentials().is_authenticated().await);
    assert_eq!(backend.state.register_calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.state.login_calls.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Address step
// ============================================================================

#[tokio::test]
async fn test_incomplete_address_blocks_advance() {
    let backend = MockBackend::start().await;
    let storefront = signed_in_storefront(&backend).await;

    let mut session = storefront.begin_checkout().await;
    assert_eq!(session.step(), CheckoutStep::Address);

    let mut draft = complete_draft();
    draft.city = String::new();
    session.set_shipping_draft(draft);

    let result = session.advance().await;
    assert!(matches!(result, Err(CheckoutError::IncompleteAddress)));
    assert_eq!(session.step().index(), 1);
    assert!(session.error().is_some());
}

#[tokio::test]
async fn test_first_saved_address_preselected() {
    let backend = MockBackend::start().await;
    backend.seed_address(3);
    backend.seed_address(4);
    let storefront = signed_in_storefront(&backend).await;

    let mut session = storefront.begin_checkout().await;

    assert_eq!(session.addresses().len(), 2);
    assert_eq!(
        session.shipping(),
        Some(&AddressSelection::Saved(AddressId::new(3)))
    );
    // The convenience default passes validation directly.
    assert_eq!(session.advance().await.unwrap(), CheckoutStep::Shipping);
}

// ============================================================================
// Submission payloads
// ============================================================================

#[tokio::test]
async fn test_saved_addresses_submitted_by_id() {
    let backend = MockBackend::start().await;
    backend.seed_address(3);
    let storefront = signed_in_storefront(&backend).await;

    let mut session = storefront.begin_checkout().await;
    drive_to_review(&mut session).await;
    session.place_order().await.unwrap();

    let payload = backend
        .state
        .last_checkout_payload
        .lock()
        .unwrap()
        .clone()
        .unwrap();
    assert_eq!(payload["shipping_address"], json!(3));
    // Billing follows shipping by default.
    assert_eq!(payload["billing_address"], json!(3));
    assert_eq!(payload["provider"], json!("stripe"));
    assert!(payload.get("coupon_code").is_none());
}

#[tokio::test]
async fn test_inline_draft_submitted_as_object_with_coupon() {
    let backend = MockBackend::start().await;
    let storefront = signed_in_storefront(&backend).await;

    let mut session = storefront.begin_checkout().await;
    session.set_shipping_draft(complete_draft());
    session.set_coupon_code(Some("WELCOME10".to_string()));
    drive_to_review(&mut session).await;
    session.set_provider(PaymentProvider::Khalti);
    session.place_order().await.unwrap();

    let payload = backend
        .state
        .last_checkout_payload
        .lock()
        .unwrap()
        .clone()
        .unwrap();
    assert_eq!(payload["shipping_address"]["city"], json!("Kathmandu"));
    assert_eq!(payload["provider"], json!("khalti"));
    assert_eq!(payload["coupon_code"], json!("WELCOME10"));
}

// ============================================================================
// Payment redirects
// ============================================================================

#[tokio::test]
async fn test_payment_form_intent_builds_auto_submit_form() {
    let backend = MockBackend::start().await;
    backend.script_checkout_success(json!({
        "order_id": 42,
        "payment_intent": {
            "provider": "esewa",
            "payment_form": {
                "url": "https://pay.example/",
                "method": "POST",
                "fields": {"token": "abc"}
            }
        }
    }));
    let storefront = signed_in_storefront(&backend).await;

    let mut session = storefront.begin_checkout().await;
    drive_to_review(&mut session).await;

    let (order_id, html) = match session.place_order().await.unwrap() {
        CheckoutOutcome::RedirectForm { order_id, html } => (order_id, html),
        other => panic!("expected a form redirect, got {other:?}"),
    };

    assert_eq!(order_id.as_i32(), 42);
    assert!(html.contains("action=\"https://pay.example/\""));
    assert!(html.contains("method=\"POST\""));
    assert!(html.contains("<input type=\"hidden\" name=\"token\" value=\"abc\">"));
}

#[tokio::test]
async fn test_payment_url_intent_redirects() {
    let backend = MockBackend::start().await;
    backend.script_checkout_success(json!({
        "order_id": 43,
        "payment_intent": {
            "provider": "stripe",
            "payment_url": "https://pay.example/session/cs_123"
        }
    }));
    let storefront = signed_in_storefront(&backend).await;

    let mut session = storefront.begin_checkout().await;
    drive_to_review(&mut session).await;

    let outcome = session.place_order().await.unwrap();
    assert_eq!(
        outcome,
        CheckoutOutcome::Redirect {
            order_id: 43.into(),
            url: "https://pay.example/session/cs_123".to_string()
        }
    );
}

#[tokio::test]
async fn test_absent_intent_confirms_in_place() {
    let backend = MockBackend::start().await;
    let storefront = signed_in_storefront(&backend).await;

    let mut session = storefront.begin_checkout().await;
    drive_to_review(&mut session).await;

    let outcome = session.place_order().await.unwrap();
    assert_eq!(
        outcome,
        CheckoutOutcome::Confirmed { order_id: 1.into() }
    );
}

// ============================================================================
// Submission failure
// ============================================================================

#[tokio::test]
async fn test_order_failure_stays_on_review_for_retry() {
    let backend = MockBackend::start().await;
    backend.script_checkout_failure(400, "Cart is empty");
    let storefront = signed_in_storefront(&backend).await;

    let mut session = storefront.begin_checkout().await;
    drive_to_review(&mut session).await;

    let result = session.place_order().await;
    assert!(matches!(result, Err(CheckoutError::OrderRejected(_))));
    assert_eq!(session.step(), CheckoutStep::Review);
    assert_eq!(session.error(), Some("Cart is empty"));

    // The user may retry indefinitely; a later attempt succeeds.
    backend.script_checkout_success(json!({"order_id": 7, "payment_intent": null}));
    let outcome = session.place_order().await.unwrap();
    assert_eq!(outcome, CheckoutOutcome::Confirmed { order_id: 7.into() });
}
