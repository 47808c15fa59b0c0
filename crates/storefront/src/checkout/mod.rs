//! Checkout step machine.
//!
//! Sequences account resolution, address selection, shipping confirmation,
//! payment method selection, and order submission. Steps are an explicit
//! finite-state machine: [`CheckoutSession::advance`] and
//! [`CheckoutSession::retreat`] are the only mutators of the current step,
//! and `advance` consults the current step's exit guard, so the validation
//! contract lives in one place.
//!
//! The session is entirely client-local and ephemeral: it is created when
//! the checkout view opens and discarded on navigation away or once the
//! order is placed (the server-confirmed order supersedes it).

pub mod redirect;

pub use redirect::CheckoutOutcome;

use rust_decimal::Decimal;
use secrecy::SecretString;
use tracing::instrument;

use driftmarket_core::AddressId;

use crate::api::types::{
    Address, AddressDraft, AddressPayload, CheckoutPayload, PaymentProvider,
};
use crate::api::{ApiClient, ApiError};
use crate::cart::CartStore;
use crate::error::add_breadcrumb;
use crate::services::auth::{AuthError, AuthService};

/// Demo tax rate applied in the order summary (10%).
const TAX_RATE: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

/// Checkout steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckoutStep {
    /// Account resolution; only entered when unauthenticated at start.
    Account,
    /// Shipping (and optionally billing) address selection.
    Address,
    /// Display-only confirmation of the flat shipping cost.
    Shipping,
    /// Payment provider selection.
    Payment,
    /// Final review and order submission.
    Review,
}

impl CheckoutStep {
    /// Ordinal position (ACCOUNT = 0 .. REVIEW = 4).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Account => 0,
            Self::Address => 1,
            Self::Shipping => 2,
            Self::Payment => 3,
            Self::Review => 4,
        }
    }

    const fn next(self) -> Self {
        match self {
            Self::Account => Self::Address,
            Self::Address => Self::Shipping,
            Self::Shipping => Self::Payment,
            Self::Payment | Self::Review => Self::Review,
        }
    }

    const fn previous(self) -> Self {
        match self {
            Self::Account | Self::Address => Self::Account,
            Self::Shipping => Self::Address,
            Self::Payment => Self::Shipping,
            Self::Review => Self::Payment,
        }
    }
}

/// Account sub-mode while on the ACCOUNT step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    Login,
    Guest,
}

/// A shipping or billing address choice: a saved address by id, or an
/// inline draft. The tagged split keeps the "use saved vs. new" branch
/// exhaustively checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressSelection {
    Saved(AddressId),
    Draft(AddressDraft),
}

impl AddressSelection {
    fn to_payload(&self) -> AddressPayload {
        match self {
            Self::Saved(id) => AddressPayload::Saved(*id),
            Self::Draft(draft) => AddressPayload::Inline(draft.clone()),
        }
    }
}

/// Checkout flow errors. `Display` doubles as the user-visible message.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("Sign in or continue as guest first")]
    NotAuthenticated,

    #[error("A shipping address is required")]
    ShippingAddressRequired,

    #[error("A billing address is required")]
    BillingAddressRequired,

    #[error("Please complete all required address fields")]
    IncompleteAddress,

    #[error("The selected saved address no longer exists")]
    UnknownSavedAddress,

    #[error("Billing address follows the shipping address")]
    BillingAliasesShipping,

    #[error("Review your order before placing it")]
    NotAtReview,

    #[error("{0}")]
    OrderRejected(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Line items of the order summary sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSummary {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// The checkout state machine.
///
/// Reads the cart snapshot (read-only) and drives its own step state,
/// culminating in order creation and, usually, a payment redirect.
pub struct CheckoutSession {
    api: ApiClient,
    auth: AuthService,
    cart: CartStore,
    shipping_flat_rate: Decimal,

    step: CheckoutStep,
    auth_mode: AuthMode,
    addresses: Vec<Address>,
    shipping: Option<AddressSelection>,
    /// Independent billing selection; `None` while `same_as_shipping`.
    billing: Option<AddressSelection>,
    same_as_shipping: bool,
    provider: PaymentProvider,
    coupon_code: Option<String>,
    error: Option<String>,
}

impl CheckoutSession {
    /// Start a checkout session.
    ///
    /// Starts at ACCOUNT when unauthenticated, otherwise at ADDRESS with the
    /// saved-address list loaded and the first address pre-selected.
    pub(crate) async fn begin(
        api: ApiClient,
        auth: AuthService,
        cart: CartStore,
        shipping_flat_rate: Decimal,
    ) -> Self {
        let mut session = Self {
            api,
            auth,
            cart,
            shipping_flat_rate,
            step: CheckoutStep::Account,
            auth_mode: AuthMode::default(),
            addresses: Vec::new(),
            shipping: None,
            billing: None,
            same_as_shipping: true,
            provider: PaymentProvider::default(),
            coupon_code: None,
            error: None,
        };

        if session.api.credentials().is_authenticated().await {
            session.step = CheckoutStep::Address;
            session.enter_address().await;
        }

        session
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Current step.
    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    /// Current user-visible error, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Account sub-mode.
    #[must_use]
    pub const fn auth_mode(&self) -> AuthMode {
        self.auth_mode
    }

    /// Saved addresses loaded for this session.
    #[must_use]
    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    /// Current shipping selection.
    #[must_use]
    pub const fn shipping(&self) -> Option<&AddressSelection> {
        self.shipping.as_ref()
    }

    /// Current billing selection. `None` while billing follows shipping.
    #[must_use]
    pub const fn billing(&self) -> Option<&AddressSelection> {
        self.billing.as_ref()
    }

    /// Whether billing follows the shipping address.
    #[must_use]
    pub const fn same_as_shipping(&self) -> bool {
        self.same_as_shipping
    }

    /// Selected payment provider.
    #[must_use]
    pub const fn provider(&self) -> PaymentProvider {
        self.provider
    }

    /// Subtotal, shipping, tax, and total for the current cart.
    pub async fn order_summary(&self) -> OrderSummary {
        let cart = self.cart.snapshot().await;
        let subtotal = cart.total_or_derived();
        let shipping = if cart.is_empty() {
            Decimal::ZERO
        } else {
            self.shipping_flat_rate
        };
        let tax = (subtotal * TAX_RATE).round_dp(2);
        OrderSummary {
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
        }
    }

    // =========================================================================
    // Step navigation
    // =========================================================================

    /// Move forward one step if the current step's exit guard passes.
    ///
    /// Clears the session error first; a guard violation stores a new one
    /// and leaves every other part of the session untouched.
    ///
    /// # Errors
    ///
    /// Returns the guard violation that blocked the transition.
    #[instrument(skip(self), fields(step = ?self.step))]
    pub async fn advance(&mut self) -> Result<CheckoutStep, CheckoutError> {
        self.error = None;

        match self.step {
            CheckoutStep::Account => {
                // Externally restored sessions force-advance past ACCOUNT.
                if !self.api.credentials().is_authenticated().await {
                    return Err(self.block(CheckoutError::NotAuthenticated));
                }
                self.step = CheckoutStep::Address;
                self.enter_address().await;
            }
            CheckoutStep::Address => {
                if let Err(violation) = self.validate_addresses() {
                    return Err(self.block(violation));
                }
                self.step = CheckoutStep::Shipping;
            }
            // Shipping display and payment selection always pass: a default
            // provider is always selected.
            CheckoutStep::Shipping | CheckoutStep::Payment => {
                self.step = self.step.next();
            }
            CheckoutStep::Review => {}
        }

        Ok(self.step)
    }

    /// Move back one step unconditionally (no re-validation going backward).
    ///
    /// Never retreats past ADDRESS once authenticated, and never past
    /// ACCOUNT otherwise.
    pub async fn retreat(&mut self) -> CheckoutStep {
        self.error = None;

        let floor = if self.api.credentials().is_authenticated().await {
            CheckoutStep::Address
        } else {
            CheckoutStep::Account
        };

        if self.step > floor {
            self.step = self.step.previous();
        }
        self.step
    }

    /// Force-advance out of ACCOUNT if authentication happened externally
    /// (e.g., a session restore in another view). Returns `true` if the
    /// session advanced.
    pub async fn sync_authentication(&mut self) -> bool {
        if self.step == CheckoutStep::Account
            && self.api.credentials().is_authenticated().await
        {
            self.error = None;
            self.step = CheckoutStep::Address;
            self.enter_address().await;
            return true;
        }
        false
    }

    /// Load saved addresses and pre-select the first one as a convenience
    /// default. Failures leave the list empty; the shopper can still enter
    /// a draft.
    async fn enter_address(&mut self) {
        if self.addresses.is_empty() {
            match self.api.addresses().await {
                Ok(addresses) => self.addresses = addresses,
                Err(error) => {
                    tracing::warn!(%error, "Failed to fetch saved addresses");
                }
            }
        }

        if self.shipping.is_none()
            && let Some(first) = self.addresses.first()
        {
            self.shipping = Some(AddressSelection::Saved(first.id));
        }
    }

    fn block(&mut self, violation: CheckoutError) -> CheckoutError {
        self.error = Some(violation.to_string());
        violation
    }

    // =========================================================================
    // Account step
    // =========================================================================

    /// Switch between login and guest sub-modes.
    pub fn set_auth_mode(&mut self, mode: AuthMode) {
        self.auth_mode = mode;
    }

    /// Log in and advance to ADDRESS.
    ///
    /// # Errors
    ///
    /// Surfaces the login failure and stays on ACCOUNT.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in(
        &mut self,
        email: &str,
        password: &SecretString,
    ) -> Result<(), CheckoutError> {
        self.error = None;

        if let Err(error) = self.auth.login(email, password).await {
            return Err(self.block(CheckoutError::Auth(error)));
        }

        self.step = CheckoutStep::Address;
        self.enter_address().await;
        Ok(())
    }

    /// Guest checkout: register (name split server-style), fall back to
    /// login on an email conflict, and advance to ADDRESS.
    ///
    /// # Errors
    ///
    /// Surfaces the compound operation's failure and stays on ACCOUNT.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn continue_as_guest(
        &mut self,
        display_name: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<(), CheckoutError> {
        self.error = None;

        if let Err(error) = self.auth.guest_sign_in(display_name, email, password).await {
            return Err(self.block(CheckoutError::Auth(error)));
        }

        self.step = CheckoutStep::Address;
        self.enter_address().await;
        Ok(())
    }

    // =========================================================================
    // Address step
    // =========================================================================

    /// Select a saved address for shipping.
    pub fn select_saved_shipping(&mut self, id: AddressId) {
        self.shipping = Some(AddressSelection::Saved(id));
    }

    /// Use an inline draft for shipping.
    pub fn set_shipping_draft(&mut self, draft: AddressDraft) {
        self.shipping = Some(AddressSelection::Draft(draft));
    }

    /// Toggle whether billing follows shipping. Turning it on drops any
    /// independent billing selection.
    pub fn set_same_as_shipping(&mut self, same: bool) {
        self.same_as_shipping = same;
        if same {
            self.billing = None;
        }
    }

    /// Select a saved address for billing.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::BillingAliasesShipping` while the
    /// same-as-shipping flag is set.
    pub fn select_saved_billing(&mut self, id: AddressId) -> Result<(), CheckoutError> {
        if self.same_as_shipping {
            return Err(CheckoutError::BillingAliasesShipping);
        }
        self.billing = Some(AddressSelection::Saved(id));
        Ok(())
    }

    /// Use an inline draft for billing.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::BillingAliasesShipping` while the
    /// same-as-shipping flag is set.
    pub fn set_billing_draft(&mut self, draft: AddressDraft) -> Result<(), CheckoutError> {
        if self.same_as_shipping {
            return Err(CheckoutError::BillingAliasesShipping);
        }
        self.billing = Some(AddressSelection::Draft(draft));
        Ok(())
    }

    /// Validate address completeness: shipping present with all of
    /// {line1, city, state, postal code, country} non-blank, and the same
    /// for billing when it does not follow shipping. Applied on ADDRESS
    /// exit and again on REVIEW submit.
    fn validate_addresses(&self) -> Result<(), CheckoutError> {
        let shipping = self
            .shipping
            .as_ref()
            .ok_or(CheckoutError::ShippingAddressRequired)?;
        self.check_complete(shipping)?;

        if !self.same_as_shipping {
            let billing = self
                .billing
                .as_ref()
                .ok_or(CheckoutError::BillingAddressRequired)?;
            self.check_complete(billing)?;
        }

        Ok(())
    }

    fn check_complete(&self, selection: &AddressSelection) -> Result<(), CheckoutError> {
        let complete = match selection {
            AddressSelection::Saved(id) => self
                .addresses
                .iter()
                .find(|a| a.id == *id)
                .ok_or(CheckoutError::UnknownSavedAddress)?
                .is_complete(),
            AddressSelection::Draft(draft) => draft.is_complete(),
        };

        if complete {
            Ok(())
        } else {
            Err(CheckoutError::IncompleteAddress)
        }
    }

    // =========================================================================
    // Payment step
    // =========================================================================

    /// Select the payment provider.
    pub fn set_provider(&mut self, provider: PaymentProvider) {
        self.provider = provider;
    }

    /// Attach a coupon code, passed through to order creation unvalidated.
    pub fn set_coupon_code(&mut self, code: Option<String>) {
        self.coupon_code = code.filter(|c| !c.trim().is_empty());
    }

    // =========================================================================
    // Review step
    // =========================================================================

    /// Place the order.
    ///
    /// Re-validates addresses (state could have been corrupted since
    /// ADDRESS), submits, and interprets the payment intent. On success the
    /// session is done: the caller performs the returned redirect or shows
    /// the confirmation, and discards the session. On failure the session
    /// stays on REVIEW with the error surfaced, ready for retry.
    ///
    /// # Errors
    ///
    /// Returns the validation violation or the server's rejection.
    #[instrument(skip(self), fields(provider = %self.provider))]
    pub async fn place_order(&mut self) -> Result<CheckoutOutcome, CheckoutError> {
        self.error = None;

        if self.step != CheckoutStep::Review {
            return Err(self.block(CheckoutError::NotAtReview));
        }

        if let Err(violation) = self.validate_addresses() {
            return Err(self.block(violation));
        }

        // validate_addresses guarantees both selections resolve.
        let Some(shipping) = self.shipping.clone() else {
            return Err(self.block(CheckoutError::ShippingAddressRequired));
        };
        let billing = if self.same_as_shipping {
            shipping.clone()
        } else {
            match self.billing.clone() {
                Some(billing) => billing,
                None => return Err(self.block(CheckoutError::BillingAddressRequired)),
            }
        };

        let payload = CheckoutPayload {
            shipping_address: shipping.to_payload(),
            billing_address: billing.to_payload(),
            provider: self.provider,
            coupon_code: self.coupon_code.clone(),
        };

        add_breadcrumb(
            "checkout",
            "Placing order",
            Some(&[("provider", &self.provider.to_string())]),
        );

        match self.api.create_order(&payload).await {
            Ok(response) => {
                // The session is superseded by the confirmed order.
                Ok(CheckoutOutcome::from_response(response))
            }
            Err(error) => {
                let message = order_failure_message(&error);
                self.error = Some(message.clone());
                Err(CheckoutError::OrderRejected(message))
            }
        }
    }
}

/// The server's `detail`/`message` when it sent one, otherwise a generic
/// fallback suitable for display.
fn order_failure_message(error: &ApiError) -> String {
    match error {
        ApiError::Api { message, .. } | ApiError::Unauthorized(message)
            if !message.trim().is_empty() =>
        {
            message.clone()
        }
        _ => "We could not place your order. Please try again.".to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::credentials::CredentialStore;
    use driftmarket_core::AccessToken;

    /// Session wired to an unroutable backend: good enough for everything
    /// that never leaves the state machine.
    async fn offline_session(authenticated: bool) -> CheckoutSession {
        let credentials = CredentialStore::new();
        if authenticated {
            credentials
                .store_session(AccessToken::new("test-access".to_string()), None, None)
                .await;
        }
        let config = ApiConfig::for_base_url("http://127.0.0.1:1/api/").unwrap();
        let api = ApiClient::new(&config, credentials).unwrap();
        let cart = CartStore::new(api.clone());
        let auth = AuthService::new(api.clone(), cart.clone());
        CheckoutSession::begin(api, auth, cart, Decimal::from(5)).await
    }

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

    #[tokio::test]
    async fn test_starts_at_account_when_unauthenticated() {
        let session = offline_session(false).await;
        assert_eq!(session.step(), CheckoutStep::Account);
        assert_eq!(session.step().index(), 0);
    }

    #[tokio::test]
    async fn test_starts_at_address_when_authenticated() {
        let session = offline_session(true).await;
        assert_eq!(session.step(), CheckoutStep::Address);
    }

    #[tokio::test]
    async fn test_account_guard_blocks_unauthenticated_advance() {
        let mut session = offline_session(false).await;
        let result = session.advance().await;
        assert!(matches!(result, Err(CheckoutError::NotAuthenticated)));
        assert_eq!(session.step(), CheckoutStep::Account);
        assert!(session.error().is_some());
    }

    #[tokio::test]
    async fn test_sync_authentication_force_advances() {
        let mut session = offline_session(false).await;
        assert!(!session.sync_authentication().await);

        // Session restored externally (e.g., another tab logged in).
        session
            .api
            .credentials()
            .store_session(AccessToken::new("restored".to_string()), None, None)
            .await;

        assert!(session.sync_authentication().await);
        assert_eq!(session.step(), CheckoutStep::Address);
    }

    #[tokio::test]
    async fn test_address_guard_blocks_missing_shipping() {
        let mut session = offline_session(true).await;
        let result = session.advance().await;
        assert!(matches!(result, Err(CheckoutError::ShippingAddressRequired)));
        assert_eq!(session.step(), CheckoutStep::Address);
        assert!(session.error().is_some());
    }

    #[tokio::test]
    async fn test_address_guard_blocks_blank_city() {
        let mut session = offline_session(true).await;
        let mut draft = complete_draft();
        draft.city = String::new();
        session.set_shipping_draft(draft);

        let result = session.advance().await;
        assert!(matches!(result, Err(CheckoutError::IncompleteAddress)));
        assert_eq!(session.step().index(), 1);
        assert!(session.error().is_some());
    }

    #[tokio::test]
    async fn test_happy_path_reaches_review() {
        let mut session = offline_session(true).await;
        session.set_shipping_draft(complete_draft());

        assert_eq!(session.advance().await.unwrap(), CheckoutStep::Shipping);
        assert_eq!(session.advance().await.unwrap(), CheckoutStep::Payment);
        assert_eq!(session.advance().await.unwrap(), CheckoutStep::Review);
        // Advancing past REVIEW is a no-op; submission is a separate call.
        assert_eq!(session.advance().await.unwrap(), CheckoutStep::Review);
        assert!(session.error().is_none());
    }

    #[tokio::test]
    async fn test_validation_failure_mutates_nothing_else() {
        let mut session = offline_session(true).await;
        session.set_shipping_draft(complete_draft());
        session.set_provider(PaymentProvider::Khalti);
        let shipping_before = session.shipping().cloned();

        let mut incomplete = complete_draft();
        incomplete.postal_code = "  ".to_string();
        session.set_shipping_draft(incomplete);
        assert!(session.advance().await.is_err());

        assert_ne!(session.shipping().cloned(), shipping_before);
        assert_eq!(session.provider(), PaymentProvider::Khalti);
        assert_eq!(session.step(), CheckoutStep::Address);
    }

    #[tokio::test]
    async fn test_distinct_billing_validated_independently() {
        let mut session = offline_session(true).await;
        session.set_shipping_draft(complete_draft());
        session.set_same_as_shipping(false);

        // Billing unset: blocked.
        assert!(matches!(
            session.advance().await,
            Err(CheckoutError::BillingAddressRequired)
        ));

        // Billing incomplete: blocked.
        let mut bad = complete_draft();
        bad.country = String::new();
        session.set_billing_draft(bad).unwrap();
        assert!(matches!(
            session.advance().await,
            Err(CheckoutError::IncompleteAddress)
        ));

        // Billing complete: passes.
        session.set_billing_draft(complete_draft()).unwrap();
        assert_eq!(session.advance().await.unwrap(), CheckoutStep::Shipping);
    }

    #[tokio::test]
    async fn test_billing_not_settable_while_aliased() {
        let mut session = offline_session(true).await;
        assert!(session.same_as_shipping());

        let result = session.set_billing_draft(complete_draft());
        assert!(matches!(result, Err(CheckoutError::BillingAliasesShipping)));
        assert!(session.billing().is_none());

        session.set_same_as_shipping(false);
        session.set_billing_draft(complete_draft()).unwrap();
        assert!(session.billing().is_some());

        // Re-enabling the alias drops the independent selection.
        session.set_same_as_shipping(true);
        assert!(session.billing().is_none());
    }

    #[tokio::test]
    async fn test_retreat_floor_when_authenticated() {
        let mut session = offline_session(true).await;
        session.set_shipping_draft(complete_draft());
        session.advance().await.unwrap();
        assert_eq!(session.step(), CheckoutStep::Shipping);

        assert_eq!(session.retreat().await, CheckoutStep::Address);
        // Never back past ADDRESS once authenticated.
        assert_eq!(session.retreat().await, CheckoutStep::Address);
    }

    #[tokio::test]
    async fn test_retreat_is_unconditional() {
        let mut session = offline_session(true).await;
        session.set_shipping_draft(complete_draft());
        session.advance().await.unwrap();

        // Corrupt the address after passing the gate; retreat still works.
        session.set_shipping_draft(AddressDraft::default());
        assert_eq!(session.retreat().await, CheckoutStep::Address);
        assert!(session.error().is_none());
    }

    #[tokio::test]
    async fn test_place_order_requires_review_step() {
        let mut session = offline_session(true).await;
        session.set_shipping_draft(complete_draft());

        let result = session.place_order().await;
        assert!(matches!(result, Err(CheckoutError::NotAtReview)));
    }

    #[tokio::test]
    async fn test_provider_defaults_to_stripe() {
        let session = offline_session(true).await;
        assert_eq!(session.provider(), PaymentProvider::Stripe);
    }

    #[tokio::test]
    async fn test_coupon_code_blank_is_dropped() {
        let mut session = offline_session(true).await;
        session.set_coupon_code(Some("  ".to_string()));
        assert!(session.coupon_code.is_none());
        session.set_coupon_code(Some("WELCOME10".to_string()));
        assert_eq!(session.coupon_code.as_deref(), Some("WELCOME10"));
    }

    #[test]
    fn test_tax_rate_constant() {
        assert_eq!(TAX_RATE.to_string(), "0.1");
    }

    #[test]
    fn test_order_failure_message_prefers_server_detail() {
        let api_error = ApiError::Api {
            status: 400,
            message: "Cart is empty".to_string(),
        };
        assert_eq!(order_failure_message(&api_error), "Cart is empty");

        let blank = ApiError::Api {
            status: 500,
            message: String::new(),
        };
        assert!(order_failure_message(&blank).contains("try again"));
    }
}
