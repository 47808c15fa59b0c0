//! Application state shared across the UI shell.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::cart::CartStore;
use crate::checkout::CheckoutSession;
use crate::config::StorefrontConfig;
use crate::credentials::CredentialStore;
use crate::services::AuthService;

/// The storefront engine facade.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// shared API client, credential store, and cart cache. The UI shell
/// creates one at startup and hands clones to every view.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: StorefrontConfig,
    api: ApiClient,
    credentials: CredentialStore,
    cart: CartStore,
    auth: AuthService,
}

impl Storefront {
    /// Wire up the engine from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let credentials = CredentialStore::new();
        let api = ApiClient::new(&config.api, credentials.clone())?;
        let cart = CartStore::new(api.clone());
        let auth = AuthService::new(api.clone(), cart.clone());

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                config,
                api,
                credentials,
                cart,
                auth,
            }),
        })
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backend API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the credential store.
    #[must_use]
    pub fn credentials(&self) -> &CredentialStore {
        &self.inner.credentials
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// Get a reference to the authentication service.
    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    /// Start a checkout session over the current cart and credentials.
    pub async fn begin_checkout(&self) -> CheckoutSession {
        CheckoutSession::begin(
            self.inner.api.clone(),
            self.inner.auth.clone(),
            self.inner.cart.clone(),
            self.inner.config.shipping_flat_rate,
        )
        .await
    }
}
