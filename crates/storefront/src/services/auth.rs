//! Authentication service.
//!
//! Coordinates the auth endpoints with the credential store and cart:
//! login/registration store tokens and merge the anonymous cart; logout
//! clears both. This module and the refresh path are the only writers of
//! the credential store.

use secrecy::SecretString;
use tracing::instrument;

use driftmarket_core::{Email, EmailError};

use crate::api::auth::{self, LoginResponse, RegisterResponse};
use crate::api::types::AuthUser;
use crate::api::{ApiClient, ApiError};
use crate::cart::CartStore;
use crate::credentials::CredentialStore;
use crate::error::{clear_sentry_user, set_sentry_user};

/// Errors that can occur during authentication.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Email or password was rejected.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The email is already registered.
    #[error("An account with this email already exists")]
    EmailAlreadyRegistered,

    /// The email failed structural validation before any request was sent.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Any other API failure.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Authentication service.
///
/// Handles login, registration, the guest checkout compound flow, and
/// logout.
#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
    cart: CartStore,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(api: ApiClient, cart: CartStore) -> Self {
        Self { api, cart }
    }

    fn credentials(&self) -> &CredentialStore {
        self.api.credentials()
    }

    /// Login with email and password, storing the session on success.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Option<AuthUser>, AuthError> {
        let email = Email::parse(email)?;

        let response = auth::login(self.api.http(), self.api.base_url(), email.as_str(), password)
            .await
            .map_err(|e| match e {
                ApiError::Unauthorized(_) => AuthError::InvalidCredentials,
                other => AuthError::Api(other),
            })?;

        self.adopt_session(response).await;
        Ok(self.credentials().current_user().await)
    }

    /// Register a new account. Does not sign in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmailAlreadyRegistered` if the email is taken.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn register(
        &self,
        email: &str,
        password: &SecretString,
        first_name: &str,
        last_name: &str,
    ) -> Result<RegisterResponse, AuthError> {
        let email = Email::parse(email)?;

        auth::register(
            self.api.http(),
            self.api.base_url(),
            email.as_str(),
            password,
            first_name,
            last_name,
        )
        .await
        .map_err(|e| {
            if e.is_conflict() {
                AuthError::EmailAlreadyRegistered
            } else {
                AuthError::Api(e)
            }
        })
    }

    /// Guest checkout sign-in: register with a display name, then log in,
    /// as a single compound operation.
    ///
    /// A registration conflict (email already registered) is not fatal: the
    /// flow falls back to a plain login with the same credentials. With the
    /// right password the guest simply continues with their existing
    /// account; with a different one the login fails and that error is
    /// surfaced.
    ///
    /// # Errors
    ///
    /// Returns the registration error for non-conflict failures, otherwise
    /// whatever the login attempt returns.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn guest_sign_in(
        &self,
        display_name: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<Option<AuthUser>, AuthError> {
        let (first_name, last_name) = split_display_name(display_name);

        match self.register(email, password, &first_name, &last_name).await {
            Ok(_) | Err(AuthError::EmailAlreadyRegistered) => {}
            Err(other) => return Err(other),
        }

        self.login(email, password).await
    }

    /// Fetch the authenticated user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error when not signed in or the request fails.
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<AuthUser, AuthError> {
        Ok(self.api.get_json::<AuthUser>("auth/me/").await?)
    }

    /// Sign out: drop the credential and the local cart cache.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        self.credentials().clear().await;
        self.cart.clear_local().await;
        clear_sentry_user();
    }

    /// Store the session and fold the anonymous cart into the account cart.
    async fn adopt_session(&self, response: LoginResponse) {
        let LoginResponse {
            access,
            refresh,
            user,
        } = response;

        if let Some(user) = &user {
            set_sentry_user(&user.id, Some(&user.email));
        }
        self.credentials()
            .store_session(access, Some(refresh), user)
            .await;

        // Best effort: a failed merge must not fail the login.
        if let Err(error) = self.cart.merge().await {
            tracing::debug!(%error, "Cart merge after login failed, refetching");
            let _ = self.cart.refresh().await;
        }
    }
}

/// Split a free-form display name into (first, last), defaulting the first
/// name to "Guest" when blank.
fn split_display_name(display_name: &str) -> (String, String) {
    let mut words = display_name.split_whitespace();
    let first = words.next().unwrap_or("Guest").to_string();
    let last = words.collect::<Vec<_>>().join(" ");
    (first, last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_display_name() {
        assert_eq!(
            split_display_name("Asha Gurung"),
            ("Asha".to_string(), "Gurung".to_string())
        );
        assert_eq!(
            split_display_name("Madonna"),
            ("Madonna".to_string(), String::new())
        );
        assert_eq!(
            split_display_name("Jan van der Berg"),
            ("Jan".to_string(), "van der Berg".to_string())
        );
        assert_eq!(split_display_name(""), ("Guest".to_string(), String::new()));
        assert_eq!(
            split_display_name("   "),
            ("Guest".to_string(), String::new())
        );
    }
}
