//! Process-wide credential store.
//!
//! Holds the bearer tokens and the signed-in user for the whole process.
//! Single-writer convention: only the login/logout flows
//! ([`crate::services::auth::AuthService`]) and the token-refresh path
//! ([`crate::api::ApiClient`]) write to this store; everything else reads.
//!
//! The generation counter increments on every write so the refresh path can
//! tell "the credential I sent is still current" apart from "someone already
//! replaced it while I waited" - that distinction is what deduplicates
//! concurrent refresh exchanges.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, RwLock};

use driftmarket_core::{AccessToken, RefreshToken};

use crate::api::types::AuthUser;

/// A full credential set as returned by login.
#[derive(Debug, Clone)]
pub struct Credential {
    /// Short-lived bearer token attached to every request.
    pub access: AccessToken,
    /// Long-lived token exchanged for new access tokens. Absent for
    /// sessions restored without one; refresh-on-401 is then disabled.
    pub refresh: Option<RefreshToken>,
    /// The signed-in user, when the backend returned one.
    pub user: Option<AuthUser>,
}

/// Shared handle to the process-wide credential state.
#[derive(Clone, Default)]
pub struct CredentialStore {
    inner: Arc<CredentialStoreInner>,
}

#[derive(Default)]
struct CredentialStoreInner {
    credential: RwLock<Option<Credential>>,
    /// Bumped on every write; read lock-free by the refresh path.
    generation: AtomicU64,
    /// Serializes refresh exchanges so concurrent 401s share one.
    refresh_gate: Mutex<()>,
}

impl CredentialStore {
    /// Create an empty store (signed out).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Readers
    // =========================================================================

    /// Current access token, if signed in.
    pub async fn access_token(&self) -> Option<AccessToken> {
        self.inner
            .credential
            .read()
            .await
            .as_ref()
            .map(|c| c.access.clone())
    }

    /// Current refresh token, if one was issued.
    pub async fn refresh_token(&self) -> Option<RefreshToken> {
        self.inner
            .credential
            .read()
            .await
            .as_ref()
            .and_then(|c| c.refresh.clone())
    }

    /// The signed-in user, if known.
    pub async fn current_user(&self) -> Option<AuthUser> {
        self.inner
            .credential
            .read()
            .await
            .as_ref()
            .and_then(|c| c.user.clone())
    }

    /// Whether an access credential is present.
    pub async fn is_authenticated(&self) -> bool {
        self.inner.credential.read().await.is_some()
    }

    /// Generation counter value. Changes whenever the credential changes.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::Acquire)
    }

    /// The mutex that serializes refresh exchanges.
    pub(crate) fn refresh_gate(&self) -> &Mutex<()> {
        &self.inner.refresh_gate
    }

    // =========================================================================
    // Writers (login / refresh / logout only)
    // =========================================================================

    /// Store a full credential set after login or registration.
    pub async fn store_session(
        &self,
        access: AccessToken,
        refresh: Option<RefreshToken>,
        user: Option<AuthUser>,
    ) {
        *self.inner.credential.write().await = Some(Credential {
            access,
            refresh,
            user,
        });
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Replace only the access token after a successful refresh exchange,
    /// keeping the refresh token and user.
    pub async fn store_access(&self, access: AccessToken) {
        let mut guard = self.inner.credential.write().await;
        if let Some(credential) = guard.as_mut() {
            credential.access = access;
        } else {
            // Refresh landed after logout; treat as a bare session.
            *guard = Some(Credential {
                access,
                refresh: None,
                user: None,
            });
        }
        drop(guard);
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Clear the credential on logout.
    pub async fn clear(&self) {
        *self.inner.credential.write().await = None;
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_and_read_session() {
        let store = CredentialStore::new();
        assert!(!store.is_authenticated().await);

        store
            .store_session(
                AccessToken::new("access-1".to_string()),
                Some(RefreshToken::new("refresh-1".to_string())),
                None,
            )
            .await;

        assert!(store.is_authenticated().await);
        assert_eq!(store.access_token().await.unwrap().reveal(), "access-1");
        assert_eq!(store.refresh_token().await.unwrap().reveal(), "refresh-1");
    }

    #[tokio::test]
    async fn test_generation_changes_on_every_write() {
        let store = CredentialStore::new();
        let g0 = store.generation();

        store
            .store_session(AccessToken::new("a".to_string()), None, None)
            .await;
        let g1 = store.generation();
        assert_ne!(g0, g1);

        store.store_access(AccessToken::new("b".to_string())).await;
        let g2 = store.generation();
        assert_ne!(g1, g2);

        store.clear().await;
        assert_ne!(g2, store.generation());
    }

    #[tokio::test]
    async fn test_store_access_keeps_refresh_token() {
        let store = CredentialStore::new();
        store
            .store_session(
                AccessToken::new("a1".to_string()),
                Some(RefreshToken::new("r1".to_string())),
                None,
            )
            .await;

        store.store_access(AccessToken::new("a2".to_string())).await;

        assert_eq!(store.access_token().await.unwrap().reveal(), "a2");
        assert_eq!(store.refresh_token().await.unwrap().reveal(), "r1");
    }

    #[tokio::test]
    async fn test_clear_signs_out() {
        let store = CredentialStore::new();
        store
            .store_session(AccessToken::new("a".to_string()), None, None)
            .await;
        store.clear().await;
        assert!(!store.is_authenticated().await);
        assert!(store.access_token().await.is_none());
    }
}
