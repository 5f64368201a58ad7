//! Credential stores: where the signing identity for mutations comes from.
//!
//! Call sites only see [`CredentialStore`]. Two strategies exist:
//! - [`LocalCredentialStore`] derives an Ed25519 identity from a seed that is
//!   generated once and persisted in a [`KeyValueStore`].
//! - [`DelegatedCredentialStore`] defers to an external [`IdentityProvider`].

use crate::identity::{CallerIdentity, Ed25519Identity};
use crate::store::{KeyValueStore, StoreError};
use async_trait::async_trait;
use openlot_core::Principal;
use parking_lot::RwLock;
use rand::RngCore;
use std::sync::Arc;
use zeroize::Zeroizing;

/// Store key for the logged-in flag.
pub const AUTH_STATUS_KEY: &str = "local_auth_status";
/// Store key for the hex-encoded identity seed.
pub const AUTH_SEED_KEY: &str = "local_auth_seed";
const AUTHENTICATED: &str = "authenticated";

/// Error obtaining or clearing credentials.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("persisted identity seed is not 32 hex-encoded bytes")]
    CorruptSeed,
    #[error("entropy source failed: {0}")]
    Entropy(String),
    #[error("identity provider: {0}")]
    Provider(#[from] ProviderError),
}

/// Error reported by an external identity provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("login was cancelled")]
    Cancelled,
    #[error("login failed: {0}")]
    Failed(String),
}

/// Source of the authenticated identity used for mutations.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Log in, creating the identity if needed.
    async fn get_or_create_identity(&self) -> Result<Arc<dyn CallerIdentity>, CredentialError>;

    /// The logged-in identity, if any. Never creates one.
    fn current_identity(&self) -> Result<Option<Arc<dyn CallerIdentity>>, CredentialError>;

    /// Log out.
    async fn clear_identity(&self) -> Result<(), CredentialError>;

    /// The principal shown for this session: the logged-in one, else anonymous.
    fn session_principal(&self) -> Principal {
        match self.current_identity() {
            Ok(Some(identity)) => identity.principal(),
            Ok(None) => Principal::anonymous(),
            Err(e) => {
                tracing::warn!("Falling back to anonymous principal: {}", e);
                Principal::anonymous()
            }
        }
    }
}

/// Locally generated Ed25519 identity persisted as a seed.
///
/// Logging out clears only the logged-in flag; the seed is kept so the next
/// login recovers the same principal. [`LocalCredentialStore::forget`] removes
/// the seed too.
pub struct LocalCredentialStore<S> {
    store: S,
}

impl<S: KeyValueStore> LocalCredentialStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Log out and discard the seed, so the next login yields a new principal.
    pub fn forget(&self) -> Result<(), CredentialError> {
        self.store.remove(AUTH_STATUS_KEY)?;
        self.store.remove(AUTH_SEED_KEY)?;
        tracing::info!("Local identity seed discarded");
        Ok(())
    }

    fn load_seed(&self) -> Result<Option<Zeroizing<[u8; 32]>>, CredentialError> {
        let Some(encoded) = self.store.get(AUTH_SEED_KEY)?.map(Zeroizing::new) else {
            return Ok(None);
        };

        let mut seed = Zeroizing::new([0u8; 32]);
        hex::decode_to_slice(encoded.as_str(), &mut seed[..])
            .map_err(|_| CredentialError::CorruptSeed)?;
        Ok(Some(seed))
    }

    fn generate_seed(&self) -> Result<Zeroizing<[u8; 32]>, CredentialError> {
        let mut seed = Zeroizing::new([0u8; 32]);
        rand::rngs::OsRng
            .try_fill_bytes(&mut seed[..])
            .map_err(|e| CredentialError::Entropy(e.to_string()))?;

        let encoded = Zeroizing::new(hex::encode(&seed[..]));
        self.store.set(AUTH_SEED_KEY, &encoded)?;
        tracing::debug!("Generated new local identity seed");
        Ok(seed)
    }

    fn is_logged_in(&self) -> Result<bool, CredentialError> {
        Ok(self.store.get(AUTH_STATUS_KEY)?.as_deref() == Some(AUTHENTICATED))
    }
}

#[async_trait]
impl<S: KeyValueStore> CredentialStore for LocalCredentialStore<S> {
    async fn get_or_create_identity(&self) -> Result<Arc<dyn CallerIdentity>, CredentialError> {
        let seed = match self.load_seed()? {
            Some(seed) => seed,
            None => self.generate_seed()?,
        };
        self.store.set(AUTH_STATUS_KEY, AUTHENTICATED)?;

        let identity = Ed25519Identity::from_seed(&seed);
        tracing::info!("Logged in as {}", identity.principal());
        Ok(Arc::new(identity))
    }

    fn current_identity(&self) -> Result<Option<Arc<dyn CallerIdentity>>, CredentialError> {
        if !self.is_logged_in()? {
            return Ok(None);
        }
        Ok(self
            .load_seed()?
            .map(|seed| Arc::new(Ed25519Identity::from_seed(&seed)) as Arc<dyn CallerIdentity>))
    }

    async fn clear_identity(&self) -> Result<(), CredentialError> {
        self.store.remove(AUTH_STATUS_KEY)?;
        tracing::info!("Logged out");
        Ok(())
    }
}

/// An external login flow that hands back a signing identity.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// An identity from an earlier login that is still valid.
    async fn restore(&self) -> Option<Arc<dyn CallerIdentity>>;

    /// Run the login flow.
    async fn login(&self) -> Result<Arc<dyn CallerIdentity>, ProviderError>;

    async fn logout(&self) -> Result<(), ProviderError>;
}

/// Credentials owned by an external identity provider.
///
/// When the provider is unavailable or the login fails, the session stays
/// anonymous and mutations have no identity to use.
pub struct DelegatedCredentialStore<P> {
    provider: P,
    session: RwLock<Option<Arc<dyn CallerIdentity>>>,
}

impl<P: IdentityProvider> DelegatedCredentialStore<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            session: RwLock::new(None),
        }
    }

    /// Pick up a session left over from an earlier login, if the provider has one.
    pub async fn init(&self) {
        let restored = self.provider.restore().await;
        match &restored {
            Some(identity) => tracing::info!("Restored session for {}", identity.principal()),
            None => tracing::debug!("No delegated session to restore"),
        }
        *self.session.write() = restored;
    }
}

#[async_trait]
impl<P: IdentityProvider> CredentialStore for DelegatedCredentialStore<P> {
    async fn get_or_create_identity(&self) -> Result<Arc<dyn CallerIdentity>, CredentialError> {
        let existing = self.session.read().clone();
        if let Some(identity) = existing {
            return Ok(identity);
        }

        match self.provider.login().await {
            Ok(identity) => {
                tracing::info!("Logged in as {}", identity.principal());
                *self.session.write() = Some(identity.clone());
                Ok(identity)
            }
            Err(e) => {
                tracing::warn!("Login failed: {}", e);
                Err(e.into())
            }
        }
    }

    fn current_identity(&self) -> Result<Option<Arc<dyn CallerIdentity>>, CredentialError> {
        Ok(self.session.read().clone())
    }

    async fn clear_identity(&self) -> Result<(), CredentialError> {
        self.provider.logout().await?;
        *self.session.write() = None;
        tracing::info!("Logged out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::AnonymousIdentity;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn local_login_persists_seed() {
        let creds = LocalCredentialStore::new(MemoryStore::new());
        assert!(creds.current_identity().unwrap().is_none());
        assert!(creds.session_principal().is_anonymous());

        let identity = creds.get_or_create_identity().await.unwrap();
        assert!(!identity.principal().is_anonymous());
        assert_eq!(
            creds.current_identity().unwrap().unwrap().principal(),
            identity.principal()
        );
        assert_eq!(creds.session_principal(), identity.principal());
    }

    #[tokio::test]
    async fn logout_keeps_seed_and_principal() {
        let creds = LocalCredentialStore::new(MemoryStore::new());
        let first = creds.get_or_create_identity().await.unwrap().principal();

        creds.clear_identity().await.unwrap();
        assert!(creds.current_identity().unwrap().is_none());
        assert!(creds.store().get(AUTH_SEED_KEY).unwrap().is_some());

        let second = creds.get_or_create_identity().await.unwrap().principal();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn forget_yields_new_principal() {
        let creds = LocalCredentialStore::new(MemoryStore::new());
        let first = creds.get_or_create_identity().await.unwrap().principal();
        creds.forget().unwrap();
        assert!(creds.store().get(AUTH_SEED_KEY).unwrap().is_none());
        let second = creds.get_or_create_identity().await.unwrap().principal();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn corrupt_seed_is_an_error() {
        let store = MemoryStore::new();
        store.set(AUTH_SEED_KEY, "zz").unwrap();
        store.set(AUTH_STATUS_KEY, AUTHENTICATED).unwrap();
        let creds = LocalCredentialStore::new(store);
        assert!(matches!(
            creds.current_identity(),
            Err(CredentialError::CorruptSeed)
        ));
        assert!(creds.session_principal().is_anonymous());
    }

    struct StubProvider {
        outcome: Result<(), ProviderError>,
    }

    #[async_trait]
    impl IdentityProvider for StubProvider {
        async fn restore(&self) -> Option<Arc<dyn CallerIdentity>> {
            None
        }

        async fn login(&self) -> Result<Arc<dyn CallerIdentity>, ProviderError> {
            self.outcome.clone()?;
            Ok(Arc::new(Ed25519Identity::from_seed(&[3u8; 32])))
        }

        async fn logout(&self) -> Result<(), ProviderError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn delegated_login_and_logout() {
        let creds = DelegatedCredentialStore::new(StubProvider { outcome: Ok(()) });
        creds.init().await;
        assert!(creds.session_principal().is_anonymous());

        let identity = creds.get_or_create_identity().await.unwrap();
        assert_eq!(creds.session_principal(), identity.principal());

        creds.clear_identity().await.unwrap();
        assert!(creds.current_identity().unwrap().is_none());
    }

    #[tokio::test]
    async fn delegated_failure_stays_anonymous() {
        let creds = DelegatedCredentialStore::new(StubProvider {
            outcome: Err(ProviderError::Cancelled),
        });
        assert!(matches!(
            creds.get_or_create_identity().await,
            Err(CredentialError::Provider(ProviderError::Cancelled))
        ));
        assert!(creds.current_identity().unwrap().is_none());
        assert_eq!(
            creds.session_principal(),
            AnonymousIdentity.principal()
        );
    }
}
