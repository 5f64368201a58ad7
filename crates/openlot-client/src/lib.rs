//! Client-side implementation for the openlot services.
//!
//! Wraps every remote operation in a typed method that performs exactly one
//! call and returns a [`CallResult`](openlot_core::CallResult). Identity for
//! mutations comes from a [`CredentialStore`]; bytes move over a
//! [`Transport`].

mod auction;
mod config;
mod credentials;
mod identity;
mod service;
mod store;
mod transport;
mod voting;

pub use auction::AuctionService;
pub use config::{ClientConfig, ConfigError, Network};
pub use credentials::{
    CredentialError, CredentialStore, DelegatedCredentialStore, IdentityProvider,
    LocalCredentialStore, ProviderError, AUTH_SEED_KEY, AUTH_STATUS_KEY,
};
pub use identity::{
    sign_request, verify_request, AnonymousIdentity, CallSignature, CallerIdentity,
    Ed25519Identity,
};
pub use service::ServiceClient;
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use transport::{Transport, TransportError, WsTransport};
pub use voting::VotingService;

use std::sync::Arc;

/// Auction and voting clients sharing one transport and one credential store.
pub struct Services<T> {
    pub auction: AuctionService<T>,
    pub voting: VotingService<T>,
}

impl<T: Transport + Clone> Services<T> {
    pub fn new(transport: T, config: &ClientConfig, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            auction: AuctionService::new(
                transport.clone(),
                config.auction_canister_id.clone(),
                credentials.clone(),
            ),
            voting: VotingService::new(transport, config.voting_canister_id.clone(), credentials),
        }
    }
}

impl Services<WsTransport> {
    /// Services talking WebSocket to the configured host.
    pub fn connect(config: &ClientConfig, credentials: Arc<dyn CredentialStore>) -> Self {
        Self::new(WsTransport::new(config.host()), config, credentials)
    }
}
