//! Voting service client.

use crate::credentials::CredentialStore;
use crate::service::{arg, ServiceClient};
use crate::transport::Transport;
use openlot_core::voting::{Choice, CreateProposal, Proposal};
use openlot_core::{CallResult, Nat, Opt, Principal};
use std::sync::Arc;

/// One method per voting service operation.
pub struct VotingService<T> {
    client: ServiceClient<T>,
}

impl<T: Transport> VotingService<T> {
    pub fn new(transport: T, canister_id: Principal, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            client: ServiceClient::new(transport, canister_id, credentials),
        }
    }

    pub fn client(&self) -> &ServiceClient<T> {
        &self.client
    }

    pub async fn get_proposal(&self, key: &Nat) -> CallResult<Option<Proposal>> {
        let found: Opt<Proposal> = self.client.query("get_proposal", vec![arg(key)?]).await?;
        Ok(found.into())
    }

    pub async fn get_proposal_count(&self) -> CallResult<Nat> {
        self.client.query("get_proposal_count", vec![]).await
    }

    /// Store a proposal under `key`. Returns the key.
    pub async fn create_proposal(&self, key: &Nat, proposal: &CreateProposal) -> CallResult<Nat> {
        self.client
            .update("create_proposal", vec![arg(key)?, arg(proposal)?])
            .await
    }

    pub async fn vote(&self, key: &Nat, choice: Choice) -> CallResult<()> {
        self.client
            .update_fallible("vote", vec![arg(key)?, arg(&choice)?])
            .await
    }

    pub async fn end_proposal(&self, key: &Nat) -> CallResult<()> {
        self.client
            .update_fallible("end_proposal", vec![arg(key)?])
            .await
    }
}
