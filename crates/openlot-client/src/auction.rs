//! Auction service client.

use crate::credentials::CredentialStore;
use crate::service::{arg, ServiceClient};
use crate::transport::Transport;
use openlot_core::auction::{AuctionItem, Bid, CreateAuctionItem, UpdateAuctionItem};
use openlot_core::{CallResult, Nat, Opt, Principal};
use std::sync::Arc;

/// One method per auction service operation.
///
/// Mutations are not idempotent and are attempted exactly once.
pub struct AuctionService<T> {
    client: ServiceClient<T>,
}

impl<T: Transport> AuctionService<T> {
    pub fn new(transport: T, canister_id: Principal, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            client: ServiceClient::new(transport, canister_id, credentials),
        }
    }

    pub fn client(&self) -> &ServiceClient<T> {
        &self.client
    }

    // Updates

    pub async fn create_auction_item(&self, item: &CreateAuctionItem) -> CallResult<AuctionItem> {
        self.client
            .update_fallible("create_auction_item", vec![arg(item)?])
            .await
    }

    pub async fn place_bid(&self, item_id: &Nat, amount: &Nat) -> CallResult<()> {
        self.client
            .update_fallible("place_bid", vec![arg(item_id)?, arg(amount)?])
            .await
    }

    pub async fn edit_auction_item(
        &self,
        item_id: &Nat,
        updates: &UpdateAuctionItem,
    ) -> CallResult<AuctionItem> {
        self.client
            .update_fallible("edit_auction_item", vec![arg(item_id)?, arg(updates)?])
            .await
    }

    pub async fn stop_auction(&self, item_id: &Nat) -> CallResult<AuctionItem> {
        self.client
            .update_fallible("stop_auction", vec![arg(item_id)?])
            .await
    }

    /// Ask the service to close the auction if its end time has passed.
    pub async fn update_auction_status(&self, item_id: &Nat) -> CallResult<AuctionItem> {
        self.client
            .update_fallible("update_auction_status", vec![arg(item_id)?])
            .await
    }

    /// Remove every listing. Returns how many there were.
    pub async fn clear_all_auctions(&self) -> CallResult<Nat> {
        self.client.update("clear_all_auctions", vec![]).await
    }

    // Queries

    pub async fn get_all_auction_items(&self) -> CallResult<Vec<AuctionItem>> {
        self.client.query("get_all_auction_items", vec![]).await
    }

    pub async fn get_active_auction_items(&self) -> CallResult<Vec<AuctionItem>> {
        self.client.query("get_active_auction_items", vec![]).await
    }

    pub async fn get_auction_item(&self, item_id: &Nat) -> CallResult<Option<AuctionItem>> {
        let found: Opt<AuctionItem> = self
            .client
            .query("get_auction_item", vec![arg(item_id)?])
            .await?;
        Ok(found.into())
    }

    pub async fn get_item_bids(&self, item_id: &Nat) -> CallResult<Vec<Bid>> {
        self.client.query("get_item_bids", vec![arg(item_id)?]).await
    }

    pub async fn get_user_items(&self, owner: &Principal) -> CallResult<Vec<AuctionItem>> {
        self.client.query("get_user_items", vec![arg(owner)?]).await
    }

    pub async fn get_auction_count(&self) -> CallResult<Nat> {
        self.client.query("get_auction_count", vec![]).await
    }

    /// The closed auction with the highest winning bid.
    pub async fn get_item_sold_for_most(&self) -> CallResult<Option<AuctionItem>> {
        let found: Opt<AuctionItem> = self.client.query("get_item_sold_for_most", vec![]).await?;
        Ok(found.into())
    }

    /// The listing with the most bids.
    pub async fn get_most_bid_on_item(&self) -> CallResult<Option<AuctionItem>> {
        let found: Opt<AuctionItem> = self.client.query("get_most_bid_on_item", vec![]).await?;
        Ok(found.into())
    }
}
