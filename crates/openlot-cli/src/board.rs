//! Listings fetched from the auction service.

use openlot_client::{AuctionService, Transport};
use openlot_core::auction::AuctionItem;
use openlot_core::CallResult;

/// The last successfully fetched set of listings.
///
/// A failed refresh leaves the previous listings in place.
#[derive(Debug, Default)]
pub struct AuctionBoard {
    items: Vec<AuctionItem>,
}

impl AuctionBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[AuctionItem] {
        &self.items
    }

    pub async fn refresh<T: Transport>(&mut self, service: &AuctionService<T>) -> CallResult<()> {
        match service.get_all_auction_items().await {
            Ok(items) => {
                tracing::debug!("Fetched {} listings", items.len());
                self.items = items;
                Ok(())
            }
            Err(kind) => {
                tracing::warn!("Keeping {} cached listings: {}", self.items.len(), kind);
                Err(kind)
            }
        }
    }
}
