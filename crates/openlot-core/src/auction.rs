//! Auction records as served by the auction service.

use crate::wire::{self, Nat};
use crate::Principal;
use serde::{Deserialize, Serialize};

/// A listing.
///
/// Timestamps are nanoseconds since the Unix epoch, as stamped by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionItem {
    pub id: Nat,
    pub title: String,
    pub description: String,
    pub starting_price: Nat,
    pub current_highest_bid: Nat,
    #[serde(with = "wire::opt")]
    pub highest_bidder: Option<Principal>,
    pub owner: Principal,
    /// Set when the auction is stopped with at least one bid.
    #[serde(with = "wire::opt")]
    pub new_owner: Option<Principal>,
    pub is_active: bool,
    pub created_at: Nat,
    #[serde(with = "wire::opt")]
    pub end_time: Option<Nat>,
}

impl AuctionItem {
    pub fn is_owned_by(&self, principal: &Principal) -> bool {
        &self.owner == principal
    }

    pub fn has_bids(&self) -> bool {
        self.highest_bidder.is_some()
    }
}

/// A bid placed on a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    pub bidder: Principal,
    pub amount: Nat,
    pub timestamp: Nat,
}

/// Arguments for creating a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAuctionItem {
    pub title: String,
    pub description: String,
    pub starting_price: Nat,
    /// Auction length; absent means no time limit.
    #[serde(with = "wire::opt")]
    pub duration_hours: Option<Nat>,
}

/// Partial update of a listing. Absent fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateAuctionItem {
    #[serde(with = "wire::opt")]
    pub title: Option<String>,
    #[serde(with = "wire::opt")]
    pub description: Option<String>,
    #[serde(with = "wire::opt")]
    pub starting_price: Option<Nat>,
    #[serde(with = "wire::opt")]
    pub duration_hours: Option<Nat>,
}

impl UpdateAuctionItem {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.starting_price.is_none()
            && self.duration_hours.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item_json() -> serde_json::Value {
        json!({
            "id": "1",
            "title": "Lamp",
            "description": "Brass desk lamp",
            "starting_price": "100",
            "current_highest_bid": "100",
            "highest_bidder": [],
            "owner": "2vxsx-fae",
            "new_owner": [],
            "is_active": true,
            "created_at": "1700000000000000000",
            "end_time": ["1700003600000000000"]
        })
    }

    #[test]
    fn decode_item() {
        let item: AuctionItem = serde_json::from_value(item_json()).unwrap();
        assert_eq!(item.id, Nat::from(1u32));
        assert_eq!(item.highest_bidder, None);
        assert!(!item.has_bids());
        assert!(item.is_owned_by(&Principal::anonymous()));
        assert_eq!(
            item.end_time,
            Some("1700003600000000000".parse().unwrap())
        );
        assert_eq!(serde_json::to_value(&item).unwrap(), item_json());
    }

    #[test]
    fn empty_update_sends_empty_sequences() {
        let update = UpdateAuctionItem::default();
        assert!(update.is_empty());
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({
                "title": [],
                "description": [],
                "starting_price": [],
                "duration_hours": []
            })
        );
    }
}
