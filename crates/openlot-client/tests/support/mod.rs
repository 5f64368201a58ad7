//! In-memory auction and voting ledger used as a [`Transport`] in tests.

#![allow(dead_code)]

use async_trait::async_trait;
use openlot_client::{
    verify_request, AuctionService, ClientConfig, CredentialStore, LocalCredentialStore,
    MemoryStore, Transport, TransportError, VotingService,
};
use openlot_core::auction::{AuctionItem, Bid, CreateAuctionItem, UpdateAuctionItem};
use openlot_core::voting::{CreateProposal, Proposal};
use openlot_core::{CallKind, CallReply, CallRequest, Nat, Opt, Principal};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

pub const HOUR_NANOS: u128 = 3_600_000_000_000;
pub const START_NANOS: u128 = 1_700_000_000_000_000_000;

const AUCTION_UPDATES: &[&str] = &[
    "create_auction_item",
    "place_bid",
    "edit_auction_item",
    "stop_auction",
    "update_auction_status",
    "clear_all_auctions",
];
const VOTING_UPDATES: &[&str] = &["create_proposal", "vote", "end_proposal"];

/// A system-level refusal.
struct Reject(u32, String);

impl Reject {
    fn new(code: u32, message: impl Into<String>) -> Self {
        Self(code, message.into())
    }
}

type Outcome<T> = Result<T, &'static str>;

#[derive(Default)]
struct Ledger {
    now: u128,
    next_id: u64,
    items: BTreeMap<u64, AuctionItem>,
    bids: BTreeMap<u64, Vec<Bid>>,
    proposals: BTreeMap<u64, Proposal>,
}

/// Answers calls for both services the way the deployed ledgers do.
pub struct FakeLedger {
    auction_canister: Principal,
    voting_canister: Principal,
    ledger: Mutex<Ledger>,
    offline: AtomicBool,
    rejecting: AtomicBool,
    scripted: Mutex<Option<Value>>,
    calls: AtomicUsize,
}

impl FakeLedger {
    pub fn new(config: &ClientConfig) -> Arc<Self> {
        Arc::new(Self {
            auction_canister: config.auction_canister_id.clone(),
            voting_canister: config.voting_canister_id.clone(),
            ledger: Mutex::new(Ledger {
                now: START_NANOS,
                ..Ledger::default()
            }),
            offline: AtomicBool::new(false),
            rejecting: AtomicBool::new(false),
            scripted: Mutex::new(None),
            calls: AtomicUsize::new(0),
        })
    }

    /// Every call fails before reaching the ledger.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Every call is refused by the system.
    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::SeqCst);
    }

    /// The next call is answered with `value` instead of running the method.
    pub fn script_reply(&self, value: Value) {
        *self.scripted.lock() = Some(value);
    }

    /// Calls received, including those that failed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn advance_hours(&self, hours: u128) {
        self.ledger.lock().now += hours * HOUR_NANOS;
    }

    /// Overwrite a listing directly.
    pub fn put_item(&self, item: AuctionItem) {
        let id = key(&item.id).unwrap_or_default();
        let mut ledger = self.ledger.lock();
        ledger.bids.entry(id).or_default();
        ledger.items.insert(id, item);
    }

    fn handle(&self, request: &CallRequest) -> Result<Value, Reject> {
        let updates = if request.canister_id == self.auction_canister {
            AUCTION_UPDATES
        } else if request.canister_id == self.voting_canister {
            VOTING_UPDATES
        } else {
            return Err(Reject::new(3, format!("canister {} not found", request.canister_id)));
        };
        if updates.contains(&request.method.as_str()) && request.kind != CallKind::Update {
            return Err(Reject::new(3, format!("{} is an update method", request.method)));
        }

        let mut ledger = self.ledger.lock();
        if request.canister_id == self.auction_canister {
            ledger.auction(&request.method, &request.args, &request.sender)
        } else {
            ledger.voting(&request.method, &request.args, &request.sender)
        }
    }
}

#[async_trait]
impl Transport for FakeLedger {
    async fn call(&self, request: &CallRequest) -> Result<CallReply, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        if self.rejecting.load(Ordering::SeqCst) {
            return Ok(CallReply::Rejected {
                code: 5,
                message: "canister is stopped".to_string(),
            });
        }
        if !verify_request(request) {
            return Ok(CallReply::Rejected {
                code: 4,
                message: "invalid signature".to_string(),
            });
        }
        if let Some(value) = self.scripted.lock().take() {
            return Ok(CallReply::Replied { value });
        }

        Ok(match self.handle(request) {
            Ok(value) => CallReply::Replied { value },
            Err(Reject(code, message)) => CallReply::Rejected { code, message },
        })
    }
}

impl Ledger {
    fn auction(&mut self, method: &str, args: &[Value], caller: &Principal) -> Result<Value, Reject> {
        Ok(match method {
            "create_auction_item" => outcome(self.create_item(caller, arg(args, 0)?)),
            "place_bid" => outcome(self.place_bid(caller, &arg(args, 0)?, arg(args, 1)?)),
            "edit_auction_item" => outcome(self.edit_item(caller, &arg(args, 0)?, arg(args, 1)?)),
            "stop_auction" => outcome(self.stop_auction(caller, &arg(args, 0)?)),
            "update_auction_status" => outcome(self.update_status(&arg(args, 0)?)),
            "clear_all_auctions" => {
                let count = Nat::from(self.items.len());
                self.items.clear();
                self.bids.clear();
                encode(&count)
            }
            "get_all_auction_items" => encode(&self.items.values().collect::<Vec<_>>()),
            "get_active_auction_items" => encode(
                &self
                    .items
                    .values()
                    .filter(|item| item.is_active && !self.is_expired(item))
                    .collect::<Vec<_>>(),
            ),
            "get_auction_item" => {
                let id: Nat = arg(args, 0)?;
                encode(&Opt(key(&id).and_then(|id| self.items.get(&id))))
            }
            "get_item_bids" => {
                let id: Nat = arg(args, 0)?;
                let bids = key(&id).and_then(|id| self.bids.get(&id));
                encode(&bids.cloned().unwrap_or_default())
            }
            "get_user_items" => {
                let owner: Principal = arg(args, 0)?;
                encode(
                    &self
                        .items
                        .values()
                        .filter(|item| item.owner == owner)
                        .collect::<Vec<_>>(),
                )
            }
            "get_auction_count" => encode(&Nat::from(self.items.len())),
            "get_item_sold_for_most" => encode(&Opt(self
                .items
                .values()
                .filter(|item| !item.is_active && item.highest_bidder.is_some())
                .max_by(|a, b| a.current_highest_bid.cmp(&b.current_highest_bid)))),
            "get_most_bid_on_item" => encode(&Opt(self
                .items
                .values()
                .map(|item| (item, self.bids.get(&key(&item.id).unwrap_or_default()).map_or(0, Vec::len)))
                .filter(|(_, count)| *count > 0)
                .max_by_key(|(_, count)| *count)
                .map(|(item, _)| item))),
            other => return Err(Reject::new(3, format!("method {other} not found"))),
        })
    }

    fn voting(&mut self, method: &str, args: &[Value], caller: &Principal) -> Result<Value, Reject> {
        Ok(match method {
            "get_proposal" => {
                let id: Nat = arg(args, 0)?;
                encode(&Opt(key(&id).and_then(|id| self.proposals.get(&id))))
            }
            "get_proposal_count" => encode(&Nat::from(self.proposals.len())),
            "create_proposal" => {
                let id: Nat = arg(args, 0)?;
                let proposal: CreateProposal = arg(args, 1)?;
                let slot = key(&id).ok_or_else(|| Reject::new(5, "key out of range"))?;
                self.proposals.insert(
                    slot,
                    Proposal {
                        description: proposal.description,
                        approve: Nat::zero(),
                        reject: Nat::zero(),
                        pass: Nat::zero(),
                        is_active: proposal.is_active,
                        voted: Vec::new(),
                        owner: caller.clone(),
                    },
                );
                encode(&id)
            }
            "vote" => outcome(self.vote(caller, &arg(args, 0)?, &arg(args, 1)?)),
            "end_proposal" => outcome(self.end_proposal(caller, &arg(args, 0)?)),
            other => return Err(Reject::new(3, format!("method {other} not found"))),
        })
    }

    fn is_expired(&self, item: &AuctionItem) -> bool {
        item.end_time
            .as_ref()
            .is_some_and(|end| &Nat::from(self.now) >= end)
    }

    fn end_time(&self, hours: Option<&Nat>) -> Outcome<Option<Nat>> {
        let Some(hours) = hours else {
            return Ok(None);
        };
        let hours = u128::try_from(hours).map_err(|_| "InvalidInput")?;
        let end = hours
            .checked_mul(HOUR_NANOS)
            .and_then(|span| span.checked_add(self.now))
            .ok_or("InvalidInput")?;
        Ok(Some(Nat::from(end)))
    }

    fn create_item(&mut self, caller: &Principal, input: CreateAuctionItem) -> Outcome<AuctionItem> {
        validate_text(Some(&input.title), 100)?;
        validate_text(Some(&input.description), 1000)?;
        if input.starting_price.is_zero() {
            return Err("InvalidInput");
        }

        self.next_id += 1;
        let id = self.next_id;
        let item = AuctionItem {
            id: Nat::from(id),
            title: input.title,
            description: input.description,
            starting_price: input.starting_price.clone(),
            current_highest_bid: input.starting_price,
            highest_bidder: None,
            owner: caller.clone(),
            new_owner: None,
            is_active: true,
            created_at: Nat::from(self.now),
            end_time: self.end_time(input.duration_hours.as_ref())?,
        };
        self.items.insert(id, item.clone());
        self.bids.insert(id, Vec::new());
        Ok(item)
    }

    fn place_bid(&mut self, caller: &Principal, id: &Nat, amount: Nat) -> Outcome<()> {
        let id = key(id).ok_or("ItemNotFound")?;
        let now = Nat::from(self.now);
        let expired = {
            let item = self.items.get(&id).ok_or("ItemNotFound")?;
            self.is_expired(item)
        };
        let item = self.items.get_mut(&id).ok_or("ItemNotFound")?;

        if !item.is_active {
            return Err("ItemNotActive");
        }
        if expired {
            item.is_active = false;
            return Err("AuctionEnded");
        }
        if amount.is_zero() {
            return Err("InvalidInput");
        }
        if amount <= item.current_highest_bid {
            return Err("BidTooLow");
        }
        if &item.owner == caller {
            return Err("Unauthorized");
        }

        item.current_highest_bid = amount.clone();
        item.highest_bidder = Some(caller.clone());
        self.bids.entry(id).or_default().push(Bid {
            bidder: caller.clone(),
            amount,
            timestamp: now,
        });
        Ok(())
    }

    fn edit_item(&mut self, caller: &Principal, id: &Nat, updates: UpdateAuctionItem) -> Outcome<AuctionItem> {
        let id = key(id).ok_or("ItemNotFound")?;
        let item = self.items.get(&id).ok_or("ItemNotFound")?;
        if &item.owner != caller {
            return Err("NotOwner");
        }
        if !item.is_active {
            return Err("ItemNotActive");
        }
        if self.is_expired(item) {
            return Err("AuctionEnded");
        }
        validate_text(updates.title.as_ref(), 100)?;
        validate_text(updates.description.as_ref(), 1000)?;
        if updates.starting_price.as_ref().is_some_and(Nat::is_zero) {
            return Err("InvalidInput");
        }
        let has_bids = self.bids.get(&id).is_some_and(|bids| !bids.is_empty());
        if has_bids && updates.starting_price.is_some() {
            return Err("AuctionHasBids");
        }

        let end_time = match &updates.duration_hours {
            Some(hours) => Some(self.end_time(Some(hours))?),
            None => None,
        };
        let item = self.items.get_mut(&id).ok_or("ItemNotFound")?;
        if let Some(title) = updates.title {
            item.title = title;
        }
        if let Some(description) = updates.description {
            item.description = description;
        }
        if let Some(price) = updates.starting_price {
            item.starting_price = price.clone();
            item.current_highest_bid = price;
        }
        if let Some(end_time) = end_time {
            item.end_time = end_time;
        }
        Ok(item.clone())
    }

    fn stop_auction(&mut self, caller: &Principal, id: &Nat) -> Outcome<AuctionItem> {
        let id = key(id).ok_or("ItemNotFound")?;
        let item = self.items.get_mut(&id).ok_or("ItemNotFound")?;
        if &item.owner != caller {
            return Err("NotOwner");
        }
        if !item.is_active {
            return Err("ItemNotActive");
        }
        item.is_active = false;
        item.new_owner = item.highest_bidder.clone();
        Ok(item.clone())
    }

    fn update_status(&mut self, id: &Nat) -> Outcome<AuctionItem> {
        let id = key(id).ok_or("ItemNotFound")?;
        let expired = self.is_expired(self.items.get(&id).ok_or("ItemNotFound")?);
        let item = self.items.get_mut(&id).ok_or("ItemNotFound")?;
        if expired {
            item.is_active = false;
        }
        Ok(item.clone())
    }

    fn vote(&mut self, caller: &Principal, id: &Nat, choice: &Value) -> Outcome<()> {
        let proposal = key(id)
            .and_then(|id| self.proposals.get_mut(&id))
            .ok_or("NoSuchProposal")?;
        if proposal.has_voted(caller) {
            return Err("AlreadyVoted");
        }
        if !proposal.is_active {
            return Err("ProposalNotActive");
        }

        let tally = match choice.as_object().and_then(|record| record.keys().next()) {
            Some(name) if name == "Approve" => &mut proposal.approve,
            Some(name) if name == "Reject" => &mut proposal.reject,
            Some(name) if name == "Pass" => &mut proposal.pass,
            _ => return Err("InvalidChoice"),
        };
        let count = u128::try_from(&*tally).map_err(|_| "UpdateError")?;
        *tally = Nat::from(count + 1);
        proposal.voted.push(caller.clone());
        Ok(())
    }

    fn end_proposal(&mut self, caller: &Principal, id: &Nat) -> Outcome<()> {
        let proposal = key(id)
            .and_then(|id| self.proposals.get_mut(&id))
            .ok_or("NoSuchProposal")?;
        if &proposal.owner != caller {
            return Err("AccessDenied");
        }
        proposal.is_active = false;
        Ok(())
    }
}

fn validate_text(text: Option<&String>, max_len: usize) -> Outcome<()> {
    let Some(text) = text else {
        return Ok(());
    };
    if text.trim().is_empty() {
        return Err("InvalidInput");
    }
    if text.len() > max_len {
        return Err("InputTooLong");
    }
    if text.contains(['<', '>', '"', '\'']) {
        return Err("SecurityViolation");
    }
    Ok(())
}

fn key(id: &Nat) -> Option<u64> {
    u64::try_from(id).ok()
}

fn arg<T: DeserializeOwned>(args: &[Value], index: usize) -> Result<T, Reject> {
    let value = args
        .get(index)
        .ok_or_else(|| Reject::new(5, format!("missing argument {index}")))?;
    serde_json::from_value(value.clone())
        .map_err(|e| Reject::new(5, format!("argument {index}: {e}")))
}

fn encode<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).expect("ledger values encode")
}

fn outcome<T: Serialize>(result: Outcome<T>) -> Value {
    match result {
        Ok(value) => json!({ "Ok": encode(&value) }),
        Err(tag) => json!({ "Err": { tag: null } }),
    }
}

/// A credential store that is already logged in with a fresh identity.
pub async fn logged_in() -> Arc<dyn CredentialStore> {
    let store = LocalCredentialStore::new(MemoryStore::new());
    store
        .get_or_create_identity()
        .await
        .expect("memory store login");
    Arc::new(store)
}

/// A credential store nobody has logged into.
pub fn logged_out() -> Arc<dyn CredentialStore> {
    Arc::new(LocalCredentialStore::new(MemoryStore::new()))
}

pub fn auction(
    ledger: &Arc<FakeLedger>,
    credentials: Arc<dyn CredentialStore>,
) -> AuctionService<Arc<FakeLedger>> {
    AuctionService::new(
        ledger.clone(),
        ClientConfig::default().auction_canister_id,
        credentials,
    )
}

pub fn voting(
    ledger: &Arc<FakeLedger>,
    credentials: Arc<dyn CredentialStore>,
) -> VotingService<Arc<FakeLedger>> {
    VotingService::new(
        ledger.clone(),
        ClientConfig::default().voting_canister_id,
        credentials,
    )
}

pub fn listing(title: &str, price: u64, hours: Option<u64>) -> CreateAuctionItem {
    CreateAuctionItem {
        title: title.to_string(),
        description: format!("{title} in good condition"),
        starting_price: Nat::from(price),
        duration_hours: hours.map(Nat::from),
    }
}
