//! Text rendering for records.

use openlot_core::auction::{AuctionItem, Bid};
use openlot_core::voting::Proposal;
use openlot_core::{Nat, Principal};
use std::time::{SystemTime, UNIX_EPOCH};

const MINUTE_NANOS: u128 = 60 * 1_000_000_000;
const HOUR_NANOS: u128 = 60 * MINUTE_NANOS;

pub fn now_nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or(0)
}

/// Nanoseconds until `end_time`, floored at zero. `None` when there is no end.
pub fn time_left(end_time: Option<&Nat>, now: u128) -> Option<u128> {
    let end = u128::try_from(end_time?).unwrap_or(u128::MAX);
    Some(end.saturating_sub(now))
}

pub fn format_time_left(left: Option<u128>) -> String {
    match left {
        None => "No time limit".to_string(),
        Some(nanos) => format!(
            "{}h {}m",
            nanos / HOUR_NANOS,
            (nanos % HOUR_NANOS) / MINUTE_NANOS
        ),
    }
}

/// Shorten to `start...end` characters unless that would not save anything.
pub fn format_principal(principal: &Principal, start: usize, end: usize) -> String {
    let text = principal.as_str();
    let len = text.chars().count();
    if len <= start + end + 3 {
        return text.to_string();
    }
    let head: String = text.chars().take(start).collect();
    let tail: String = text.chars().skip(len - end).collect();
    format!("{head}...{tail}")
}

fn short(principal: &Principal) -> String {
    format_principal(principal, 8, 4)
}

/// Card lines for one listing, as seen by `viewer`.
pub fn render_item(item: &AuctionItem, viewer: Option<&Principal>, now: u128) -> Vec<String> {
    let status = if item.is_active { "Active" } else { "Ended" };
    let mut lines = vec![
        format!("#{} {} [{}]", item.id, item.title, status),
        format!("  {}", item.description),
        format!("  Owner: {}", short(&item.owner)),
        format!("  Current bid: {} ICP", item.current_highest_bid),
    ];
    if let Some(bidder) = &item.highest_bidder {
        lines.push(format!("  Highest bidder: {}", short(bidder)));
    }
    if let Some(new_owner) = &item.new_owner {
        lines.push(format!("  Sold to: {}", short(new_owner)));
    }
    if item.end_time.is_some() {
        let left = time_left(item.end_time.as_ref(), now);
        lines.push(format!("  Time left: {}", format_time_left(left)));
    }
    if viewer.is_some_and(|viewer| item.is_owned_by(viewer)) {
        lines.push("  You own this auction".to_string());
    }
    lines
}

pub fn render_bid(bid: &Bid) -> String {
    format!("{} ICP by {} at {}", bid.amount, short(&bid.bidder), bid.timestamp)
}

pub fn render_proposal(key: &Nat, proposal: &Proposal) -> Vec<String> {
    let status = if proposal.is_active { "Open" } else { "Closed" };
    vec![
        format!("Proposal {} [{}]", key, status),
        format!("  {}", proposal.description),
        format!("  Owner: {}", short(&proposal.owner)),
        format!(
            "  Approve: {}  Reject: {}  Pass: {}",
            proposal.approve, proposal.reject, proposal.pass
        ),
        format!("  Votes cast: {}", proposal.voted.len()),
    ]
}
