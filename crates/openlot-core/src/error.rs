//! Failure reasons reported by the remote services, plus local catch-alls.
//!
//! The services encode a failure either as a bare tag (`"BidTooLow"`) or as a
//! record whose single key names the variant (`{ "BidTooLow": null }`).
//! [`ErrorKind::from_wire`] turns either shape into a closed enum once, at the
//! client boundary. Tags nobody knows about are kept verbatim so they can
//! still be shown and diagnosed.

use serde::{Serialize, Serializer};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

/// Application-level and local failure reasons.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // Auction service.
    ItemNotFound,
    NotOwner,
    AuctionEnded,
    BidTooLow,
    ItemNotActive,
    InvalidInput,
    Unauthorized,
    AuctionHasBids,
    SecurityViolation,
    InputTooLong,
    // Voting service.
    AlreadyVoted,
    ProposalNotActive,
    InvalidChoice,
    NoSuchProposal,
    AccessDenied,
    UpdateError,
    /// The call never produced an application-level answer.
    NetworkError,
    /// A mutation was attempted without an authenticated identity.
    Unauthenticated,
    /// A failure value outside the known set.
    Unrecognized { shape: WireShape, raw: String },
}

/// How an unrecognized failure value was encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireShape {
    Tag,
    Record,
    Other,
}

impl ErrorKind {
    /// Every variant with a fixed tag, in declaration order.
    pub const KNOWN: [ErrorKind; 18] = [
        ErrorKind::ItemNotFound,
        ErrorKind::NotOwner,
        ErrorKind::AuctionEnded,
        ErrorKind::BidTooLow,
        ErrorKind::ItemNotActive,
        ErrorKind::InvalidInput,
        ErrorKind::Unauthorized,
        ErrorKind::AuctionHasBids,
        ErrorKind::SecurityViolation,
        ErrorKind::InputTooLong,
        ErrorKind::AlreadyVoted,
        ErrorKind::ProposalNotActive,
        ErrorKind::InvalidChoice,
        ErrorKind::NoSuchProposal,
        ErrorKind::AccessDenied,
        ErrorKind::UpdateError,
        ErrorKind::NetworkError,
        ErrorKind::Unauthenticated,
    ];

    /// Look up a bare tag, local ones included.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::KNOWN.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Look up a tag the services can send. Local tags are not among them.
    pub fn from_remote_tag(tag: &str) -> Option<Self> {
        Self::from_tag(tag).filter(ErrorKind::is_remote)
    }

    /// Decode a failure value from the wire. Never fails.
    ///
    /// A service answering with `network_error` or `unauthenticated` gets an
    /// `Unrecognized` kind, so it still counts as a remote failure.
    pub fn from_wire(value: &Value) -> Self {
        Self::decode(value, Self::from_remote_tag)
    }

    fn decode(value: &Value, lookup: impl Fn(&str) -> Option<Self>) -> Self {
        match value {
            Value::String(tag) => lookup(tag).unwrap_or_else(|| ErrorKind::Unrecognized {
                shape: WireShape::Tag,
                raw: tag.clone(),
            }),
            Value::Object(fields) => {
                let mut keys = fields.keys();
                match (keys.next(), keys.next()) {
                    (Some(key), None) => lookup(key),
                    _ => None,
                }
                .unwrap_or_else(|| ErrorKind::Unrecognized {
                    shape: WireShape::Record,
                    raw: value.to_string(),
                })
            }
            other => ErrorKind::Unrecognized {
                shape: WireShape::Other,
                raw: other.to_string(),
            },
        }
    }

    /// The wire tag, or the raw text for unrecognized values.
    pub fn tag(&self) -> &str {
        match self {
            ErrorKind::ItemNotFound => "ItemNotFound",
            ErrorKind::NotOwner => "NotOwner",
            ErrorKind::AuctionEnded => "AuctionEnded",
            ErrorKind::BidTooLow => "BidTooLow",
            ErrorKind::ItemNotActive => "ItemNotActive",
            ErrorKind::InvalidInput => "InvalidInput",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::AuctionHasBids => "AuctionHasBids",
            ErrorKind::SecurityViolation => "SecurityViolation",
            ErrorKind::InputTooLong => "InputTooLong",
            ErrorKind::AlreadyVoted => "AlreadyVoted",
            ErrorKind::ProposalNotActive => "ProposalNotActive",
            ErrorKind::InvalidChoice => "InvalidChoice",
            ErrorKind::NoSuchProposal => "NoSuchProposal",
            ErrorKind::AccessDenied => "AccessDenied",
            ErrorKind::UpdateError => "UpdateError",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::Unauthenticated => "unauthenticated",
            ErrorKind::Unrecognized { raw, .. } => raw,
        }
    }

    /// The user-facing message.
    pub fn message(&self) -> Cow<'static, str> {
        let fixed = match self {
            ErrorKind::ItemNotFound => "Auction item not found",
            ErrorKind::NotOwner => "You are not the owner of this item",
            ErrorKind::AuctionEnded => "This auction has ended",
            ErrorKind::BidTooLow => "Your bid is too low",
            ErrorKind::ItemNotActive => "This auction is not active",
            ErrorKind::InvalidInput => "Invalid input provided",
            ErrorKind::Unauthorized => "You are not authorized to perform this action",
            ErrorKind::AuctionHasBids => "Cannot modify auction with existing bids",
            ErrorKind::SecurityViolation => "Input contains invalid characters",
            ErrorKind::InputTooLong => "Input text is too long",
            ErrorKind::AlreadyVoted => "You have already voted on this proposal",
            ErrorKind::ProposalNotActive => "This proposal is not active",
            ErrorKind::InvalidChoice => "Invalid vote choice",
            ErrorKind::NoSuchProposal => "Proposal not found",
            ErrorKind::AccessDenied => "Only the proposal owner can do that",
            ErrorKind::UpdateError => "The proposal could not be updated",
            ErrorKind::NetworkError => "Network error",
            ErrorKind::Unauthenticated => "Please log in to perform this action",
            ErrorKind::Unrecognized { shape, raw } => {
                return Cow::Owned(match shape {
                    WireShape::Tag => format!("Unknown error: {raw}"),
                    WireShape::Record => format!("Unknown error object: {raw}"),
                    WireShape::Other => format!("Unknown error type: {raw}"),
                });
            }
        };
        Cow::Borrowed(fixed)
    }

    /// Whether the failure came from the service rather than this client.
    pub fn is_remote(&self) -> bool {
        !matches!(self, ErrorKind::NetworkError | ErrorKind::Unauthenticated)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for ErrorKind {}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

/// Map any failure value, local tags included, to its user-facing message.
pub fn format_error(value: &Value) -> String {
    ErrorKind::decode(value, ErrorKind::from_tag)
        .message()
        .into_owned()
}
