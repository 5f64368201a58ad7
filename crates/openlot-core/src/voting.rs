//! Proposal records as served by the voting service.

use crate::wire::{self, Nat};
use crate::Principal;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A proposal and its running tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub description: String,
    pub approve: Nat,
    pub reject: Nat,
    pub pass: Nat,
    pub is_active: bool,
    /// Principals that have already voted.
    pub voted: Vec<Principal>,
    pub owner: Principal,
}

impl Proposal {
    pub fn has_voted(&self, principal: &Principal) -> bool {
        self.voted.contains(principal)
    }
}

/// Arguments for creating a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProposal {
    pub description: String,
    pub is_active: bool,
}

/// A ballot choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Choice {
    Approve,
    Reject,
    Pass,
}

impl Choice {
    pub fn name(&self) -> &'static str {
        match self {
            Choice::Approve => "Approve",
            Choice::Reject => "Reject",
            Choice::Pass => "Pass",
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Choice {
    type Err = ChoiceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "approve" => Ok(Choice::Approve),
            "reject" => Ok(Choice::Reject),
            "pass" => Ok(Choice::Pass),
            _ => Err(ChoiceParseError(s.to_string())),
        }
    }
}

impl Serialize for Choice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        wire::serialize_unit_variant(self.name(), serializer)
    }
}

/// Error parsing a ballot choice.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown choice {0:?}, expected approve, reject or pass")]
pub struct ChoiceParseError(String);
