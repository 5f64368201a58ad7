//! Core types for openlot.
//!
//! This crate holds the protocol primitives shared by the client and anything
//! that speaks to the auction and voting services: principals, the wire value
//! conventions, the records, the call envelope and the error taxonomy.

pub mod auction;
mod error;
mod message;
mod principal;
mod result;
pub mod voting;
pub mod wire;

pub use error::{format_error, ErrorKind, WireShape};
pub use message::{CallKind, CallReply, CallRequest, RemoteResult};
pub use principal::{Principal, PrincipalParseError};
pub use result::{CallResult, Envelope};
pub use wire::{Nat, NatError, Opt};
