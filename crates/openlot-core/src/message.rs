//! Call envelopes.
//!
//! A client sends one [`CallRequest`] and receives one [`CallReply`]. Methods
//! that can fail at the application level answer with a [`RemoteResult`]
//! inside the reply value.

use crate::Principal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Whether a call reads or mutates service state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    Query,
    Update,
}

/// A request sent from client to service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRequest {
    pub canister_id: Principal,
    pub method: String,
    pub kind: CallKind,
    /// Positional arguments.
    pub args: Vec<Value>,
    pub sender: Principal,
    /// Random hex nonce; distinguishes otherwise identical updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    /// Hex DER public key of the signer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_pubkey: Option<String>,
    /// Hex signature over [`CallRequest::signing_bytes`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_sig: Option<String>,
}

#[derive(Serialize)]
struct CallContent<'a> {
    canister_id: &'a Principal,
    method: &'a str,
    kind: CallKind,
    args: &'a [Value],
    sender: &'a Principal,
    nonce: Option<&'a str>,
}

impl CallRequest {
    /// Create an unsigned request.
    pub fn new(
        canister_id: Principal,
        method: impl Into<String>,
        kind: CallKind,
        args: Vec<Value>,
        sender: Principal,
    ) -> Self {
        Self {
            canister_id,
            method: method.into(),
            kind,
            args,
            sender,
            nonce: None,
            sender_pubkey: None,
            sender_sig: None,
        }
    }

    /// The bytes a signer commits to: everything except the signature fields.
    pub fn signing_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&CallContent {
            canister_id: &self.canister_id,
            method: &self.method,
            kind: self.kind,
            args: &self.args,
            sender: &self.sender,
            nonce: self.nonce.as_deref(),
        })
    }

    pub fn is_signed(&self) -> bool {
        self.sender_sig.is_some()
    }
}

/// A reply sent from service to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CallReply {
    /// The method ran and produced a value.
    Replied { value: Value },
    /// The system refused to run the method.
    Rejected { code: u32, message: String },
}

/// The two-variant success/failure union used by fallible methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RemoteResult<T> {
    Ok(T),
    Err(Value),
}
