//! The call wrapper shared by every service.
//!
//! Each public operation performs exactly one transport call and returns a
//! [`CallResult`]. Nothing escapes as a panic or a transport error:
//! - queries are sent as the anonymous caller;
//! - updates need a logged-in identity and fail closed without one;
//! - anything that prevents an application-level answer becomes
//!   [`ErrorKind::NetworkError`], logged with its cause;
//! - `Err` arms of result unions are decoded through [`ErrorKind::from_wire`].

use crate::credentials::CredentialStore;
use crate::identity::sign_request;
use crate::transport::Transport;
use openlot_core::{
    CallKind, CallReply, CallRequest, CallResult, ErrorKind, Principal, RemoteResult,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Calls into one service (canister).
pub struct ServiceClient<T> {
    transport: T,
    canister_id: Principal,
    credentials: Arc<dyn CredentialStore>,
}

impl<T: Transport> ServiceClient<T> {
    pub fn new(transport: T, canister_id: Principal, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            transport,
            canister_id,
            credentials,
        }
    }

    pub fn canister_id(&self) -> &Principal {
        &self.canister_id
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// Read-only call returning a plain value.
    pub async fn query<R: DeserializeOwned>(&self, method: &str, args: Vec<Value>) -> CallResult<R> {
        let request = CallRequest::new(
            self.canister_id.clone(),
            method,
            CallKind::Query,
            args,
            Principal::anonymous(),
        );
        let value = self.dispatch(&request).await?;
        decode(method, value)
    }

    /// Authenticated call returning a plain value.
    pub async fn update<R: DeserializeOwned>(&self, method: &str, args: Vec<Value>) -> CallResult<R> {
        let request = self.signed_request(method, args)?;
        let value = self.dispatch(&request).await?;
        decode(method, value)
    }

    /// Authenticated call returning a `{ Ok } | { Err }` union.
    pub async fn update_fallible<R: DeserializeOwned>(
        &self,
        method: &str,
        args: Vec<Value>,
    ) -> CallResult<R> {
        let request = self.signed_request(method, args)?;
        let value = self.dispatch(&request).await?;
        match decode::<RemoteResult<R>>(method, value)? {
            RemoteResult::Ok(data) => Ok(data),
            RemoteResult::Err(err) => {
                let kind = ErrorKind::from_wire(&err);
                tracing::debug!("{} rejected by service: {}", method, kind.tag());
                Err(kind)
            }
        }
    }

    fn signed_request(&self, method: &str, args: Vec<Value>) -> CallResult<CallRequest> {
        let identity = match self.credentials.current_identity() {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                tracing::debug!("{} needs a logged-in identity", method);
                return Err(ErrorKind::Unauthenticated);
            }
            Err(e) => {
                tracing::warn!("{}: credentials unavailable: {}", method, e);
                return Err(ErrorKind::Unauthenticated);
            }
        };

        let mut request = CallRequest::new(
            self.canister_id.clone(),
            method,
            CallKind::Update,
            args,
            identity.principal(),
        );
        match sign_request(identity.as_ref(), &mut request) {
            Ok(true) if !request.sender.is_anonymous() => Ok(request),
            Ok(_) => {
                tracing::debug!("{}: identity cannot sign, refusing to call", method);
                Err(ErrorKind::Unauthenticated)
            }
            Err(e) => {
                tracing::warn!("{}: failed to encode request: {}", method, e);
                Err(ErrorKind::NetworkError)
            }
        }
    }

    async fn dispatch(&self, request: &CallRequest) -> CallResult<Value> {
        tracing::debug!(
            "{:?} {}.{} as {}",
            request.kind,
            request.canister_id,
            request.method,
            request.sender
        );

        match self.transport.call(request).await {
            Ok(CallReply::Replied { value }) => Ok(value),
            Ok(CallReply::Rejected { code, message }) => {
                tracing::warn!("{} rejected ({}): {}", request.method, code, message);
                Err(ErrorKind::NetworkError)
            }
            Err(e) => {
                tracing::warn!("{} failed: {}", request.method, e);
                Err(ErrorKind::NetworkError)
            }
        }
    }
}

/// Encode one argument. Failing to encode is a transport-level failure.
pub fn arg<A: Serialize>(value: &A) -> CallResult<Value> {
    serde_json::to_value(value).map_err(|e| {
        tracing::warn!("Failed to encode argument: {}", e);
        ErrorKind::NetworkError
    })
}

fn decode<R: DeserializeOwned>(method: &str, value: Value) -> CallResult<R> {
    serde_json::from_value(value).map_err(|e| {
        tracing::warn!("{} returned an undecodable reply: {}", method, e);
        ErrorKind::NetworkError
    })
}
