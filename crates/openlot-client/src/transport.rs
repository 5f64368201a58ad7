//! Moving call envelopes to the service and back.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use openlot_core::{CallReply, CallRequest, Principal};
use std::sync::Arc;
use tokio_tungstenite::tungstenite::{self, Message};

/// One request in, one reply out. Implementations must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(&self, request: &CallRequest) -> Result<CallReply, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn call(&self, request: &CallRequest) -> Result<CallReply, TransportError> {
        (**self).call(request).await
    }
}

/// Failure to get a reply at all.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("websocket error: {0}")]
    Socket(#[from] tungstenite::Error),
    #[error("failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode reply: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("connection closed before a reply arrived")]
    Closed,
    #[error("unexpected frame: {0}")]
    UnexpectedFrame(String),
}

/// Opens a WebSocket per call to `{host}/api/v2/canister/{id}/call`, sends
/// the request as one text frame and waits for one text frame back.
///
/// No timeout is applied here; whatever the socket does, applies.
#[derive(Debug, Clone)]
pub struct WsTransport {
    host: String,
}

impl WsTransport {
    pub fn new(host: impl Into<String>) -> Self {
        let host: String = host.into();
        Self {
            host: host.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self, canister_id: &Principal) -> String {
        format!("{}/api/v2/canister/{}/call", self.host, canister_id)
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn call(&self, request: &CallRequest) -> Result<CallReply, TransportError> {
        let url = self.endpoint(&request.canister_id);
        let body = serde_json::to_string(request).map_err(TransportError::Encode)?;

        let (ws, _) = tokio_tungstenite::connect_async(url.as_str()).await?;
        let (mut sink, mut stream) = ws.split();
        tracing::trace!("Connected to {}", url);

        sink.send(Message::Text(body.into())).await?;

        let reply = loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    break serde_json::from_str::<CallReply>(&text)
                        .map_err(TransportError::Decode)?;
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                Some(Ok(Message::Close(_))) | None => return Err(TransportError::Closed),
                Some(Ok(other)) => {
                    return Err(TransportError::UnexpectedFrame(format!("{other:?}")));
                }
                Some(Err(e)) => return Err(e.into()),
            }
        };

        if let Err(e) = sink.close().await {
            tracing::debug!("Error closing socket to {}: {}", url, e);
        }
        Ok(reply)
    }
}
