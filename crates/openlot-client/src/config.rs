//! Startup configuration: which network and which services.

use crate::transport::WsTransport;
use openlot_core::{Principal, PrincipalParseError};
use serde::{Deserialize, Serialize};

const LOCAL_HOST: &str = "ws://localhost:4943";
const PUBLIC_HOST: &str = "wss://ic0.app";

// uxrrr-q7777-77774-qaaaq-cai
const DEFAULT_AUCTION_CANISTER: [u8; 10] = [255, 255, 255, 255, 255, 144, 0, 1, 1, 1];
// u6s2n-gx777-77774-qaaba-cai
const DEFAULT_VOTING_CANISTER: [u8; 10] = [255, 255, 255, 255, 255, 144, 0, 2, 1, 1];

/// Which deployment the services live on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Local,
    #[default]
    Ic,
}

impl Network {
    /// `local` (any case) is the local replica; every other name is public.
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("local") {
            Network::Local
        } else {
            Network::Ic
        }
    }

    pub fn default_host(&self) -> &'static str {
        match self {
            Network::Local => LOCAL_HOST,
            Network::Ic => PUBLIC_HOST,
        }
    }
}

/// Client configuration.
///
/// Every field has a fallback, so an empty environment or an empty TOML
/// document yields a usable configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub network: Network,
    /// Overrides the network's default host.
    pub host: Option<String>,
    pub auction_canister_id: Principal,
    pub voting_canister_id: Principal,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            host: None,
            auction_canister_id: Principal::from_bytes(&DEFAULT_AUCTION_CANISTER),
            voting_canister_id: Principal::from_bytes(&DEFAULT_VOTING_CANISTER),
        }
    }
}

/// Error building a [`ClientConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is not a valid canister id: {source}")]
    InvalidCanisterId {
        var: String,
        #[source]
        source: PrincipalParseError,
    },
}

impl ClientConfig {
    /// Read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read variables through `lookup`; unset or empty variables fall back.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let first = |keys: &[&str]| -> Option<(String, String)> {
            keys.iter().find_map(|key| {
                lookup(key)
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| (key.to_string(), v.trim().to_string()))
            })
        };
        let canister = |keys: &[&str], fallback: Principal| -> Result<Principal, ConfigError> {
            match first(keys) {
                Some((var, value)) => value
                    .parse()
                    .map_err(|source| ConfigError::InvalidCanisterId { var, source }),
                None => Ok(fallback),
            }
        };

        let defaults = Self::default();
        Ok(Self {
            network: network(&lookup).unwrap_or(defaults.network),
            host: first(&["OPENLOT_HOST"]).map(|(_, host)| host),
            auction_canister_id: canister(
                &[
                    "CANISTER_ID_OPEN_LOT_BACKEND",
                    "VITE_CANISTER_ID_OPEN_LOT_BACKEND",
                ],
                defaults.auction_canister_id,
            )?,
            voting_canister_id: canister(
                &[
                    "CANISTER_ID_VOTING_SYSTEM_BACKEND",
                    "VITE_CANISTER_ID_VOTING_SYSTEM_BACKEND",
                ],
                defaults.voting_canister_id,
            )?,
        })
    }

    /// The host calls go to.
    pub fn host(&self) -> &str {
        self.host
            .as_deref()
            .unwrap_or_else(|| self.network.default_host())
    }

    pub fn is_local(&self) -> bool {
        self.network == Network::Local
    }

    /// Call URL for `canister_id` on the configured host.
    pub fn endpoint(&self, canister_id: &Principal) -> String {
        WsTransport::new(self.host()).endpoint(canister_id)
    }
}

/// `Local` when either network variable names the local replica.
fn network(lookup: impl Fn(&str) -> Option<String>) -> Option<Network> {
    let names: Vec<String> = ["DFX_NETWORK", "VITE_DFX_NETWORK"]
        .iter()
        .filter_map(|key| lookup(key))
        .filter(|name| !name.trim().is_empty())
        .collect();
    if names.is_empty() {
        return None;
    }
    let local = names
        .iter()
        .any(|name| Network::from_name(name) == Network::Local);
    Some(if local { Network::Local } else { Network::Ic })
}
