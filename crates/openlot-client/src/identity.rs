//! Caller identities and request signing.
//!
//! An identity names the caller with a [`Principal`] and, unless it is
//! anonymous, signs outgoing calls. Ed25519 identities derive their principal
//! from the DER-encoded public key, so a verifier can check that the signer
//! really is the claimed sender.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use openlot_core::{CallRequest, Principal};
use rand::RngCore;
use std::fmt;

/// DER prefix of an Ed25519 SubjectPublicKeyInfo.
const ED25519_DER_PREFIX: [u8; 12] = [
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00,
];

/// A signature together with the key that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSignature {
    /// DER-encoded public key.
    pub public_key: Vec<u8>,
    pub signature: Vec<u8>,
}

/// Something that can act as the sender of a call.
pub trait CallerIdentity: Send + Sync + fmt::Debug {
    fn principal(&self) -> Principal;

    /// Sign call content. Anonymous identities return `None`.
    fn sign(&self, content: &[u8]) -> Option<CallSignature>;
}

/// The anonymous caller. Never signs.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousIdentity;

impl CallerIdentity for AnonymousIdentity {
    fn principal(&self) -> Principal {
        Principal::anonymous()
    }

    fn sign(&self, _content: &[u8]) -> Option<CallSignature> {
        None
    }
}

/// An Ed25519 keypair derived from a 32-byte seed.
pub struct Ed25519Identity {
    signing_key: SigningKey,
    public_key_der: Vec<u8>,
    principal: Principal,
}

impl Ed25519Identity {
    /// Same seed, same keypair, same principal.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        let public_key_der = der_encode(&signing_key.verifying_key());
        let principal = Principal::self_authenticating(&public_key_der);
        Self {
            signing_key,
            public_key_der,
            principal,
        }
    }

    pub fn public_key_der(&self) -> &[u8] {
        &self.public_key_der
    }
}

impl fmt::Debug for Ed25519Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ed25519Identity")
            .field("principal", &self.principal)
            .finish_non_exhaustive()
    }
}

impl CallerIdentity for Ed25519Identity {
    fn principal(&self) -> Principal {
        self.principal.clone()
    }

    fn sign(&self, content: &[u8]) -> Option<CallSignature> {
        Some(CallSignature {
            public_key: self.public_key_der.clone(),
            signature: self.signing_key.sign(content).to_bytes().to_vec(),
        })
    }
}

fn der_encode(key: &VerifyingKey) -> Vec<u8> {
    let mut der = ED25519_DER_PREFIX.to_vec();
    der.extend_from_slice(key.as_bytes());
    der
}

/// Stamp `request` with the identity's principal, a fresh nonce and a signature.
///
/// Returns `false` if the identity cannot sign, leaving the request unsigned.
pub fn sign_request(
    identity: &dyn CallerIdentity,
    request: &mut CallRequest,
) -> Result<bool, serde_json::Error> {
    let mut nonce = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut nonce);

    request.sender = identity.principal();
    request.nonce = Some(hex::encode(nonce));
    request.sender_pubkey = None;
    request.sender_sig = None;

    let content = request.signing_bytes()?;
    let Some(signature) = identity.sign(&content) else {
        return Ok(false);
    };
    request.sender_pubkey = Some(hex::encode(signature.public_key));
    request.sender_sig = Some(hex::encode(signature.signature));
    Ok(true)
}

/// Check that a request's signature is valid and belongs to its sender.
///
/// Unsigned requests are only valid from the anonymous principal.
pub fn verify_request(request: &CallRequest) -> bool {
    let (Some(pubkey_hex), Some(sig_hex)) = (&request.sender_pubkey, &request.sender_sig) else {
        return request.sender.is_anonymous()
            && request.sender_pubkey.is_none()
            && request.sender_sig.is_none();
    };

    let (Ok(der), Ok(sig_bytes)) = (hex::decode(pubkey_hex), hex::decode(sig_hex)) else {
        return false;
    };
    if Principal::self_authenticating(&der) != request.sender {
        return false;
    }
    let Some(raw_key) = der.strip_prefix(&ED25519_DER_PREFIX[..]) else {
        return false;
    };
    let Ok(key_bytes) = <[u8; 32]>::try_from(raw_key) else {
        return false;
    };
    let Ok(key) = VerifyingKey::from_bytes(&key_bytes) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(&sig_bytes) else {
        return false;
    };
    let Ok(content) = request.signing_bytes() else {
        return false;
    };

    key.verify(&content, &signature).is_ok()
}
