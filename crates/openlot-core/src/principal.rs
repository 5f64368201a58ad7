//! Caller principals.
//!
//! Textual format: lowercase base32 of `crc32(bytes) ++ bytes`, split into
//! groups of five characters joined by `-`. Two principals are the same caller
//! exactly when their texts are equal.
//!
//! Well-known forms:
//! - `2vxsx-fae` - the anonymous caller
//! - self-authenticating - `sha224(der_public_key) ++ 0x02`

use ic_principal::PrincipalError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An opaque caller identifier in its textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal {
    raw: ic_principal::Principal,
    text: String,
}

impl Principal {
    /// The anonymous principal (`2vxsx-fae`).
    pub fn anonymous() -> Self {
        ic_principal::Principal::anonymous().into()
    }

    /// Derive the principal owned by a DER-encoded public key.
    pub fn self_authenticating(der_public_key: &[u8]) -> Self {
        ic_principal::Principal::self_authenticating(der_public_key).into()
    }

    /// Wrap raw principal bytes.
    ///
    /// # Panics
    ///
    /// If `bytes` is longer than 29 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        ic_principal::Principal::from_slice(bytes).into()
    }

    /// The textual form.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.raw.as_slice()
    }

    /// Check if this is the anonymous principal.
    pub fn is_anonymous(&self) -> bool {
        self.raw == ic_principal::Principal::anonymous()
    }
}

impl From<ic_principal::Principal> for Principal {
    fn from(raw: ic_principal::Principal) -> Self {
        let text = raw.to_text();
        Self { raw, text }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Principal {
    type Err = PrincipalParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PrincipalParseError::Empty);
        }

        let parsed: Self = ic_principal::Principal::from_text(s)
            .map_err(|err| PrincipalParseError::from_decode(err, s))?
            .into();

        // from_text folds case; the text form here is case-sensitive.
        if parsed.text != s {
            return Err(PrincipalParseError::NotCanonical(s.to_string()));
        }

        Ok(parsed)
    }
}

impl TryFrom<String> for Principal {
    type Error = PrincipalParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Principal> for String {
    fn from(p: Principal) -> Self {
        p.text
    }
}

/// Error parsing a principal string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrincipalParseError {
    #[error("principal text cannot be empty")]
    Empty,
    #[error("principal contains characters outside the base32 alphabet: {0}")]
    InvalidCharacter(String),
    #[error("principal is too short to carry a checksum: {0}")]
    TooShort(String),
    #[error("principal is longer than 29 bytes: {0}")]
    TooLong(String),
    #[error("principal checksum does not match: {0}")]
    Checksum(String),
    #[error("principal is not in canonical form: {0}")]
    NotCanonical(String),
}

impl PrincipalParseError {
    fn from_decode(err: PrincipalError, text: &str) -> Self {
        let text = text.to_string();
        match err {
            PrincipalError::InvalidBase32(..) => Self::InvalidCharacter(text),
            PrincipalError::TextTooShort(..) => Self::TooShort(text),
            PrincipalError::TextTooLong(..) | PrincipalError::BytesTooLong(..) => Self::TooLong(text),
            PrincipalError::CheckSequenceNotMatch(..) => Self::Checksum(text),
            PrincipalError::AbnormalGrouped(..) => Self::NotCanonical(text),
            #[allow(unreachable_patterns)]
            _ => Self::InvalidCharacter(text),
        }
    }
}
