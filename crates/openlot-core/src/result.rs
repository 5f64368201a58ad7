//! The normalized outcome of a remote call.

use crate::ErrorKind;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Outcome of exactly one remote call: the decoded data or one failure reason.
pub type CallResult<T> = Result<T, ErrorKind>;

/// Serializes a [`CallResult`] as `{ "success": true, "data": .. }` or
/// `{ "success": false, "error": tag, "message": text }`.
pub struct Envelope<'a, T>(pub &'a CallResult<T>);

impl<T: Serialize> Serialize for Envelope<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Ok(data) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("success", &true)?;
                map.serialize_entry("data", data)?;
                map.end()
            }
            Err(kind) => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", kind.tag())?;
                map.serialize_entry("message", &kind.message())?;
                map.end()
            }
        }
    }
}
