//! Call identifier type.

use std::borrow::Borrow;
use std::sync::Arc;

/// Identifier reserved for the local audio hardware path.
///
/// The hardware capture thread writes into the buffer with this ID and the
/// playback thread reads with it as its reader token.
pub const DEFAULT_ID: &str = "audiolayer_id";

/// Identifier of a call leg, or of a reader attached to a call leg's buffer.
///
/// `CallId` uses `Arc<str>` internally, so cloning it on the audio path is a
/// reference count bump and never allocates. It borrows as `str`, which lets
/// the routing maps be queried with plain string slices.
///
/// # Example
///
/// ```
/// use call_audio::CallId;
///
/// let call = CallId::new("call-42");
/// assert_eq!(call, CallId::new("call-42"));
/// assert!(!call.is_default());
/// assert!(CallId::default_id().is_default());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallId(Arc<str>);

impl CallId {
    /// Creates a new call ID from a string.
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Returns the ID of the local hardware path.
    pub fn default_id() -> Self {
        Self::new(DEFAULT_ID)
    }

    /// Returns `true` if this is the hardware path ID.
    pub fn is_default(&self) -> bool {
        &*self.0 == DEFAULT_ID
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CallId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CallId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&CallId> for CallId {
    fn from(id: &CallId) -> Self {
        id.clone()
    }
}

impl AsRef<str> for CallId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CallId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_id_equality() {
        let a = CallId::new("call");
        let b = CallId::new("call");
        let c = CallId::new("other");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_call_id_default() {
        assert!(CallId::default_id().is_default());
        assert_eq!(CallId::default_id().as_str(), DEFAULT_ID);
        assert!(!CallId::new("audiolayer").is_default());
    }

    #[test]
    fn test_call_id_display() {
        let id = CallId::new("incoming rtp session");
        assert_eq!(format!("{id}"), "incoming rtp session");
    }

    #[test]
    fn test_call_id_lookup_by_str() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(CallId::new("participant A"), 1);
        map.insert(CallId::new("participant B"), 2);

        assert_eq!(map.get("participant A"), Some(&1));
        assert_eq!(map.get("participant C"), None);
    }

    #[test]
    fn test_call_id_clone_shares_storage() {
        let a = CallId::new("call");
        let b = a.clone();
        assert!(std::ptr::eq(a.as_str(), b.as_str()));
    }
}
