//! Keys selecting rate-limit slots.
//!
//! A key is an opaque identifier: every distinct key owns its own TAT slot
//! and its own schedule. Keys are supplied by the caller; the limiter itself
//! only ever fabricates the `"_global"` sentinel for keyless acquisition.

use std::fmt;

/// Identifies one rate-limit slot.
///
/// `Key::None` is a legal key with a slot of its own. In the shared-store
/// key name it renders as the literal text `None`; changing that would break
/// the wire contract with existing deployments.
///
/// # Example
///
/// ```ignore
/// use freqlimit::Key;
///
/// let user: Key = "user:42".into();
/// assert_eq!(user.to_string(), "user:42");
/// assert_eq!(Key::None.to_string(), "None");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// The null key. A distinct slot, not the absence of one.
    None,
    /// A caller-chosen text key.
    Text(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for Key {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Key {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}
