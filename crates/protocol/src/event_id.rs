use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Identity of a timeline event.
///
/// The lane engine keys several tables by event (lane slots, the reverse
/// lane index, listener handles), so ids are `Arc<str>` and clone without
/// reallocating. Serialized as a bare JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct EventId(Arc<str>);

impl EventId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for EventId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        EventId(s.into())
    }
}

impl From<String> for EventId {
    fn from(s: String) -> Self {
        EventId(s.into())
    }
}

impl From<EventId> for String {
    fn from(id: EventId) -> Self {
        id.0.to_string()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
