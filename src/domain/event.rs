//! Identity and category extraction from inbound events.
//!
//! Every admission decision is keyed by *who* sent the request and *what
//! kind* of request it is. The caller supplies both by implementing the
//! [`Event`] trait on its own event type; the extraction must be a pure
//! function of the event.

use std::fmt;

/// Stable key distinguishing independent request sources.
///
/// Typically a numeric sender id. The value is opaque to the limiter: two
/// events with the same `Identity` share rate-limit state, nothing more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Identity(pub u64);

impl Identity {
    /// Get the raw key value.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for Identity {
    fn from(id: u64) -> Self {
        Identity(id)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request classification selecting a limit tier.
///
/// Unknown or unclassified requests resolve to [`Category::Default`], which
/// always maps to the default tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Category {
    /// Unclassified requests; always mapped to the default tier.
    #[default]
    Default,
    /// Command-style requests (e.g. `/start`).
    Command,
    /// Plain message payloads.
    Message,
    /// Callback/interaction events.
    Callback,
    /// Anything else the extractor recognizes but does not map.
    Other,
}

impl Category {
    /// All categories, in declaration order.
    pub const ALL: [Category; 5] = [
        Category::Default,
        Category::Command,
        Category::Message,
        Category::Callback,
        Category::Other,
    ];

    /// Stable label for logging and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Default => "default",
            Category::Command => "command",
            Category::Message => "message",
            Category::Callback => "callback",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite accounting key: one rate-limit state per identity × category.
///
/// Keying on the pair (rather than identity alone) is what makes the tiers
/// independent: exhausting an identity's command budget leaves its message
/// budget untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BucketKey {
    /// The request source.
    pub identity: Identity,
    /// The request classification.
    pub category: Category,
}

impl BucketKey {
    /// Create a key from its parts.
    pub fn new(identity: Identity, category: Category) -> Self {
        Self { identity, category }
    }
}

/// Inbound event abstraction.
///
/// Implement this on the service's event type to tell the admission
/// controller who sent a request and how to classify it. Both methods must
/// be cheap and side-effect free; they are called once per request on the
/// hot path.
///
/// An event without an identity (e.g. a channel post with no sender) is
/// admitted unconditionally and touches no rate-limit state.
///
/// # Example
///
/// ```
/// use admission_throttle::{Category, Event, Identity};
///
/// struct Inbound {
///     sender: Option<u64>,
///     text: String,
/// }
///
/// impl Event for Inbound {
///     fn identity(&self) -> Option<Identity> {
///         self.sender.map(Identity)
///     }
///
///     fn category(&self) -> Category {
///         if self.text.starts_with('/') {
///             Category::Command
///         } else {
///             Category::Message
///         }
///     }
/// }
/// ```
pub trait Event {
    /// The stable identity of the request source, if any.
    fn identity(&self) -> Option<Identity>;

    /// The request classification.
    ///
    /// Defaults to [`Category::Default`] for implementations that do not
    /// distinguish request kinds.
    fn category(&self) -> Category {
        Category::Default
    }
}
