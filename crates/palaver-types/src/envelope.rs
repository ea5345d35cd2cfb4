//! Addresses, intents, payloads, and message envelopes.
//!
//! Every interaction between tasks is an [`Envelope`] delivered to a named
//! mailbox. Two intents exist: `Inform` (fire-and-forget, including the
//! replies to earlier queries) and `Query` (expects a correlated reply).
//! A reply is an `Inform` envelope carrying the correlation id of the
//! query it answers -- the awaiting side matches on that id and discards
//! everything else, which is what makes late (stale) replies harmless.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entry::ChatEntry;

/// The name of a mailbox (e.g. `village`, `participant-3`, `llm-interface`).
///
/// Addresses are opaque strings; no structure is assumed beyond equality.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// Create an address from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Address {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl From<String> for Address {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// The performative of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    /// A broadcast or a reply; no response is expected.
    Inform,
    /// A request that expects a correlated `Inform` reply.
    Query,
}

/// The body of an envelope.
///
/// Which variants are meaningful depends on the recipient: the log
/// distributor accepts `Entry` informs and `CursorQuery` queries and
/// answers with `Entries`; a response provider accepts `Context` queries
/// and answers with `Entry`. Any other combination is a malformed message
/// and is dropped at the receiving side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum Payload {
    /// A single chat entry: a publication to the room, or a provider reply.
    Entry(ChatEntry),
    /// "Give me everything after index N" -- the querier's current cursor.
    CursorQuery(u64),
    /// The ordered suffix of the log answering a cursor query (may be empty).
    Entries(Vec<ChatEntry>),
    /// An ordered generation context sent to a response provider.
    Context(Vec<ChatEntry>),
}

impl Payload {
    /// Short name of the payload variant, for logging.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Entry(_) => "entry",
            Self::CursorQuery(_) => "cursor_query",
            Self::Entries(_) => "entries",
            Self::Context(_) => "context",
        }
    }
}

/// An addressed message between two tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Whether this message expects a reply.
    pub intent: Intent,
    /// The mailbox that sent the message (where replies go).
    pub sender: Address,
    /// The mailbox this message is addressed to.
    pub recipient: Address,
    /// Correlation id: freshly drawn for a query, echoed back on its reply,
    /// absent on plain informs.
    pub correlation: Option<Uuid>,
    /// The message body.
    pub payload: Payload,
}

impl Envelope {
    /// Build a fire-and-forget inform (no correlation).
    pub fn inform(sender: Address, recipient: Address, payload: Payload) -> Self {
        Self {
            intent: Intent::Inform,
            sender,
            recipient,
            correlation: None,
            payload,
        }
    }

    /// Build a query with a fresh correlation id. Returns the envelope and
    /// the id the caller must match replies against.
    pub fn query(sender: Address, recipient: Address, payload: Payload) -> (Self, Uuid) {
        let correlation = Uuid::new_v4();
        (
            Self {
                intent: Intent::Query,
                sender,
                recipient,
                correlation: Some(correlation),
                payload,
            },
            correlation,
        )
    }

    /// Build the reply to a query: an inform addressed back to the query's
    /// sender, echoing its correlation id.
    pub fn reply_to(query: &Self, sender: Address, payload: Payload) -> Self {
        Self {
            intent: Intent::Inform,
            sender,
            recipient: query.sender.clone(),
            correlation: query.correlation,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_reply_share_correlation() {
        let (query, correlation) = Envelope::query(
            Address::from("participant-1"),
            Address::from("village"),
            Payload::CursorQuery(0),
        );
        assert_eq!(query.correlation, Some(correlation));

        let reply = Envelope::reply_to(&query, Address::from("village"), Payload::Entries(Vec::new()));
        assert_eq!(reply.intent, Intent::Inform);
        assert_eq!(reply.recipient, Address::from("participant-1"));
        assert_eq!(reply.correlation, Some(correlation));
    }

    #[test]
    fn payload_wire_shape_is_adjacently_tagged() {
        let json = serde_json::to_value(Payload::CursorQuery(7)).unwrap_or_default();
        assert_eq!(json, serde_json::json!({"kind": "cursor_query", "body": 7}));
    }

    #[test]
    fn envelope_roundtrip_serde() {
        let envelope = Envelope::inform(
            Address::from("participant-2"),
            Address::from("village"),
            Payload::Entry(crate::entry::ChatEntry::user("hi")),
        );
        let json = serde_json::to_string(&envelope).unwrap_or_default();
        let restored: Result<Envelope, _> = serde_json::from_str(&json);
        assert_eq!(restored.ok(), Some(envelope));
    }

    #[test]
    fn distinct_queries_get_distinct_correlations() {
        let (_, a) = Envelope::query(
            Address::from("p"),
            Address::from("room"),
            Payload::CursorQuery(0),
        );
        let (_, b) = Envelope::query(
            Address::from("p"),
            Address::from("room"),
            Payload::CursorQuery(0),
        );
        assert_ne!(a, b);
    }
}
