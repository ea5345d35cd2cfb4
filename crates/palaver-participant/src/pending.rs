//! Request/reply correlation and the bounded timeout wait.
//!
//! Every query the state machine issues creates one [`PendingRequest`]:
//! the target address, the logical request kind, a fresh correlation id,
//! and a deadline. [`await_reply`] suspends the issuing state until a
//! correctly-addressed, correlation-matching, well-formed reply arrives
//! or the deadline elapses. Everything else that lands in the mailbox
//! meanwhile -- replies to requests that already timed out, envelopes
//! from unexpected senders, payload shapes that do not fit the request --
//! is logged and discarded without touching the state machine.
//!
//! The state machine is single-threaded per participant: it never issues
//! a second query before resolving the first, so at most one pending
//! request exists at any time.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::timeout;
use tracing::debug;
use uuid::Uuid;

use palaver_post::Mailbox;
use palaver_types::{Address, Envelope, Payload};

/// The logical intent of an outstanding query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Naming request to the response provider (expects an entry reply).
    Name,
    /// Cursor query to the log distributor (expects an entries reply).
    Fetch,
    /// Generation request to the response provider (expects an entry reply).
    Generate,
}

impl RequestKind {
    /// Short name for logging.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Fetch => "fetch",
            Self::Generate => "generate",
        }
    }

    /// Whether a reply payload has the shape this request expects.
    fn accepts(self, payload: &Payload) -> bool {
        match self {
            Self::Name | Self::Generate => matches!(payload, Payload::Entry(_)),
            Self::Fetch => matches!(payload, Payload::Entries(_)),
        }
    }
}

/// One outstanding query awaiting its correlated reply.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    /// The address the query was sent to; replies must come from it.
    pub target: Address,
    /// The logical request kind.
    pub kind: RequestKind,
    /// The correlation id replies must echo.
    pub correlation: Uuid,
    /// Time allowed for the reply; the deadline is taken from the moment
    /// the wait starts.
    pub timeout: Duration,
}

impl PendingRequest {
    /// Record a query as pending.
    pub const fn new(
        target: Address,
        kind: RequestKind,
        correlation: Uuid,
        timeout: Duration,
    ) -> Self {
        Self {
            target,
            kind,
            correlation,
            timeout,
        }
    }

    /// Whether an envelope is the reply this request is waiting for.
    fn matches(&self, envelope: &Envelope) -> bool {
        envelope.correlation == Some(self.correlation)
            && envelope.sender == self.target
            && self.kind.accepts(&envelope.payload)
    }
}

/// How a bounded reply wait resolved.
#[derive(Debug, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// The matching reply arrived; its payload shape fits the request.
    Reply(Payload),
    /// The deadline elapsed with no matching reply.
    TimedOut,
    /// The shutdown signal fired during the wait.
    Cancelled,
    /// The participant's own mailbox closed.
    MailboxClosed,
}

/// Wait for the reply to `pending`, discarding everything else.
///
/// Stale replies (correlation ids from requests that already timed out),
/// envelopes from other senders, and malformed payload shapes are each
/// logged and dropped; the wait continues until the matching reply
/// arrives, the deadline elapses, or shutdown fires.
pub async fn await_reply(
    mailbox: &mut Mailbox,
    pending: &PendingRequest,
    shutdown: &mut watch::Receiver<bool>,
) -> ReplyOutcome {
    let wait = async {
        loop {
            let Some(envelope) = mailbox.recv().await else {
                return ReplyOutcome::MailboxClosed;
            };
            if pending.matches(&envelope) {
                return ReplyOutcome::Reply(envelope.payload);
            }
            debug!(
                request = pending.kind.as_str(),
                expected_from = %pending.target,
                sender = %envelope.sender,
                correlation = ?envelope.correlation,
                payload = envelope.payload.kind(),
                "discarding stale or malformed envelope"
            );
        }
    };

    tokio::select! {
        _ = shutdown.changed() => ReplyOutcome::Cancelled,
        outcome = timeout(pending.timeout, wait) => {
            outcome.unwrap_or(ReplyOutcome::TimedOut)
        }
    }
}
