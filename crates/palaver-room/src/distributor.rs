//! The log distributor task.
//!
//! Owns one [`ChatLog`] and its room mailbox, and processes envelopes one
//! at a time in arrival order:
//!
//! - `Inform` carrying an entry appends it (this single-consumer loop is
//!   what makes concurrent appends linearizable -- there is exactly one
//!   writer, and it handles one envelope at a time).
//! - `Query` carrying a cursor replies with the log suffix from that index,
//!   echoing the query's correlation id back to the sender.
//!
//! Any other intent/payload combination is a malformed message: it is
//! logged and dropped without a reply, so the querier falls through to its
//! own timeout path. A failed reply delivery is logged and skipped -- one
//! participant's death never stalls the room for the others.

use tokio::sync::watch;
use tracing::{debug, info, warn};

use palaver_post::{Mailbox, PostOffice};
use palaver_types::{Address, Envelope, Intent, Payload};

use crate::log::ChatLog;

/// The task owning the shared chat log and answering cursor queries.
pub struct LogDistributor {
    address: Address,
    post: PostOffice,
    mailbox: Mailbox,
    log: ChatLog,
}

impl LogDistributor {
    /// Register a distributor under `address` on the given broker.
    pub async fn register(post: &PostOffice, address: Address) -> Self {
        let mailbox = post.register(address.clone()).await;
        Self {
            address,
            post: post.clone(),
            mailbox,
            log: ChatLog::new(),
        }
    }

    /// The address the distributor serves under.
    pub const fn address(&self) -> &Address {
        &self.address
    }

    /// Run the serving loop until shutdown fires or the mailbox closes.
    ///
    /// Returns the final log, which is useful for transcripts and tests.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> ChatLog {
        info!(room = %self.address, "log distributor started");

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!(room = %self.address, entries = self.log.len(), "log distributor shutting down");
                    break;
                }
                maybe_envelope = self.mailbox.recv() => {
                    let Some(envelope) = maybe_envelope else {
                        info!(room = %self.address, "room mailbox closed, distributor stopping");
                        break;
                    };
                    self.handle(envelope).await;
                }
            }
        }

        self.post.unregister(&self.address).await;
        self.log
    }

    /// Process one envelope: append, answer, or drop as malformed.
    async fn handle(&mut self, envelope: Envelope) {
        match (envelope.intent, &envelope.payload) {
            (Intent::Inform, Payload::Entry(entry)) => {
                let speaker = entry.speaker.clone().unwrap_or_default();
                let length = self.log.append(entry.clone());
                info!(
                    room = %self.address,
                    sender = %envelope.sender,
                    speaker = speaker,
                    length = length,
                    content = %entry.content,
                    "entry appended"
                );
            }
            (Intent::Query, &Payload::CursorQuery(cursor)) => {
                self.answer_cursor_query(&envelope, cursor).await;
            }
            _ => {
                warn!(
                    room = %self.address,
                    sender = %envelope.sender,
                    intent = ?envelope.intent,
                    payload = envelope.payload.kind(),
                    "malformed envelope dropped"
                );
            }
        }
    }

    /// Reply to a cursor query with the log suffix from that index.
    async fn answer_cursor_query(&self, query: &Envelope, cursor: u64) {
        // A cursor beyond usize range is far past the end of any log;
        // clamping to usize::MAX yields the same empty suffix.
        let index = usize::try_from(cursor).unwrap_or(usize::MAX);
        let entries = self.log.fetch_since(index).to_vec();

        debug!(
            room = %self.address,
            sender = %query.sender,
            cursor = cursor,
            returned = entries.len(),
            log_length = self.log.len(),
            "answering cursor query"
        );

        let reply = Envelope::reply_to(query, self.address.clone(), Payload::Entries(entries));
        if let Err(e) = self.post.deliver(reply).await {
            warn!(
                room = %self.address,
                recipient = %query.sender,
                error = %e,
                "failed to deliver cursor reply"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unreachable)]
mod tests {
    use super::*;
    use palaver_types::ChatEntry;

    async fn setup() -> (PostOffice, LogDistributor) {
        let post = PostOffice::new();
        let distributor = LogDistributor::register(&post, Address::from("village")).await;
        (post, distributor)
    }

    #[tokio::test]
    async fn inform_appends_and_query_fetches() {
        let (post, mut distributor) = setup().await;

        let inform = Envelope::inform(
            Address::from("p1"),
            Address::from("village"),
            Payload::Entry(ChatEntry::user("hello")),
        );
        distributor.handle(inform).await;
        assert_eq!(distributor.log.len(), 1);

        let mut querier = post.register(Address::from("p2")).await;
        let (query, correlation) = Envelope::query(
            Address::from("p2"),
            Address::from("village"),
            Payload::CursorQuery(0),
        );
        distributor.handle(query).await;

        let reply = querier.recv().await;
        let Some(reply) = reply else {
            unreachable!("expected a reply envelope");
        };
        assert_eq!(reply.correlation, Some(correlation));
        match reply.payload {
            Payload::Entries(entries) => {
                assert_eq!(entries.len(), 1);
                assert_eq!(
                    entries.first().map(|e| e.content.as_str()),
                    Some("hello")
                );
            }
            other => unreachable!("unexpected payload: {other:?}"),
        }
    }

    #[tokio::test]
    async fn query_past_end_yields_empty_entries() {
        let (post, mut distributor) = setup().await;
        let mut querier = post.register(Address::from("p1")).await;

        let (query, _) = Envelope::query(
            Address::from("p1"),
            Address::from("village"),
            Payload::CursorQuery(99),
        );
        distributor.handle(query).await;

        let reply = querier.recv().await;
        assert!(matches!(
            reply.map(|e| e.payload),
            Some(Payload::Entries(entries)) if entries.is_empty()
        ));
    }

    #[tokio::test]
    async fn malformed_envelope_is_dropped_without_reply() {
        let (post, mut distributor) = setup().await;
        let mut querier = post.register(Address::from("p1")).await;

        // A query carrying an entry payload is the wrong shape for the room.
        let malformed = Envelope {
            intent: Intent::Query,
            sender: Address::from("p1"),
            recipient: Address::from("village"),
            correlation: None,
            payload: Payload::Entry(ChatEntry::user("nope")),
        };
        distributor.handle(malformed).await;

        assert_eq!(distributor.log.len(), 0);
        assert!(querier.drain().is_empty());
    }

    #[tokio::test]
    async fn reply_failure_does_not_stop_the_distributor() {
        let (_post, mut distributor) = setup().await;

        // Querier never registered: the reply delivery fails, but handling
        // completes and the log is untouched.
        let (query, _) = Envelope::query(
            Address::from("ghost"),
            Address::from("village"),
            Payload::CursorQuery(0),
        );
        distributor.handle(query).await;
        assert_eq!(distributor.log.len(), 0);

        let inform = Envelope::inform(
            Address::from("p1"),
            Address::from("village"),
            Payload::Entry(ChatEntry::user("still alive")),
        );
        distributor.handle(inform).await;
        assert_eq!(distributor.log.len(), 1);
    }
}
