//! In-process addressed message substrate.
//!
//! The [`PostOffice`] is a cloneable broker mapping addresses to bounded
//! mailbox channels. Tasks register an address to obtain their [`Mailbox`]
//! (the owned receive half) and deliver [`Envelope`]s to any registered
//! address through the broker. This stands in for the reliable, addressed,
//! asynchronous messaging substrate the rest of the system assumes --
//! nothing above this crate knows the transport is a set of channels.
//!
//! Delivery is reliable for registered, live recipients and fails with a
//! typed error otherwise. No shared mutable state crosses task boundaries
//! anywhere else in the workspace; every interaction is an envelope.

pub mod error;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, trace};

use palaver_types::{Address, Envelope};

pub use error::PostError;

/// Bounded depth of each mailbox channel.
///
/// Deep enough that a slow participant never stalls the distributor under
/// normal pacing; senders back-pressure rather than drop if it fills.
const MAILBOX_DEPTH: usize = 64;

/// Shared broker routing envelopes between registered mailboxes.
#[derive(Clone, Default)]
pub struct PostOffice {
    peers: Arc<Mutex<HashMap<Address, mpsc::Sender<Envelope>>>>,
}

impl PostOffice {
    /// Create an empty broker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an address and return its mailbox.
    ///
    /// Registering an address that already exists replaces the previous
    /// registration; the old mailbox stops receiving new envelopes.
    pub async fn register(&self, address: Address) -> Mailbox {
        let (tx, rx) = mpsc::channel(MAILBOX_DEPTH);
        debug!(address = %address, "registering mailbox");
        self.peers.lock().await.insert(address.clone(), tx);
        Mailbox { address, rx }
    }

    /// Remove an address from the broker.
    ///
    /// Subsequent deliveries to it fail with [`PostError::UnknownRecipient`].
    pub async fn unregister(&self, address: &Address) {
        debug!(address = %address, "unregistering mailbox");
        self.peers.lock().await.remove(address);
    }

    /// Deliver an envelope to its recipient's mailbox.
    ///
    /// Waits if the recipient's mailbox is full (back-pressure, never
    /// silent drop).
    ///
    /// # Errors
    ///
    /// Returns [`PostError::UnknownRecipient`] if no mailbox is registered
    /// under the recipient address, or [`PostError::MailboxClosed`] if the
    /// recipient has dropped its mailbox.
    pub async fn deliver(&self, envelope: Envelope) -> Result<(), PostError> {
        let tx = {
            let peers = self.peers.lock().await;
            peers
                .get(&envelope.recipient)
                .cloned()
                .ok_or_else(|| PostError::UnknownRecipient(envelope.recipient.clone()))?
        };

        trace!(
            sender = %envelope.sender,
            recipient = %envelope.recipient,
            intent = ?envelope.intent,
            payload = envelope.payload.kind(),
            "delivering envelope"
        );

        let recipient = envelope.recipient.clone();
        tx.send(envelope)
            .await
            .map_err(|_| PostError::MailboxClosed(recipient))
    }

    /// Number of currently registered mailboxes.
    pub async fn registered_count(&self) -> usize {
        self.peers.lock().await.len()
    }
}

impl core::fmt::Debug for PostOffice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PostOffice").finish_non_exhaustive()
    }
}

/// The owned receive half of a registered address.
#[derive(Debug)]
pub struct Mailbox {
    address: Address,
    rx: mpsc::Receiver<Envelope>,
}

impl Mailbox {
    /// The address this mailbox is registered under.
    pub const fn address(&self) -> &Address {
        &self.address
    }

    /// Receive the next envelope.
    ///
    /// Returns `None` once the mailbox has been unregistered (or replaced)
    /// and all buffered envelopes have been drained.
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }

    /// Drain any buffered envelopes without waiting.
    ///
    /// Used between request/reply rounds to discard envelopes that arrived
    /// while nobody was awaiting them.
    pub fn drain(&mut self) -> Vec<Envelope> {
        let mut drained = Vec::new();
        while let Ok(envelope) = self.rx.try_recv() {
            drained.push(envelope);
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palaver_types::{ChatEntry, Payload};

    fn entry_inform(from: &str, to: &str, text: &str) -> Envelope {
        Envelope::inform(
            Address::from(from),
            Address::from(to),
            Payload::Entry(ChatEntry::user(text)),
        )
    }

    #[tokio::test]
    async fn delivers_to_registered_address() {
        let post = PostOffice::new();
        let mut mailbox = post.register(Address::from("village")).await;

        let sent = entry_inform("p1", "village", "hello");
        assert!(post.deliver(sent.clone()).await.is_ok());

        let received = mailbox.recv().await;
        assert_eq!(received, Some(sent));
    }

    #[tokio::test]
    async fn unknown_recipient_is_typed_error() {
        let post = PostOffice::new();
        let result = post.deliver(entry_inform("p1", "nowhere", "hi")).await;
        assert!(matches!(result, Err(PostError::UnknownRecipient(_))));
    }

    #[tokio::test]
    async fn closed_mailbox_is_typed_error() {
        let post = PostOffice::new();
        let mailbox = post.register(Address::from("village")).await;
        drop(mailbox);

        let result = post.deliver(entry_inform("p1", "village", "hi")).await;
        assert!(matches!(result, Err(PostError::MailboxClosed(_))));
    }

    #[tokio::test]
    async fn unregister_removes_the_route() {
        let post = PostOffice::new();
        let _mailbox = post.register(Address::from("village")).await;
        assert_eq!(post.registered_count().await, 1);

        post.unregister(&Address::from("village")).await;
        assert_eq!(post.registered_count().await, 0);

        let result = post.deliver(entry_inform("p1", "village", "hi")).await;
        assert!(matches!(result, Err(PostError::UnknownRecipient(_))));
    }

    #[tokio::test]
    async fn envelopes_arrive_in_send_order() {
        let post = PostOffice::new();
        let mut mailbox = post.register(Address::from("village")).await;

        for i in 0..5_u32 {
            let env = entry_inform("p1", "village", &format!("line {i}"));
            assert!(post.deliver(env).await.is_ok());
        }

        for i in 0..5_u32 {
            let env = mailbox.recv().await;
            let text = env
                .map(|e| match e.payload {
                    Payload::Entry(entry) => entry.content,
                    _ => String::new(),
                })
                .unwrap_or_default();
            assert_eq!(text, format!("line {i}"));
        }
    }

    #[tokio::test]
    async fn drain_empties_buffered_envelopes() {
        let post = PostOffice::new();
        let mut mailbox = post.register(Address::from("village")).await;

        for _ in 0..3 {
            assert!(post.deliver(entry_inform("p1", "village", "x")).await.is_ok());
        }

        assert_eq!(mailbox.drain().len(), 3);
        assert!(mailbox.drain().is_empty());
    }
}
