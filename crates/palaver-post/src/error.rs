//! Error types for the message substrate.

use palaver_types::Address;

/// Errors that can occur when delivering an envelope.
#[derive(Debug, thiserror::Error)]
pub enum PostError {
    /// No mailbox is registered under the recipient address.
    #[error("unknown recipient: {0}")]
    UnknownRecipient(Address),

    /// The recipient's mailbox has been dropped.
    #[error("mailbox closed: {0}")]
    MailboxClosed(Address),
}
