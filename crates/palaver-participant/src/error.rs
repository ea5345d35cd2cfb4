//! Error types for the participant state machine.
//!
//! Only unrecoverable failures surface as errors: everything else in the
//! fetch/generate/publish loop resolves to a defined next state (usually
//! back to fetching). A participant that cannot even request its name
//! cannot proceed, so the naming phase is the one place transport and
//! timeout failures are fatal.

use palaver_post::PostError;

/// Unrecoverable participant failures.
#[derive(Debug, thiserror::Error)]
pub enum ParticipantError {
    /// The naming request could not be sent to the response provider.
    #[error("naming request send failed: {source}")]
    NamingSend {
        /// The underlying delivery failure.
        #[source]
        source: PostError,
    },

    /// The naming reply timed out or came back blank.
    #[error("naming failed: {reason}")]
    NamingFailed {
        /// What went wrong with the reply.
        reason: String,
    },

    /// The join announcement could not be published.
    #[error("join announcement send failed: {source}")]
    JoinAnnounce {
        /// The underlying delivery failure.
        #[source]
        source: PostError,
    },
}
