//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup, providing a single type that
//! `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Provider configuration or setup failed.
    #[error("provider error: {source}")]
    Provider {
        /// The underlying provider error.
        #[from]
        source: palaver_provider::ProviderError,
    },

    /// The participant-count argument could not be parsed.
    #[error("invalid participant count '{value}': {source}")]
    ParticipantCount {
        /// The raw argument as given.
        value: String,
        /// The parse failure.
        #[source]
        source: std::num::ParseIntError,
    },

    /// Installing the Ctrl-C signal handler failed.
    #[error("signal handler error: {source}")]
    Signal {
        /// The underlying I/O failure.
        #[from]
        source: std::io::Error,
    },
}
