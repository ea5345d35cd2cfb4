//! Error types for the provider crate.

/// Errors raised while producing a response.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Bad or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The HTTP call to the model API failed or returned an error.
    #[error("llm backend error: {0}")]
    LlmBackend(String),

    /// Reading a line from the console failed.
    #[error("console read failed: {source}")]
    ConsoleRead {
        /// The underlying read failure.
        #[source]
        source: std::io::Error,
    },
}
