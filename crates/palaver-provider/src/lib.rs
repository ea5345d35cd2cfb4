//! Response providers for the Palaver chat-room simulation.
//!
//! A provider is a mailbox-driven task that answers context queries with
//! a single chat entry: the [`service::LlmProviderService`] asks a model
//! API over HTTP, the [`console::ConsoleProvider`] asks the person at the
//! terminal. Participants never know which one is behind the address they
//! query.
//!
//! # Modules
//!
//! - [`llm`] -- Enum-dispatched HTTP backends (OpenAI-compatible, Anthropic)
//! - [`service`] -- The LLM-backed provider task
//! - [`console`] -- The interactive stdin/stdout provider task
//! - [`config`] -- Backend selection from environment variables

pub mod config;
pub mod console;
pub mod error;
pub mod llm;
pub mod service;

pub use config::{BackendType, LlmConfig};
pub use console::ConsoleProvider;
pub use error::ProviderError;
pub use llm::LlmBackend;
pub use service::LlmProviderService;
