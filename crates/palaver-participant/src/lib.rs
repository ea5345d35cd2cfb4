//! Participant orchestration for the Palaver chat-room simulation.
//!
//! Each participant is a finite-state machine looping through
//! name -> join -> fetch -> generate -> publish against the shared log,
//! with every external interaction (the log distributor, the response
//! provider) going through addressed envelopes with a bounded-timeout
//! reply wait. A failure at any stage of the loop degrades to "go re-read
//! the log" rather than crashing the participant; only a failed naming
//! phase is fatal.
//!
//! # Modules
//!
//! - [`controller`] -- The state machine and its run loop
//! - [`memory`] -- The bounded sliding window of recent conversation
//! - [`pending`] -- Request/reply correlation and the timeout wait
//! - [`prompts`] -- Prompt texts and generation-context assembly
//! - [`config`] -- Per-participant configuration and pacing jitter

pub mod config;
pub mod controller;
pub mod error;
pub mod memory;
pub mod pending;
pub mod prompts;

pub use config::{ParticipantConfig, ParticipantKind};
pub use controller::{ParticipantController, ParticipantState, StopReason};
pub use error::ParticipantError;
pub use memory::ConversationMemory;
pub use pending::{PendingRequest, ReplyOutcome, RequestKind};
