//! Shared type definitions for the Palaver chat-room simulation.
//!
//! This crate is the single source of truth for the types that cross task
//! boundaries: chat entries, addressed message envelopes, and participant
//! identities. Every type here is serde-serializable so the wire shape is
//! transport-agnostic -- the in-process substrate carries typed envelopes
//! today, but nothing in the data model assumes that.
//!
//! # Modules
//!
//! - [`entry`] -- Chat roles and immutable chat entries
//! - [`envelope`] -- Addresses, intents, payloads, and message envelopes
//! - [`identity`] -- Personalities and participant identities

pub mod entry;
pub mod envelope;
pub mod identity;

// Re-export all public types at crate root for convenience.
pub use entry::{ChatEntry, Role};
pub use envelope::{Address, Envelope, Intent, Payload};
pub use identity::{ParticipantIdentity, Personality};
