//! Append-only chat log and the distributor task serving it.
//!
//! The [`ChatLog`] is the sole piece of shared state in the simulation.
//! It is exclusively owned by one [`LogDistributor`] task, which serializes
//! all appends (arrival order is the total order) and answers cursor-based
//! "everything after index N" queries with immutable snapshots. Readers
//! never hold a lock on the log; they only see cloned suffixes.
//!
//! # Modules
//!
//! - [`log`] -- The append-only entry sequence
//! - [`distributor`] -- The serving task (informs append, queries fetch)

pub mod distributor;
pub mod log;

pub use distributor::LogDistributor;
pub use log::ChatLog;
