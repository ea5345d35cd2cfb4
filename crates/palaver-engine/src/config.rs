//! Engine configuration from the command line and environment.

use palaver_types::Address;

use crate::error::EngineError;

/// Top-level engine settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How many automated participants to spawn.
    pub participants: usize,
    /// Whether to also run an interactive console participant.
    pub interactive: bool,
    /// The room's mailbox address.
    pub room: Address,
}

impl EngineConfig {
    /// Default number of automated participants.
    pub const DEFAULT_PARTICIPANTS: usize = 3;

    /// Load settings from the process arguments and environment.
    ///
    /// The first positional argument is the automated participant count
    /// (default 3). `PALAVER_INTERACTIVE` set to `1` or `true` adds a
    /// console participant; `PALAVER_ROOM` renames the room (default
    /// `village`).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ParticipantCount`] if the count argument is
    /// not a number.
    pub fn load() -> Result<Self, EngineError> {
        let participants = match std::env::args().nth(1) {
            Some(raw) => raw.trim().parse().map_err(|source| {
                EngineError::ParticipantCount { value: raw, source }
            })?,
            None => Self::DEFAULT_PARTICIPANTS,
        };

        let interactive = std::env::var("PALAVER_INTERACTIVE")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let room = std::env::var("PALAVER_ROOM")
            .map_or_else(|_| Address::from("village"), Address::from);

        Ok(Self {
            participants,
            interactive,
            room,
        })
    }
}
