//! Per-participant configuration and pacing jitter.
//!
//! The room and provider addresses are explicit configuration -- nothing
//! in the controller hardcodes any mailbox name. The pacing knobs mirror
//! the conversational loop's needs: a median wait with a variance band so
//! concurrent participants do not contend in lockstep, and per-request
//! timeouts for the two query targets.

use std::time::Duration;

use rand::Rng;

use palaver_types::Address;

/// What drives a participant's replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantKind {
    /// An LLM-backed participant; generation contexts carry system framing
    /// (name, chat instructions, personality).
    Automated,
    /// A human-backed participant; no system framing, typically zero waits.
    Interactive,
}

/// Configuration for one participant controller.
#[derive(Debug, Clone)]
pub struct ParticipantConfig {
    /// Address of the log distributor serving the shared room.
    pub room: Address,
    /// Address of this participant's response provider.
    pub provider: Address,
    /// Automated or human-backed.
    pub kind: ParticipantKind,
    /// Maximum number of entries held as generation context.
    pub max_memory: usize,
    /// Median pause between loop transitions.
    pub wait_period: Duration,
    /// Uniform spread around the median pause.
    pub wait_variance: Duration,
    /// Deadline for a cursor-query reply from the room.
    pub fetch_timeout: Duration,
    /// Deadline for a generation (or naming) reply from the provider.
    pub generate_timeout: Duration,
    /// Whether joining publishes a "has entered the room" system entry.
    pub announce_join: bool,
}

impl ParticipantConfig {
    /// Defaults for an automated participant talking to `room` via `provider`.
    pub const fn new(room: Address, provider: Address) -> Self {
        Self {
            room,
            provider,
            kind: ParticipantKind::Automated,
            max_memory: 5,
            wait_period: Duration::from_secs(10),
            wait_variance: Duration::from_secs(5),
            fetch_timeout: Duration::from_secs(30),
            generate_timeout: Duration::from_secs(300),
            announce_join: false,
        }
    }

    /// Defaults for a human-backed participant: no framing, no pacing --
    /// the human's own typing speed is the pacing.
    pub const fn interactive(room: Address, provider: Address) -> Self {
        let mut config = Self::new(room, provider);
        config.kind = ParticipantKind::Interactive;
        config.wait_period = Duration::ZERO;
        config.wait_variance = Duration::ZERO;
        config
    }
}

/// Draw one pacing pause: uniform over
/// `[wait_period - wait_variance, wait_period + wait_variance]`
/// (saturating at zero), doubled.
pub fn jitter<R: Rng + ?Sized>(
    rng: &mut R,
    wait_period: Duration,
    wait_variance: Duration,
) -> Duration {
    let low = wait_period.saturating_sub(wait_variance);
    let high = wait_period.saturating_add(wait_variance);
    if high.is_zero() {
        return Duration::ZERO;
    }

    let millis = rng.random_range(low.as_millis()..=high.as_millis());
    let millis = u64::try_from(millis).unwrap_or(u64::MAX);
    Duration::from_millis(millis).saturating_mul(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn jitter_stays_within_doubled_bounds() {
        let mut rng = SmallRng::seed_from_u64(1);
        let period = Duration::from_secs(10);
        let variance = Duration::from_secs(5);

        for _ in 0..500 {
            let pause = jitter(&mut rng, period, variance);
            assert!(pause >= Duration::from_secs(10), "pause too short: {pause:?}");
            assert!(pause <= Duration::from_secs(30), "pause too long: {pause:?}");
        }
    }

    #[test]
    fn jitter_saturates_below_zero() {
        let mut rng = SmallRng::seed_from_u64(2);
        let pause = jitter(&mut rng, Duration::from_secs(1), Duration::from_secs(5));
        // Lower bound clamps to zero rather than underflowing.
        assert!(pause <= Duration::from_secs(12));
    }

    #[test]
    fn jitter_of_zero_config_is_zero() {
        let mut rng = SmallRng::seed_from_u64(3);
        assert_eq!(
            jitter(&mut rng, Duration::ZERO, Duration::ZERO),
            Duration::ZERO
        );
    }

    #[test]
    fn interactive_defaults_disable_pacing() {
        let config = ParticipantConfig::interactive(
            Address::from("village"),
            Address::from("console"),
        );
        assert_eq!(config.kind, ParticipantKind::Interactive);
        assert!(config.wait_period.is_zero());
        assert!(config.wait_variance.is_zero());
        assert_eq!(config.max_memory, 5);
    }
}
