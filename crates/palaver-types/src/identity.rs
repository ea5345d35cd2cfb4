//! Personalities and participant identities.
//!
//! Each participant is assigned one personality label for its lifetime,
//! drawn from a fixed small set. The draw takes an injected random source
//! rather than reaching for ambient global state, so tests can seed it.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// The fixed set of personality labels a participant can be assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    /// Playful and prone to nonsense.
    Silly,
    /// Short-tempered and complaining.
    Grumpy,
    /// Relentlessly upbeat.
    Happy,
    /// Sees the dark side of everything.
    Gloomy,
    /// Scattered and easily distracted.
    Ditzy,
    /// Precise, pedantic, fond of trivia.
    Nerdy,
}

impl Personality {
    /// All personalities, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Silly,
        Self::Grumpy,
        Self::Happy,
        Self::Gloomy,
        Self::Ditzy,
        Self::Nerdy,
    ];

    /// Draw one personality uniformly from an injected random source.
    pub fn pick<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let idx = rng.random_range(0..Self::ALL.len());
        Self::ALL.get(idx).copied().unwrap_or(Self::Silly)
    }

    /// The lowercase label of this personality.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Silly => "silly",
            Self::Grumpy => "grumpy",
            Self::Happy => "happy",
            Self::Gloomy => "gloomy",
            Self::Ditzy => "ditzy",
            Self::Nerdy => "nerdy",
        }
    }

    /// The system-prompt fragment hinting this personality to a generator.
    pub fn prompt_fragment(self) -> String {
        format!("You have a {} personality.", self.label())
    }
}

impl core::fmt::Display for Personality {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// A participant's chosen identity: display name plus personality.
///
/// The name is chosen once during the naming phase and immutable after;
/// the personality is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantIdentity {
    /// Display name, distinct from the participant's mailbox address.
    pub name: String,
    /// Lifetime personality label.
    pub personality: Personality,
}

impl ParticipantIdentity {
    /// Create an identity from a chosen name and an assigned personality.
    pub fn new(name: impl Into<String>, personality: Personality) -> Self {
        Self {
            name: name.into(),
            personality,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn pick_is_deterministic_under_seed() {
        let mut a = SmallRng::seed_from_u64(42);
        let mut b = SmallRng::seed_from_u64(42);
        assert_eq!(Personality::pick(&mut a), Personality::pick(&mut b));
    }

    #[test]
    fn pick_covers_the_whole_set() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..200 {
            seen.insert(Personality::pick(&mut rng).label());
        }
        assert_eq!(seen.len(), Personality::ALL.len());
    }

    #[test]
    fn prompt_fragment_names_the_label() {
        assert_eq!(
            Personality::Grumpy.prompt_fragment(),
            "You have a grumpy personality."
        );
    }

    #[test]
    fn identity_serde_roundtrip() {
        let identity = ParticipantIdentity::new("Mira", Personality::Nerdy);
        let json = serde_json::to_string(&identity).unwrap_or_default();
        let restored: Result<ParticipantIdentity, _> = serde_json::from_str(&json);
        assert_eq!(restored.ok(), Some(identity));
    }
}
