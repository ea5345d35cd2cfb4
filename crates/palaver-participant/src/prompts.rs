//! Prompt texts and generation-context assembly.

use palaver_types::{ChatEntry, ParticipantIdentity, Personality};

/// The naming-phase prompt sent to the response provider.
pub const NAME_GEN_PROMPT: &str =
    "Think of a random name for yourself. Respond using one word, with no punctuation.";

/// The standing chat instructions framed into automated contexts.
pub const CHAT_GEN_PROMPT: &str =
    "You are in a chat room. Respond in one short sentence. Do not say your own name.";

/// The synthetic line appended to memory when a fetch returns nothing,
/// so the generation context is never empty.
pub const FILLER_LINE: &str = "It's pretty quiet over here...";

/// The context for a naming request: one user entry combining the naming
/// prompt with the personality hint.
pub fn naming_request(personality: Personality) -> Vec<ChatEntry> {
    vec![ChatEntry::user(format!(
        "{NAME_GEN_PROMPT} {}",
        personality.prompt_fragment()
    ))]
}

/// System framing entries prepended to an automated participant's
/// generation context. Human-backed participants get none -- the console
/// shows the raw conversation instead.
pub fn framing(identity: &ParticipantIdentity) -> Vec<ChatEntry> {
    vec![
        ChatEntry::system(format!("Your name is {}", identity.name)),
        ChatEntry::system(CHAT_GEN_PROMPT),
        ChatEntry::system(identity.personality.prompt_fragment()),
    ]
}

/// The synthetic quiet-room entry.
pub fn filler_entry() -> ChatEntry {
    ChatEntry::user(FILLER_LINE)
}

/// Whether an entry is the synthetic filler (never published to the room).
pub fn is_filler(entry: &ChatEntry) -> bool {
    entry.content == FILLER_LINE
}

#[cfg(test)]
mod tests {
    use super::*;
    use palaver_types::Role;

    #[test]
    fn naming_request_is_one_user_entry_with_hint() {
        let context = naming_request(Personality::Ditzy);
        assert_eq!(context.len(), 1);
        let entry = context.first().cloned().unwrap_or_else(|| ChatEntry::user(""));
        assert_eq!(entry.role, Role::User);
        assert!(entry.content.starts_with(NAME_GEN_PROMPT));
        assert!(entry.content.ends_with("You have a ditzy personality."));
    }

    #[test]
    fn framing_names_the_participant() {
        let identity = ParticipantIdentity::new("Mira", Personality::Happy);
        let framing = framing(&identity);
        assert_eq!(framing.len(), 3);
        assert!(framing.iter().all(|e| e.role == Role::System));
        assert_eq!(
            framing.first().map(|e| e.content.as_str()),
            Some("Your name is Mira")
        );
    }

    #[test]
    fn filler_is_detected_by_content() {
        assert!(is_filler(&filler_entry()));
        assert!(!is_filler(&ChatEntry::user("it's pretty loud over here")));
    }
}
