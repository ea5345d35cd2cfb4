//! The bounded sliding window of recent conversation.
//!
//! Each participant keeps the most recent `max_memory` entries it has
//! observed (or generated) as its generation context. Appending past the
//! cap drops the oldest entries -- newest are always retained, in original
//! order.

use std::collections::VecDeque;

use palaver_types::ChatEntry;

/// A sliding window over the most recent conversation entries.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    window: VecDeque<ChatEntry>,
    cap: usize,
}

impl ConversationMemory {
    /// Create an empty window holding at most `cap` entries.
    ///
    /// A cap of zero is clamped to one; a participant with no context at
    /// all could never carry a conversation.
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            window: VecDeque::with_capacity(cap),
            cap,
        }
    }

    /// Append one entry, dropping the oldest if the window is full.
    pub fn push(&mut self, entry: ChatEntry) {
        self.window.push_back(entry);
        while self.window.len() > self.cap {
            self.window.pop_front();
        }
    }

    /// Append several entries in order, trimming to the cap afterwards.
    pub fn extend(&mut self, entries: impl IntoIterator<Item = ChatEntry>) {
        for entry in entries {
            self.push(entry);
        }
    }

    /// The most recently appended entry, if any.
    pub fn latest(&self) -> Option<&ChatEntry> {
        self.window.back()
    }

    /// Clone the window contents in order, oldest first.
    pub fn snapshot(&self) -> Vec<ChatEntry> {
        self.window.iter().cloned().collect()
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Whether the window is empty.
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// The configured cap.
    pub const fn cap(&self) -> usize {
        self.cap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str) -> ChatEntry {
        ChatEntry::user(text)
    }

    fn contents(memory: &ConversationMemory) -> Vec<String> {
        memory.snapshot().into_iter().map(|e| e.content).collect()
    }

    #[test]
    fn never_exceeds_cap() {
        let mut memory = ConversationMemory::new(3);
        for i in 0..10 {
            memory.push(line(&format!("{i}")));
            assert!(memory.len() <= 3);
        }
    }

    #[test]
    fn trimming_keeps_newest_in_original_order() {
        let mut memory = ConversationMemory::new(2);
        memory.push(line("a"));
        memory.push(line("b"));
        memory.push(line("c"));
        assert_eq!(contents(&memory), vec!["b", "c"]);
    }

    #[test]
    fn extend_trims_like_repeated_push() {
        let mut memory = ConversationMemory::new(3);
        memory.extend(["a", "b", "c", "d", "e"].map(line));
        assert_eq!(contents(&memory), vec!["c", "d", "e"]);
    }

    #[test]
    fn latest_is_most_recent() {
        let mut memory = ConversationMemory::new(5);
        assert!(memory.latest().is_none());
        memory.push(line("first"));
        memory.push(line("second"));
        assert_eq!(memory.latest().map(|e| e.content.as_str()), Some("second"));
    }

    #[test]
    fn zero_cap_clamps_to_one() {
        let mut memory = ConversationMemory::new(0);
        memory.push(line("a"));
        memory.push(line("b"));
        assert_eq!(contents(&memory), vec!["b"]);
        assert_eq!(memory.cap(), 1);
    }
}
