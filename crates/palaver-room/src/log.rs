//! The append-only chat log.
//!
//! An ordered sequence of [`ChatEntry`] values. Entries are only ever
//! appended; once an entry occupies position `i` it never changes, so the
//! length is monotonically non-decreasing and any previously observed
//! prefix stays valid forever. Position is the sole identity of an entry.

use palaver_types::ChatEntry;

/// The ordered, append-only sequence of chat entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatLog {
    entries: Vec<ChatEntry>,
}

impl ChatLog {
    /// Create an empty log.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an entry at the end. Returns the new length.
    ///
    /// Appends are never rejected for content reasons; boundary validation
    /// happens at the receiving side of the distributor.
    pub fn append(&mut self, entry: ChatEntry) -> usize {
        self.entries.push(entry);
        self.entries.len()
    }

    /// Return `log[index..]`, clamped to empty for out-of-range indices.
    ///
    /// Never blocks, never errors, never mutates.
    pub fn fetch_since(&self, index: usize) -> &[ChatEntry] {
        self.entries.get(index..).unwrap_or(&[])
    }

    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all entries in append order.
    pub fn iter(&self) -> core::slice::Iter<'_, ChatEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a ChatLog {
    type Item = &'a ChatEntry;
    type IntoIter = core::slice::Iter<'a, ChatEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
