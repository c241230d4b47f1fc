//! In-memory inbox cache with a cache-preserving merge.

use crate::models::{Message, MessageIntro};

/// One cached message, in its summary form plus the full fetch if one
/// happened. Both sides share the same identity key (`id`).
#[derive(Debug, Clone)]
pub struct InboxEntry {
    pub intro: MessageIntro,
    pub full: Option<Message>,
}

/// Append-only message cache for one account, keyed by message id in
/// arrival order.
///
/// Re-listing intros refreshes the summary fields of known messages
/// without discarding an already-fetched full message, so an intro can be
/// upgraded once and stay upgraded across listings.
#[derive(Debug, Clone, Default)]
pub struct Inbox {
    entries: Vec<InboxEntry>,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a fresh listing into the cache. New ids are appended in
    /// listing order; known ids only get their intro refreshed.
    pub fn merge_intros(&mut self, intros: impl IntoIterator<Item = MessageIntro>) {
        for intro in intros {
            match self.entries.iter_mut().find(|e| e.intro.id == intro.id) {
                Some(entry) => entry.intro = intro,
                None => self.entries.push(InboxEntry { intro, full: None }),
            }
        }
    }

    /// Attach a full fetch to its entry, inserting the entry if the id
    /// was never listed.
    pub fn upgrade(&mut self, message: Message) {
        match self.entries.iter_mut().find(|e| e.intro.id == message.id) {
            Some(entry) => entry.full = Some(message),
            None => self.entries.push(InboxEntry {
                intro: MessageIntro::from(&message),
                full: Some(message),
            }),
        }
    }

    /// Drop the entry for `id`. Returns whether one was present.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.intro.id != id);
        self.entries.len() != before
    }

    pub fn get(&self, id: &str) -> Option<&InboxEntry> {
        self.entries.iter().find(|e| e.intro.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.intro.id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &InboxEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
