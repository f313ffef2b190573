//! Append-only conversation transcript

use crate::message::Message;
use crate::render::RenderedFragment;

/// A message together with the fragment rendered from it
#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    message: Message,
    fragment: RenderedFragment,
}

impl TranscriptEntry {
    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn fragment(&self) -> &RenderedFragment {
        &self.fragment
    }
}

/// Ordered, append-only sequence of rendered messages.
///
/// Entries are added through [`MessageRenderer::append`](crate::MessageRenderer::append)
/// and are never reordered, removed, or mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, message: Message, fragment: RenderedFragment) -> &TranscriptEntry {
        self.entries.push(TranscriptEntry { message, fragment });
        &self.entries[self.entries.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TranscriptEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    pub fn get(&self, index: usize) -> Option<&TranscriptEntry> {
        self.entries.get(index)
    }

    /// Concatenated HTML of all entries, in insertion order
    pub fn to_html(&self) -> String {
        self.entries
            .iter()
            .map(|entry| entry.fragment.to_html())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
