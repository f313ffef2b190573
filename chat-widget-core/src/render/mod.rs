//! Message rendering
//!
//! Turns role-tagged raw text plus citations into a [`RenderedFragment`].
//! Raw text is escaped before anything else touches it; newlines become
//! explicit [`Inline::LineBreak`] markers afterwards.

pub mod escape;
pub mod fragment;

pub use escape::EscapedText;
pub use fragment::{CitationBlock, CitationLink, Inline, LinkTarget, RenderedFragment};

use crate::message::{Message, Role, Source};
use crate::transcript::{Transcript, TranscriptEntry};

const DEFAULT_SOURCES_LABEL: &str = "Sources:";

/// Converts message payloads into safe view fragments
#[derive(Debug, Clone)]
pub struct MessageRenderer {
    sources_label: String,
}

impl MessageRenderer {
    /// Create a renderer with a custom citation block label
    pub fn new(sources_label: impl Into<String>) -> Self {
        Self {
            sources_label: sources_label.into(),
        }
    }

    /// Render one message payload
    pub fn render(&self, role: Role, raw_text: &str, sources: &[Source]) -> RenderedFragment {
        let escaped = EscapedText::escape(raw_text);

        let mut body = Vec::new();
        for (i, line) in escaped.as_str().split('\n').enumerate() {
            if i > 0 {
                body.push(Inline::LineBreak);
            }
            if !line.is_empty() {
                // splitting on '\n' cannot cut an entity
                body.push(Inline::Text(EscapedText::from_escaped(line)));
            }
        }

        RenderedFragment {
            role,
            body,
            citations: self.render_citations(sources),
        }
    }

    /// Render a [`Message`]
    pub fn render_message(&self, message: &Message) -> RenderedFragment {
        self.render(message.role(), message.text(), message.sources())
    }

    /// Render a message and append it to the transcript.
    ///
    /// This is the only way entries enter a [`Transcript`].
    pub fn append<'t>(
        &self,
        transcript: &'t mut Transcript,
        message: Message,
    ) -> &'t TranscriptEntry {
        let fragment = self.render_message(&message);
        transcript.push(message, fragment)
    }

    fn render_citations(&self, sources: &[Source]) -> Option<CitationBlock> {
        if sources.is_empty() {
            return None;
        }

        let links = sources
            .iter()
            .map(|source| CitationLink {
                text: EscapedText::escape(&format!("- {}", source.display_title())),
                href: EscapedText::escape(source.href()),
                target: LinkTarget::NewContext,
                tooltip: source
                    .title
                    .as_deref()
                    .filter(|t| !t.is_empty())
                    .map(EscapedText::escape),
            })
            .collect();

        Some(CitationBlock {
            label: EscapedText::escape(&self.sources_label),
            links,
        })
    }
}

impl Default for MessageRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCES_LABEL)
    }
}
