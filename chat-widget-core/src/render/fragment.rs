//! Structured, pre-escaped view fragments
//!
//! A [`RenderedFragment`] is what a host surface mounts. Every piece of text
//! in it is an [`EscapedText`], so serializing it to markup never needs to
//! escape again and can never leak raw input.

use super::escape::EscapedText;
use crate::message::Role;
use serde::Serialize;
use std::fmt::Write;

/// One piece of a message body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Inline {
    Text(EscapedText),
    LineBreak,
}

/// Where a citation link opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkTarget {
    /// A distinct browsing context (new tab/window)
    NewContext,
}

impl LinkTarget {
    pub fn as_attr(&self) -> &'static str {
        match self {
            LinkTarget::NewContext => "_blank",
        }
    }
}

/// A single citation entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CitationLink {
    /// Display text, `"- " + title`
    pub text: EscapedText,
    pub href: EscapedText,
    pub target: LinkTarget,
    /// The source title, when the service supplied one
    pub tooltip: Option<EscapedText>,
}

/// Labeled list of citations appended below a bot reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CitationBlock {
    pub label: EscapedText,
    pub links: Vec<CitationLink>,
}

/// A rendered message ready for a host surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedFragment {
    pub role: Role,
    pub body: Vec<Inline>,
    pub citations: Option<CitationBlock>,
}

impl RenderedFragment {
    /// Serialize to HTML markup
    pub fn to_html(&self) -> String {
        let role = self.role.as_str();
        let mut html = String::new();
        let _ = write!(
            html,
            r#"<div class="message-container {role}"><div class="message {role}">"#
        );

        for inline in &self.body {
            match inline {
                Inline::Text(text) => html.push_str(text.as_str()),
                Inline::LineBreak => html.push_str("<br>"),
            }
        }

        if let Some(block) = &self.citations {
            let _ = write!(
                html,
                r#"<div class="sources"><strong>{}</strong>"#,
                block.label
            );
            for link in &block.links {
                let _ = write!(
                    html,
                    r#"<a class="source-link" href="{}" target="{}" rel="noopener noreferrer""#,
                    link.href,
                    link.target.as_attr()
                );
                if let Some(tooltip) = &link.tooltip {
                    let _ = write!(html, r#" title="{}""#, tooltip);
                }
                let _ = write!(html, ">{}</a>", link.text);
            }
            html.push_str("</div>");
        }

        html.push_str("</div></div>");
        html
    }

    /// Render for a surface that shows plain text (e.g. a terminal)
    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        for inline in &self.body {
            match inline {
                Inline::Text(text) => out.push_str(&text.unescaped()),
                Inline::LineBreak => out.push('\n'),
            }
        }

        if let Some(block) = &self.citations {
            out.push('\n');
            out.push_str(&block.label.unescaped());
            for link in &block.links {
                let _ = write!(out, "\n{}", link.text.unescaped());
                let href = link.href.unescaped();
                if href != crate::message::NO_SOURCE_URL {
                    let _ = write!(out, " <{}>", href);
                }
            }
        }
        out
    }
}
