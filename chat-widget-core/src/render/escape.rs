//! Escaped text newtype

use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

/// Text that has passed through HTML escaping.
///
/// The only constructor escapes `&`, `<`, `>`, `"` and `'`, so a value of this
/// type is safe both as element content and inside a quoted attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EscapedText(String);

impl EscapedText {
    /// Escape untrusted text
    pub fn escape(raw: &str) -> Self {
        Self(html_escape::encode_quoted_attribute(raw).into_owned())
    }

    /// Wrap a slice of text that is already escaped
    pub(crate) fn from_escaped(escaped: &str) -> Self {
        Self(escaped.to_string())
    }

    /// The escaped form, ready to be written into markup
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The original text, for surfaces that do not interpret markup
    pub fn unescaped(&self) -> Cow<'_, str> {
        html_escape::decode_html_entities(&self.0)
    }
}

impl fmt::Display for EscapedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
