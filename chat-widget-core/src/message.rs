//! Transcript message data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Display text used for a citation without a title
pub const UNKNOWN_SOURCE_TITLE: &str = "Unknown Source";

/// Link target used for a citation without a URL
pub const NO_SOURCE_URL: &str = "#";

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Bot => "bot",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A citation attached to a bot reply
///
/// Both fields are optional on the wire. Older service builds send a bare
/// string per source; that string is taken as the title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Source {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Source {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            url: Some(url.into()),
        }
    }

    /// Title to display, falling back to [`UNKNOWN_SOURCE_TITLE`]
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(UNKNOWN_SOURCE_TITLE)
    }

    /// Link target, falling back to [`NO_SOURCE_URL`]
    pub fn href(&self) -> &str {
        self.url
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(NO_SOURCE_URL)
    }
}

impl<'de> Deserialize<'de> for Source {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Fields {
            #[serde(default)]
            title: Option<String>,
            #[serde(default)]
            url: Option<String>,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Title(String),
            Fields(Fields),
        }

        Ok(match Helper::deserialize(deserializer)? {
            Helper::Title(title) => Source {
                title: Some(title),
                url: None,
            },
            Helper::Fields(fields) => Source {
                title: fields.title,
                url: fields.url,
            },
        })
    }
}

/// A transcript entry
///
/// Messages are immutable once built: fields are private and there are no
/// mutating methods.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    role: Role,
    text: String,
    sources: Vec<Source>,
    created_at: DateTime<Utc>,
}

impl Message {
    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text, Vec::new())
    }

    /// Create a bot message with citations
    pub fn bot(text: impl Into<String>, sources: Vec<Source>) -> Self {
        Self::new(Role::Bot, text, sources)
    }

    pub fn new(role: Role, text: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            role,
            text: text.into(),
            sources,
            created_at: Utc::now(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// The raw, unescaped text
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
