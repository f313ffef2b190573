//! Client trait and wire types for the answering service

use async_trait::async_trait;
use chat_widget_core::{SessionToken, Source};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Error type for a failed exchange
///
/// Callers treat both variants the same way; the split exists for logging.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// Transport failure or non-success status
    #[error("Network error: {0}")]
    Network(String),

    /// A success response whose body is not a valid reply
    #[error("Malformed response: {0}")]
    Malformed(String),
}

pub type ChatResult<T> = Result<T, ChatError>;

/// A successful reply from the answering service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub response_text: String,
    /// Continuity token, if the service issued one
    pub session_id: Option<SessionToken>,
    pub sources: Vec<Source>,
}

/// Request body for `POST {base}/chat`
#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub query: &'a str,
    /// Serialized as `null` when absent
    pub session_id: Option<&'a str>,
}

/// Response body for `POST {base}/chat`
#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponseBody {
    response: String,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    sources: Vec<Source>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Source>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Source>>::deserialize(deserializer)?.unwrap_or_default())
}

impl From<ChatResponseBody> for ChatReply {
    fn from(body: ChatResponseBody) -> Self {
        Self {
            response_text: body.response,
            session_id: body.session_id.and_then(SessionToken::new),
            sources: body.sources,
        }
    }
}

/// Parse a success body into a [`ChatReply`]
pub fn parse_reply(body: &[u8]) -> ChatResult<ChatReply> {
    serde_json::from_slice::<ChatResponseBody>(body)
        .map(ChatReply::from)
        .map_err(|e| ChatError::Malformed(e.to_string()))
}

/// Performs one query exchange against the answering service
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send a query, carrying the current continuity token if any.
    ///
    /// One request per call; no retries.
    async fn send(&self, query: &str, token: Option<&SessionToken>) -> ChatResult<ChatReply>;
}
