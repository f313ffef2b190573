//! HTTP client for the answering service

use async_trait::async_trait;
use chat_widget_core::config::ServiceConfig;
use chat_widget_core::utils::truncate;
use chat_widget_core::SessionToken;
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, warn};

use crate::base::{parse_reply, ChatClient, ChatError, ChatReply, ChatRequest, ChatResult};

/// Answering-service client over HTTP/JSON
pub struct HttpChatClient {
    client: Client,
    base_url: String,
}

impl HttpChatClient {
    /// Create a client for the service rooted at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Create a client from service configuration
    pub fn from_config(config: &ServiceConfig) -> Self {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_else(|_| Client::new());
        Self::with_client(client, config.base_url.clone())
    }

    fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Probe `GET {base}/health`; the service answers with JSON `true`
    pub async fn health(&self) -> ChatResult<bool> {
        let url = self.endpoint("health");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Network(format!("service returned {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;
        match serde_json::from_slice::<serde_json::Value>(&body) {
            Ok(serde_json::Value::Bool(up)) => Ok(up),
            Ok(other) => Err(ChatError::Malformed(format!(
                "expected a boolean, got {}",
                other
            ))),
            Err(e) => Err(ChatError::Malformed(e.to_string())),
        }
    }

    /// Ask the service to forget the history behind `token`.
    ///
    /// Returns `false` when the service does not know the token. The local
    /// token is unaffected either way.
    pub async fn clear_history(&self, token: &SessionToken) -> ChatResult<bool> {
        let url = self.history_url(token)?;
        debug!(url = %url, "Clearing server-side history");

        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(ChatError::Network(format!("service returned {}", status))),
        }
    }

    fn history_url(&self, token: &SessionToken) -> ChatResult<Url> {
        let mut url = Url::parse(&self.endpoint("history"))
            .map_err(|e| ChatError::Network(format!("invalid service URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ChatError::Network("service URL cannot have a path".to_string()))?
            .push(token.as_str());
        Ok(url)
    }
}

#[async_trait]
impl ChatClient for HttpChatClient {
    async fn send(&self, query: &str, token: Option<&SessionToken>) -> ChatResult<ChatReply> {
        let url = self.endpoint("chat");
        debug!(
            url = %url,
            query = %truncate(query, 80),
            has_session = token.is_some(),
            "Sending chat request"
        );

        let request = ChatRequest {
            query,
            session_id: token.map(SessionToken::as_str),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Chat request failed");
                ChatError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Chat service returned an error status");
            return Err(ChatError::Network(format!("service returned {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        let reply = parse_reply(&body).inspect_err(|e| {
            warn!(error = %e, "Chat service returned an unusable body");
        })?;
        debug!(
            sources = reply.sources.len(),
            new_session = reply.session_id.is_some(),
            "Received chat reply"
        );
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn token(s: &str) -> SessionToken {
        SessionToken::new(s).unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = HttpChatClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.endpoint("chat"), "http://localhost:8000/chat");
    }

    #[test]
    fn test_history_url_encodes_token() {
        let client = HttpChatClient::new("http://localhost:8000/api");
        let url = client.history_url(&token("a b/c")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/history/a%20b%2Fc");
    }

    #[tokio::test]
    async fn test_send_without_session_posts_null() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"query": "hello", "session_id": null})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"response":"hi","session_id":"abc"}"#)
            .create_async()
            .await;

        let client = HttpChatClient::new(server.url());
        let reply = client.send("hello", None).await.unwrap();

        assert_eq!(reply.response_text, "hi");
        assert_eq!(reply.session_id, Some(token("abc")));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_carries_session_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat")
            .match_body(Matcher::Json(json!({"query": "again", "session_id": "abc"})))
            .with_status(200)
            .with_body(r#"{"response":"ok","sources":[{"title":"Rules","url":"https://e.org/r"}]}"#)
            .create_async()
            .await;

        let client = HttpChatClient::new(server.url());
        let reply = client.send("again", Some(&token("abc"))).await.unwrap();

        assert!(reply.session_id.is_none());
        assert_eq!(reply.sources.len(), 1);
        assert_eq!(reply.sources[0].display_title(), "Rules");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_is_network_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat")
            .with_status(500)
            .with_body(r#"{"detail":"LLM Generation Error"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = HttpChatClient::new(server.url());
        let err = client.send("hello", None).await.unwrap_err();

        assert!(matches!(err, ChatError::Network(_)));
        // exactly one request: no retries
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unparsable_success_body_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat")
            .with_status(200)
            .with_body(r#"{"session_id":"abc"}"#)
            .create_async()
            .await;

        let client = HttpChatClient::new(server.url());
        let err = client.send("hello", None).await.unwrap_err();
        assert!(matches!(err, ChatError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let client = HttpChatClient::new("http://127.0.0.1:1");
        let err = client.send("hello", None).await.unwrap_err();
        assert!(matches!(err, ChatError::Network(_)));
    }

    #[tokio::test]
    async fn test_health() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/health")
            .with_status(200)
            .with_body("true")
            .create_async()
            .await;

        let client = HttpChatClient::new(server.url());
        assert!(client.health().await.unwrap());
    }

    #[tokio::test]
    async fn test_health_non_boolean_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/health")
            .with_status(200)
            .with_body(r#"{"status":"ok"}"#)
            .create_async()
            .await;

        let client = HttpChatClient::new(server.url());
        assert!(matches!(
            client.health().await,
            Err(ChatError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_clear_history() {
        let mut server = mockito::Server::new_async().await;
        let known = server
            .mock("DELETE", "/history/abc")
            .with_status(200)
            .with_body(r#"{"message":"Chat history cleared."}"#)
            .create_async()
            .await;
        server
            .mock("DELETE", "/history/gone")
            .with_status(404)
            .create_async()
            .await;
        server
            .mock("DELETE", "/history/boom")
            .with_status(503)
            .create_async()
            .await;

        let client = HttpChatClient::new(server.url());
        assert!(client.clear_history(&token("abc")).await.unwrap());
        assert!(!client.clear_history(&token("gone")).await.unwrap());
        assert!(matches!(
            client.clear_history(&token("boom")).await,
            Err(ChatError::Network(_))
        ));
        known.assert_async().await;
    }
}
