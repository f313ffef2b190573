//! Conversation controller
//!
//! Drives one conversation: validates input, appends messages through the
//! renderer, runs exchanges against the answering service and keeps the
//! session token current.
//!
//! An exchange is split in two so a surface can keep drawing while the
//! request is in flight:
//!
//! 1. [`ConversationController::submit`] appends the user message, enters
//!    [`WidgetState::Sending`] and hands back an [`Exchange`].
//! 2. [`Exchange::run`] performs the request without borrowing the
//!    controller.
//! 3. [`ConversationController::complete`] applies the result and returns
//!    to [`WidgetState::Idle`].
//!
//! [`ConversationController::ask`] chains the three for callers that have
//! nothing to do in between. Hosts that spawn the request use
//! [`Exchange::deliver_to`], which always reports back, even on panic.

use chat_widget_client::{ChatClient, ChatError, ChatReply, ChatResult};
use chat_widget_core::config::WidgetConfig;
use chat_widget_core::utils::truncate;
use chat_widget_core::{Message, MessageRenderer, SessionStore, SessionToken, Transcript};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::state::{WidgetEvent, WidgetState};

/// Presentation options for a controller
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Bot message appended when an exchange fails
    pub fallback_message: String,
    /// Label above citation lists
    pub sources_label: String,
    /// Opening bot message, appended on construction
    pub greeting: Option<String>,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self::from(&WidgetConfig::default())
    }
}

impl From<&WidgetConfig> for ControllerOptions {
    fn from(config: &WidgetConfig) -> Self {
        Self {
            fallback_message: config.fallback_message.clone(),
            sources_label: config.sources_label.clone(),
            greeting: config
                .greeting
                .as_ref()
                .filter(|g| !g.trim().is_empty())
                .cloned(),
        }
    }
}

/// What became of a submission
#[must_use = "a started exchange leaves the controller sending until completed"]
pub enum Submission {
    /// Empty or whitespace-only input; nothing changed
    Ignored,
    /// An exchange is already in flight; nothing changed
    Rejected,
    /// The user message was appended; run the exchange and complete it
    Started(Exchange),
}

impl std::fmt::Debug for Submission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Submission::Ignored => write!(f, "Ignored"),
            Submission::Rejected => write!(f, "Rejected"),
            Submission::Started(exchange) => f.debug_tuple("Started").field(exchange).finish(),
        }
    }
}

/// How an exchange ended, from the conversation's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Input was empty or whitespace-only
    Ignored,
    /// Another exchange was in flight
    Rejected,
    /// The service answered and its reply was appended
    Answered,
    /// The exchange failed and the fallback message was appended
    FellBack,
}

/// One in-flight request, detached from the controller
pub struct Exchange {
    client: Arc<dyn ChatClient>,
    query: String,
    token: Option<SessionToken>,
}

impl Exchange {
    /// The trimmed query text
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The token that will accompany the query
    pub fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }

    /// Perform the request. Exactly one call to the answering service.
    pub async fn run(self) -> ChatResult<ChatReply> {
        self.client.send(&self.query, self.token.as_ref()).await
    }

    /// Run the exchange and send its result to `results`.
    ///
    /// Exactly one result is sent, even when the future is dropped early or
    /// the client panics; that result is a [`ChatError::Network`] describing
    /// the abandoned exchange. Suitable for `tokio::spawn`.
    pub fn deliver_to(
        self,
        results: mpsc::UnboundedSender<ChatResult<ChatReply>>,
    ) -> impl Future<Output = ()> + Send + 'static {
        // armed before the first poll so an unpolled, dropped future still reports
        let mut delivery = Delivery {
            results: Some(results),
        };
        async move {
            let result = self.run().await;
            delivery.send(result);
        }
    }
}

/// Sends an abandonment error unless a real result was sent
struct Delivery {
    results: Option<mpsc::UnboundedSender<ChatResult<ChatReply>>>,
}

impl Delivery {
    fn send(&mut self, result: ChatResult<ChatReply>) {
        if let Some(results) = self.results.take() {
            let _ = results.send(result);
        }
    }
}

impl Drop for Delivery {
    fn drop(&mut self) {
        if self.results.is_some() {
            warn!("Exchange abandoned before it finished");
            self.send(Err(abandoned()));
        }
    }
}

fn abandoned() -> ChatError {
    ChatError::Network("exchange abandoned before a reply arrived".to_string())
}

/// Completes the controller's exchange with an error if the owner goes away
/// while it is still sending
struct SendingGuard<'c> {
    controller: &'c mut ConversationController,
}

impl Drop for SendingGuard<'_> {
    fn drop(&mut self) {
        if self.controller.state == WidgetState::Sending {
            warn!("Exchange abandoned before it finished");
            let _ = self.controller.complete(Err(abandoned()));
        }
    }
}

impl std::fmt::Debug for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exchange")
            .field("query", &self.query)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

/// Owns the conversation state, transcript and session token
pub struct ConversationController {
    client: Arc<dyn ChatClient>,
    session: Box<dyn SessionStore>,
    renderer: MessageRenderer,
    transcript: Transcript,
    state: WidgetState,
    fallback_message: String,
    events: Option<mpsc::UnboundedSender<WidgetEvent>>,
}

impl ConversationController {
    /// Create a controller; the greeting, if any, is the first transcript entry
    pub fn new(
        client: Arc<dyn ChatClient>,
        session: Box<dyn SessionStore>,
        options: ControllerOptions,
    ) -> Self {
        let mut controller = Self {
            client,
            session,
            renderer: MessageRenderer::new(options.sources_label),
            transcript: Transcript::new(),
            state: WidgetState::Idle,
            fallback_message: options.fallback_message,
            events: None,
        };

        if let Some(greeting) = options.greeting {
            controller.append(Message::bot(greeting, Vec::new()));
        }
        controller
    }

    /// Attach an event subscriber.
    ///
    /// The subscriber first receives the current transcript and state, then
    /// every later change.
    pub fn with_events(mut self, events: mpsc::UnboundedSender<WidgetEvent>) -> Self {
        for entry in self.transcript.iter() {
            let _ = events.send(WidgetEvent::MessageAppended(entry.fragment().clone()));
        }
        let _ = events.send(WidgetEvent::StateChanged(self.state));
        self.events = Some(events);
        self
    }

    pub fn state(&self) -> WidgetState {
        self.state
    }

    pub fn input_enabled(&self) -> bool {
        self.state.input_enabled()
    }

    pub fn typing_indicator_visible(&self) -> bool {
        self.state.shows_typing_indicator()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// The current session token, if any
    pub fn session_token(&self) -> Option<SessionToken> {
        self.session.get()
    }

    /// Accept raw user input.
    ///
    /// Rejected while sending. Whitespace-only input is ignored without any
    /// visible change. Otherwise the trimmed text is appended as a user
    /// message, the input is cleared and the controller enters `Sending`.
    pub fn submit(&mut self, raw: &str) -> Submission {
        if self.state == WidgetState::Sending {
            debug!("Submission rejected, exchange already in flight");
            return Submission::Rejected;
        }

        let query = raw.trim();
        if query.is_empty() {
            return Submission::Ignored;
        }

        self.append(Message::user(query));
        self.emit(WidgetEvent::InputCleared);
        self.transition(WidgetState::Sending);

        let token = self.session.get();
        info!(
            query = %truncate(query, 80),
            has_session = token.is_some(),
            "Starting exchange"
        );

        Submission::Started(Exchange {
            client: self.client.clone(),
            query: query.to_string(),
            token,
        })
    }

    /// Apply the result of the in-flight exchange and return to `Idle`.
    ///
    /// A result delivered while idle has no exchange to belong to and is
    /// dropped.
    pub fn complete(&mut self, result: ChatResult<ChatReply>) -> Outcome {
        if self.state != WidgetState::Sending {
            warn!("Exchange result arrived while idle, ignoring");
            return Outcome::Ignored;
        }

        let outcome = match result {
            Ok(reply) => {
                if let Some(token) = reply.session_id {
                    self.session.set(token);
                }
                debug!(sources = reply.sources.len(), "Appending reply");
                self.append(Message::bot(reply.response_text, reply.sources));
                Outcome::Answered
            }
            Err(e) => {
                warn!(error = %e, "Exchange failed, showing fallback message");
                self.append(Message::bot(self.fallback_message.clone(), Vec::new()));
                Outcome::FellBack
            }
        };

        self.transition(WidgetState::Idle);
        outcome
    }

    /// Submit, run and complete in one call.
    ///
    /// Dropping the returned future mid-exchange completes it as a failure,
    /// so the controller is never left sending.
    pub async fn ask(&mut self, raw: &str) -> Outcome {
        match self.submit(raw) {
            Submission::Ignored => Outcome::Ignored,
            Submission::Rejected => Outcome::Rejected,
            Submission::Started(exchange) => {
                let mut guard = SendingGuard { controller: self };
                let result = exchange.run().await;
                guard.controller.complete(result)
            }
        }
    }

    fn append(&mut self, message: Message) {
        let entry = self.renderer.append(&mut self.transcript, message);
        if let Some(events) = &self.events {
            let _ = events.send(WidgetEvent::MessageAppended(entry.fragment().clone()));
        }
    }

    fn transition(&mut self, state: WidgetState) {
        if self.state != state {
            debug!(from = %self.state, to = %state, "Widget state changed");
            self.state = state;
            self.emit(WidgetEvent::StateChanged(state));
        }
    }

    fn emit(&self, event: WidgetEvent) {
        if let Some(events) = &self.events {
            // a dropped receiver just means nobody is watching
            let _ = events.send(event);
        }
    }
}
