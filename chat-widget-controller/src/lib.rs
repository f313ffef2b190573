//! Conversation control for chat-widget
//!
//! This crate provides the widget state machine that ties the answering
//! service client, the session store and the message renderer together.

pub mod controller;
pub mod state;

pub use controller::{ControllerOptions, ConversationController, Exchange, Outcome, Submission};
pub use state::{WidgetEvent, WidgetState};
