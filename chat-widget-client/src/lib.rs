//! Answering-service client for chat-widget
//!
//! This crate provides the [`ChatClient`] abstraction the conversation
//! controller talks to, and its HTTP implementation.

pub mod base;
pub mod http;

pub use base::{parse_reply, ChatClient, ChatError, ChatReply, ChatResult};
pub use http::HttpChatClient;
