//! Core types for chat-widget
//!
//! This crate provides the pieces every other chat-widget component builds
//! on: configuration, logging, session-token persistence, the message and
//! transcript model, and the HTML-safe message renderer.

pub mod config;
pub mod error;
pub mod logging;
pub mod message;
pub mod render;
pub mod session;
pub mod transcript;
pub mod utils;

pub use error::{Error, Result};
pub use message::{Message, Role, Source};
pub use render::{MessageRenderer, RenderedFragment};
pub use session::{FileSessionStore, MemorySessionStore, SessionStore, SessionToken};
pub use transcript::Transcript;
