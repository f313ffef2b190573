//! Widget state and the events a surface observes

use chat_widget_core::RenderedFragment;
use std::fmt;

/// Conversation state. At most one exchange is in flight at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidgetState {
    /// Accepting input
    #[default]
    Idle,
    /// Waiting for the answering service
    Sending,
}

impl WidgetState {
    /// Input controls are enabled exactly when idle
    pub fn input_enabled(&self) -> bool {
        matches!(self, WidgetState::Idle)
    }

    /// The typing indicator is visible exactly while sending
    pub fn shows_typing_indicator(&self) -> bool {
        matches!(self, WidgetState::Sending)
    }
}

impl fmt::Display for WidgetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WidgetState::Idle => write!(f, "idle"),
            WidgetState::Sending => write!(f, "sending"),
        }
    }
}

/// Change notifications for a presentation surface
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    /// A message was rendered and appended to the transcript
    MessageAppended(RenderedFragment),
    /// The input field should be emptied
    InputCleared,
    /// Input availability and typing indicator follow the new state
    StateChanged(WidgetState),
}
