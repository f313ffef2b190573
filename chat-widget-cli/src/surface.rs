//! Terminal presentation of widget events

use chat_widget_controller::{WidgetEvent, WidgetState};
use chat_widget_core::{RenderedFragment, Role};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc;

/// Draws the conversation on stdout and shows a spinner as the typing indicator
pub struct TerminalSurface {
    events: mpsc::UnboundedReceiver<WidgetEvent>,
    spinner: Option<ProgressBar>,
    echo_user: bool,
    interactive: bool,
}

impl TerminalSurface {
    /// `echo_user` prints user messages too; an interactive terminal already
    /// shows what was typed.
    pub fn new(events: mpsc::UnboundedReceiver<WidgetEvent>, echo_user: bool) -> Self {
        Self {
            events,
            spinner: None,
            echo_user,
            interactive: false,
        }
    }

    /// Show a prompt whenever the widget returns to idle
    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    /// Apply every pending event
    pub fn drain(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.apply(event);
        }
    }

    pub fn notice(&self, text: &str) {
        let line = format!("{}", style(text).yellow());
        match &self.spinner {
            Some(spinner) => spinner.println(line),
            None => println!("{}", line),
        }
    }

    pub fn prompt(&self) {
        print!("{} ", style(">").cyan().bold());
        let _ = std::io::stdout().flush();
    }

    fn apply(&mut self, event: WidgetEvent) {
        match event {
            WidgetEvent::MessageAppended(fragment) => {
                if fragment.role == Role::User && !self.echo_user {
                    return;
                }
                println!("{}", format_fragment(&fragment));
            }
            // the terminal consumed the line already
            WidgetEvent::InputCleared => {}
            WidgetEvent::StateChanged(WidgetState::Sending) => self.show_typing(),
            WidgetEvent::StateChanged(WidgetState::Idle) => {
                self.hide_typing();
                if self.interactive {
                    self.prompt();
                }
            }
        }
    }

    fn show_typing(&mut self) {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message("thinking...");
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
    }

    fn hide_typing(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        self.hide_typing();
    }
}

/// Format one fragment as labelled, indented terminal text
pub fn format_fragment(fragment: &RenderedFragment) -> String {
    let label = match fragment.role {
        Role::User => style("you").cyan().bold(),
        Role::Bot => style("bot").green().bold(),
    };

    let text = sanitize_for_terminal(&fragment.to_plain_text());
    let mut out = String::new();
    for (i, line) in text.lines().enumerate() {
        if i == 0 {
            out.push_str(&format!("{} {}", label, line));
        } else {
            out.push_str(&format!("\n    {}", line));
        }
    }
    if out.is_empty() {
        out = label.to_string();
    }
    out
}

/// Drop escape sequences and control characters other than newlines.
///
/// Message text comes from the service and must not drive the terminal.
fn sanitize_for_terminal(text: &str) -> String {
    console::strip_ansi_codes(text)
        .chars()
        .filter(|c| *c == '\n' || !c.is_control())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_widget_core::{MessageRenderer, Source};

    fn plain(s: &str) -> String {
        console::strip_ansi_codes(s).to_string()
    }

    #[test]
    fn test_format_bot_with_sources() {
        let fragment = MessageRenderer::default().render(
            Role::Bot,
            "Line one\nLine <two>",
            &[Source::new("Rules", "https://e.org/r"), Source::default()],
        );

        assert_eq!(
            plain(&format_fragment(&fragment)),
            "bot Line one\n    Line <two>\n    Sources:\n    - Rules <https://e.org/r>\n    - Unknown Source"
        );
    }

    #[test]
    fn test_format_user() {
        let fragment = MessageRenderer::default().render(Role::User, "hi & bye", &[]);
        assert_eq!(plain(&format_fragment(&fragment)), "you hi & bye");
    }

    #[test]
    fn test_format_empty_text() {
        let fragment = MessageRenderer::default().render(Role::Bot, "", &[]);
        assert_eq!(plain(&format_fragment(&fragment)), "bot");
    }

    #[test]
    fn test_control_sequences_are_not_printed() {
        let fragment = MessageRenderer::default().render(
            Role::Bot,
            "\u{1b}[2J\u{1b}]0;pwned\u{7}hi\rthere\u{8}\nnext",
            &[Source::new("\u{1b}[31mred", "https://e.org")],
        );

        let out = format_fragment(&fragment);
        let body = out.trim_start_matches(|c: char| c != ' ');
        assert!(!body.chars().any(|c| c != '\n' && c.is_control()));
        assert!(body.contains("hithere"));
        assert!(body.contains("\n    next"));
        assert!(body.contains("- red <https://e.org>"));
    }

    #[test]
    fn test_drain_consumes_events() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut surface = TerminalSurface::new(rx, false);
        tx.send(WidgetEvent::InputCleared).unwrap();
        tx.send(WidgetEvent::StateChanged(WidgetState::Sending)).unwrap();
        tx.send(WidgetEvent::StateChanged(WidgetState::Idle)).unwrap();

        surface.drain();
        assert!(surface.spinner.is_none());
        assert!(surface.events.try_recv().is_err());
    }
}
