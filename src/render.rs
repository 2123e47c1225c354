//! Rendering sinks.
//!
//! The client never touches the terminal directly. Every visible effect goes
//! through a [`RenderSink`]: chat log entries, alerts, the identity banner
//! and the graph "modal" (a frame source plus a visibility flag).

use std::io::{self, Write};
use std::sync::Mutex;

use crate::session::SessionId;
use crate::types::{ChatMessage, Sender};

/// Destination for everything the client displays.
///
/// Methods take `&self` so overlapping operations can share one sink.
pub trait RenderSink: Send + Sync {
    /// Append an entry to the chat log.
    fn append(&self, message: ChatMessage);

    /// Show or hide the graph modal.
    fn set_modal_visible(&self, visible: bool);

    /// Point the embedded graph frame at a URL.
    fn set_frame_source(&self, url: &str);

    /// Show a blocking notice to the user.
    fn alert(&self, text: &str);

    /// Display the active session identity.
    fn show_identity(&self, id: &SessionId);
}

// ─────────────────────────────────────────────────────────────────────────────
// Terminal
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct TerminalState<W> {
    out: W,
    modal_visible: bool,
    frame_source: Option<String>,
}

/// Line-oriented sink writing to a terminal (or any writer).
#[derive(Debug)]
pub struct TerminalSink<W> {
    state: Mutex<TerminalState<W>>,
}

impl TerminalSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            state: Mutex::new(TerminalState {
                out,
                modal_visible: false,
                frame_source: None,
            }),
        }
    }

    pub fn modal_visible(&self) -> bool {
        self.state.lock().unwrap().modal_visible
    }

    /// Consume the sink, returning the writer.
    pub fn into_inner(self) -> W {
        self.state
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .out
    }

    fn line(&self, text: &str) {
        let mut state = self.state.lock().unwrap();
        // A closed stdout is not worth aborting the session over.
        let _ = writeln!(state.out, "{text}");
        let _ = state.out.flush();
    }
}

impl<W: Write + Send> RenderSink for TerminalSink<W> {
    fn append(&self, message: ChatMessage) {
        let prefix = match message.sender {
            Sender::User => "you",
            Sender::Bot => "bot",
        };
        self.line(&format!("{prefix}> {}", message.text));
    }

    fn set_modal_visible(&self, visible: bool) {
        let mut state = self.state.lock().unwrap();
        let was_visible = state.modal_visible;
        state.modal_visible = visible;

        let notice = match (visible, state.frame_source.as_deref()) {
            (true, Some(src)) => Some(format!("[graph] {src}  (/close to dismiss)")),
            (true, None) => Some("[graph] (no source)".to_string()),
            (false, _) if was_visible => Some("[graph closed]".to_string()),
            (false, _) => None,
        };
        if let Some(notice) = notice {
            let _ = writeln!(state.out, "{notice}");
            let _ = state.out.flush();
        }
    }

    fn set_frame_source(&self, url: &str) {
        self.state.lock().unwrap().frame_source = Some(url.to_string());
    }

    fn alert(&self, text: &str) {
        self.line(&format!("! {text}"));
    }

    fn show_identity(&self, id: &SessionId) {
        self.line(&format!("Logged in as: {id}"));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Recording
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Recorded {
    messages: Vec<ChatMessage>,
    alerts: Vec<String>,
    identities: Vec<String>,
    modal_visible: bool,
    frame_source: Option<String>,
}

/// Sink that keeps everything in memory for later inspection.
#[derive(Debug, Default)]
pub struct RecordingSink {
    inner: Mutex<Recorded>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chat log in append order.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.inner.lock().unwrap().messages.clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.inner.lock().unwrap().alerts.clone()
    }

    pub fn identities(&self) -> Vec<String> {
        self.inner.lock().unwrap().identities.clone()
    }

    pub fn modal_visible(&self) -> bool {
        self.inner.lock().unwrap().modal_visible
    }

    pub fn frame_source(&self) -> Option<String> {
        self.inner.lock().unwrap().frame_source.clone()
    }
}

impl RenderSink for RecordingSink {
    fn append(&self, message: ChatMessage) {
        self.inner.lock().unwrap().messages.push(message);
    }

    fn set_modal_visible(&self, visible: bool) {
        self.inner.lock().unwrap().modal_visible = visible;
    }

    fn set_frame_source(&self, url: &str) {
        self.inner.lock().unwrap().frame_source = Some(url.to_string());
    }

    fn alert(&self, text: &str) {
        self.inner.lock().unwrap().alerts.push(text.to_string());
    }

    fn show_identity(&self, id: &SessionId) {
        self.inner.lock().unwrap().identities.push(id.to_string());
    }
}
