#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for the stager staging runner
//!
//! All diagnostics flow through events - the runner never prints or logs
//! directly. Consumers attach a receiver to render progress, forward
//! buildpack output, or (in tests) assert on emitted warnings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Type alias for event sender
pub type EventSender = tokio::sync::mpsc::UnboundedSender<Event>;

/// Type alias for event receiver
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<Event>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// Which stream of a buildpack script a line of output came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStream {
    Stdout,
    Stderr,
}

/// Core event enum for staging communication
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    // Staging lifecycle
    StagingStarted {
        build_dir: PathBuf,
    },
    StagingCompleted {
        droplet: PathBuf,
    },

    // Detection
    DetectStarted {
        key: String,
    },
    BuildpackSelected {
        key: String,
        detected_name: String,
    },

    // Script phases
    ScriptStarted {
        key: String,
        script: String,
    },
    ScriptOutput {
        stream: LogStream,
        line: String,
    },

    // Diagnostics
    Warning {
        message: String,
        context: Option<String>,
    },
    Error {
        message: String,
        details: Option<String>,
    },
    DebugLog {
        message: String,
    },
}

impl Event {
    /// Create a warning event
    pub fn warning(message: impl Into<String>) -> Self {
        Self::Warning {
            message: message.into(),
            context: None,
        }
    }

    /// Create an error event
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            details: None,
        }
    }

    /// Create a debug log event
    pub fn debug(message: impl Into<String>) -> Self {
        Self::DebugLog {
            message: message.into(),
        }
    }

    /// The human-readable message carried by diagnostic events, if any.
    ///
    /// Lifecycle and script events return `None`; tests use this to scan
    /// the emitted log for expected lines.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Warning { message, .. }
            | Self::Error { message, .. }
            | Self::DebugLog { message } => Some(message),
            _ => None,
        }
    }
}

/// Helper to send events with error handling
pub trait EventSenderExt {
    /// Send an event, ignoring send errors (receiver dropped)
    fn emit(&self, event: Event);
}

impl EventSenderExt for EventSender {
    fn emit(&self, event: Event) {
        // Ignore send errors - if receiver is dropped, we just continue
        let _ = self.send(event);
    }
}

/// Implemented by anything that may carry an event sender.
///
/// The helpers are no-ops when no sender is attached, so callers never
/// branch on whether events are being collected.
pub trait EventEmitter {
    fn event_sender(&self) -> Option<&EventSender>;

    fn emit(&self, event: Event) {
        if let Some(sender) = self.event_sender() {
            sender.emit(event);
        }
    }

    fn emit_warning(&self, message: impl Into<String>) {
        self.emit(Event::warning(message));
    }

    fn emit_error(&self, message: impl Into<String>) {
        self.emit(Event::error(message));
    }

    fn emit_debug(&self, message: impl Into<String>) {
        self.emit(Event::debug(message));
    }
}

impl EventEmitter for Option<EventSender> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.as_ref()
    }
}
