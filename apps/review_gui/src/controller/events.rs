//! UI/backend events and error modeling for the review console.

use std::path::PathBuf;

use review_client::{ClientError, LoadTicket, PendingWrite, PlayerEvent};
use shared::{domain::RecordId, protocol::PageResponse};

pub enum UiEvent {
    Info(String),
    Error(UiError),
    PageLoaded {
        ticket: LoadTicket,
        result: Result<PageResponse, ClientError>,
    },
    WriteFinished {
        write: PendingWrite,
        result: Result<(), ClientError>,
    },
    ExportFinished {
        dest: PathBuf,
        result: Result<u64, ClientError>,
    },
    Player {
        id: RecordId,
        event: PlayerEvent,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Server,
    Audio,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Export,
    Playback,
    General,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_client_error(context: UiErrorContext, err: &ClientError) -> Self {
        let category = match err {
            ClientError::Transport { .. } | ClientError::Unavailable(_) => {
                UiErrorCategory::Transport
            }
            ClientError::Status { .. } => UiErrorCategory::Server,
            ClientError::Decode { .. } | ClientError::InvalidConfig(_) => {
                UiErrorCategory::Validation
            }
            ClientError::Audio(_) => UiErrorCategory::Audio,
            ClientError::Io { .. } => UiErrorCategory::Unknown,
        };
        Self {
            category,
            context,
            message: err.to_string(),
        }
    }

    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_ascii_lowercase();
        let category = if lower.contains("audio")
            || lower.contains("wav")
            || lower.contains("output device")
        {
            UiErrorCategory::Audio
        } else if lower.contains("invalid")
            || lower.contains("missing")
            || lower.contains("malformed")
        {
            UiErrorCategory::Validation
        } else if lower.contains("timeout")
            || lower.contains("connection")
            || lower.contains("network")
            || lower.contains("transport")
            || lower.contains("unavailable")
            || lower.contains("disconnect")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Errors the operator has to see even after the status line moves on.
    pub fn wants_banner(&self) -> bool {
        matches!(
            self.context,
            UiErrorContext::BackendStartup | UiErrorContext::Export | UiErrorContext::Playback
        )
    }
}

pub fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Transport => "Transport",
        UiErrorCategory::Server => "Server",
        UiErrorCategory::Audio => "Audio",
        UiErrorCategory::Validation => "Validation",
        UiErrorCategory::Unknown => "Unexpected",
    }
}
