//! Backend-to-UI events and error modeling for the desktop controller.

use client_core::TransferError;
use shared::{
    domain::OperationId,
    protocol::{IngestResponse, QueryResponse},
};

pub enum UiEvent {
    Info(String),
    Error(UiError),
    IngestCompleted {
        id: OperationId,
        response: IngestResponse,
    },
    QueryCompleted {
        id: OperationId,
        response: QueryResponse,
    },
    OperationFailed {
        id: OperationId,
        error: UiError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    /// The backend answered with a failure status or an unreadable body.
    Server,
    /// The request never reached the backend.
    Transport,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Ingest,
    Query,
    General,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_transfer(context: UiErrorContext, err: &TransferError) -> Self {
        let category = match err {
            TransferError::Status { .. } | TransferError::Decode { .. } => UiErrorCategory::Server,
            TransferError::Request(_) => UiErrorCategory::Transport,
            TransferError::InvalidBaseUrl { .. } => UiErrorCategory::Validation,
        };
        Self {
            category,
            context,
            message: err.to_string(),
        }
    }

    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("invalid")
            || message_lower.contains("missing")
            || message_lower.contains("malformed")
            || message_lower.contains("failed to read")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("timeout")
            || message_lower.contains("connection")
            || message_lower.contains("network")
            || message_lower.contains("unreachable")
            || message_lower.contains("disconnected")
            || message_lower.contains("queue is full")
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

    /// Text shown to the user; for backend failures this is the raw response body.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn title(&self) -> &'static str {
        match self.context {
            UiErrorContext::BackendStartup => "Backend worker failed to start",
            UiErrorContext::Ingest => "Upload failed",
            UiErrorContext::Query => "Query failed",
            UiErrorContext::General => match self.category {
                UiErrorCategory::Transport => "Connection problem",
                UiErrorCategory::Validation => "Invalid input",
                UiErrorCategory::Server | UiErrorCategory::Unknown => "Unexpected error",
            },
        }
    }
}
