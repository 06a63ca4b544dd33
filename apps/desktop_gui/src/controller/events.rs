//! UI/backend events and error modeling for the desktop GUI controller.

use client_core::{WorkflowError, WorkflowSnapshot};

pub enum UiEvent {
    /// The workflow moved; carries the full snapshot to render from.
    StateChanged(WorkflowSnapshot),
    Info(String),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Validation,
    Server,
    Transport,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Upload,
    Merge,
    Download,
    General,
}

/// An error ready to show the user. The message is exactly what the toast
/// displays, so validation and server messages pass through verbatim.
#[derive(Debug, Clone)]
pub struct UiError {
    pub category: UiErrorCategory,
    pub context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_workflow(context: UiErrorContext, err: &WorkflowError) -> Self {
        let category = match err {
            WorkflowError::InsufficientFiles { .. }
            | WorkflowError::TooManyFiles { .. }
            | WorkflowError::InvalidType { .. }
            | WorkflowError::FileTooLarge { .. }
            | WorkflowError::EmptyFile { .. } => UiErrorCategory::Validation,
            WorkflowError::Server(_) => UiErrorCategory::Server,
            WorkflowError::Transport(_) | WorkflowError::InvalidServerUrl(_) => {
                UiErrorCategory::Transport
            }
            WorkflowError::Internal(_) => UiErrorCategory::Unknown,
        };
        Self {
            category,
            context,
            message: err.to_string(),
        }
    }

    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        Self {
            category: UiErrorCategory::Unknown,
            context,
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
