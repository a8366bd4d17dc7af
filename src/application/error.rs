use std::error::Error as StdError;

use thiserror::Error;

use crate::application::editor::EditorError;
use crate::application::media_picker::MediaPickerError;
use crate::application::post_form::PostSaveError;
use crate::application::repos::RepoError;
use crate::domain::error::{DocumentError, DomainError};
use crate::domain::registry::RenderError;
use crate::infra::error::InfraError;

/// Error together with its chain of causes, for logging and CLI output.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self { source, messages }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error(transparent)]
    MediaPicker(#[from] MediaPickerError),
    #[error(transparent)]
    PostSave(#[from] PostSaveError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    pub fn presentation_message(&self) -> &'static str {
        match self {
            AppError::Domain(DomainError::NotFound { .. }) | AppError::Repo(RepoError::NotFound) => {
                "Resource not found"
            }
            AppError::Domain(DomainError::Validation { .. })
            | AppError::Validation(_)
            | AppError::PostSave(PostSaveError::Invalid(_)) => "Input could not be accepted",
            AppError::Document(_) | AppError::Editor(_) => "Document could not be edited",
            AppError::MediaPicker(_) => "Media library request failed",
            AppError::PostSave(_) => "Failed to save post. Please try again.",
            AppError::Repo(_) => "Content API request failed",
            AppError::Render(_) => "Document could not be rendered",
            AppError::Infra(InfraError::Configuration { .. }) => "Client misconfigured",
            AppError::Infra(InfraError::Telemetry(_)) => "Logging subsystem could not start",
            AppError::Infra(InfraError::Io(_)) => "I/O failure",
            AppError::Infra(InfraError::HttpClient(_)) => "HTTP client could not be built",
            AppError::Domain(DomainError::Invariant { .. }) | AppError::Unexpected(_) => {
                "Unexpected error occurred"
            }
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::from_error("application::error::AppError", self)
    }
}
