use thiserror::Error;

/// Top-level application error.
/// Submission errors are recovered by the session and shown as a banner via [`AppError::banner`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    // ── Submission errors ────────────────────────────────────────────────────
    #[error("Field '{field_name}' cannot be empty")]
    EmptyInput { field_name: String },

    #[error("Received an empty response from the AI.")]
    EmptyResponse,

    #[error("{message}")]
    ServiceFailure { message: String },

    #[error("Image generation failed: {message}")]
    ImageGenerationFailed { message: String },

    #[error("A submission is already in progress")]
    Busy,

    // ── Store errors ─────────────────────────────────────────────────────────
    #[error("Message '{id}' not found")]
    MessageNotFound { id: String },

    // ── Configuration errors ─────────────────────────────────────────────────
    #[error("Invalid configuration for {key}: {message}")]
    Config { key: String, message: String },
}

impl AppError {
    pub fn service(message: impl Into<String>) -> Self {
        AppError::ServiceFailure { message: message.into() }
    }

    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Config { key: key.into(), message: message.into() }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::EmptyInput { .. })
    }

    pub fn is_service_failure(&self) -> bool {
        matches!(
            self,
            AppError::ServiceFailure { .. } | AppError::ImageGenerationFailed { .. }
        )
    }

    /// Human-readable text shown next to the input area for a failed submission.
    pub fn banner(&self) -> String {
        match self {
            AppError::EmptyInput { field_name } if field_name == "prompt" => {
                "Please provide a description for the image you want to create.".to_string()
            }
            AppError::EmptyInput { .. } => "Please type a message first.".to_string(),
            AppError::EmptyResponse => self.to_string(),
            AppError::ServiceFailure { message } => format!("Failed to get response. {message}"),
            AppError::ImageGenerationFailed { .. } => {
                "Failed to generate image. Please try again.".to_string()
            }
            AppError::Busy => "Please wait for the current response to finish.".to_string(),
            other => format!("Something went wrong. {other}"),
        }
    }
}
