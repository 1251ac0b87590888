use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("ingredients is required")]
    EmptyIngredients,
    #[error("{0}")]
    InvalidInput(String),
    #[error("CLAUDE_API_KEY is not set")]
    Misconfigured,
    #[error("Completion service unreachable: {0}")]
    Transport(String),
    #[error("Anthropic API request failed with status {status}")]
    Upstream { status: u16, detail: String },
    #[error("Unexpected completion service response: {0}")]
    Envelope(String),
    #[error("Recipe response was not valid JSON: {message}")]
    StructuredParse { message: String, raw_text: String },
}

impl RecipeError {
    /// Machine-readable kind, stable across message wording changes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyIngredients | Self::InvalidInput(_) => "invalid_input",
            Self::Misconfigured => "misconfigured",
            Self::Transport(_) => "transport_error",
            Self::Upstream { .. } => "upstream_error",
            Self::Envelope(_) => "envelope_error",
            Self::StructuredParse { .. } => "structured_parse_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::EmptyIngredients | Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the fallback recipe may stand in for this failure.
    pub fn is_substitutable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Upstream { .. } | Self::Envelope(_) | Self::StructuredParse { .. }
        )
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(rename = "rawText", skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, kind: &'static str) -> Self {
        Self { error: error.into(), kind, status: None, details: None, raw_text: None }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl From<&RecipeError> for ErrorBody {
    fn from(err: &RecipeError) -> Self {
        let kind = err.kind();
        match err {
            RecipeError::EmptyIngredients | RecipeError::InvalidInput(_) | RecipeError::Misconfigured => {
                ErrorBody::new(err.to_string(), kind)
            }
            RecipeError::Transport(msg) => ErrorBody::new("Completion service unreachable", kind).with_details(msg.clone()),
            RecipeError::Upstream { status, detail } => ErrorBody {
                status: Some(*status),
                ..ErrorBody::new("Anthropic API request failed", kind).with_details(detail.clone())
            },
            RecipeError::Envelope(msg) => {
                ErrorBody::new("Unexpected completion service response", kind).with_details(msg.clone())
            }
            RecipeError::StructuredParse { message, raw_text } => ErrorBody {
                raw_text: Some(raw_text.clone()),
                ..ErrorBody::new("Recipe response was not valid JSON", kind).with_details(message.clone())
            },
        }
    }
}

impl IntoResponse for RecipeError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ErrorBody::from(&self))).into_response()
    }
}
