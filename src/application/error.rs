//! Render error surface mapped onto the HTTP contract: 400 for validation,
//! 403 for the gate, 500 for anything that went wrong while typesetting.

use std::error::Error as StdError;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    application::compose::ComposeError,
    domain::error::DomainError,
    infra::{error::InfraError, latex::LatexError},
};

/// Structured diagnostic attached to error responses as a request extension,
/// consumed by the shared logging middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("authorization check failed for `{device_info}`")]
    Unauthorized { device_info: String },
    #[error(transparent)]
    Compose(#[from] ComposeError),
    #[error(transparent)]
    Compiler(#[from] LatexError),
    #[error(transparent)]
    Infra(#[from] InfraError),
}

/// JSON error body. `device_info`/`hint` accompany gate rejections so the
/// operator can derive the correct code; `details` carries the engine
/// diagnostic on compile failures.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    device_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ErrorBody {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            device_info: None,
            hint: None,
            details: None,
        }
    }
}

impl RenderError {
    fn status_code(&self) -> StatusCode {
        match self {
            RenderError::Domain(DomainError::Validation { .. }) => StatusCode::BAD_REQUEST,
            RenderError::Unauthorized { .. } => StatusCode::FORBIDDEN,
            RenderError::Compose(_) | RenderError::Compiler(_) | RenderError::Infra(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            RenderError::Domain(DomainError::Validation { message }) => ErrorBody::new(message),
            RenderError::Unauthorized { device_info } => ErrorBody {
                device_info: Some(device_info.clone()),
                hint: Some(
                    "compute the code yourself: SHA-256 of the device_info string, \
                     uppercase hex, first 12 characters"
                        .to_string(),
                ),
                ..ErrorBody::new("authorization check failed")
            },
            RenderError::Compiler(err) => ErrorBody {
                details: Some(err.to_string()),
                ..ErrorBody::new("failed to compile the prescription document")
            },
            RenderError::Compose(err) => ErrorBody {
                details: Some(err.to_string()),
                ..ErrorBody::new("rendering failed")
            },
            RenderError::Infra(err) => ErrorBody {
                details: Some(err.to_string()),
                ..ErrorBody::new("rendering failed")
            },
        }
    }
}

impl IntoResponse for RenderError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = self.body();
        let report = ErrorReport::from_error("application::error::RenderError", status, &self);
        let mut response = (status, Json(body)).into_response();
        report.attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let err = RenderError::from(DomainError::validation("date is required"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.body().error, "date is required");
    }

    #[test]
    fn unauthorized_discloses_device_info() {
        let err = RenderError::Unauthorized {
            device_info: "alice@ward-8".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        let body = err.body();
        assert_eq!(body.device_info.as_deref(), Some("alice@ward-8"));
        assert!(body.hint.is_some());
    }

    #[test]
    fn compiler_failures_carry_the_engine_diagnostic() {
        let err = RenderError::Compiler(LatexError::Engine {
            exit_code: Some(1),
            log: "! Undefined control sequence.".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let details = err.body().details.expect("details");
        assert!(details.contains("Undefined control sequence"));
    }

    #[test]
    fn report_collects_the_source_chain() {
        let err = RenderError::Compiler(LatexError::MissingOutput);
        let report =
            ErrorReport::from_error("test", StatusCode::INTERNAL_SERVER_ERROR, &err);
        assert!(!report.messages.is_empty());
    }
}
