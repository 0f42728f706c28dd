use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::intake::RepositoryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;
use std::net::SocketAddr;

/// Failures that stop the service or a CLI command before any intake work happens.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    Serve(std::io::Error),
    Store(RepositoryError),
}

impl AppError {
    /// Stable machine-readable tag for logs and JSON bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config_invalid",
            AppError::Telemetry(_) => "telemetry_failed",
            AppError::Bind { .. } => "bind_failed",
            AppError::Serve(_) => "serve_failed",
            AppError::Store(RepositoryError::NotFound) => "lead_not_found",
            AppError::Store(RepositoryError::Conflict) => "lead_conflict",
            AppError::Store(_) => "lead_store_unavailable",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Store(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Store(RepositoryError::Conflict) => StatusCode::CONFLICT,
            AppError::Store(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Telemetry(_) | AppError::Bind { .. } | AppError::Serve(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// sysexits-style process status for the binary.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) | AppError::Telemetry(_) => 78,
            AppError::Bind { .. } => 69,
            AppError::Serve(_) => 74,
            AppError::Store(_) => 70,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "invalid intake configuration: {err}"),
            AppError::Telemetry(err) => write!(f, "could not start logging: {err}"),
            AppError::Bind { addr, source } => {
                write!(f, "could not listen on {addr}: {source}")
            }
            AppError::Serve(err) => write!(f, "intake server stopped: {err}"),
            AppError::Store(err) => write!(f, "lead store error: {err}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Bind { source, .. } => Some(source),
            AppError::Serve(err) => Some(err),
            AppError::Store(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string(), "code": self.code() }));
        (self.status(), body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<RepositoryError> for AppError {
    fn from(value: RepositoryError) -> Self {
        Self::Store(value)
    }
}
