//! Error types for the exporter.

use http::StatusCode;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Failures talking to the Asana API.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid request URI: {0}")]
    Uri(#[from] http::uri::InvalidUri),

    #[error("could not build request: {0}")]
    Request(#[from] http::Error),

    #[error("request failed: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    #[error("could not read response body: {0}")]
    Body(#[from] hyper::Error),

    #[error("Asana returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("unexpected response payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("access token is not a valid header value")]
    InvalidToken,
}

#[derive(Deserialize)]
struct ErrorBody {
    errors: Vec<ErrorEntry>,
}

#[derive(Deserialize)]
struct ErrorEntry {
    message: String,
}

impl ApiError {
    /// Builds a status error, preferring Asana's `errors[].message` over the raw body.
    pub fn from_status(status: StatusCode, body: &[u8]) -> Self {
        let message = match serde_json::from_slice::<ErrorBody>(body) {
            Ok(parsed) if !parsed.errors.is_empty() => parsed
                .errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; "),
            _ => String::from_utf8_lossy(body).trim().to_string(),
        };
        ApiError::Status { status, message }
    }
}

/// Everything that aborts an export run.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Please specify {0}")]
    MissingArgument(&'static str),

    #[error("Cannot open {} for writing: {source}", .path.display())]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Workspace '{0}' not found")]
    WorkspaceNotFound(String),

    #[error("Project '{project}' not found in workspace '{workspace}'")]
    ProjectNotFound { workspace: String, project: String },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("failed writing report: {0}")]
    Write(#[from] std::io::Error),

    #[error("failed writing CSV: {0}")]
    Csv(#[from] csv::Error),
}
