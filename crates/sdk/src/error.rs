//! SDK Error Types

use reqwest::StatusCode;
use squonk2_core::DomainError;
use std::path::PathBuf;
use thiserror::Error;

/// SDK Result type
pub type Result<T> = std::result::Result<T, ApiError>;

/// Broad classification of an [`ApiError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The client has no API URL (no network call was made)
    Configuration,
    /// Connection failure, timeout or other transport problem (no response)
    Transport,
    /// A response arrived with a status code outside the expected set
    UnexpectedStatus,
    /// A well-formed response says the resource or operation is unavailable
    Domain,
    /// Missing or malformed caller-supplied arguments
    Contract,
    /// Local file or payload handling
    Local,
}

/// Error returned by every Data Manager and Account Server call
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No API URL defined")]
    NoApiUrl,

    #[error("{label} (transport error: {source})")]
    Transport {
        label: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{label} (status={status})")]
    UnexpectedStatus {
        label: String,
        status: StatusCode,
        body: String,
    },

    #[error("No Job operator installed")]
    NoOperatorInstalled,

    #[error("Failed getting Job operator version ({0})")]
    OperatorLookupFailed(Box<ApiError>),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No such file ({})", .0.display())]
    NoSuchFile(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected response payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::NoApiUrl => ErrorKind::Configuration,
            ApiError::Transport { .. } => ErrorKind::Transport,
            ApiError::UnexpectedStatus { .. } => ErrorKind::UnexpectedStatus,
            ApiError::NoOperatorInstalled | ApiError::OperatorLookupFailed(_) => {
                ErrorKind::Domain
            }
            ApiError::Domain(DomainError::Validation(_)) => ErrorKind::Contract,
            ApiError::Domain(_) => ErrorKind::Domain,
            ApiError::InvalidArgument(_) => ErrorKind::Contract,
            ApiError::NoSuchFile(_) | ApiError::Io(_) | ApiError::Decode(_) => ErrorKind::Local,
        }
    }

    /// Status code of the response that caused the error, if there was one
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::UnexpectedStatus { status, .. } => Some(*status),
            ApiError::OperatorLookupFailed(inner) => inner.status(),
            _ => None,
        }
    }

    /// Body of the response that caused the error, if there was one
    pub fn body(&self) -> Option<&str> {
        match self {
            ApiError::UnexpectedStatus { body, .. } => Some(body),
            ApiError::OperatorLookupFailed(inner) => inner.body(),
            _ => None,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        ApiError::InvalidArgument(message.into())
    }
}

/// Reject an empty (or blank) required argument
pub(crate) fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ApiError::invalid(format!("{} cannot be empty", field)));
    }
    Ok(())
}

/// Project paths are absolute, i.e. `/` or `/work`
pub(crate) fn require_project_path(project_path: &str) -> Result<()> {
    if !project_path.starts_with('/') {
        return Err(ApiError::invalid(format!(
            "project path '{}' must start with '/'",
            project_path
        )));
    }
    Ok(())
}

/// Identity provider (Keycloak) errors
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Failed to get response from Keycloak: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Failed to get token (status={status}): {body}")]
    Rejected { status: StatusCode, body: String },

    #[error("Keycloak response has no access_token")]
    MissingToken,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Environments file errors
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("Failed to load environments file {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: config::ConfigError,
    },

    #[error("No environment named '{0}'")]
    UnknownEnvironment(String),

    #[error("No environment named and the environments file has no default")]
    NoDefault,

    #[error("Environment '{environment}' has no '{setting}'")]
    MissingSetting {
        environment: String,
        setting: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(ApiError::NoApiUrl.kind(), ErrorKind::Configuration);
        assert_eq!(ApiError::NoOperatorInstalled.kind(), ErrorKind::Domain);
        assert_eq!(ApiError::invalid("project_id").kind(), ErrorKind::Contract);
        assert_eq!(
            ApiError::Domain(DomainError::UnsupportedScope("asset-x".into())).kind(),
            ErrorKind::Domain
        );
        assert_eq!(
            ApiError::NoSuchFile(PathBuf::from("missing.smi")).kind(),
            ErrorKind::Local
        );
    }

    #[test]
    fn test_unexpected_status_carries_label() {
        let err = ApiError::UnexpectedStatus {
            label: "Failed creating project".to_string(),
            status: StatusCode::FORBIDDEN,
            body: "{\"error\": \"nope\"}".to_string(),
        };

        assert_eq!(err.to_string(), "Failed creating project (status=403 Forbidden)");
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
        assert_eq!(err.body(), Some("{\"error\": \"nope\"}"));
    }

    #[test]
    fn test_operator_lookup_wraps_response() {
        let err = ApiError::OperatorLookupFailed(Box::new(ApiError::UnexpectedStatus {
            label: "Failed getting Job application info".to_string(),
            status: StatusCode::NOT_FOUND,
            body: String::new(),
        }));

        assert!(err.to_string().starts_with("Failed getting Job operator version"));
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(err.kind(), ErrorKind::Domain);
    }

    #[test]
    fn test_argument_checks() {
        assert!(require("project_id", "project-1").is_ok());
        assert!(matches!(
            require("project_id", "  "),
            Err(ApiError::InvalidArgument(_))
        ));
        assert!(require_project_path("/work").is_ok());
        assert!(require_project_path("work").is_err());
        assert!(require_project_path("").is_err());
    }

    #[test]
    fn test_no_api_url_message() {
        assert_eq!(ApiError::NoApiUrl.to_string(), "No API URL defined");
    }
}
