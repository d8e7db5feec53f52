//! Error types for irida-api

use irida_model::{IridaResourceError, ModelValidationError, RunStatus};
use thiserror::Error;

/// Errors that can occur talking to IRIDA
#[derive(Error, Debug)]
pub enum ApiError {
    /// A remote resource is missing, could not be created, or refused a
    /// state change
    #[error(transparent)]
    Resource(#[from] IridaResourceError),

    /// Could not reach the server
    #[error("Connection to IRIDA failed: {0}")]
    Connection(String),

    /// OAuth token request rejected
    #[error("Authentication with IRIDA failed: {0}")]
    Authentication(String),

    /// Unexpected HTTP status
    #[error("IRIDA returned HTTP {status} for {url}")]
    Http { status: u16, url: String },

    /// Response body could not be (de)serialized
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Reading a sequence file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Illegal run lifecycle transition
    #[error("Invalid run status transition: {from} -> {to}")]
    InvalidTransition { from: RunStatus, to: RunStatus },

    /// The upload failed and marking the run as errored failed too
    #[error("{original}; setting run status to ERROR also failed: {status_error}")]
    StatusUpdateFailed {
        #[source]
        original: Box<ApiError>,
        status_error: Box<ApiError>,
    },
}

impl ApiError {
    /// Collapse into the resource-error family, keeping resource errors as is.
    pub fn into_resource_error(self) -> IridaResourceError {
        match self {
            ApiError::Resource(err) => err,
            other => IridaResourceError::new(other.to_string()),
        }
    }

    pub fn is_resource(&self) -> bool {
        matches!(self, ApiError::Resource(_))
    }
}

impl From<ModelValidationError> for ApiError {
    fn from(err: ModelValidationError) -> Self {
        ApiError::Resource(err.into())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        match (err.status(), err.url()) {
            (Some(status), Some(url)) => ApiError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            },
            _ if err.is_decode() => ApiError::Connection(format!("invalid response body: {err}")),
            _ => ApiError::Connection(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_error_becomes_resource_error() {
        let err: ApiError = ModelValidationError::new("bad project", None).into();
        assert!(err.is_resource());
        assert!(err.to_string().contains("bad project"));
    }

    #[test]
    fn test_into_resource_error() {
        let err = ApiError::Connection("refused".to_string());
        let res = err.into_resource_error();
        assert!(res.message.contains("refused"));

        let err = ApiError::Resource(IridaResourceError::for_resource("gone", "6"));
        let res = err.into_resource_error();
        assert_eq!(res.resource.as_deref(), Some("6"));
    }

    #[test]
    fn test_status_update_failed_mentions_both() {
        let err = ApiError::StatusUpdateFailed {
            original: Box::new(ApiError::Resource(IridaResourceError::new("Boom"))),
            status_error: Box::new(ApiError::Connection("down".to_string())),
        };
        let msg = err.to_string();
        assert!(msg.contains("Boom"));
        assert!(msg.contains("down"));
    }
}
