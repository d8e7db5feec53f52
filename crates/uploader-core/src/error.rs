//! Error taxonomy for the uploader core.

use irida_api::ApiError;
use sheet_parsers::SheetError;

/// Errors that stop a run from being processed.
///
/// Validation problems are not errors here: they are reported as data in
/// [`RunOutcome::Invalid`](crate::RunOutcome::Invalid).
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("sample sheet: {0}")]
    Sheet(#[from] SheetError),

    #[error("IRIDA: {0}")]
    Api(#[from] ApiError),
}

/// Result type for uploader core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// The upload-time API error, when that is what went wrong.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            CoreError::Api(err) => Some(err),
            CoreError::Sheet(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use irida_model::IridaResourceError;

    #[test]
    fn test_core_error_display() {
        let err = CoreError::from(SheetError::NoSamples);
        assert!(err.to_string().starts_with("sample sheet:"));
        assert!(err.api_error().is_none());

        let err = CoreError::from(ApiError::from(IridaResourceError::new("Boom")));
        assert!(err.to_string().contains("Boom"));
        assert!(err.api_error().unwrap().is_resource());
    }
}
