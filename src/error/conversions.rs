//! Type Conversions for AlchemyError
//!
//! From implementations for the foreign error types the pipeline touches.

use super::types::AlchemyError;

impl From<reqwest::Error> for AlchemyError {
    fn from(err: reqwest::Error) -> Self {
        Self::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for AlchemyError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: AlchemyError = json_err.into();
        assert!(matches!(err, AlchemyError::ParseError(_)));
    }
}
