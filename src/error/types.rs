use thiserror::Error;

/// Boxed underlying cause carried by refine failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Pipeline stage a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Vendor/model invocation failed or content could not be mapped.
    Transmute,
    /// Raw model output could not be parsed or validated.
    Refine,
    /// A transform's precondition failed.
    Transform,
    /// Caller-supplied input or configuration string was malformed.
    Validation,
    /// The call was cancelled through its cancellation token.
    Cancelled,
}

/// The common error type for every pipeline failure.
#[derive(Error, Debug)]
pub enum AlchemyError {
    /// Transport-level failure talking to a vendor or remote resource.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The vendor API answered with a non-success status.
    #[error("{provider} API error {status}: {message}")]
    ApiError {
        provider: String,
        status: u16,
        message: String,
    },

    /// The vendor response body could not be decoded.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A streaming response failed after it started.
    #[error("Stream error: {0}")]
    StreamError(String),

    /// A material part has no mapping in the vendor's wire format.
    #[error("{provider} transmuter: unsupported part type '{part_type}'")]
    UnsupportedPartType { provider: String, part_type: String },

    /// The capability is not implemented by this component.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Transmuter configuration is unusable (missing key, bad URL).
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Model output could not be turned into the expected shape.
    #[error("Refine error: {message}")]
    RefineError {
        message: String,
        #[source]
        source: BoxError,
    },

    /// A transform rejected its input.
    #[error("Transform error in {transform}: {message}")]
    TransformError { transform: String, message: String },

    /// A transform could not be built from its configuration string.
    #[error("Invalid transform '{spec}': {message}")]
    InvalidTransform { spec: String, message: String },

    /// Malformed caller input (wire materials, template variables).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The call was cancelled before it completed.
    #[error("Operation cancelled")]
    Cancelled,
}

impl AlchemyError {
    pub fn transform(transform: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransformError {
            transform: transform.into(),
            message: message.into(),
        }
    }

    pub fn refine(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::RefineError {
            message: message.into(),
            source: source.into(),
        }
    }

    pub fn api_error(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    pub fn unsupported_part(provider: impl Into<String>, part_type: impl Into<String>) -> Self {
        Self::UnsupportedPartType {
            provider: provider.into(),
            part_type: part_type.into(),
        }
    }

    /// Error returned when a transmuter has no streaming implementation.
    pub fn streaming_unsupported(transmuter: &str) -> Self {
        Self::UnsupportedOperation(format!("{transmuter} does not support streaming"))
    }

    /// The pipeline stage this error belongs to.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::HttpError(_)
            | Self::ApiError { .. }
            | Self::ParseError(_)
            | Self::StreamError(_)
            | Self::UnsupportedPartType { .. }
            | Self::UnsupportedOperation(_)
            | Self::ConfigurationError(_) => ErrorKind::Transmute,
            Self::RefineError { .. } => ErrorKind::Refine,
            Self::TransformError { .. } | Self::InvalidTransform { .. } => ErrorKind::Transform,
            Self::InvalidInput(_) => ErrorKind::Validation,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// True for the "transmuter has no `stream`" failure.
    pub fn is_streaming_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedOperation(msg) if msg.ends_with("does not support streaming"))
    }

    /// Vendor status code, when the vendor answered at all.
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the caller's input, not the pipeline, is at fault.
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::InvalidTransform { .. })
    }

    /// Status an HTTP boundary should answer with: 400 for malformed input,
    /// 500 for pipeline and vendor failures.
    pub const fn http_status_hint(&self) -> u16 {
        if self.is_validation() { 400 } else { 500 }
    }
}

/// A JSON value did not match its declared schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Schema validation failed: {}", .violations.join("; "))]
pub struct SchemaViolation {
    pub violations: Vec<String>,
}
