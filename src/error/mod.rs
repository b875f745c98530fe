//! Error Handling Module
//!
//! Every stage of the pipeline reports failures through [`AlchemyError`].
//! Each variant belongs to exactly one [`ErrorKind`], so callers can either
//! match precise variants or ask "which stage failed".
//!
//! # Example
//!
//! ```rust,ignore
//! use alchemy::error::{AlchemyError, ErrorKind};
//!
//! let error = AlchemyError::transform("imageUrlToBase64", "Failed to fetch image: 404 Not Found");
//! assert_eq!(error.kind(), ErrorKind::Transform);
//! assert_eq!(error.http_status_hint(), 500);
//! ```

mod conversions;
pub mod types;

pub use types::*;
