//! Utility modules
//!
//! Cancellation, vendor HTTP error handling and SSE streaming shared by the
//! transmuters.

pub mod cancel;
pub mod http;
pub mod streaming;

pub use cancel::{cancellable_stream, with_cancellation};
pub use streaming::{SseEventConverter, StreamFactory};
