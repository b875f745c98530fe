//! Cancellation utilities
//!
//! Callers hand a [`CancellationToken`] to a transmutation through
//! `TransmuteOptions::cancel`. These helpers race vendor futures and streams
//! against that token so an abandoned call drops its HTTP connection.

use futures::StreamExt;
use std::future::Future;
use tokio_util::sync::CancellationToken;

use crate::error::AlchemyError;
use crate::types::TextStream;

/// Await `future`, failing with [`AlchemyError::Cancelled`] as soon as `token` fires.
///
/// Without a token the future runs to completion. An already-cancelled token
/// fails before the future is polled.
pub async fn with_cancellation<F, T>(
    token: Option<&CancellationToken>,
    future: F,
) -> Result<T, AlchemyError>
where
    F: Future<Output = Result<T, AlchemyError>>,
{
    let Some(token) = token else {
        return future.await;
    };
    if token.is_cancelled() {
        return Err(AlchemyError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = token.cancelled() => {
            tracing::debug!(target: "alchemy::cancel", "call cancelled");
            Err(AlchemyError::Cancelled)
        }
        res = future => res,
    }
}

/// Wrap a text stream so that cancelling `token` ends it.
///
/// Chunks already yielded stay delivered; after cancellation the stream yields
/// a single `Err(Cancelled)` and then terminates, dropping the inner stream.
pub fn cancellable_stream(stream: TextStream, token: Option<CancellationToken>) -> TextStream {
    let Some(token) = token else {
        return stream;
    };
    let mut inner = stream;
    let s = async_stream::stream! {
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracing::debug!(target: "alchemy::cancel", "stream cancelled");
                    yield Err(AlchemyError::Cancelled);
                    break;
                }
                item = inner.next() => {
                    let Some(item) = item else { break };
                    yield item;
                }
            }
        }
    };
    Box::pin(s)
}
