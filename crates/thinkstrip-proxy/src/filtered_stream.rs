//! Streaming response bodies passed through the think-tag filter.
//!
//! A pump task pulls upstream chunks, filters them and hands the output to
//! the client body over a bounded channel. The channel gives backpressure:
//! the pump only reads from upstream as fast as the client drains the body.
//!
//! Cancellation has one control point, the per-request
//! [`CancellationToken`]. The client body owns a drop guard for it, so when
//! hyper drops the body (client gone) the pump wakes up, stops reading and
//! drops the upstream response, which releases the connection.

use std::fmt::Display;

use axum::body::Body;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use thinkstrip_core::{ThinkTagFilter, Utf8ChunkDecoder};

type BodyItem = Result<Bytes, std::io::Error>;

/// Chunks of filtered output allowed in flight between pump and client.
const CHANNEL_CAPACITY: usize = 1;

/// How a pump run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpOutcome {
    /// Upstream finished; the flushed tail was delivered.
    Completed,
    /// Client went away or the server is shutting down; nothing was flushed.
    Cancelled,
    /// Upstream failed mid-stream; the flushed tail was delivered and the
    /// body was terminated with an error.
    UpstreamFailed,
}

/// Build a client body that streams `upstream` through a fresh filter.
///
/// Spawns the pump task. Dropping the returned body cancels `cancel`.
pub fn filtered_body<S, E>(upstream: S, cancel: CancellationToken) -> Body
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let guard = cancel.clone().drop_guard();

    tokio::spawn(async move {
        match pump(upstream, tx, cancel).await {
            PumpOutcome::Completed => debug!("Filtered stream completed"),
            PumpOutcome::Cancelled => info!("Client disconnected, stopped streaming"),
            PumpOutcome::UpstreamFailed => warn!("Filtered stream ended by upstream error"),
        }
    });

    let body_stream = futures_util::stream::unfold((rx, guard), |(mut rx, guard)| async move {
        rx.recv().await.map(|item| (item, (rx, guard)))
    });
    Body::from_stream(body_stream)
}

/// Move `upstream` through a [`ThinkTagFilter`] into `tx` until upstream
/// ends, fails, or `cancel` fires.
///
/// A closed receiver counts as cancellation. Once cancelled, no further
/// output is produced and the filter is not flushed.
pub async fn pump<S, E>(
    upstream: S,
    tx: mpsc::Sender<BodyItem>,
    cancel: CancellationToken,
) -> PumpOutcome
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    let mut upstream = std::pin::pin!(upstream);
    let mut decoder = Utf8ChunkDecoder::new();
    let mut filter = ThinkTagFilter::new();

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return PumpOutcome::Cancelled,
            next = upstream.next() => next,
        };

        match next {
            Some(Ok(chunk)) => {
                trace!(bytes = chunk.len(), "Received upstream chunk");
                let text = decoder.decode(&chunk);
                let output = filter.process_chunk(&text);
                if !emit(&tx, &cancel, output).await {
                    return PumpOutcome::Cancelled;
                }
            }
            Some(Err(e)) => {
                warn!("Upstream stream error: {e}");
                if !emit(&tx, &cancel, finish(&mut decoder, &mut filter)).await {
                    return PumpOutcome::Cancelled;
                }
                let err = std::io::Error::other(format!("upstream stream failed: {e}"));
                // Receiver may already be gone; the outcome is the same.
                let _ = tx.send(Err(err)).await;
                return PumpOutcome::UpstreamFailed;
            }
            None => {
                let tail = finish(&mut decoder, &mut filter);
                if !tail.is_empty() {
                    debug!(bytes = tail.len(), "Flushing filtered tail");
                }
                if !emit(&tx, &cancel, tail).await {
                    return PumpOutcome::Cancelled;
                }
                return PumpOutcome::Completed;
            }
        }
    }
}

/// Drain the decoder and the filter at the end of the upstream body.
fn finish(decoder: &mut Utf8ChunkDecoder, filter: &mut ThinkTagFilter) -> String {
    let mut tail = filter.process_chunk(&decoder.finish());
    tail.push_str(&filter.flush());
    tail
}

/// Send non-empty output to the client. Returns `false` if the client is
/// gone or the request was cancelled.
async fn emit(tx: &mpsc::Sender<BodyItem>, cancel: &CancellationToken, output: String) -> bool {
    if output.is_empty() {
        return true;
    }
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        sent = tx.send(Ok(Bytes::from(output))) => sent.is_ok(),
    }
}
