//! `ChangeSource`: the upstream feed a streamer forwards from. Shaped after
//! a poll-style reader (`Ready`/`Pending`/`Finished`) rather than an async
//! trait method, so a source can be driven from a plain loop without
//! pulling in an async-trait crate for one method.

use std::time::Duration;

use crate::error::StreamError;
use crate::message::StreamMessage;
use crate::storer::StorerOutcome;
use crate::streamer::Streamer;
use crate::watermark::Watermark;
use crate::ChangeLogStore;

pub enum SourcePoll {
    Ready(StreamMessage),
    Pending,
    Finished,
}

pub trait ChangeSource: Send {
    /// Begins (or resumes) streaming from `from_watermark`. `startStream`
    /// failures are retried with backoff by the caller (§4.5 "Retry").
    fn start_stream(&mut self, from_watermark: &Watermark) -> Result<(), StreamError>;

    fn poll_message(&mut self) -> SourcePoll;
}

/// Drives a `ChangeSource` into a `Streamer` forever. On a mid-stream
/// failure or a finished stream, restarts from the last fully committed
/// watermark — never from the middle of an in-flight commit, since
/// `start_from` only advances on `StorerOutcome::Ack` (§4.5 "Retry").
pub async fn run_forwarding_loop<C, S>(
    mut source: C,
    streamer: Streamer<S>,
    mut start_from: Watermark,
    retry_backoff: Duration,
) where
    C: ChangeSource,
    S: ChangeLogStore,
{
    loop {
        if let Err(error) = source.start_stream(&start_from) {
            tracing::warn!(%error, "startStream failed, retrying with backoff");
            tokio::time::sleep(retry_backoff).await;
            continue;
        }

        loop {
            match source.poll_message() {
                SourcePoll::Ready(msg) => match streamer.forward(msg) {
                    Ok(StorerOutcome::Ack(watermark)) => start_from = watermark,
                    Ok(_) => {}
                    Err(StreamError::OwnershipLost) | Err(StreamError::AutoResetSignal(_)) => {
                        tracing::error!("streamer shutting down");
                        return;
                    }
                    Err(error) => {
                        tracing::warn!(%error, "dropping message the storer rejected");
                    }
                },
                SourcePoll::Pending => tokio::time::sleep(Duration::from_millis(10)).await,
                SourcePoll::Finished => break,
            }
        }
    }
}
