//! Zero Streamer - the persistent, watermark-ordered change log and the
//! forwarder/storer state machine that feeds it (§4.5): ownership-fenced
//! commits, serving/backup subscriber catchup, and periodic purging.

mod error;
mod log;
mod message;
mod replication;
mod source;
mod storer;
mod streamer;
mod subscriber;
mod watermark;

pub use error::StreamError;
pub use log::{ChangeEntry, ChangeLogEntry, ChangeLogStore, InMemoryChangeLogStore};
pub use message::{ChangeRecord, ChangeTag, ControlMessage, StreamMessage};
pub use replication::ReplicationState;
pub use source::{run_forwarding_loop, ChangeSource, SourcePoll};
pub use storer::{StorerOutcome, TxState};
pub use streamer::Streamer;
pub use subscriber::{SubscriberHandle, SubscriberMode};
pub use watermark::Watermark;
