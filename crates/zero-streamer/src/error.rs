use crate::watermark::Watermark;

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("subscriber requested watermark {requested} but earliest retained is {earliest}")]
    WatermarkTooOld {
        earliest: Watermark,
        requested: Watermark,
    },
    #[error("replica version does not match the server's")]
    WrongReplicaVersion,
    #[error("auto reset required: {0}")]
    AutoResetSignal(String),
    #[error("ownership of the replication slot was lost to another process")]
    OwnershipLost,
    #[error("stream aborted")]
    AbortError,
}
