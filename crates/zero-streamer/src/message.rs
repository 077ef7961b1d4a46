//! The wire shape of a single downstream record: a 2- or 3-tuple
//! `[kind, payload, meta?]` per §6. Modeled here as one closed enum rather
//! than a tagged tuple since every variant's payload shape is fixed.

use crate::watermark::Watermark;
use zero_core::{Row, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeTag {
    Insert,
    Update,
    Delete,
    Truncate,
}

#[derive(Clone, Debug)]
pub struct ChangeRecord {
    pub tag: ChangeTag,
    pub relation: String,
    pub new: Option<Row>,
    pub old: Option<Row>,
    pub key: Option<Vec<Value>>,
}

#[derive(Clone, Debug)]
pub enum ControlMessage {
    ResetRequired,
}

#[derive(Clone, Debug)]
pub enum StreamMessage {
    Status { watermark: Watermark },
    Begin { commit_watermark: Watermark },
    Data(ChangeRecord),
    Commit { watermark: Watermark },
    Rollback,
    Control(ControlMessage),
    Error(String),
}
