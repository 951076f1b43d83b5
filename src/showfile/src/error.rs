use std::io;

use crate::format::block::BlockType;

pub type Result<T> = std::result::Result<T, ShowFileError>;

/// ShowFileError enumerates every failure of the container and of the RTH
/// plan codec. None of them is retried internally.
#[derive(Debug, thiserror::Error)]
pub enum ShowFileError {
    #[error("expected Skybrush binary file header")]
    InvalidMagic,

    #[error("unsupported Skybrush binary file version: {0}")]
    UnsupportedVersion(u8),

    #[error("version {version} files cannot carry feature flags {features:#04x}")]
    UnsupportedFeatures { version: u8, features: u8 },

    #[error("CRC error: stored checksum {expected:#010x}, computed {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("unexpected end of input while reading {what}: need {needed} bytes, {available} available")]
    Truncated {
        what: &'static str,
        needed: u64,
        available: u64,
    },

    #[error("block body too large: {0} bytes")]
    BodyTooLarge(usize),

    #[error("negative duration: {0}")]
    NegativeDuration(i64),

    #[error("unknown RTH action: {0}")]
    UnknownAction(String),

    #[error("no scaling factor in 1..=255 can represent every RTH target")]
    NoFeasibleScale,

    #[error("numeric overflow: {0}")]
    NumericOverflow(String),

    #[error("invalid point index {index}, point table has {count} entries")]
    InvalidPointIndex { index: usize, count: usize },

    #[error("invalid scaling factor: {0}")]
    InvalidScale(u8),

    #[error("too many distinct RTH target points: {0}")]
    TooManyPoints(usize),

    #[error("too many RTH plan entries: {0}")]
    TooManyEntries(usize),

    #[error("RTH plan entry at time {current} precedes previous entry at time {previous}")]
    NonMonotonicTime { previous: i64, current: i64 },

    #[error("RTH plan entry at time {time} has no {field}")]
    IncompleteEntry { time: i64, field: &'static str },

    #[error("invalid RTH plan entry flags: {0:#04x}")]
    InvalidFlags(u8),

    #[error("malformed data: {0}")]
    Malformed(String),

    #[error("block type {0:?} has no code in the block type registry")]
    UnregisteredBlockType(BlockType),

    #[error("block type registry maps {0} more than once")]
    DuplicateBlockType(String),

    #[error("comment block is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("show file already finalized")]
    AlreadyFinalized,

    #[error("show file not finalized yet")]
    NotFinalized,

    #[error("show file writer is unusable after a failed write")]
    WriterPoisoned,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ShowFileError {
    pub(crate) fn truncated(what: &'static str, needed: u64, available: u64) -> Self {
        Self::Truncated {
            what,
            needed,
            available,
        }
    }

    pub(crate) fn overflow(what: &str, value: impl std::fmt::Display) -> Self {
        Self::NumericOverflow(format!("{} {} does not fit its field", what, value))
    }
}
