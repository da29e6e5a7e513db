use thiserror::Error;

/// Errors surfaced by the page, WAL, pager, and B-tree layers.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("unexpected end of file")]
    UnexpectedEndOfFile,

    #[error("bad WAL header")]
    BadHeader,

    #[error("WAL record checksum mismatch at offset {offset}")]
    BadChecksum { offset: u64 },

    #[error("invalid WAL op byte {op}")]
    InvalidWalOp { op: u8 },

    #[error("page out of space")]
    OutOfSpace,

    #[error("value too large ({len} bytes, max 65535)")]
    ValueTooLarge { len: usize },

    #[error("slot index {slot} out of bounds ({num_records} records)")]
    OutOfBounds { slot: u16, num_records: u16 },
}

pub type Result<T> = std::result::Result<T, Error>;
