use thiserror::Error;

/// everything that can go wrong while talking to a volume
#[derive(Error, Debug)]
pub enum FsError {
    #[error("no volume is mounted")]
    NotMounted,

    #[error("a volume is already mounted")]
    AlreadyMounted,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("resource busy: {0}")]
    ResourceBusy(String),

    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("device failure: {0}")]
    Device(#[from] std::io::Error),

    #[error("invalid volume: {0}")]
    InvalidVolume(String),

    #[error("corrupted allocation table: {0}")]
    Corrupted(String),

    #[error("metadata encoding failed: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("metadata decoding failed: {0}")]
    Decode(#[from] bincode::error::DecodeError),
}

pub type Result<T> = std::result::Result<T, FsError>;
