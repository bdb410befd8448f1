use thiserror::Error;

/// Errors raised while decoding a persisted wire grid
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("not a wire grid (bad magic)")]
    BadMagic,

    #[error("unsupported wire grid version {0}")]
    UnsupportedVersion(u8),

    #[error("chunk size mismatch: expected {expected}, found {found}")]
    ChunkSizeMismatch { expected: usize, found: usize },

    #[error("wire grid data truncated")]
    Truncated,

    #[error("chunk ({x}, {y}) lies outside the addressable grid")]
    ChunkOutOfRange { x: u32, y: u32 },

    #[error("chunk ({x}, {y}) decoded to {found} bytes, expected {expected}")]
    ChunkLength {
        x: u32,
        y: u32,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
