use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unrecognised signature byte {found:?} (expected 'F', 'C' or 'Z')")]
    UnknownSignature { found: u8 },

    #[error("LZMA-compressed files are not supported")]
    UnsupportedLzma,

    #[error("file too short: {len} bytes (header needs 8)")]
    TruncatedHeader { len: usize },

    #[error("body decompression failed: {source}")]
    Decompress {
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: count {count} exceeds what the stream can hold")]
    OversizedCount { context: &'static str, count: usize },

    #[error("{context}: {message}")]
    Parse { context: &'static str, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
