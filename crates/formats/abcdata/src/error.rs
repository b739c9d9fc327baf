use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("variable-length integer exceeds 35 bits at offset {offset:#x}")]
    IntegerOverflow { offset: usize },

    #[error("string length {len} exceeds the 1,000,000-byte limit")]
    StringTooLong { len: usize },

    #[error("{context}: count {count} exceeds the safety bound (corrupt file?)")]
    OversizedCount { context: &'static str, count: u32 },

    #[error("unknown multiname kind {kind:#04x}")]
    UnknownMultinameKind { kind: u8 },

    #[error("unknown trait kind {kind}")]
    UnknownTraitKind { kind: u8 },
}

pub type Result<T> = std::result::Result<T, Error>;
