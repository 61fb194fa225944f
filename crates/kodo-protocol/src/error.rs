use thiserror::Error;

/// Errors produced while encoding or decoding wire data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unexpected end of payload: wanted {wanted} more bytes, {remaining} left")]
    UnexpectedEof { wanted: usize, remaining: usize },

    #[error("frame declares a size of {0}, below the opcode width")]
    BadFrameSize(u16),

    #[error("frame payload of {0} bytes does not fit the size field")]
    FrameTooLarge(usize),

    #[error("client build {0} has no opcode table")]
    UnsupportedBuild(u32),

    #[error("unknown update block type {0}")]
    UnknownUpdateType(u8),

    #[error("field count {0} in a values block is implausible")]
    BadFieldCount(usize),

    #[error("string length {0} is implausible")]
    BadStringLength(u32),

    #[error("session key must be {expected} bytes, got {actual}")]
    BadSessionKey { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
