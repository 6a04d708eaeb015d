use thiserror::Error;

use crate::ASYN::Structs::Message_Structs::ErrorCode;

pub type AsynResult<T> = Result<T, AsynError>;

/// Recoverable failures of the send/poll API.
///
/// Broken transport contracts (a refused pause, a table that stays full after
/// compaction) are not represented here; those abort the process.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AsynError {
    #[error("kernel refused the async table handoff: {0}")]
    Handoff(ErrorCode),

    #[error("flags {0:#o} are not caller-settable")]
    InvalidFlags(u32),

    #[error("payload too large ({len} > {max})")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("no kernel transport installed for this process")]
    NoTransport,

    #[error("a kernel transport is already installed for this process")]
    AlreadyInstalled,
}

impl AsynError {
    /// Kernel-style status for callers on the C side.
    pub fn code(&self) -> ErrorCode {
        match self {
            AsynError::Handoff(code) => *code,
            AsynError::InvalidFlags(_) | AsynError::PayloadTooLarge { .. } => ErrorCode::EINVAL,
            AsynError::NoTransport => ErrorCode::ENOSYS,
            AsynError::AlreadyInstalled => ErrorCode::EINVAL,
        }
    }
}
