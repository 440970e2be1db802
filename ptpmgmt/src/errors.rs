//! The errors that the codec and dispatcher can report

use thiserror::Error;

use crate::types::PTPText;

/// Failures produced while building or parsing a PTP management message
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum ManagementError {
    #[error("buffer too small to read or write the requested field")]
    ShortBuffer,

    #[error("invalid PTP header: {0}")]
    InvalidHeader(&'static str),

    #[error("management id {0:#06x} is unknown or not valid for the active profile")]
    UnknownManagementId(u16),

    #[error("action field does not match what the management id allows")]
    ActionMismatch,

    #[error("TLV length field contradicts the declared body layout")]
    LengthMismatch,

    #[error("field value is out of the range the protocol allows")]
    ValueOutOfRange,

    #[error("peer reported a management error: {error_id:#06x} {display_data:?}")]
    ManagementErrorStatus {
        /// managementErrorId reported by the peer
        error_id: u16,
        /// the managementId the error refers to
        management_id: u16,
        /// human readable text attached to the error
        display_data: PTPText,
    },

    #[error("feature not supported by the active profile or build")]
    Unsupported,

    #[error("authentication TLV ICV mismatch")]
    AuthFailed,

    #[error("signaling TLV declared length exceeds the remaining message bytes")]
    FramingError,
}

/// Convenience alias used throughout the crate
pub type Result<T> = core::result::Result<T, ManagementError>;
