//! Codec error types

use thiserror::Error;

/// Errors produced by the codec and accessor layers
#[derive(Error, Debug)]
pub enum Error {
    /// Header slice too short or invalid cfg_hdr discriminator
    #[error("malformed header: needed {needed} bytes, got {got} (cfg_hdr {cfg:#04b})")]
    MalformedHeader {
        /// Bytes required for the detected size class
        needed: usize,
        /// Bytes actually available
        got: usize,
        /// The cfg_hdr bits as read from the wire
        cfg: u8,
    },

    /// A block sub-header claims more bytes than remain in the buffer
    #[error("truncated block: claims {claimed} bytes, {remaining} remain")]
    TruncatedBlock {
        /// Bytes the sub-header claims
        claimed: usize,
        /// Bytes left in the payload region
        remaining: usize,
    },

    /// Recomputed checksum disagrees with the embedded value
    #[error("checksum mismatch: expected {expected:#06x}, got {found:#06x}")]
    ChecksumMismatch {
        /// Checksum recomputed over the wire bytes
        expected: u16,
        /// Checksum embedded in the header
        found: u16,
    },

    /// Priority value outside the five defined levels
    #[error("invalid priority: {value} (defined levels are 0-4)")]
    InvalidPriority {
        /// The rejected value
        value: u8,
    },

    /// A field value does not fit the micro wire width
    #[error("field overflow: {field} = {value} exceeds micro-mode max {max}")]
    FieldOverflow {
        /// Field name
        field: &'static str,
        /// The rejected value
        value: u64,
        /// Maximum the micro encoding can carry
        max: u64,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
