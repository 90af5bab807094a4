//! Error types

use std::io;

use crate::format::Block;

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while transcoding a descriptor.
///
/// Every variant aborts the conversion; malformed input is never repaired.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reading the source or writing the destination failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The source signature matched none of the known formats.
    #[error("not a BMFont descriptor")]
    UnknownFormat,

    /// A binary source did not start with `BMF` version 3.
    #[error("invalid binary header {found:02X?}, expected BMF version 3")]
    BadMagic {
        /// The four bytes actually read.
        found: [u8; 4],
    },

    /// The source ended while a block was expected or still in progress.
    #[error("unexpected end of input in {0} block")]
    UnexpectedEnd(Block),

    /// A text or XML line carried the wrong keyword.
    #[error("expected `{expected}` in {block} block, found `{found}`")]
    UnexpectedElement {
        /// Block being decoded.
        block: Block,
        /// Keyword that should have appeared.
        expected: String,
        /// The offending line.
        found: String,
    },

    /// A binary chunk carried the wrong tag byte.
    #[error("expected {block} chunk (tag {}), found tag {found}", .block.tag())]
    UnexpectedTag {
        /// Block being decoded.
        block: Block,
        /// Tag byte actually read.
        found: u8,
    },

    /// A required key is absent.
    #[error("{block} block is missing field `{field}`")]
    MissingField {
        /// Block being decoded.
        block: Block,
        /// The absent key.
        field: &'static str,
    },

    /// A key is present but its value does not fit the field.
    #[error("{block} block has invalid `{field}` value {value:?}")]
    InvalidField {
        /// Block being decoded.
        block: Block,
        /// The key whose value was rejected.
        field: &'static str,
        /// The raw value.
        value: String,
    },

    /// A fixed-layout binary payload is shorter than its fixed fields.
    #[error("{block} chunk is too short ({length} bytes)")]
    ShortChunk {
        /// Block being decoded.
        block: Block,
        /// Declared payload length.
        length: u32,
    },

    /// A binary block's length disagrees with its entries.
    #[error("{block} chunk is {length} bytes, expected {expected}")]
    ChunkLength {
        /// Block being decoded.
        block: Block,
        /// Declared payload length.
        length: u32,
        /// Length implied by the entry count and width.
        expected: u64,
    },

    /// A page file name differs in width from the first one, which the binary layout
    /// cannot express.
    #[error("page {index} file name is {found} bytes, but binary pages must all be {expected} bytes")]
    UnevenPageNames {
        /// Zero-based page index.
        index: u32,
        /// Width of the first page entry, including the terminator.
        expected: u32,
        /// Width of the offending entry, including the terminator.
        found: u32,
    },
}
