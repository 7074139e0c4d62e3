//! Error types for header decoding and encoding.

use std::io;

use thiserror::Error;

use crate::HeaderError;

/// Errors that can occur while decoding or encoding header blocks.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Header layout error (checksum, invalid octal, oversized field).
    #[error("header error: {0}")]
    Header(#[from] HeaderError),

    /// The stream ended cleanly where a header block was expected.
    #[error("unexpected end of stream at offset {offset}")]
    UnexpectedEof {
        /// Byte offset of the missing block.
        offset: u64,
    },

    /// A block read failed or came back short.
    #[error("truncated archive at offset {offset}")]
    Truncated {
        /// Byte offset of the failed block.
        offset: u64,
        /// Underlying transport error.
        #[source]
        source: io::Error,
    },

    /// The magic field does not start with `"ustar"`.
    #[error("bad magic: {0:?}")]
    BadMagic(Vec<u8>),

    /// The version field is not `"00"`.
    #[error("bad version: {0:?}")]
    BadVersion(Vec<u8>),

    /// Extension blocks were followed by the end-of-archive marker.
    #[error("extension headers without a following entry")]
    OrphanedExtension,

    /// GNU long name/link payload exceeds the configured maximum.
    #[error("extension payload exceeds limit: {size} bytes > {limit} bytes")]
    ExtensionTooLarge {
        /// Declared payload size.
        size: u64,
        /// Configured limit.
        limit: u64,
    },

    /// Too many extension blocks in front of one entry.
    #[error("too many pending extension headers: {count} > {limit}")]
    TooManyExtensions {
        /// Number of extension headers seen.
        count: usize,
        /// Configured limit.
        limit: usize,
    },

    /// Payload size overflows when rounded up to whole blocks.
    #[error("invalid entry size: {0}")]
    InvalidSize(u64),

    /// The formatted security label line does not fit in one block.
    #[error("security label record is {len} bytes, must be under one block")]
    LabelTooLong {
        /// Length of the formatted record.
        len: usize,
    },

    /// The security label contains a newline or NUL.
    #[error("security label contains a newline or NUL byte")]
    InvalidLabel,

    /// A GNU long name or long link contains a NUL, which would cut the value
    /// short when read back.
    #[error("long name or link contains a NUL byte")]
    InvalidLongName,

    /// A block write failed.
    #[error("write failed at offset {offset}")]
    Write {
        /// Byte offset of the block being written.
        offset: u64,
        /// Underlying transport error.
        #[source]
        source: io::Error,
    },
}

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
