//! Error types for the alphaswf library.

use std::fmt;

/// Result type alias for alphaswf operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building a constrained SWF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Input is shorter than the 8-byte SWF header.
    InputTooShort {
        /// Actual number of bytes provided.
        actual: usize,
    },
    /// Input SWF is not uncompressed (first signature byte is not `F`).
    NotUncompressed {
        /// The first byte found instead.
        first: u8,
    },
    /// The Adler-32 suffix search hit its iteration cap without landing
    /// both checksum halves in the allowed set.
    ChecksumStuck {
        /// Number of bytes appended before giving up.
        appended: usize,
    },
    /// No allowed Huffman code assignment exists for a block.
    NoHuffman,
    /// The synthesized code-length table has a literal count the target
    /// runtime rejects.
    InvalidHlit {
        /// Signed distance between 257 and the table length.
        extra: i32,
    },
    /// The bit buffer ended at a phase no valid block sequence produces.
    Misaligned {
        /// Residual bit count modulo 8.
        phase: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InputTooShort { actual } => {
                write!(
                    f,
                    "Input too short: {} bytes, need at least the 8-byte SWF header",
                    actual
                )
            }
            Error::NotUncompressed { first } => {
                write!(
                    f,
                    "Input SWF is not uncompressed (FWS): first byte is {:#04x}, expected 'F'",
                    first
                )
            }
            Error::ChecksumStuck { appended } => {
                write!(
                    f,
                    "Checksum still contains forbidden bytes after appending {} bytes",
                    appended
                )
            }
            Error::NoHuffman => {
                write!(f, "No allowed Huffman code assignment for this data")
            }
            Error::InvalidHlit { extra } => {
                write!(f, "Invalid HLIT: code-length table off by {}", extra)
            }
            Error::Misaligned { phase } => {
                write!(f, "Bit stream ended {} bits past a byte boundary", phase)
            }
        }
    }
}

impl std::error::Error for Error {}
