//! # alphaswf
//!
//! Recompress an uncompressed SWF file into a byte-equivalent `CWS` file
//! whose every output byte belongs to a chosen alphabet (by default
//! `[A-Za-z0-9]`). The result is still a valid zlib-wrapped SWF: the
//! DEFLATE body is built from hand-shaped dynamic-Huffman blocks whose
//! emitted octets all fall inside the alphabet, and the trailing Adler-32
//! is steered into the alphabet by appending a suffix to the payload
//! before compression.
//!
//! This is a tool for security research into content-sniffing filters:
//! the output looks like plain text byte-for-byte, yet decompresses to
//! the original SWF payload.
//!
//! ## Example
//!
//! ```rust
//! use alphaswf::Charset;
//!
//! // A minimal uncompressed SWF: FWS header plus payload bytes.
//! let mut input = b"FWS".to_vec();
//! input.push(6);
//! input.extend_from_slice(&20u32.to_le_bytes());
//! input.extend_from_slice(&[0x44; 12]);
//!
//! let charset = Charset::alphanumeric();
//! let swf = alphaswf::encode(&input, &charset).unwrap();
//! assert!(swf.iter().all(|&b| charset.contains(b)));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod adler32;
pub mod bits;
pub mod charset;
pub mod error;
pub mod huffman;
pub mod stream;
pub mod swf;

pub use charset::Charset;
pub use error::{Error, Result};
pub use swf::{encode, encode_with_stats, EncodeStats};
