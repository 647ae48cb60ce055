//! SWF container parsing and assembly.
//!
//! Only the 8-byte uncompressed header is parsed; everything after it is
//! the payload handed to the constrained compressor. The output header is
//! fixed: all eight bytes are themselves alphabet members.

use crate::adler32;
use crate::charset::Charset;
use crate::error::{Error, Result};
use crate::stream::ZlibStream;

/// Compressed-SWF signature.
pub const SIGNATURE: [u8; 3] = *b"CWS";

/// Output SWF version byte.
pub const VERSION: u8 = b'M';

/// Output length field. The runtime ignores the first three bytes; the
/// last must stay small for PepperFlash to accept the file.
pub const FILE_LENGTH: [u8; 4] = *b"IKI0";

/// Size of the SWF header preceding the payload.
pub const HEADER_LEN: usize = 8;

/// Details of one encode run, for callers that report on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeStats {
    /// Payload length after any checksum suffix, in bytes.
    pub payload_len: usize,
    /// Bytes appended to fix the checksum (zero when it was already
    /// allowed).
    pub appended: usize,
    /// Final Adler-32 of the padded payload.
    pub checksum: u32,
}

/// Recompress an uncompressed SWF into an alphabet-constrained one.
///
/// `input` must start with the `FWS` signature; bytes 8 and up form the
/// payload. Every byte of the returned file is in `charset`.
pub fn encode(input: &[u8], charset: &Charset) -> Result<Vec<u8>> {
    encode_with_stats(input, charset).map(|(bytes, _)| bytes)
}

/// Like [`encode`], also returning [`EncodeStats`].
pub fn encode_with_stats(input: &[u8], charset: &Charset) -> Result<(Vec<u8>, EncodeStats)> {
    if input.len() < HEADER_LEN {
        return Err(Error::InputTooShort {
            actual: input.len(),
        });
    }
    if input[0] != b'F' {
        return Err(Error::NotUncompressed { first: input[0] });
    }

    let mut payload = input[HEADER_LEN..].to_vec();
    let mut checksum = adler32::checksum(&payload);
    let mut appended = 0;

    if !adler32::checksum_allowed(checksum, charset) {
        let suffix = adler32::appended_bytes(checksum, charset)?;
        checksum = adler32::update(checksum, &suffix);
        appended = suffix.len();
        payload.extend_from_slice(&suffix);
    }

    let mut stream = ZlibStream::new();
    stream.encode(&payload, charset)?;
    let body = stream.finish(checksum)?;

    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.extend_from_slice(&SIGNATURE);
    out.push(VERSION);
    out.extend_from_slice(&FILE_LENGTH);
    out.extend_from_slice(&body);

    let stats = EncodeStats {
        payload_len: payload.len(),
        appended,
        checksum,
    };
    Ok((out, stats))
}
