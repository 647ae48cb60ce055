//! Adler-32 (RFC 1950) and the checksum suffix search.
//!
//! The zlib trailer serializes the checksum as four big-endian bytes:
//! the `S2` half then the `S1` half. For the output to stay inside the
//! alphabet, each half must pack to two allowed octets, which
//! [`Charset::is_allowed_half`] tests against the precomputed pair set.
//! [`appended_bytes`] computes a payload suffix that drives both halves
//! into that set; the suffix itself travels inside the compressed body,
//! so its bytes are unconstrained.

use crate::charset::Charset;
use crate::error::{Error, Result};

/// Largest prime below 65536 (RFC 1950).
pub const MOD_ADLER: u32 = 65_521;

/// Largest n such that 255*n*(n+1)/2 + (n+1)*(MOD_ADLER-1) fits in u32.
const NMAX: usize = 5552;

/// Default filler for the first search phase. 0xFF leads to worse
/// downstream compression behavior, hence one below it.
const FILLER: u8 = 254;

/// Per-phase cap on appended bytes. Each phase walks a cyclic group of
/// order `MOD_ADLER`, so a full lap with no hit means no hit exists.
const MAX_PHASE_STEPS: usize = MOD_ADLER as usize;

/// Add `data` to the running checksum `d`.
///
/// Modulo reductions are deferred to `NMAX`-sized chunk boundaries.
pub fn update(d: u32, data: &[u8]) -> u32 {
    let mut s1 = d & 0xFFFF;
    let mut s2 = d >> 16;

    for chunk in data.chunks(NMAX) {
        for &b in chunk {
            s1 += u32::from(b);
            s2 += s1;
        }
        s1 %= MOD_ADLER;
        s2 %= MOD_ADLER;
    }

    (s2 << 16) | s1
}

/// Adler-32 checksum of `data`.
pub fn checksum(data: &[u8]) -> u32 {
    update(1, data)
}

/// The low checksum half.
#[inline]
pub fn s1(d: u32) -> u32 {
    d & 0xFFFF
}

/// The high checksum half.
#[inline]
pub fn s2(d: u32) -> u32 {
    d >> 16
}

/// Whether both halves of `d` serialize to allowed octet pairs.
pub fn checksum_allowed(d: u32, charset: &Charset) -> bool {
    charset.is_allowed_half(s1(d)) && charset.is_allowed_half(s2(d))
}

/// Compute a byte suffix such that appending it drives both checksum
/// halves into the allowed pair set.
///
/// Phase one walks `S1` into range: the filler byte steps it around the
/// modulus, except when a single byte lands it exactly on the smallest
/// allowed value. Phase two walks `S2` while keeping `S1` fixed: a zero
/// byte advances `S2` by the (nonzero, already-allowed) `S1`, unless some
/// allowed target is reachable in one byte without knocking `S1` out.
pub fn appended_bytes(d: u32, charset: &Charset) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(128);
    let mut s1 = s1(d);
    let mut s2 = s2(d);

    let Some(&min_allowed) = charset.combinations().first() else {
        return Err(Error::ChecksumStuck { appended: 0 });
    };

    while !charset.is_allowed_half(s1) {
        if bytes.len() >= MAX_PHASE_STEPS {
            return Err(Error::ChecksumStuck {
                appended: bytes.len(),
            });
        }

        let mut byte = FILLER;
        if MOD_ADLER - s1 + min_allowed < 255 {
            byte = (MOD_ADLER - s1 + min_allowed) as u8;
        }

        bytes.push(byte);
        s1 = (s1 + u32::from(byte)) % MOD_ADLER;
        s2 = (s2 + s1) % MOD_ADLER;
    }

    let phase_one = bytes.len();
    while !charset.is_allowed_half(s2) {
        if bytes.len() - phase_one >= MAX_PHASE_STEPS {
            return Err(Error::ChecksumStuck {
                appended: bytes.len(),
            });
        }

        let mut byte = 0u8;
        for &target in charset.combinations() {
            let step = MOD_ADLER - s2 + target;
            if step < 255 && charset.is_allowed_half(s1 + step) {
                byte = step as u8;
                break;
            }
        }

        bytes.push(byte);
        s1 = (s1 + u32::from(byte)) % MOD_ADLER;
        s2 = (s2 + s1) % MOD_ADLER;
    }

    Ok(bytes)
}
