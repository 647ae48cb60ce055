//! The constrained zlib/DEFLATE stream writer.
//!
//! Three hand-derived dynamic-Huffman block shapes share one bit buffer.
//! Their headers and code-length tables are fixed data chosen so that,
//! given the right starting phase, every octet they produce is allowed:
//!
//! * a padding block carrying no data, advancing the phase from 0 to 6;
//! * a main block (8-bit codes straddling byte boundaries), 6 to 0;
//! * a variant block (byte-aligned 8-bit codes), 6 back to 6.
//!
//! The selection loop keeps the invariant that a padding block precedes
//! any block whose predecessor was a main block or the start of stream,
//! so main and variant blocks always begin at phase 6. Changing any of
//! the HLIT/HDIST/HCLEN constants requires re-deriving the byte-aligned
//! substitution patterns alongside them.

use crate::bits::{lsb_bits, msb_bits, BitBuffer};
use crate::charset::Charset;
use crate::error::{Error, Result};
use crate::huffman::{EncoderV1, EncoderV2, Huffman};

/// zlib stream header: 32K window, flag bits picked to read as text.
pub const ZLIB_HEADER: [u8; 2] = *b"hC";

/// Code-length-code lengths for the padding block, in DEFLATE
/// transmission order 16 17 18 0 8 7 9 6 10 5 11 4 12.
const PADDING_LEN_OF_LEN: [u8; 13] = [2, 5, 0, 4, 3, 0, 6, 4, 4, 4, 4, 6, 2];

/// Code-length-code lengths for main blocks, transmission order
/// 16 17 18 0 8 7 9 6 10 5 11 4 12 3 13 2 14.
const MAIN_LEN_OF_LEN: [u8; 17] = [2, 5, 3, 4, 4, 5, 4, 4, 4, 0, 3, 5, 0, 5, 0, 4, 0];

/// Code-length-code lengths for variant blocks, transmission order
/// 16 17 18 0 8 7 9 6 10 5 11 4 12.
const VARIANT_LEN_OF_LEN: [u8; 13] = [2, 4, 3, 4, 4, 5, 4, 4, 4, 0, 3, 5, 4];

/// Distinct-byte cap for the greedy block window; the main encoder's
/// usable code list is about this long for the reference alphabet.
const WINDOW_DISTINCT_MAX: usize = 50;

/// Window cutoff: bytes at or above this leave the main encoder no room
/// under its canonical slope bounds.
const WINDOW_BYTE_CUTOFF: u8 = 216;

/// A maximal run of equal code lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Run {
    length: u8,
    count: usize,
}

/// Run-length encode a code-length table.
fn runs(code_lengths: &[u8]) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::with_capacity(code_lengths.len());
    for &length in code_lengths {
        match runs.last_mut() {
            Some(run) if run.length == length => run.count += 1,
            _ => runs.push(Run { length, count: 1 }),
        }
    }
    runs
}

/// Bit-level writer for the constrained DEFLATE body.
#[derive(Debug, Default)]
pub struct ZlibStream {
    bits: BitBuffer,
}

impl ZlibStream {
    /// Create an empty stream.
    pub fn new() -> Self {
        Self {
            bits: BitBuffer::with_capacity(8 * 1024 * 128),
        }
    }

    /// Current bit count modulo 8.
    pub fn disalignment(&self) -> usize {
        self.bits.disalignment()
    }

    /// Write 3-bit code-length-code lengths in transmission order.
    fn write_len_of_len(&mut self, lengths: &[u8]) {
        for &length in lengths {
            self.bits.push_bits(&lsb_bits(u32::from(length), 3));
        }
    }

    /// Emit `code` for `n` table entries, substituting a byte-aligned
    /// copy-previous pair (3 + extra, then 4) whenever the phase allows.
    fn padding_run(&mut self, code: &[u8], mut n: usize) {
        let mut first = true;
        while n > 0 {
            if !first && n > 6 && self.disalignment() == 0 {
                let x = n.min(10);
                self.bits.push_bits(&[0, 1]);
                self.bits.push_bits(&lsb_bits((x - 7) as u32, 2));
                self.bits.push_bits(&[0, 1, 1, 0]);
                n -= x;
            } else {
                self.bits.push_bits(code);
                n -= 1;
            }
            first = false;
        }
    }

    /// Emit `code` for `n` table entries, substituting six-fold
    /// copy-previous packets while two bits into an octet.
    fn block_run(&mut self, code: &[u8], mut n: usize) {
        let mut first = true;
        while n > 0 {
            if !first && n > 6 && self.disalignment() == 2 {
                let x = n / 6;
                for _ in 0..x {
                    self.bits.push_bits(&[0, 0, 1, 1]);
                }
                n -= x * 6;
            } else {
                self.bits.push_bits(code);
                n -= 1;
            }
            first = false;
        }
    }

    /// Write a dataless dynamic block that moves the phase from 0 to 6.
    pub fn write_padding_block(&mut self) {
        self.bits.push_bits(&[0]); // BFINAL
        self.bits.push_bits(&[0, 1]); // BTYPE = 10, dynamic
        self.bits.push_bits(&lsb_bits(8, 5)); // HLIT
        self.bits.push_bits(&lsb_bits(16, 5)); // HDIST
        self.bits.push_bits(&lsb_bits(9, 4)); // HCLEN
        self.write_len_of_len(&PADDING_LEN_OF_LEN);

        // 265 literal lengths: 197 zeros, 64 six-bit entries, then 21
        // zeros covering the literal tail and the whole distance table.
        self.padding_run(&[1, 0, 1, 0], 197);
        self.padding_run(&[1, 1, 0, 0], 64);
        self.padding_run(&[1, 0, 1, 0], 21);

        // End of block: literal 256 sits inside the six-bit range.
        self.bits.push_bits(&[1, 1, 1, 0, 1, 1]);
    }

    /// Write a main compressed block for `block` using a V1 table.
    pub fn write_block(&mut self, block: &[u8], huffman: &Huffman, last: bool) {
        self.bits.push_bits(&[u8::from(last)]); // BFINAL
        self.bits.push_bits(&[0, 1]); // BTYPE = 10, dynamic
        self.bits
            .push_bits(&lsb_bits((huffman.code_lengths.len() - 257) as u32, 5)); // HLIT
        self.bits.push_bits(&lsb_bits(5, 5)); // HDIST
        self.bits.push_bits(&lsb_bits(13, 4)); // HCLEN
        self.write_len_of_len(&MAIN_LEN_OF_LEN);

        for run in runs(&huffman.code_lengths) {
            let code: &[u8] = match run.length {
                0 => &[1, 0, 0, 0],
                2 => &[1, 0, 0, 1],
                6 => &[1, 0, 1, 0],
                8 => &[1, 0, 1, 1],
                _ => unreachable!(),
            };
            self.block_run(code, run.count);
        }

        // Six distance lengths; both forms land the data section six bits
        // into an octet.
        if self.disalignment() == 2 {
            self.bits.push_bits(&[1, 0, 0, 0]); // 0
            self.bits.push_bits(&[1, 0, 0, 0]); // 0
            self.bits.push_bits(&[0, 0]); // 16
            self.bits.push_bits(&[1, 0]); //   repeat 4x
        } else {
            self.bits.push_bits(&[1, 0, 0, 1]); // 2
            self.bits.push_bits(&[0, 0]); // 16
            self.bits.push_bits(&[0, 0]); //   repeat 3x
            self.bits.push_bits(&[1, 0, 0, 0]); // 0
            self.bits.push_bits(&[1, 0, 0, 0]); // 0
        }

        for &byte in block {
            self.bits
                .push_bits(&msb_bits(u32::from(huffman.codes[usize::from(byte)]), 8));
        }
        self.bits.push_bits(&msb_bits(u32::from(huffman.trailer), 2));
    }

    /// Write a variant compressed block for `block` using a V2 table.
    pub fn write_variant_block(&mut self, block: &[u8], huffman: &Huffman, last: bool) {
        self.bits.push_bits(&[u8::from(last)]); // BFINAL
        self.bits.push_bits(&[0, 1]); // BTYPE = 10, dynamic
        self.bits
            .push_bits(&lsb_bits((huffman.code_lengths.len() - 257) as u32, 5)); // HLIT
        self.bits.push_bits(&lsb_bits(25, 5)); // HDIST
        self.bits.push_bits(&lsb_bits(9, 4)); // HCLEN
        self.write_len_of_len(&VARIANT_LEN_OF_LEN);

        for run in runs(&huffman.code_lengths) {
            let code: &[u8] = match run.length {
                0 => &[1, 0, 0, 0],
                6 => &[1, 0, 0, 1],
                8 => &[1, 0, 1, 0],
                _ => unreachable!(),
            };
            self.block_run(code, run.count);
        }

        // Twenty-six distance lengths, all zero; both forms byte-align
        // the data section.
        if self.disalignment() == 2 {
            self.bits.push_bits(&[0, 1, 1]); // 18
            self.bits.push_bits(&lsb_bits(11, 7)); //   repeat zero 22x
            self.bits.push_bits(&[0, 0, 1, 0]); // 16, repeat 4x
        } else {
            self.bits.push_bits(&[1, 0, 0, 0]); // 0
            self.bits.push_bits(&[0, 1, 1]); // 18
            self.bits.push_bits(&lsb_bits(10, 7)); //   repeat zero 21x
            self.bits.push_bits(&[0, 0, 1, 0]); // 16, repeat 4x
        }

        for &byte in block {
            self.bits
                .push_bits(&msb_bits(u32::from(huffman.codes[usize::from(byte)]), 8));
        }
        self.bits.push_bits(&msb_bits(u32::from(huffman.trailer), 6));
    }

    /// Greedy window: grow until the distinct-byte cap is passed or a
    /// byte past the cutoff enters, then drop the offending byte unless
    /// the data ran out first.
    fn window(data: &[u8]) -> usize {
        let mut seen = [false; 256];
        seen[usize::from(data[0])] = true;
        let mut distinct = 1usize;
        let mut max = data[0];

        let mut i = 1;
        while i < data.len() && distinct <= WINDOW_DISTINCT_MAX && max < WINDOW_BYTE_CUTOFF {
            let byte = data[i];
            if !seen[usize::from(byte)] {
                seen[usize::from(byte)] = true;
                distinct += 1;
            }
            max = max.max(byte);
            i += 1;
        }
        if i != data.len() {
            i -= 1;
        }
        i
    }

    /// Split `data` into blocks and write them all.
    ///
    /// For each position, the main encoder gets the longest feasible
    /// prefix of the greedy window; the variant encoder then competes
    /// upward from that length and wins ties. Padding precedes any block
    /// whose predecessor was a main block or the start of stream.
    pub fn encode(&mut self, data: &[u8], charset: &Charset) -> Result<()> {
        let v1 = EncoderV1::new(charset);
        let v2 = EncoderV2::new(charset);

        let mut rest = data;
        let mut previous_main = true;

        while !rest.is_empty() {
            let window = Self::window(rest);

            let mut main_len = window;
            let mut main = None;
            while main_len > 0 {
                match v1.generate(&rest[..main_len], charset) {
                    Ok(h) => {
                        main = Some(h);
                        break;
                    }
                    Err(_) => main_len -= 1,
                }
            }

            let mut len = main_len.max(1);
            let mut variant = None;
            let mut variant_len = 0;
            while len <= rest.len() {
                match v2.generate(&rest[..len]) {
                    Ok(h) => {
                        variant = Some(h);
                        variant_len = len;
                        len += 1;
                    }
                    Err(_) => break,
                }
            }

            let (huffman, take, is_main) = match (variant, main) {
                (Some(h), _) => (h, variant_len, false),
                (None, Some(h)) => (h, main_len, true),
                (None, None) => return Err(Error::NoHuffman),
            };

            let (block, tail) = rest.split_at(take);
            rest = tail;

            if previous_main {
                self.write_padding_block();
            }
            if is_main {
                self.write_block(block, &huffman, rest.is_empty());
            } else {
                self.write_variant_block(block, &huffman, rest.is_empty());
            }
            previous_main = is_main;
        }

        Ok(())
    }

    /// Pack the body and frame it: zlib header, octets, big-endian
    /// checksum trailer.
    pub fn finish(self, checksum: u32) -> Result<Vec<u8>> {
        let body = self.bits.finish()?;
        let mut out = Vec::with_capacity(ZLIB_HEADER.len() + body.len() + 4);
        out.extend_from_slice(&ZLIB_HEADER);
        out.extend_from_slice(&body);
        out.extend_from_slice(&checksum.to_be_bytes());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs() {
        assert_eq!(
            runs(&[0, 0, 0, 8, 8, 6]),
            vec![
                Run { length: 0, count: 3 },
                Run { length: 8, count: 2 },
                Run { length: 6, count: 1 },
            ]
        );
        assert_eq!(runs(&[]), vec![]);
    }

    #[test]
    fn test_padding_block_phase() {
        let mut stream = ZlibStream::new();
        stream.write_padding_block();
        assert_eq!(stream.disalignment(), 6);
    }

    #[test]
    fn test_padding_block_bytes_are_alphanumeric() {
        let charset = Charset::alphanumeric();
        let mut stream = ZlibStream::new();
        stream.write_padding_block();
        // All full octets of a lone padding block stay in the alphabet;
        // the 6-bit tail completes once the next block starts.
        let bytes = stream.bits.finish().unwrap();
        for &b in &bytes[..bytes.len() - 1] {
            assert!(charset.contains(b), "byte {b:#04x}");
        }
    }

    #[test]
    fn test_main_block_ends_aligned() {
        let charset = Charset::alphanumeric();
        let v1 = EncoderV1::new(&charset);
        let huffman = v1.generate(&[40], &charset).unwrap();

        let mut stream = ZlibStream::new();
        stream.write_padding_block();
        stream.write_block(&[40], &huffman, true);
        assert_eq!(stream.disalignment(), 0);
    }

    #[test]
    fn test_variant_block_keeps_phase_six() {
        let charset = Charset::alphanumeric();
        let v2 = EncoderV2::new(&charset);
        let huffman = v2.generate(&[0]).unwrap();

        let mut stream = ZlibStream::new();
        stream.write_padding_block();
        stream.write_variant_block(&[0, 0, 0], &huffman, true);
        assert_eq!(stream.disalignment(), 6);
    }

    #[test]
    fn test_window_caps_on_high_byte() {
        // The first byte always enters the window, even past the cutoff.
        assert_eq!(ZlibStream::window(&[0xFF; 100]), 0);
        assert_eq!(ZlibStream::window(&[0xFF]), 1);
        // A later high byte is dropped from the window.
        assert_eq!(ZlibStream::window(&[1, 2, 0xD8, 3]), 2);
    }

    #[test]
    fn test_window_consumes_small_data() {
        assert_eq!(ZlibStream::window(&[1, 2, 3]), 3);
        assert_eq!(ZlibStream::window(&[7; 5000]), 5000);
    }

    #[test]
    fn test_finish_frames_stream() {
        let stream = ZlibStream::new();
        let out = stream.finish(0x4357_534D).unwrap();
        assert_eq!(out, b"hC\x43\x57\x53\x4D");
    }
}
