//! Constrained canonical Huffman code search.
//!
//! Both encoders assign 8-bit codes to the distinct bytes of a block such
//! that the octets observable in the final stream are all allowed. They
//! differ in where the data section sits relative to byte boundaries:
//!
//! * The main encoder ([`EncoderV1`]) serves blocks whose data section
//!   starts six bits into an octet. Every code then straddles a boundary:
//!   its two top bits finish the previous octet and its low six bits open
//!   the next one. Codes are restricted to `[132, 192)` so the top bits
//!   are always `10`, and a code is usable when the octet formed by its
//!   reversed low six bits plus that fixed pair is allowed. The block
//!   closes with a 2-bit end marker, so the code before it also needs an
//!   allowed octet with a `00` tail.
//! * The variant encoder ([`EncoderV2`]) serves byte-aligned data
//!   sections, where each emitted code is observable directly as its bit
//!   reversal. Its usable codes are exactly the reversed allowed bytes,
//!   bounded below by the canonical starting value 28. The block closes
//!   with a 6-bit end marker.
//!
//! After assignment, a code-length table is synthesized so that canonical
//! numbering reproduces the chosen codes: dummy short-code and 8-bit
//! entries pad the counts until each symbol's canonical rank equals its
//! assigned code, and the Kraft sum comes out complete.

use crate::bits::{msb_bits, pack_msb};
use crate::charset::Charset;
use crate::error::{Error, Result};

/// Smallest canonical 8-bit code in a main-encoder table
/// (two 2-bit and one 6-bit dummy codes precede the 8-bit run).
const V1_MIN_CODE: u8 = 132;

/// One past the largest usable main-encoder code; codes from here on no
/// longer carry the `10` top-bit pair.
const V1_MAX_CODE: u8 = 192;

/// Total 8-bit codes in a completed main-encoder table.
const V1_TOTAL_EIGHTS: usize = 124;

/// Smallest canonical 8-bit code in a variant-encoder table
/// (seven 6-bit codes precede the 8-bit run).
const V2_MIN_CODE: u8 = 28;

/// Total 8-bit codes in a completed variant-encoder table.
const V2_TOTAL_EIGHTS: usize = 228;

/// Node cap for the backtracking search, against adversarial inputs.
const SEARCH_FUEL: usize = 1 << 20;

/// A constrained dynamic-Huffman table for one DEFLATE block.
#[derive(Debug, Clone)]
pub struct Huffman {
    /// Literal/length code-length table, indexed by literal value.
    /// Entries are 0, 2, 6 or 8.
    pub code_lengths: Vec<u8>,
    /// Assigned 8-bit code per payload byte; meaningful only for bytes
    /// that occur in the block.
    pub codes: [u8; 256],
    /// End-of-block value: 0 written in 2 bits, or 3 written in 6 bits.
    pub trailer: u8,
}

/// Sorted distinct bytes of a block.
fn distinct_sorted(data: &[u8]) -> Vec<u8> {
    let mut seen = [false; 256];
    for &b in data {
        seen[usize::from(b)] = true;
    }
    (0..=255).filter(|&b| seen[usize::from(b)]).collect()
}

/// Main-block code search: codes carry a fixed `10` top-bit pair.
#[derive(Debug)]
pub struct EncoderV1 {
    valid_codes: Vec<u8>,
}

impl EncoderV1 {
    /// Collect the usable codes for `charset`.
    pub fn new(charset: &Charset) -> Self {
        let mut valid_codes = Vec::with_capacity(64);
        for code in V1_MIN_CODE..V1_MAX_CODE {
            let mut bits = msb_bits(u32::from(code & 63), 6);
            bits.extend_from_slice(&[1, 0]);
            if charset.binary().contains(&pack_msb(&bits)) {
                valid_codes.push(code);
            }
        }
        Self { valid_codes }
    }

    /// The usable codes, ascending.
    pub fn valid_codes(&self) -> &[u8] {
        &self.valid_codes
    }

    /// Whether `code` may sit last in the data section, right before the
    /// 2-bit end marker.
    fn closes_block(code: u8, charset: &Charset) -> bool {
        let mut bits = msb_bits(u32::from(code), 8).split_off(2);
        bits.extend_from_slice(&[0, 0]);
        charset.binary().contains(&pack_msb(&bits))
    }

    fn assign(
        &self,
        symbols: &[u8],
        last_byte: u8,
        charset: &Charset,
        assigned: &mut Vec<u8>,
        prev_code: i32,
        prev_symbol: i32,
        valid: &[u8],
        fuel: &mut usize,
    ) -> bool {
        if assigned.len() == symbols.len() {
            return true;
        }
        if valid.is_empty() || *fuel == 0 {
            return false;
        }
        *fuel -= 1;

        let symbol = symbols[assigned.len()];

        // Canonical slope: the code may not outrun the symbol gap, or the
        // dummy 8-bit entries between symbols would not fit.
        let slope_max = prev_code + i32::from(symbol) - prev_symbol;

        // Reserve the tail of the remaining code list for the symbols
        // still to come.
        let remaining = symbols.len() - assigned.len();
        let reserve_idx = (valid.len() - remaining % valid.len()) % valid.len();
        let reserve_max = i32::from(valid[reserve_idx]);

        let max_code = slope_max.min(reserve_max);
        let reachable = valid.partition_point(|&c| i32::from(c) <= max_code);

        for i in (0..reachable).rev() {
            let code = valid[i];
            if symbol == last_byte && !Self::closes_block(code, charset) {
                continue;
            }
            assigned.push(code);
            let next = &valid[valid.partition_point(|&c| c <= code)..];
            if self.assign(
                symbols,
                last_byte,
                charset,
                assigned,
                i32::from(code),
                i32::from(symbol),
                next,
                fuel,
            ) {
                return true;
            }
            assigned.pop();
        }

        false
    }

    /// Find a main-block Huffman table for `data`.
    pub fn generate(&self, data: &[u8], charset: &Charset) -> Result<Huffman> {
        debug_assert!(!data.is_empty());
        let symbols = distinct_sorted(data);
        let last_byte = data[data.len() - 1];

        let mut assigned = Vec::with_capacity(symbols.len());
        let mut fuel = SEARCH_FUEL;
        if !self.assign(
            &symbols,
            last_byte,
            charset,
            &mut assigned,
            i32::from(V1_MIN_CODE) - 1,
            -1,
            &self.valid_codes,
            &mut fuel,
        ) {
            return Err(Error::NoHuffman);
        }

        let mut codes = [0u8; 256];
        for (&symbol, &code) in symbols.iter().zip(&assigned) {
            codes[usize::from(symbol)] = code;
        }

        let code_lengths = build_lengths_v1(&symbols, &assigned)?;
        Ok(Huffman {
            code_lengths,
            codes,
            trailer: 0,
        })
    }
}

/// Variant-block code search: codes are whole reversed allowed bytes.
#[derive(Debug)]
pub struct EncoderV2 {
    valid_codes: Vec<u8>,
}

impl EncoderV2 {
    /// Collect the usable codes for `charset`.
    pub fn new(charset: &Charset) -> Self {
        let mut valid_codes: Vec<u8> = charset
            .binary()
            .iter()
            .copied()
            .filter(|&b| b >= V2_MIN_CODE)
            .collect();
        valid_codes.sort_unstable();
        valid_codes.dedup();
        Self { valid_codes }
    }

    /// The usable codes, ascending.
    pub fn valid_codes(&self) -> &[u8] {
        &self.valid_codes
    }

    fn assign(
        &self,
        symbols: &[u8],
        assigned: &mut Vec<u8>,
        prev_code: i32,
        prev_symbol: i32,
        valid: &[u8],
        fuel: &mut usize,
    ) -> bool {
        if assigned.len() == symbols.len() {
            return true;
        }
        if valid.is_empty() || *fuel == 0 {
            return false;
        }
        *fuel -= 1;

        let symbol = symbols[assigned.len()];
        let max_code = prev_code + i32::from(symbol) - prev_symbol;
        let reachable = valid.partition_point(|&c| i32::from(c) <= max_code);

        for i in (0..reachable).rev() {
            let code = valid[i];
            assigned.push(code);
            let next = &valid[valid.partition_point(|&c| c <= code)..];
            if self.assign(
                symbols,
                assigned,
                i32::from(code),
                i32::from(symbol),
                next,
                fuel,
            ) {
                return true;
            }
            assigned.pop();
        }

        false
    }

    /// Find a variant-block Huffman table for `data`.
    pub fn generate(&self, data: &[u8]) -> Result<Huffman> {
        debug_assert!(!data.is_empty());
        let symbols = distinct_sorted(data);

        let mut assigned = Vec::with_capacity(symbols.len());
        let mut fuel = SEARCH_FUEL;
        if !self.assign(
            &symbols,
            &mut assigned,
            i32::from(V2_MIN_CODE) - 1,
            -1,
            &self.valid_codes,
            &mut fuel,
        ) {
            return Err(Error::NoHuffman);
        }

        let mut codes = [0u8; 256];
        for (&symbol, &code) in symbols.iter().zip(&assigned) {
            codes[usize::from(symbol)] = code;
        }

        let code_lengths = build_lengths_v2(&symbols, &assigned)?;
        Ok(Huffman {
            code_lengths,
            codes,
            trailer: 3,
        })
    }
}

/// Synthesize the main-encoder code-length table.
///
/// Slack counters track how many dummy entries of each length are still
/// owed so that canonical numbering lands every symbol on its assigned
/// code: two 2-bit codes (end-of-block plus one), a single 6-bit code,
/// and 124 8-bit codes in total.
fn build_lengths_v1(symbols: &[u8], assigned: &[u8]) -> Result<Vec<u8>> {
    let mut table: Vec<u8> = Vec::with_capacity(320);
    let mut next = 0usize;
    let mut count_8 = 0usize;

    let mut slack_2 = 0usize;
    let mut slack_6 = 1usize;
    let mut slack_8 = usize::from(assigned[0]) - usize::from(V1_MIN_CODE);

    while table.len() < 257 || slack_2 > 0 || slack_6 > 0 || slack_8 > 0 {
        if next < symbols.len() && table.len() == usize::from(symbols[next]) {
            table.push(8);
            count_8 += 1;
            let current = assigned[next];
            next += 1;
            slack_8 = if next < assigned.len() {
                usize::from(assigned[next]) - usize::from(current) - 1
            } else {
                V1_TOTAL_EIGHTS - count_8
            };
        } else if table.len() == 256 {
            table.push(2);
            slack_2 = 1;
        } else if slack_8 > 0 {
            table.push(8);
            count_8 += 1;
            slack_8 -= 1;
        } else if slack_6 > 0 {
            table.push(6);
            slack_6 -= 1;
        } else if slack_2 > 0 {
            table.push(2);
            slack_2 -= 1;
        } else {
            table.push(0);
        }
    }

    // Literal counts the PepperFlash zlib path rejects, expressed relative
    // to the 257-entry baseline. Kept in this exact form.
    let extra = 257 - table.len() as i32;
    if (extra < 16 && extra > 12) || extra > 28 {
        return Err(Error::InvalidHlit { extra });
    }

    Ok(table)
}

/// Synthesize the variant-encoder code-length table: seven 6-bit codes
/// (three before the 8-bit run, end-of-block, three after) and 228 8-bit
/// codes in total.
fn build_lengths_v2(symbols: &[u8], assigned: &[u8]) -> Result<Vec<u8>> {
    let mut table: Vec<u8> = Vec::with_capacity(320);
    let mut next = 0usize;
    let mut count_8 = 0usize;

    let mut slack_6 = 3usize;
    let mut slack_8 = usize::from(assigned[0]) - usize::from(V2_MIN_CODE);

    while table.len() < 257 || slack_6 > 0 || slack_8 > 0 {
        if next < symbols.len() && table.len() == usize::from(symbols[next]) {
            table.push(8);
            count_8 += 1;
            let current = assigned[next];
            next += 1;
            slack_8 = if next < assigned.len() {
                usize::from(assigned[next]) - usize::from(current) - 1
            } else {
                V2_TOTAL_EIGHTS - count_8
            };
        } else if table.len() == 256 {
            // The leading 6-bit dummies must all sit below the end marker.
            if slack_6 > 0 {
                return Err(Error::NoHuffman);
            }
            table.push(6);
            slack_6 = 3;
        } else if slack_8 > 0 {
            table.push(8);
            count_8 += 1;
            slack_8 -= 1;
        } else if slack_6 > 0 {
            table.push(6);
            slack_6 -= 1;
        } else {
            table.push(0);
        }
    }

    Ok(table)
}
