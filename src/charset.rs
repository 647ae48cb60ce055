//! The allowed output alphabet and its derived lookup structures.

/// The alphabet every output byte must belong to, with two precomputed
/// views of it.
///
/// `binary` holds the 8-bit reversal of each allowed byte. DEFLATE emits
/// Huffman codes starting from their most-significant bit while bytes fill
/// from the least-significant, so the octet observable on the wire for a
/// byte-aligned 8-bit code is exactly the code's bit reversal; `binary`
/// answers "does this code land on an allowed octet" by direct comparison.
///
/// `combinations` holds every 16-bit value whose two octets are both
/// allowed, sorted ascending. It is the membership test for Adler-32
/// halves, which serialize as big-endian byte pairs.
#[derive(Debug, Clone)]
pub struct Charset {
    allowed: Vec<u8>,
    binary: Vec<u8>,
    combinations: Vec<u32>,
}

impl Charset {
    /// Build a charset from the list of allowed bytes.
    pub fn new(allowed: &[u8]) -> Self {
        debug_assert!(!allowed.is_empty());

        let binary = allowed.iter().map(|b| b.reverse_bits()).collect();

        let mut combinations: Vec<u32> = allowed
            .iter()
            .flat_map(|&hi| {
                allowed
                    .iter()
                    .map(move |&lo| u32::from(hi) * 256 + u32::from(lo))
            })
            .collect();
        combinations.sort_unstable();
        combinations.dedup();

        Self {
            allowed: allowed.to_vec(),
            binary,
            combinations,
        }
    }

    /// The reference alphabet: `[A-Za-z0-9]`, 62 bytes.
    pub fn alphanumeric() -> Self {
        Self::new(b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789")
    }

    /// The allowed bytes, in construction order.
    pub fn allowed(&self) -> &[u8] {
        &self.allowed
    }

    /// Bit-reversed forms of the allowed bytes, in construction order.
    pub fn binary(&self) -> &[u8] {
        &self.binary
    }

    /// Sorted 16-bit values whose high and low octets are both allowed.
    pub fn combinations(&self) -> &[u32] {
        &self.combinations
    }

    /// Whether a single byte is allowed.
    pub fn contains(&self, byte: u8) -> bool {
        self.allowed.contains(&byte)
    }

    /// Whether a 16-bit value serializes to two allowed octets.
    #[inline]
    pub fn is_allowed_half(&self, half: u32) -> bool {
        self.combinations.binary_search(&half).is_ok()
    }
}
