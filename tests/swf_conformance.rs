//! End-to-end conformance tests for the constrained SWF encoder.
//!
//! Every scenario checks the same core contract: the output is a valid
//! zlib-wrapped SWF, a standard decoder reproduces the (possibly
//! suffixed) payload, and every single output byte is in the alphabet.

use std::io::Read;

use flate2::read::ZlibDecoder;
use proptest::prelude::*;
use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};

use alphaswf::huffman::EncoderV1;
use alphaswf::stream::ZlibStream;
use alphaswf::{adler32, Charset};

/// Wrap a payload in a minimal uncompressed SWF.
fn fws(payload: &[u8]) -> Vec<u8> {
    let mut input = b"FWS".to_vec();
    input.push(6); // version
    input.extend_from_slice(&((payload.len() + 8) as u32).to_le_bytes());
    input.extend_from_slice(payload);
    input
}

/// Decode the zlib body after the 8-byte SWF header. The decoder also
/// verifies the Adler-32 trailer.
fn decode_body(swf: &[u8]) -> Vec<u8> {
    let mut decoder = ZlibDecoder::new(&swf[8..]);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .expect("output must be a valid zlib stream");
    out
}

/// Assert the full contract for one payload; returns the decoded body.
fn assert_conformant(payload: &[u8], charset: &Charset) -> Vec<u8> {
    let swf = alphaswf::encode(&fws(payload), charset).unwrap();

    for (i, &b) in swf.iter().enumerate() {
        assert!(charset.contains(b), "byte {b:#04x} at offset {i}");
    }
    assert_eq!(&swf[..10], b"CWSMIKI0hC");

    let decoded = decode_body(&swf);
    assert_eq!(&decoded[..payload.len()], payload);

    let trailer = u32::from_be_bytes(swf[swf.len() - 4..].try_into().unwrap());
    assert_eq!(trailer, adler32::checksum(&decoded));
    assert!(adler32::checksum_allowed(trailer, charset));

    decoded
}

#[test]
fn test_single_zero_byte() {
    let charset = Charset::alphanumeric();
    let decoded = assert_conformant(&[0x00], &charset);
    assert_eq!(decoded[0], 0x00);
}

#[test]
fn test_short_ascending_payload() {
    let charset = Charset::alphanumeric();
    assert_conformant(&[0x00, 0x01, 0x02], &charset);
}

#[test]
fn test_random_low_bytes() {
    let charset = Charset::alphanumeric();
    let mut rng = StdRng::seed_from_u64(42);
    let mut bytes: Vec<u8> = (0..128).collect();
    bytes.shuffle(&mut rng);
    bytes.truncate(64);
    assert_conformant(&bytes, &charset);
}

#[test]
fn test_high_byte_run() {
    // The first window byte exceeds the greedy cutoff, shrinking the
    // window to a single byte; the variant encoder carries it anyway.
    let charset = Charset::alphanumeric();
    assert_conformant(&[0xFF; 100], &charset);
}

#[test]
fn test_long_zero_payload() {
    let charset = Charset::alphanumeric();
    assert_conformant(&[0x00; 5000], &charset);
}

#[test]
fn test_mixed_payload_with_separators() {
    // Alternating compressible runs and cutoff bytes forces the loop
    // through main blocks, variant blocks, and padding insertions.
    let charset = Charset::alphanumeric();
    let mut payload = Vec::new();
    for _ in 0..4 {
        payload.extend_from_slice(&[3, 4, 5, 3, 4, 5]);
        payload.push(0xFF);
    }
    assert_conformant(&payload, &charset);
}

#[test]
fn test_deterministic_output() {
    let charset = Charset::alphanumeric();
    let mut rng = StdRng::seed_from_u64(7);
    let mut payload: Vec<u8> = (0..200).map(|i| (i * 7) as u8).collect();
    payload.shuffle(&mut rng);

    let input = fws(&payload);
    let first = alphaswf::encode(&input, &charset).unwrap();
    let second = alphaswf::encode(&input, &charset).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_padding_between_two_main_blocks() {
    // Drive the writer directly: main blocks end byte-aligned, so each
    // needs a fresh padding block, and the pair must still decode and
    // stay inside the alphabet.
    let charset = Charset::alphanumeric();
    let v1 = EncoderV1::new(&charset);
    let huffman = v1.generate(&[40], &charset).unwrap();

    let mut stream = ZlibStream::new();
    stream.write_padding_block();
    stream.write_block(&[40], &huffman, false);
    stream.write_padding_block();
    stream.write_block(&[40], &huffman, true);

    let body = stream.finish(adler32::checksum(&[40, 40])).unwrap();
    for &b in &body {
        assert!(charset.contains(b), "byte {b:#04x}");
    }

    let mut decoder = ZlibDecoder::new(body.as_slice());
    let mut decoded = Vec::new();
    decoder.read_to_end(&mut decoded).unwrap();
    assert_eq!(decoded, [40, 40]);
}

#[test]
fn test_single_main_block_round_trip() {
    let charset = Charset::alphanumeric();
    let v1 = EncoderV1::new(&charset);
    let payload = [40u8, 77];
    let huffman = v1.generate(&payload, &charset).unwrap();

    let mut stream = ZlibStream::new();
    stream.write_padding_block();
    stream.write_block(&payload, &huffman, true);

    let body = stream.finish(adler32::checksum(&payload)).unwrap();
    for &b in &body {
        assert!(charset.contains(b), "byte {b:#04x}");
    }

    let mut decoder = ZlibDecoder::new(body.as_slice());
    let mut decoded = Vec::new();
    decoder.read_to_end(&mut decoded).unwrap();
    assert_eq!(decoded, payload);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_suffix_always_fixes_checksum(data in proptest::collection::vec(any::<u8>(), 0..2000)) {
        let charset = Charset::alphanumeric();
        let d = adler32::checksum(&data);
        let suffix = adler32::appended_bytes(d, &charset).unwrap();
        prop_assert!(adler32::checksum_allowed(adler32::update(d, &suffix), &charset));
    }
}
