//! Tests for record header encoding and decoding
//!
//! These tests verify:
//! - Bit-exact header layout (magic, little-endian size and flags)
//! - Truncated and mis-tagged headers are rejected
//! - Flags are carried verbatim

use itstore::record::{decode_header, encode_header, CreateFlags, HEADER_SIZE, MAGIC};
use itstore::ItsError;

// =============================================================================
// Layout Tests
// =============================================================================

#[test]
fn test_header_layout_is_bit_exact() {
    let header = encode_header(0x0403_0201, CreateFlags::from_bits(0x0807_0605));

    assert_eq!(header.len(), HEADER_SIZE);
    assert_eq!(&header[0..8], b"PSA\0ITS\0");
    assert_eq!(&header[8..12], &[0x01, 0x02, 0x03, 0x04]);
    assert_eq!(&header[12..16], &[0x05, 0x06, 0x07, 0x08]);
}

#[test]
fn test_header_size_constant() {
    assert_eq!(HEADER_SIZE, 16);
    assert_eq!(MAGIC.len(), 8);
}

#[test]
fn test_decode_encoded_header() {
    let flags = CreateFlags::WRITE_ONCE | CreateFlags::NO_REPLAY_PROTECTION;
    let header = encode_header(5, flags);

    let info = decode_header(&header).unwrap();

    assert_eq!(info.size, 5);
    assert_eq!(info.flags, flags);
    assert_eq!(info.flags.bits(), 0b101);
}

#[test]
fn test_decode_ignores_trailing_payload() {
    let mut bytes = encode_header(3, CreateFlags::NONE).to_vec();
    bytes.extend_from_slice(b"bye");

    let info = decode_header(&bytes).unwrap();

    assert_eq!(info.size, 3);
}

#[test]
fn test_decode_max_values() {
    let header = encode_header(u32::MAX, CreateFlags::from_bits(u32::MAX));

    let info = decode_header(&header).unwrap();

    assert_eq!(info.size, u32::MAX);
    assert_eq!(info.flags.bits(), u32::MAX);
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_decode_empty_input() {
    let result = decode_header(&[]);
    assert!(matches!(result, Err(ItsError::CorruptHeader(_))));
}

#[test]
fn test_decode_truncated_header() {
    let header = encode_header(5, CreateFlags::NONE);

    for len in 0..HEADER_SIZE {
        let result = decode_header(&header[..len]);
        assert!(
            matches!(result, Err(ItsError::CorruptHeader(_))),
            "length {} should be rejected",
            len
        );
    }
}

#[test]
fn test_decode_bad_magic() {
    let mut header = encode_header(5, CreateFlags::NONE);
    header[3] = b'X';

    let result = decode_header(&header);
    assert!(matches!(result, Err(ItsError::CorruptHeader(_))));
}

#[test]
fn test_decode_plain_text_file() {
    let result = decode_header(b"this is not a record at all");
    assert!(matches!(result, Err(ItsError::CorruptHeader(_))));
}

// =============================================================================
// Flags Tests
// =============================================================================

#[test]
fn test_flags_contains() {
    let flags = CreateFlags::WRITE_ONCE | CreateFlags::NO_CONFIDENTIALITY;

    assert!(flags.contains(CreateFlags::WRITE_ONCE));
    assert!(flags.contains(CreateFlags::NO_CONFIDENTIALITY));
    assert!(!flags.contains(CreateFlags::NO_REPLAY_PROTECTION));
    assert!(flags.contains(CreateFlags::NONE));
}

#[test]
fn test_flags_unknown_bits_preserved() {
    let flags = CreateFlags::from(0xdead_0000u32);
    let info = decode_header(&encode_header(0, flags)).unwrap();

    assert_eq!(info.flags.bits(), 0xdead_0000);
    assert_eq!(info.flags.to_string(), "0xdead0000");
}
