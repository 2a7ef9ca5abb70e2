mod common;

use cnk::{Config, ContainerHeader};
use common::{decode, encode, u32_be, u32_le, wrap, HEADER};

#[test]
fn size_fields_agree() {
    let payload: Vec<u8> = (0..50_000u32).map(|i| (i % 97) as u8).collect();
    let (container, report) = encode(&wrap(HEADER, &payload), &Config::default());

    let n = u32_le(&container, 12) as usize;
    assert_eq!(n, report.compressed_size as usize);
    assert_eq!(container.len(), 16 + n + 4);
    assert_eq!(u32_le(&container, 8), payload.len() as u32);
    assert_eq!(u32_be(&container, 16 + n), payload.len() as u32);
    assert_eq!(report.transfer.total_out, n as u64);
}

#[test]
fn trailer_is_byte_swapped_copy() {
    let payload = vec![1u8; 0x0102];
    let (container, _) = encode(&wrap(HEADER, &payload), &Config::default());
    let tail = &container[container.len() - 4..];
    let mut lead = container[8..12].to_vec();
    lead.reverse();
    assert_eq!(tail, &lead[..]);
}

#[test]
fn header_passes_through_both_directions() {
    for magic in [*b"CNK0", *b"CNK5", *b"ZZZZ", [0, 0xFF, 0x7F, 0x80]] {
        let header = ContainerHeader {
            magic,
            version: 0xDEAD_BEEF,
        };
        let source = wrap(header, b"some terrain bytes");
        let (container, report) = encode(&source, &Config::default());
        assert_eq!(&container[..8], &source[..8]);
        assert_eq!(report.header, header);

        let (decoded, report) = decode(&container, &Config::default());
        assert_eq!(&decoded[..8], &source[..8]);
        assert_eq!(report.header, header);
    }
}

#[test]
fn stored_compressed_size_is_not_relied_on() {
    let source = wrap(HEADER, b"abcabcabcabcabc");
    let (mut container, _) = encode(&source, &Config::default());
    // Older writers counted the trailer into this field.
    let bogus = u32_le(&container, 12) + 4;
    container[12..16].copy_from_slice(&bogus.to_le_bytes());
    let (decoded, report) = decode(&container, &Config::default());
    assert_eq!(decoded, source);
    assert_eq!(report.compressed_size, bogus);
}
