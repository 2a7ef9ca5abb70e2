mod common;

use std::io::Cursor;

use cnk::{read_container, write_container, CnkError, Config};
use common::{encode, u32_le, wrap, HEADER};

fn try_decode(container: &[u8], config: &Config) -> Result<Vec<u8>, CnkError> {
    let mut out = Vec::new();
    read_container(&mut Cursor::new(container), &mut out, config)?;
    Ok(out)
}

#[test]
fn declared_length_beyond_source_is_truncation() {
    let source = wrap(HEADER, &[5u8; 100]);
    let mut dst = Cursor::new(Vec::new());
    let err = write_container(&mut Cursor::new(&source), &mut dst, 150, &Config::default())
        .unwrap_err();
    match err {
        CnkError::TruncatedInput { expected, actual } => {
            assert_eq!(expected, 150);
            assert_eq!(actual, 100);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn source_shorter_than_header_is_truncation() {
    let mut dst = Cursor::new(Vec::new());
    let err = write_container(&mut Cursor::new(b"CNK"), &mut dst, 0, &Config::default())
        .unwrap_err();
    assert!(matches!(err, CnkError::TruncatedInput { .. }));
}

#[test]
fn cut_payload_fails() {
    let payload: Vec<u8> = (0..30_000u32).map(|i| (i * 31 % 251) as u8).collect();
    let (container, _) = encode(&wrap(HEADER, &payload), &Config::default());
    let n = u32_le(&container, 12) as usize;
    // Keep the trailer but drop the back half of the compressed stream.
    let mut cut = container[..16 + n / 2].to_vec();
    cut.extend_from_slice(&container[16 + n..]);
    assert!(try_decode(&cut, &Config::default()).is_err());
}

#[test]
fn corrupt_payload_fails() {
    let (mut container, _) = encode(&wrap(HEADER, &[0u8; 64]), &Config::default());
    container[16] ^= 0xFF;
    let err = try_decode(&container, &Config::default()).unwrap_err();
    assert!(matches!(err, CnkError::Codec { .. }));
}

#[test]
fn trailer_mismatch_detected() {
    let (mut container, _) = encode(&wrap(HEADER, b"hello chunk"), &Config::default());
    let last = container.len() - 1;
    container[last] ^= 0x01;
    let err = try_decode(&container, &Config::default()).unwrap_err();
    assert!(matches!(err, CnkError::SizeMismatch { field: "trailer size", .. }));

    let lenient = Config {
        verify_sizes: false,
        ..Config::default()
    };
    let decoded = try_decode(&container, &lenient).unwrap();
    assert_eq!(&decoded[8..], b"hello chunk");
}

#[test]
fn leading_size_mismatch_detected() {
    let (mut container, _) = encode(&wrap(HEADER, b"hello chunk"), &Config::default());
    let wrong = 99u32;
    container[8..12].copy_from_slice(&wrong.to_le_bytes());
    let len = container.len();
    container[len - 4..].copy_from_slice(&wrong.to_be_bytes());
    let err = try_decode(&container, &Config::default()).unwrap_err();
    assert!(matches!(
        err,
        CnkError::SizeMismatch {
            field: "uncompressed size",
            expected: 99,
            actual: 11
        }
    ));
}

#[test]
fn empty_file_is_truncation() {
    let err = try_decode(&[], &Config::default()).unwrap_err();
    assert!(matches!(err, CnkError::TruncatedInput { .. }));
}
