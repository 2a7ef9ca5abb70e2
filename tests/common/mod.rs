#![allow(dead_code)]

use std::io::Cursor;

use cnk::{read_container, write_container, Config, ContainerHeader, ContainerReport};

pub const HEADER: ContainerHeader = ContainerHeader {
    magic: *b"CNK0",
    version: 1,
};

/// Prefix `payload` with an 8-byte container header.
pub fn wrap(header: ContainerHeader, payload: &[u8]) -> Vec<u8> {
    let mut out = header.to_bytes().to_vec();
    out.extend_from_slice(payload);
    out
}

pub fn encode(source: &[u8], config: &Config) -> (Vec<u8>, ContainerReport) {
    let payload_len = source.len() as u64 - 8;
    let mut dst = Cursor::new(Vec::new());
    let report = write_container(&mut Cursor::new(source), &mut dst, payload_len, config)
        .expect("encode");
    (dst.into_inner(), report)
}

pub fn decode(container: &[u8], config: &Config) -> (Vec<u8>, ContainerReport) {
    let mut dst = Vec::new();
    let report = read_container(&mut Cursor::new(container), &mut dst, config).expect("decode");
    (dst, report)
}

pub fn u32_le(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
}

pub fn u32_be(bytes: &[u8], at: usize) -> u32 {
    u32::from_be_bytes(bytes[at..at + 4].try_into().unwrap())
}
