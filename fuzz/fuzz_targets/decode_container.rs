use std::io::Cursor;

use cnk::{read_container, Config};
use honggfuzz::fuzz;

fn main() {
    let config = Config {
        buffer_capacity: 256,
        ..Config::default()
    };
    loop {
        fuzz!(|data: &[u8]| {
            let mut out = Vec::new();
            let _ = read_container(&mut Cursor::new(data), &mut out, &config);
        });
    }
}
