//! 7-bit groups, low bits first, high bit set on every byte but the last.
//! Used as the length prefix of ledger strings.

use std::io::{self, Read, Write};

/// Longest encoding of a `u32`.
pub const MAX_LEN: usize = 5;

pub fn write_u32(mut w: impl Write, mut v: u32) -> io::Result<()> {
    let mut buf = [0u8; MAX_LEN];
    let mut n = 0;
    while v >= 0x80 {
        buf[n] = (v as u8) | 0x80;
        v >>= 7;
        n += 1;
    }
    buf[n] = v as u8;
    w.write_all(&buf[..=n])
}

pub fn read_u32(mut r: impl Read) -> io::Result<u32> {
    let mut out = 0u32;
    for i in 0..MAX_LEN {
        let mut b = [0u8; 1];
        r.read_exact(&mut b)?;
        let byte = b[0];
        if i == MAX_LEN - 1 && byte > 0x0F {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "varint overflows u32",
            ));
        }
        out |= u32::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(out);
        }
    }
    Err(io::Error::new(io::ErrorKind::InvalidData, "varint too long"))
}
