use std::io::{self, Read, Write};

use crate::progress::Progress;

/// Copy `src` to `dst` through the caller's buffer; never holds more than
/// `buf.len()` bytes in memory. Does not flush `dst`.
pub fn copy_bounded(
    src: &mut dyn Read,
    dst: &mut dyn Write,
    buf: &mut [u8],
    progress: &mut Progress,
) -> io::Result<u64> {
    let mut copied = 0u64;
    loop {
        let n = match src.read(buf) {
            Ok(0) => return Ok(copied),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        dst.write_all(&buf[..n])?;
        copied += n as u64;
        progress.advance(n as u64);
    }
}
