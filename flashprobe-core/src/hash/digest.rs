use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use serde::{Serialize, Serializer};

use crate::error::{ProbeError, Result};
use crate::progress::Progress;

/// Width of a chunk digest. BLAKE3's extendable output is truncated to this
/// many bytes; the ledger stores exactly this length.
pub const DIGEST_LEN: usize = 16;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; DIGEST_LEN] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn parse_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim())
            .map_err(|e| ProbeError::Format(format!("invalid hex digest: {e}")))?;
        Self::from_slice(&bytes).ok_or_else(|| {
            ProbeError::Format(format!(
                "expected {DIGEST_LEN} bytes ({} hex chars), got {}",
                DIGEST_LEN * 2,
                bytes.len()
            ))
        })
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_hex())
    }
}

/// Incremental digest context.
#[derive(Default, Clone)]
pub struct DigestHasher {
    inner: blake3::Hasher,
}

impl DigestHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, buf: &[u8]) -> &mut Self {
        self.inner.update(buf);
        self
    }

    pub fn finalize(&self) -> Digest {
        let mut out = [0u8; DIGEST_LEN];
        self.inner.finalize_xof().fill(&mut out);
        Digest(out)
    }
}

pub fn digest_bytes(buf: &[u8]) -> Digest {
    DigestHasher::new().update(buf).finalize()
}

/// Stream `r` to EOF in `block_size` reads. Returns the digest and the number
/// of bytes consumed.
pub fn digest_reader(
    r: &mut dyn Read,
    block_size: usize,
    progress: &mut Progress,
) -> io::Result<(Digest, u64)> {
    let mut hasher = DigestHasher::new();
    let mut buf = vec![0u8; block_size.max(1)];
    let mut total = 0u64;
    loop {
        let n = match r.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
        total += n as u64;
        progress.advance(n as u64);
    }
    Ok((hasher.finalize(), total))
}

pub fn digest_file(
    path: &Path,
    block_size: usize,
    threshold: u64,
    step: u64,
) -> Result<Digest> {
    let mut f = File::open(path)?;
    let len = f.metadata()?.len();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut progress = Progress::new("digest", &name, len, threshold, step);
    let (digest, _) = digest_reader(&mut f, block_size, &mut progress)?;
    Ok(digest)
}
