use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::domain::ChunkRecord;
use crate::error::{ProbeError, Result};
use crate::hash::{DIGEST_LEN, Digest};
use crate::util::varint;

/// Upper bound on a ledger name; chunk names are a dozen bytes.
const MAX_NAME_LEN: u32 = 4096;

/// Ordered name -> digest mapping persisted next to the chunks.
///
/// Layout (little endian):
/// `i32 count`, then `count` x (`varint len`, `len` UTF-8 bytes,
/// `i32 digest_len`, `digest_len` bytes).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ledger {
    records: Vec<ChunkRecord>,
    names: HashSet<String>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record; names must be unique within a ledger.
    pub fn push(&mut self, name: impl Into<String>, digest: Digest) -> Result<()> {
        let name = name.into();
        if !self.names.insert(name.clone()) {
            return Err(ProbeError::Format(format!("duplicate ledger entry: {name}")));
        }
        self.records.push(ChunkRecord { name, digest });
        Ok(())
    }

    pub fn records(&self) -> &[ChunkRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn write_to(&self, mut w: impl Write) -> Result<()> {
        let count = i32::try_from(self.records.len())
            .map_err(|_| ProbeError::Format("too many ledger entries".into()))?;
        w.write_all(&count.to_le_bytes())?;
        for r in &self.records {
            let name = r.name.as_bytes();
            let len = u32::try_from(name.len())
                .ok()
                .filter(|&l| l <= MAX_NAME_LEN)
                .ok_or_else(|| ProbeError::Format(format!("ledger name too long: {}", r.name)))?;
            varint::write_u32(&mut w, len)?;
            w.write_all(name)?;
            w.write_all(&(DIGEST_LEN as i32).to_le_bytes())?;
            w.write_all(r.digest.as_bytes())?;
        }
        w.flush()?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(4 + self.records.len() * (1 + 16 + 4 + DIGEST_LEN));
        self.write_to(&mut out)?;
        Ok(out)
    }

    pub fn read_from(mut r: impl Read) -> Result<Self> {
        let count = read_i32(&mut r, "count")?;
        if count < 0 {
            return Err(ProbeError::Format(format!("negative entry count {count}")));
        }

        let mut ledger = Ledger::new();
        for i in 0..count {
            let len = varint::read_u32(&mut r).map_err(|e| truncated(i, "name length", e))?;
            if len > MAX_NAME_LEN {
                return Err(ProbeError::Format(format!(
                    "entry {i}: name length {len} exceeds {MAX_NAME_LEN}"
                )));
            }
            let mut name = vec![0u8; len as usize];
            r.read_exact(&mut name)
                .map_err(|e| truncated(i, "name", e))?;
            let name = String::from_utf8(name)
                .map_err(|_| ProbeError::Format(format!("entry {i}: name is not UTF-8")))?;

            let dlen = read_i32(&mut r, "digest length")?;
            if dlen != DIGEST_LEN as i32 {
                return Err(ProbeError::Format(format!(
                    "entry {i} ({name}): digest length {dlen}, expected {DIGEST_LEN}"
                )));
            }
            let mut digest = [0u8; DIGEST_LEN];
            r.read_exact(&mut digest)
                .map_err(|e| truncated(i, "digest", e))?;
            ledger.push(name, Digest::from_bytes(digest))?;
        }

        // The header count must account for every byte that follows.
        let mut probe = [0u8; 1];
        match r.read(&mut probe) {
            Ok(0) => Ok(ledger),
            Ok(_) => Err(ProbeError::Format(format!(
                "trailing data after {count} declared entries"
            ))),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let f = File::create(path)?;
        let mut w = BufWriter::new(f);
        self.write_to(&mut w)?;
        w.into_inner()
            .map_err(|e| ProbeError::Io(e.into_error()))?
            .sync_all()?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let f = File::open(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ProbeError::Format(format!("ledger not found: {}", path.display()))
            } else {
                ProbeError::Io(e)
            }
        })?;
        Self::read_from(BufReader::new(f))
    }
}

fn read_i32(r: &mut impl Read, what: &str) -> Result<i32> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            ProbeError::Format(format!("truncated ledger reading {what}"))
        } else {
            ProbeError::Io(e)
        }
    })?;
    Ok(i32::from_le_bytes(b))
}

fn truncated(entry: i32, what: &str, e: io::Error) -> ProbeError {
    match e.kind() {
        io::ErrorKind::UnexpectedEof => {
            ProbeError::Format(format!("truncated ledger in entry {entry} ({what})"))
        }
        io::ErrorKind::InvalidData => ProbeError::Format(format!("entry {entry}: {e}")),
        _ => ProbeError::Io(e),
    }
}
