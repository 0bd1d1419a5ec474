use std::io::{self, Write};

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::error::{ProbeError, Result};
use crate::progress::Progress;

/// Only this many leading bytes of a refill are perturbed.
const PERTURB_SPAN: usize = 4096;
const PERTURB_STRIDE: usize = 64;

/// Reproducible pseudo-random bytes for `seed`.
pub fn generate(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = vec![0u8; len];
    rng.fill_bytes(&mut out);
    out
}

/// Writes chunk content from one reusable random buffer.
///
/// The buffer is randomized once. Every later fill XORs a sparse prefix with a
/// value derived from the chunk seed and a running fill counter, so no two
/// fills are byte-identical while multi-hundred-megabyte chunks never pay for
/// fresh randomness. Integrity checks digest the bytes actually written.
pub struct ChunkGenerator {
    scratch: Vec<u8>,
    fills: u64,
}

impl ChunkGenerator {
    /// Scratch randomized from an OS-entropy seed.
    pub fn new(buffer_size: usize) -> Result<Self> {
        let mut seed = [0u8; 32];
        getrandom::getrandom(&mut seed)
            .map_err(|e| ProbeError::Staging(format!("entropy source: {e}")))?;
        Ok(Self::from_rng(buffer_size, StdRng::from_seed(seed)))
    }

    pub fn with_seed(buffer_size: usize, seed: u64) -> Self {
        Self::from_rng(buffer_size, StdRng::seed_from_u64(seed))
    }

    fn from_rng(buffer_size: usize, mut rng: StdRng) -> Self {
        let mut scratch = vec![0u8; buffer_size.max(1)];
        rng.fill_bytes(&mut scratch);
        Self { scratch, fills: 0 }
    }

    /// Write exactly `len` bytes of chunk content to `dst`.
    pub fn write_chunk(
        &mut self,
        dst: &mut dyn Write,
        len: u64,
        seed: u64,
        progress: &mut Progress,
    ) -> io::Result<()> {
        let mut left = len;
        while left > 0 {
            let n = self.scratch.len().min(left as usize);
            if self.fills > 0 {
                perturb(&mut self.scratch[..n], seed, self.fills);
            }
            dst.write_all(&self.scratch[..n])?;
            self.fills += 1;
            left -= n as u64;
            progress.advance(n as u64);
        }
        dst.flush()
    }
}

fn perturb(buf: &mut [u8], seed: u64, fill: u64) {
    let mut x = (fill.wrapping_mul(13).wrapping_add(seed.wrapping_mul(7)) & 0xFF) as u8;
    if x == 0 {
        x = 0xA5;
    }
    let span = buf.len().min(PERTURB_SPAN);
    for b in buf[..span].iter_mut().step_by(PERTURB_STRIDE) {
        *b ^= x;
    }
}
