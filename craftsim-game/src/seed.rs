//! Seed derivation and the per-attempt random stream.
use hmac::{Hmac, Mac};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;

const ATTEMPT_DOMAIN: &[u8] = b"craftsim-attempt";

/// Derive an independent attempt seed from a base seed and attempt index.
#[must_use]
pub fn derive_attempt_seed(base_seed: u64, attempt: u64) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&base_seed.to_le_bytes()) else {
        // HMAC accepts keys of any length.
        return base_seed ^ attempt;
    };
    mac.update(ATTEMPT_DOMAIN);
    mac.update(&attempt.to_le_bytes());
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}

/// Counting wrapper over the attempt's `ChaCha20` stream.
#[derive(Debug, Clone)]
pub struct CraftRng<R = ChaCha20Rng> {
    rng: R,
    draws: u64,
}

impl CraftRng<ChaCha20Rng> {
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self::wrap(ChaCha20Rng::seed_from_u64(seed))
    }
}

impl<R: RngCore> CraftRng<R> {
    #[must_use]
    pub const fn wrap(rng: R) -> Self {
        Self { rng, draws: 0 }
    }

    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: RngCore> RngCore for CraftRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}
