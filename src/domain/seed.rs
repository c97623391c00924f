// src/domain/seed.rs

use rand::rngs::StdRng;
use rand::SeedableRng;
use sha2::{Digest, Sha256};

/// Stable 64-bit seed derived from arbitrary text.
pub fn seed_from(text: &str) -> u64 {
    let digest = Sha256::digest(text.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

/// RNG whose whole sequence is a function of `text`.
pub fn rng_for(text: &str) -> StdRng {
    StdRng::seed_from_u64(seed_from(text))
}

/// First `len` hex characters of SHA-256(text). Used for synthesized URLs.
pub fn short_hash(text: &str, len: usize) -> String {
    let mut hex = hex::encode(Sha256::digest(text.as_bytes()));
    hex.truncate(len);
    hex
}
