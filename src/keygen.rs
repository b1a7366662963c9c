//! Random key generation.

use crate::core::alphabet::{index_to_symbol, ALPHABET_SIZE};
use rand::Rng;

/// `length` uniformly random alphabet symbols from the thread-local RNG.
pub fn generate_key(length: usize) -> Vec<u8> {
    generate_key_with(&mut rand::rng(), length)
}

/// `length` uniformly random alphabet symbols drawn from `rng`.
pub fn generate_key_with<R: Rng>(rng: &mut R, length: usize) -> Vec<u8> {
    (0..length)
        .map(|_| index_to_symbol(rng.random_range(0..ALPHABET_SIZE)))
        .collect()
}
