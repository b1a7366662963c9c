//! One-time-pad cipher over the 27-symbol alphabet.
//!
//! Each output symbol depends only on the input and key symbols at the same
//! position, so the transform is stateless and position-independent.
//!
//! ```rust
//! use otp_protocol::core::cipher::{decrypt, encrypt};
//!
//! let key = b"XMCKL QWERTYUIOP";
//! let ciphertext = encrypt(b"HELLO WORLD", key).unwrap();
//! assert_eq!(decrypt(&ciphertext, key).unwrap(), b"HELLO WORLD");
//! ```

use crate::core::alphabet::{index_to_symbol, symbol_to_index, ALPHABET_SIZE};
use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which direction of the cipher to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CipherOp {
    Encrypt,
    Decrypt,
}

impl CipherOp {
    /// Combine one message symbol with one key symbol.
    #[inline]
    pub fn apply(self, symbol: u8, key: u8) -> u8 {
        match self {
            CipherOp::Encrypt => encrypt_symbol(symbol, key),
            CipherOp::Decrypt => decrypt_symbol(symbol, key),
        }
    }
}

impl fmt::Display for CipherOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CipherOp::Encrypt => f.write_str("encrypt"),
            CipherOp::Decrypt => f.write_str("decrypt"),
        }
    }
}

/// `(p + k) mod 27`, on symbols.
#[inline]
pub fn encrypt_symbol(plain: u8, key: u8) -> u8 {
    let p = u16::from(symbol_to_index(plain));
    let k = u16::from(symbol_to_index(key));
    index_to_symbol(((p + k) % u16::from(ALPHABET_SIZE)) as u8)
}

/// `(c - k) mod 27`, on symbols.
#[inline]
pub fn decrypt_symbol(cipher: u8, key: u8) -> u8 {
    let c = i16::from(symbol_to_index(cipher));
    let k = i16::from(symbol_to_index(key));
    // rem_euclid keeps the result non-negative for negative differences
    index_to_symbol((c - k).rem_euclid(i16::from(ALPHABET_SIZE)) as u8)
}

/// Apply `op` symbol by symbol over `input`, consuming the first
/// `input.len()` symbols of `key`.
///
/// # Errors
/// Returns [`ProtocolError::KeyTooShort`] when the key has fewer symbols than
/// the input.
pub fn transform(op: CipherOp, input: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    if key.len() < input.len() {
        return Err(ProtocolError::KeyTooShort {
            key_len: key.len(),
            required: input.len(),
        });
    }

    Ok(input
        .iter()
        .zip(key)
        .map(|(&symbol, &k)| op.apply(symbol, k))
        .collect())
}

/// Encrypt `plaintext` with `key`.
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    transform(CipherOp::Encrypt, plaintext, key)
}

/// Decrypt `ciphertext` with `key`.
pub fn decrypt(ciphertext: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    transform(CipherOp::Decrypt, ciphertext, key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vectors() {
        assert_eq!(encrypt(b"A", b"A").unwrap(), b"A");
        assert_eq!(encrypt(b" ", b"A").unwrap(), b" ");
        assert_eq!(encrypt(b"A", b" ").unwrap(), b" ");
        assert_eq!(decrypt(b" ", b"A").unwrap(), b" ");
    }

    #[test]
    fn test_wraps_around_the_alphabet() {
        // Z(25) + C(2) = 27 -> 0 -> A
        assert_eq!(encrypt_symbol(b'Z', b'C'), b'A');
        // space(26) + B(1) = 27 -> A
        assert_eq!(encrypt_symbol(b' ', b'B'), b'A');
        // A(0) - B(1) = -1 -> 26 -> space
        assert_eq!(decrypt_symbol(b'A', b'B'), b' ');
        // B(1) - space(26) = -25 -> 2 -> C
        assert_eq!(decrypt_symbol(b'B', b' '), b'C');
    }

    #[test]
    fn test_only_consumes_prefix_of_key() {
        let key = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
        let out = encrypt(b"AAA", key).unwrap();
        assert_eq!(out, b"ABC");
    }

    #[test]
    fn test_short_key_is_rejected() {
        let err = encrypt(b"HELLO", b"KEY").unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::KeyTooShort {
                key_len: 3,
                required: 5
            }
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(encrypt(b"", b"").unwrap().is_empty());
        assert!(decrypt(b"", b"ABC").unwrap().is_empty());
    }

    #[test]
    fn test_hello_world_roundtrip() {
        let key = b"XMCKL QWERTYUIOPZZZ";
        let ciphertext = encrypt(b"HELLO WORLD", key).unwrap();
        assert_eq!(ciphertext.len(), 11);
        assert_ne!(ciphertext, b"HELLO WORLD");
        assert_eq!(decrypt(&ciphertext, key).unwrap(), b"HELLO WORLD");
    }
}
