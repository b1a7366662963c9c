//! The 27-symbol alphabet shared by messages and keys.
//!
//! `'A'..='Z'` map to indices 0 through 25 and the space character maps to 26.

/// Number of symbols in the alphabet.
pub const ALPHABET_SIZE: u8 = 27;

/// Index assigned to the space symbol.
pub const SPACE_INDEX: u8 = 26;

/// All valid symbols, in index order.
pub const SYMBOLS: &[u8; ALPHABET_SIZE as usize] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ ";

/// Map a symbol to its index.
///
/// Anything that is not a space is treated as a letter. Bytes outside the
/// alphabet produce an index outside `0..27`; validation happens before
/// symbols ever reach the cipher.
#[inline]
pub fn symbol_to_index(symbol: u8) -> u8 {
    if symbol == b' ' {
        SPACE_INDEX
    } else {
        symbol.wrapping_sub(b'A')
    }
}

/// Map an index back to its symbol. Every index of 26 or more becomes a space.
#[inline]
pub fn index_to_symbol(index: u8) -> u8 {
    if index < SPACE_INDEX {
        b'A' + index
    } else {
        b' '
    }
}

/// Whether `symbol` belongs to the alphabet.
#[inline]
pub fn is_valid_symbol(symbol: u8) -> bool {
    symbol == b' ' || symbol.is_ascii_uppercase()
}

/// Position and value of the first byte outside the alphabet, if any.
pub fn first_invalid_symbol(data: &[u8]) -> Option<(usize, u8)> {
    data.iter()
        .copied()
        .enumerate()
        .find(|&(_, symbol)| !is_valid_symbol(symbol))
}
