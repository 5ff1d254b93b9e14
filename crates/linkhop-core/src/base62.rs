//! Base-62 alphabet shared by generated codes and aliases.
//!
//! Digits first, then lowercase, then uppercase, so `encode(0) == "0"` and
//! `encode(61) == "Z"`.

pub const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub const BASE: u128 = 62;

/// Encodes `value` as a base-62 string without padding.
pub fn encode(mut value: u128) -> String {
    if value == 0 {
        return (ALPHABET[0] as char).to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(ALPHABET[(value % BASE) as usize]);
        value /= BASE;
    }
    digits.reverse();
    // every byte comes from ALPHABET, which is ASCII
    digits.into_iter().map(char::from).collect()
}

/// Returns `true` if `input` is non-empty and uses only the base-62 alphabet.
pub fn is_base62(input: &str) -> bool {
    !input.is_empty() && input.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// `62^length`, or `None` once it no longer fits in a `u128`.
pub fn space(length: usize) -> Option<u128> {
    let exp = u32::try_from(length).ok()?;
    BASE.checked_pow(exp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_alphabet_boundaries() {
        assert_eq!(encode(0), "0");
        assert_eq!(encode(9), "9");
        assert_eq!(encode(10), "a");
        assert_eq!(encode(36), "A");
        assert_eq!(encode(61), "Z");
        assert_eq!(encode(62), "10");
    }

    #[test]
    fn six_symbol_space() {
        assert_eq!(space(6), Some(56_800_235_584));
        assert_eq!(space(0), Some(1));
        assert_eq!(space(40), None);
    }

    #[test]
    fn base62_check() {
        assert!(is_base62("aZ09"));
        assert!(!is_base62(""));
        assert!(!is_base62("a_b"));
    }
}
