//! Random password generation.

use rand::Rng;
use zeroize::Zeroizing;

use crate::errors::{Result, VaultError};

pub const DEFAULT_LENGTH: usize = 16;
pub const MIN_LENGTH: usize = 4;
pub const MAX_LENGTH: usize = 128;

/// ASCII letters, digits and punctuation.
const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz\
ABCDEFGHIJKLMNOPQRSTUVWXYZ\
0123456789\
!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Generate a password of `length` characters drawn uniformly from the charset.
pub fn generate_password(length: usize) -> Result<Zeroizing<String>> {
    if !(MIN_LENGTH..=MAX_LENGTH).contains(&length) {
        return Err(VaultError::InvalidInput(format!(
            "password length must be between {MIN_LENGTH} and {MAX_LENGTH}, got {length}"
        )));
    }

    let mut rng = rand::rng();
    let password: String = (0..length)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect();
    Ok(Zeroizing::new(password))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_requested_length() {
        for len in [MIN_LENGTH, DEFAULT_LENGTH, MAX_LENGTH] {
            assert_eq!(generate_password(len).unwrap().chars().count(), len);
        }
    }

    #[test]
    fn rejects_out_of_range_lengths() {
        assert!(matches!(generate_password(3), Err(VaultError::InvalidInput(_))));
        assert!(matches!(generate_password(129), Err(VaultError::InvalidInput(_))));
    }

    #[test]
    fn only_uses_charset() {
        let pw = generate_password(MAX_LENGTH).unwrap();
        assert!(pw.bytes().all(|b| CHARSET.contains(&b)));
    }

    #[test]
    fn charset_has_no_whitespace() {
        assert_eq!(CHARSET.len(), 26 * 2 + 10 + 32);
        assert!(!CHARSET.iter().any(|b| b.is_ascii_whitespace()));
    }

    #[test]
    fn consecutive_passwords_differ() {
        let a = generate_password(32).unwrap();
        let b = generate_password(32).unwrap();
        assert_ne!(*a, *b);
    }
}
