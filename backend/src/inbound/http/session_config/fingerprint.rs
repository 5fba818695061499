//! Session key fingerprint for startup logs.
//!
//! Operators compare the fingerprint across replicas to confirm they share a
//! key; the key material itself is never logged.

use actix_web::cookie::Key;
use sha2::{Digest, Sha256};

/// Bytes of the digest kept before hex encoding.
const FINGERPRINT_BYTES: usize = 8;

/// Truncated SHA-256 of the key's signing half, as 16 lowercase hex digits.
///
/// # Examples
///
/// ```rust
/// use actix_web::cookie::Key;
/// use clinic_console::inbound::http::session_config::fingerprint::key_fingerprint;
///
/// let fp = key_fingerprint(&Key::generate());
/// assert_eq!(fp.len(), 16);
/// assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
/// ```
#[must_use]
pub fn key_fingerprint(key: &Key) -> String {
    let digest = Sha256::digest(key.signing());
    hex::encode(&digest[..FINGERPRINT_BYTES])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn same_material_same_fingerprint() {
        let first = Key::derive_from(&[b'c'; 64]);
        let second = Key::derive_from(&[b'c'; 64]);
        assert_eq!(key_fingerprint(&first), key_fingerprint(&second));
    }

    #[rstest]
    #[case([b'a'; 64], [b'b'; 64])]
    #[case([0_u8; 64], [1_u8; 64])]
    fn different_material_differs(#[case] left: [u8; 64], #[case] right: [u8; 64]) {
        assert_ne!(
            key_fingerprint(&Key::derive_from(&left)),
            key_fingerprint(&Key::derive_from(&right))
        );
    }

    #[rstest]
    fn fingerprint_is_short_lowercase_hex() {
        let fp = key_fingerprint(&Key::generate());
        assert_eq!(fp.len(), FINGERPRINT_BYTES * 2);
        assert!(fp.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
    }

    #[rstest]
    fn fingerprint_is_a_digest_prefix() {
        let key = Key::derive_from(&[b'z'; 64]);
        let full = hex::encode(Sha256::digest(key.signing()));
        assert!(full.starts_with(&key_fingerprint(&key)));
    }
}
