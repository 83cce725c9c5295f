use sha2::{Digest, Sha256};

const CHARSET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const BASE: u32 = 62;

/// Length of [`digest_base62`] output: base62 digits needed to hold any
/// 256-bit value (62^43 > 2^256).
pub const HASH_CODE_LENGTH: usize = 43;

/// Stable base62 rendering of the SHA-256 digest of `input`.
///
/// The whole digest is treated as one 256-bit number and its digits are
/// emitted least significant first. A prefix of length `k` is therefore the
/// digest modulo 62^k, spread evenly over the full alphabet, and a longer
/// prefix always extends a shorter one.
pub fn digest_base62(input: &str) -> String {
    let mut value = [0u8; 32];
    value.copy_from_slice(&Sha256::digest(input.as_bytes()));

    let mut code = String::with_capacity(HASH_CODE_LENGTH);
    for _ in 0..HASH_CODE_LENGTH {
        // Long division of the big-endian bytes by 62, in place
        let mut remainder = 0u32;
        for byte in value.iter_mut() {
            let acc = (remainder << 8) | u32::from(*byte);
            *byte = (acc / BASE) as u8;
            remainder = acc % BASE;
        }
        code.push(CHARSET[remainder as usize] as char);
    }

    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_digest_base62_is_stable_and_alphanumeric() {
        let a = digest_base62("https://example.com/");
        let b = digest_base62("https://example.com/");
        assert_eq!(a, b);
        assert_eq!(a.len(), HASH_CODE_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, digest_base62("https://example.org/"));
    }

    #[test]
    fn test_digest_base62_known_value() {
        assert_eq!(
            digest_base62("https://example.com/"),
            "BitZUQ78Dwa4F5nUndMDGkIi1hphC2SGf2P1PBNnWZ3"
        );
    }

    #[test]
    fn test_leading_character_covers_whole_alphabet() {
        let leading: HashSet<char> = (0..2000)
            .filter_map(|i| digest_base62(&format!("https://example.com/{}", i)).chars().next())
            .collect();

        assert_eq!(leading.len(), CHARSET.len());
        assert!(leading.contains(&'z'));
    }
}
