//! Keycode generation, PBKDF2 derivation, and HMAC request signing

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::{KEY_SIZE, PBKDF2_ITERATIONS};

type HmacSha256 = Hmac<Sha256>;

/// Generate a fresh keycode: 32 cryptographically random bytes, URL-safe
/// base64, no padding.
pub fn generate_keycode() -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    let mut bytes = [0u8; KEY_SIZE];
    rand::thread_rng().fill_bytes(&mut bytes);
    let keycode = URL_SAFE_NO_PAD.encode(bytes);
    bytes.zeroize();
    keycode
}

/// Keycodes must be present and at least 32 characters long before any
/// call that derives server-visible material from them.
pub fn validate_keycode(keycode: &str) -> anyhow::Result<()> {
    if keycode.is_empty() {
        anyhow::bail!("keycode is empty");
    }
    if keycode.len() < 32 {
        anyhow::bail!(
            "keycode too short: {} characters (minimum 32)",
            keycode.len()
        );
    }
    Ok(())
}

/// PBKDF2-HMAC-SHA256 with a fixed 32-byte output, hex-encoded.
///
/// Deterministic for identical inputs. The server compares checksums
/// derived this way, so the output length and PRF are part of the wire
/// protocol.
pub fn pbkdf2_hex(value: &str, salt: &str, iterations: u32) -> anyhow::Result<String> {
    let mut okm = derive_key(value.as_bytes(), salt.as_bytes(), iterations)?;
    let encoded = hex::encode(okm);
    okm.zeroize();
    Ok(encoded)
}

/// Proof-of-keycode checksum: PBKDF2(keycode, salt = package code, 1024).
/// Authorizes finalize and message retrieval without revealing the keycode.
pub fn access_checksum(keycode: &str, package_code: &str) -> anyhow::Result<String> {
    pbkdf2_hex(keycode, package_code, PBKDF2_ITERATIONS)
}

/// Raw 32-byte PBKDF2 output (segment cipher key material).
pub(crate) fn derive_key(
    value: &[u8],
    salt: &[u8],
    iterations: u32,
) -> anyhow::Result<[u8; KEY_SIZE]> {
    let mut okm = [0u8; KEY_SIZE];
    pbkdf2::pbkdf2::<HmacSha256>(value, salt, iterations, &mut okm)
        .map_err(|e| anyhow::anyhow!("PBKDF2 derivation failed: {e}"))?;
    Ok(okm)
}

/// HMAC-SHA256 over `data`, keyed by `key`, hex-encoded.
pub fn sign(key: &str, data: &str) -> anyhow::Result<String> {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|e| anyhow::anyhow!("HMAC key setup failed: {e}"))?;
    mac.update(data.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keycode_shape() {
        let keycode = generate_keycode();
        // 32 bytes of unpadded base64 is 43 characters
        assert_eq!(keycode.len(), 43);
        assert!(keycode
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn keycodes_are_unique() {
        assert_ne!(generate_keycode(), generate_keycode());
    }

    #[test]
    fn keycode_validation() {
        assert!(validate_keycode(&generate_keycode()).is_ok());
        assert!(validate_keycode("").is_err());
        assert!(validate_keycode("too-short").is_err());
        assert!(validate_keycode(&"a".repeat(31)).is_err());
        assert!(validate_keycode(&"a".repeat(32)).is_ok());
    }

    #[test]
    fn pbkdf2_is_deterministic() {
        let a = pbkdf2_hex("keycode-value", "PKG-CODE", 1024).unwrap();
        let b = pbkdf2_hex("keycode-value", "PKG-CODE", 1024).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64, "32 bytes hex-encoded");
    }

    #[test]
    fn pbkdf2_changes_with_any_input() {
        let base = pbkdf2_hex("value", "salt", 1024).unwrap();
        assert_ne!(base, pbkdf2_hex("value2", "salt", 1024).unwrap());
        assert_ne!(base, pbkdf2_hex("value", "salt2", 1024).unwrap());
        assert_ne!(base, pbkdf2_hex("value", "salt", 2048).unwrap());
    }

    #[test]
    fn checksum_matches_raw_derivation() {
        let checksum = access_checksum("the-keycode", "PKG").unwrap();
        assert_eq!(checksum, pbkdf2_hex("the-keycode", "PKG", 1024).unwrap());
    }

    #[test]
    fn sign_is_deterministic_hex() {
        let a = sign("secret", "payload").unwrap();
        let b = sign("secret", "payload").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn sign_depends_on_key_and_data() {
        let base = sign("secret", "payload").unwrap();
        assert_ne!(base, sign("secret2", "payload").unwrap());
        assert_ne!(base, sign("secret", "payload2").unwrap());
    }
}
