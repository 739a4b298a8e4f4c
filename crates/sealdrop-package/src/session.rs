//! Caller-owned package secrets
//!
//! There is no client-global keycode registry: `create_package` hands the
//! caller a `PackageContext`, and every operation that needs the
//! passphrase takes it back by reference. Concurrent work on multiple
//! packages needs no shared state.

use secrecy::{ExposeSecret, SecretString};

use sealdrop_core::types::Package;
use sealdrop_core::{SdResult, SealdropError};

/// A package plus its client-only keycode.
pub struct PackageContext {
    pub package: Package,
    keycode: SecretString,
}

impl PackageContext {
    pub fn new(package: Package, keycode: SecretString) -> Self {
        Self { package, keycode }
    }

    pub fn keycode(&self) -> &str {
        self.keycode.expose_secret()
    }

    /// The segment cipher passphrase: server secret concatenated with the
    /// keycode. Neither half alone decrypts anything.
    pub fn passphrase(&self) -> SecretString {
        SecretString::from(format!(
            "{}{}",
            self.package.server_secret,
            self.keycode.expose_secret()
        ))
    }

    /// Checksum proving keycode possession to the server.
    pub fn access_checksum(&self) -> SdResult<String> {
        sealdrop_crypto::access_checksum(self.keycode(), &self.package.package_code)
            .map_err(SealdropError::Other)
    }
}

impl std::fmt::Debug for PackageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageContext")
            .field("package", &self.package.package_id)
            .field("keycode", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealdrop_crypto::generate_keycode;

    fn test_context() -> PackageContext {
        let package = Package {
            package_id: "PKG-1".into(),
            package_code: "PUBLIC-CODE".into(),
            server_secret: "SERVER-SECRET".into(),
            ..Package::default()
        };
        PackageContext::new(package, SecretString::from("k".repeat(43)))
    }

    #[test]
    fn passphrase_concatenates_secret_and_keycode() {
        let ctx = test_context();
        let expected = format!("SERVER-SECRET{}", "k".repeat(43));
        assert_eq!(ctx.passphrase().expose_secret(), expected);
    }

    #[test]
    fn checksum_matches_direct_derivation() {
        let keycode = generate_keycode();
        let mut ctx = test_context();
        ctx.keycode = SecretString::from(keycode.clone());
        let expected = sealdrop_crypto::access_checksum(&keycode, "PUBLIC-CODE").unwrap();
        assert_eq!(ctx.access_checksum().unwrap(), expected);
    }

    #[test]
    fn debug_redacts_keycode() {
        let rendered = format!("{:?}", test_context());
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("kkkk"));
    }
}
