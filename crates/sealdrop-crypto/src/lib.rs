//! sealdrop-crypto: key derivation and the segment cipher
//!
//! Key material:
//! ```text
//! keycode    (client CSPRNG, URL-safe base64, never sent to the server in plaintext)
//! passphrase = server_secret || keycode
//!   ├── segment key:     PBKDF2-HMAC-SHA256(passphrase, salt = random 16B, 1024) → AES-256-GCM
//!   └── access checksum: PBKDF2-HMAC-SHA256(keycode, salt = package_code, 1024) → hex
//! ```
//!
//! The checksum proves keycode possession to the server without revealing
//! it; its parameters are fixed by the wire protocol and must never change.

pub mod kdf;
pub mod segment;

pub use kdf::{access_checksum, generate_keycode, pbkdf2_hex, sign, validate_keycode};
pub use segment::{
    decrypt_message, decrypt_segment, encrypt_message, encrypt_segment, encrypted_len,
};

/// PBKDF2 iteration count fixed by the protocol.
pub const PBKDF2_ITERATIONS: u32 = 1024;

/// Derived key size in bytes (AES-256).
pub const KEY_SIZE: usize = 32;
