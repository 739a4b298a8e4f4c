//! Framed AES-256-GCM segment container
//!
//! Binary layout:
//! ```text
//! [16 bytes: PBKDF2 salt][8 bytes: nonce prefix][frame 0][frame 1]...
//! frame i = AES-256-GCM(key, nonce = prefix || i as u32 BE, ≤64 KiB plaintext) || 16-byte tag
//! ```
//!
//! The key is PBKDF2-HMAC-SHA256(passphrase, salt, 1024). Frames move
//! through a fixed 64 KiB working buffer, so peak memory does not grow with
//! segment size. Every frame tag is verified on decrypt; a single mismatch
//! fails the whole segment — ciphertext travels over a channel the cipher
//! itself must authenticate.
//!
//! A segment whose plaintext length is an exact multiple of the frame size
//! (including the empty segment) ends with an authenticated empty frame, so
//! truncating whole frames off the tail is always detected.

use std::io::{Read, Write};

use aes_gcm::{aead::Aead, Aes256Gcm, KeyInit, Nonce};
use rand::RngCore;
use zeroize::Zeroize;

use crate::kdf::derive_key;
use crate::PBKDF2_ITERATIONS;

/// Plaintext bytes carried by one frame.
pub const FRAME_SIZE: usize = 64 * 1024;

const SALT_SIZE: usize = 16;
const NONCE_PREFIX_SIZE: usize = 8;
const NONCE_SIZE: usize = 12;
const TAG_SIZE: usize = 16;
const HEADER_SIZE: usize = SALT_SIZE + NONCE_PREFIX_SIZE;

/// Exact ciphertext length for a plaintext of `len` bytes.
pub fn encrypted_len(len: u64) -> u64 {
    let frames = len / FRAME_SIZE as u64 + 1;
    HEADER_SIZE as u64 + len + frames * TAG_SIZE as u64
}

/// Encrypt everything `reader` yields into the framed container, writing
/// ciphertext to `writer`. Returns the number of ciphertext bytes written.
pub fn encrypt_stream(
    passphrase: &str,
    reader: &mut impl Read,
    writer: &mut impl Write,
) -> anyhow::Result<u64> {
    let mut salt = [0u8; SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);
    let mut prefix = [0u8; NONCE_PREFIX_SIZE];
    rand::thread_rng().fill_bytes(&mut prefix);

    let mut key = derive_key(passphrase.as_bytes(), &salt, PBKDF2_ITERATIONS)?;
    let cipher = Aes256Gcm::new_from_slice(&key)
        .map_err(|e| anyhow::anyhow!("creating AES-256-GCM cipher: {e}"))?;
    key.zeroize();

    writer.write_all(&salt)?;
    writer.write_all(&prefix)?;
    let mut written = HEADER_SIZE as u64;

    let mut buf = vec![0u8; FRAME_SIZE];
    let mut counter: u32 = 0;
    loop {
        let n = read_full(reader, &mut buf)?;
        let nonce = frame_nonce(&prefix, counter);
        let frame = cipher
            .encrypt(Nonce::from_slice(&nonce), &buf[..n])
            .map_err(|_| anyhow::anyhow!("frame encryption failed"))?;
        writer.write_all(&frame)?;
        written += frame.len() as u64;

        // A short (or empty) read is the final frame.
        if n < FRAME_SIZE {
            break;
        }
        counter = counter
            .checked_add(1)
            .ok_or_else(|| anyhow::anyhow!("segment too large: frame counter overflow"))?;
    }
    buf.zeroize();
    Ok(written)
}

/// Decrypt a framed container from `reader` into `writer`, verifying every
/// frame tag. Returns the number of plaintext bytes written.
pub fn decrypt_stream(
    passphrase: &str,
    reader: &mut impl Read,
    writer: &mut impl Write,
) -> anyhow::Result<u64> {
    let mut header = [0u8; HEADER_SIZE];
    if read_full(reader, &mut header)? != HEADER_SIZE {
        anyhow::bail!("segment truncated: missing header");
    }
    let mut salt = [0u8; SALT_SIZE];
    salt.copy_from_slice(&header[..SALT_SIZE]);
    let mut prefix = [0u8; NONCE_PREFIX_SIZE];
    prefix.copy_from_slice(&header[SALT_SIZE..]);

    let mut key = derive_key(passphrase.as_bytes(), &salt, PBKDF2_ITERATIONS)?;
    let cipher = Aes256Gcm::new_from_slice(&key)
        .map_err(|e| anyhow::anyhow!("creating AES-256-GCM cipher: {e}"))?;
    key.zeroize();

    // One frame of read-ahead decides whether the pending frame is interior
    // (must be full-sized) or final (carries the remainder).
    let mut pending = vec![0u8; FRAME_SIZE + TAG_SIZE];
    let mut pending_len = read_full(reader, &mut pending)?;
    if pending_len < TAG_SIZE {
        anyhow::bail!("segment truncated: no complete frame");
    }

    let mut counter: u32 = 0;
    let mut total = 0u64;
    loop {
        let mut next = vec![0u8; FRAME_SIZE + TAG_SIZE];
        let next_len = read_full(reader, &mut next)?;
        let is_last = next_len == 0;

        if !is_last && pending_len != FRAME_SIZE + TAG_SIZE {
            anyhow::bail!("malformed segment: short interior frame");
        }
        // Encryption always ends with a short (possibly empty) frame, so a
        // stream ending on a full frame lost its tail.
        if is_last && pending_len == FRAME_SIZE + TAG_SIZE {
            anyhow::bail!("segment truncated: stream ends on a full frame");
        }

        let nonce = frame_nonce(&prefix, counter);
        let mut plaintext = cipher
            .decrypt(Nonce::from_slice(&nonce), &pending[..pending_len])
            .map_err(|_| {
                anyhow::anyhow!("segment verification failed: authentication tag mismatch")
            })?;
        writer.write_all(&plaintext)?;
        total += plaintext.len() as u64;
        plaintext.zeroize();

        if is_last {
            break;
        }
        if next_len < TAG_SIZE {
            anyhow::bail!("segment truncated: trailing partial frame");
        }
        pending = next;
        pending_len = next_len;
        counter = counter
            .checked_add(1)
            .ok_or_else(|| anyhow::anyhow!("segment too large: frame counter overflow"))?;
    }
    Ok(total)
}

/// Encrypt an in-memory segment. See [`encrypt_stream`] for the format.
pub fn encrypt_segment(passphrase: &str, plaintext: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(encrypted_len(plaintext.len() as u64) as usize);
    let mut input = plaintext;
    encrypt_stream(passphrase, &mut input, &mut out)?;
    Ok(out)
}

/// Decrypt an in-memory segment, verifying every frame tag.
pub fn decrypt_segment(passphrase: &str, ciphertext: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(ciphertext.len());
    let mut input = ciphertext;
    decrypt_stream(passphrase, &mut input, &mut out)?;
    Ok(out)
}

/// Encrypt a text payload for transport inside JSON: framed ciphertext,
/// base64-encoded (standard alphabet).
pub fn encrypt_message(passphrase: &str, text: &str) -> anyhow::Result<String> {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    let ciphertext = encrypt_segment(passphrase, text.as_bytes())?;
    Ok(STANDARD.encode(ciphertext))
}

/// Decrypt a base64 message payload produced by [`encrypt_message`].
pub fn decrypt_message(passphrase: &str, encoded: &str) -> anyhow::Result<String> {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    let ciphertext = STANDARD
        .decode(encoded)
        .map_err(|e| anyhow::anyhow!("base64 decode: {e}"))?;
    let plaintext = decrypt_segment(passphrase, &ciphertext)?;
    String::from_utf8(plaintext)
        .map_err(|_| anyhow::anyhow!("decrypted message is not valid UTF-8"))
}

fn frame_nonce(prefix: &[u8; NONCE_PREFIX_SIZE], counter: u32) -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    nonce[..NONCE_PREFIX_SIZE].copy_from_slice(prefix);
    nonce[NONCE_PREFIX_SIZE..].copy_from_slice(&counter.to_be_bytes());
    nonce
}

/// Read until `buf` is full or the reader is exhausted.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSPHRASE: &str = "server-secret-part_client-keycode-part";

    #[test]
    fn roundtrip_small() {
        let plaintext = b"hello, encrypted segment";
        let encrypted = encrypt_segment(PASSPHRASE, plaintext).unwrap();
        let decrypted = decrypt_segment(PASSPHRASE, &encrypted).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn roundtrip_empty() {
        let encrypted = encrypt_segment(PASSPHRASE, b"").unwrap();
        assert_eq!(encrypted.len() as u64, encrypted_len(0));
        let decrypted = decrypt_segment(PASSPHRASE, &encrypted).unwrap();
        assert!(decrypted.is_empty());
    }

    #[test]
    fn roundtrip_frame_boundaries() {
        for len in [
            FRAME_SIZE - 1,
            FRAME_SIZE,
            FRAME_SIZE + 1,
            2 * FRAME_SIZE,
            2 * FRAME_SIZE + 7,
        ] {
            let plaintext: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let encrypted = encrypt_segment(PASSPHRASE, &plaintext).unwrap();
            assert_eq!(
                encrypted.len() as u64,
                encrypted_len(len as u64),
                "ciphertext length for {len}-byte plaintext"
            );
            let decrypted = decrypt_segment(PASSPHRASE, &encrypted).unwrap();
            assert_eq!(decrypted, plaintext, "roundtrip for {len}-byte plaintext");
        }
    }

    #[test]
    fn wrong_passphrase_fails() {
        let encrypted = encrypt_segment(PASSPHRASE, b"secret data").unwrap();
        assert!(decrypt_segment("some-other-passphrase", &encrypted).is_err());
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let mut encrypted = encrypt_segment(PASSPHRASE, b"secret data").unwrap();
        // Flip a bit in the frame body (past the header)
        encrypted[HEADER_SIZE + 2] ^= 0x01;
        assert!(decrypt_segment(PASSPHRASE, &encrypted).is_err());
    }

    #[test]
    fn tampered_tag_fails() {
        let mut encrypted = encrypt_segment(PASSPHRASE, b"secret data").unwrap();
        let last = encrypted.len() - 1;
        encrypted[last] ^= 0x01;
        assert!(decrypt_segment(PASSPHRASE, &encrypted).is_err());
    }

    #[test]
    fn truncated_ciphertext_fails() {
        let plaintext = vec![7u8; FRAME_SIZE + 100];
        let encrypted = encrypt_segment(PASSPHRASE, &plaintext).unwrap();
        // Drop the entire final frame: the interior frame still authenticates,
        // but the stream must not decrypt to a shorter plaintext.
        let cut = HEADER_SIZE + FRAME_SIZE + TAG_SIZE;
        assert!(
            decrypt_segment(PASSPHRASE, &encrypted[..cut]).is_err(),
            "dropping the final frame must fail, not yield partial plaintext"
        );
    }

    #[test]
    fn truncated_header_fails() {
        let encrypted = encrypt_segment(PASSPHRASE, b"payload").unwrap();
        assert!(decrypt_segment(PASSPHRASE, &encrypted[..HEADER_SIZE - 1]).is_err());
        assert!(decrypt_segment(PASSPHRASE, &encrypted[..HEADER_SIZE + 3]).is_err());
    }

    #[test]
    fn ciphertexts_differ_per_encryption() {
        // Fresh salt and nonce prefix every time
        let a = encrypt_segment(PASSPHRASE, b"same input").unwrap();
        let b = encrypt_segment(PASSPHRASE, b"same input").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn message_roundtrip() {
        let encoded = encrypt_message(PASSPHRASE, "shhh, this is a package note").unwrap();
        // Transportable inside JSON
        assert!(encoded.chars().all(|c| c.is_ascii()));
        let decoded = decrypt_message(PASSPHRASE, &encoded).unwrap();
        assert_eq!(decoded, "shhh, this is a package note");
    }

    #[test]
    fn message_rejects_bad_base64() {
        assert!(decrypt_message(PASSPHRASE, "not//valid==base64!!").is_err());
    }
}
