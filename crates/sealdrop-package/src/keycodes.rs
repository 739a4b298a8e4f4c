//! Per-recipient keycode encryption
//!
//! Recipients that registered a public key receive the keycode encrypted
//! to that key (age X25519, armored ASCII), uploaded at finalize time.
//! This is the only form in which the keycode ever reaches the server.

use std::io::{Read, Write};

/// Encrypt the keycode to one recipient public key ("age1…").
pub fn encrypt_keycode(recipient_key: &str, keycode: &str) -> anyhow::Result<String> {
    use age::armor::{ArmoredWriter, Format};

    let recipient: age::x25519::Recipient = recipient_key
        .trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("parsing recipient public key: {e}"))?;
    let encryptor =
        age::Encryptor::with_recipients(std::iter::once(&recipient as &dyn age::Recipient))
            .map_err(|e| anyhow::anyhow!("building age encryptor: {e}"))?;

    let mut armored = Vec::new();
    let armor = ArmoredWriter::wrap_output(&mut armored, Format::AsciiArmor)
        .map_err(|e| anyhow::anyhow!("starting armored output: {e}"))?;
    let mut sealed = encryptor
        .wrap_output(armor)
        .map_err(|e| anyhow::anyhow!("sealing keycode: {e}"))?;
    sealed.write_all(keycode.as_bytes())?;
    let armor = sealed
        .finish()
        .map_err(|e| anyhow::anyhow!("finishing age stream: {e}"))?;
    armor
        .finish()
        .map_err(|e| anyhow::anyhow!("finishing armored output: {e}"))?;

    String::from_utf8(armored).map_err(|_| anyhow::anyhow!("armored output is not UTF-8"))
}

/// Recover a keycode encrypted to this client's identity ("AGE-SECRET-KEY-1…").
pub fn decrypt_keycode(identity_key: &str, armored: &str) -> anyhow::Result<String> {
    use age::armor::ArmoredReader;

    let identity: age::x25519::Identity = identity_key
        .trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("parsing identity key: {e}"))?;
    let decryptor = age::Decryptor::new(ArmoredReader::new(armored.as_bytes()))
        .map_err(|e| anyhow::anyhow!("reading armored keycode: {e}"))?;

    let mut reader = decryptor
        .decrypt(std::iter::once(&identity as &dyn age::Identity))
        .map_err(|e| anyhow::anyhow!("decrypting keycode: {e}"))?;
    let mut keycode = String::new();
    reader
        .read_to_string(&mut keycode)
        .map_err(|e| anyhow::anyhow!("reading decrypted keycode: {e}"))?;
    Ok(keycode)
}
