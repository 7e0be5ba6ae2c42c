//! Passphrase sealing for principal key files.
//!
//! Argon2id stretches the passphrase into a master key; ChaCha20-Poly1305
//! seals the payload under a fresh 12-byte nonce.

use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};

use crate::crypto::random::random_nonce_12;
use crate::error::{RegistryError, Result};

const ARGON2_M_COST: u32 = 65536; // 64 MiB
const ARGON2_T_COST: u32 = 3;
const ARGON2_P_COST: u32 = 4;

/// Ciphertext plus the nonce it was sealed under.
#[derive(Debug, Clone)]
pub struct SealedBox {
    pub nonce: [u8; 12],
    pub ciphertext: Vec<u8>,
}

/// Derive a 32-byte master key from a passphrase with Argon2id.
pub fn derive_passphrase_key(passphrase: &[u8], salt: &[u8; 16]) -> Result<[u8; 32]> {
    let params = Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, Some(32))
        .map_err(|e| RegistryError::DerivationFailed(format!("Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = [0u8; 32];
    argon2
        .hash_password_into(passphrase, salt, &mut output)
        .map_err(|e| RegistryError::DerivationFailed(format!("Argon2 hash: {e}")))?;

    Ok(output)
}

/// Seal `plaintext` under `key` with a random nonce.
pub fn seal(key: &[u8; 32], plaintext: &[u8]) -> Result<SealedBox> {
    let nonce = random_nonce_12();
    let cipher = ChaCha20Poly1305::new_from_slice(key)
        .map_err(|e| RegistryError::EncryptionFailed(format!("cipher init: {e}")))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| RegistryError::EncryptionFailed(format!("encrypt: {e}")))?;
    Ok(SealedBox { nonce, ciphertext })
}

/// Open a sealed box.
///
/// An authentication failure means the key was derived from the wrong
/// passphrase (or the file was tampered with) and is reported as
/// `InvalidPassphrase`.
pub fn open(key: &[u8; 32], sealed: &SealedBox) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new_from_slice(key)
        .map_err(|e| RegistryError::DecryptionFailed(format!("cipher init: {e}")))?;
    cipher
        .decrypt(Nonce::from_slice(&sealed.nonce), sealed.ciphertext.as_slice())
        .map_err(|_| RegistryError::InvalidPassphrase)
}
