//! .akey file format: encrypted principal key storage.
//!
//! An `.akey` file holds a principal's Ed25519 signing key sealed with
//! ChaCha20-Poly1305 under a key derived from a passphrase, next to the
//! plaintext principal string so it can be read without the passphrase.
//!
//! File format (JSON):
//! ```json
//! {
//!     "version": 1,
//!     "format": "akey-v1",
//!     "encryption": {
//!         "algorithm": "chacha20-poly1305",
//!         "kdf": "argon2id",
//!         "salt": "<base64-16-bytes>",
//!         "nonce": "<base64-12-bytes>"
//!     },
//!     "encrypted_key": "<base64-ciphertext>",
//!     "principal": "apr_...",
//!     "name": "alice",
//!     "created_at": 1700000000000000
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::crypto::encryption::SealedBox;
use crate::crypto::{derivation, encryption, random};
use crate::error::{RegistryError, Result};
use crate::identity::{Principal, PrincipalKey};

use super::registry_store::write_atomic;

// ── File format constants ─────────────────────────────────────────────────────

const AKEY_VERSION: u32 = 1;
const AKEY_FORMAT: &str = "akey-v1";
const AKEY_ALGORITHM: &str = "chacha20-poly1305";
const AKEY_KDF: &str = "argon2id";

// ── On-disk structures ────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct KeyFile {
    pub version: u32,
    pub format: String,
    pub encryption: EncryptionMetadata,
    /// Base64 ciphertext of the 32 signing key bytes.
    pub encrypted_key: String,
    pub principal: Principal,
    pub name: Option<String>,
    pub created_at: u64,
}

/// Parameters needed to reopen the sealed key.
#[derive(Debug, Serialize, Deserialize)]
pub struct EncryptionMetadata {
    pub algorithm: String,
    pub kdf: String,
    /// Base64 Argon2id salt (16 bytes).
    pub salt: String,
    /// Base64 ChaCha20-Poly1305 nonce (12 bytes).
    pub nonce: String,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Write `key` to `path`, sealed with `passphrase`.
///
/// # Errors
///
/// `DerivationFailed` or `EncryptionFailed` from the crypto layer, `Io`
/// for filesystem errors.
pub fn save_principal_key(key: &PrincipalKey, path: &Path, passphrase: &str) -> Result<()> {
    let salt = random::random_salt_16();
    let mut file_key = derive_file_key(passphrase, &salt)?;

    let mut signing_bytes = key.signing_key_bytes();
    let sealed = encryption::seal(&file_key, &signing_bytes);
    signing_bytes.zeroize();
    file_key.zeroize();
    let sealed = sealed?;

    let key_file = KeyFile {
        version: AKEY_VERSION,
        format: AKEY_FORMAT.to_string(),
        encryption: EncryptionMetadata {
            algorithm: AKEY_ALGORITHM.to_string(),
            kdf: AKEY_KDF.to_string(),
            salt: b64_encode(&salt),
            nonce: b64_encode(&sealed.nonce),
        },
        encrypted_key: b64_encode(&sealed.ciphertext),
        principal: key.principal(),
        name: key.name.clone(),
        created_at: key.created_at,
    };

    let json = serde_json::to_string_pretty(&key_file)
        .map_err(|e| RegistryError::SerializationError(e.to_string()))?;
    write_atomic(path, json.as_bytes())?;

    log::debug!("saved principal key {} to {}", key_file.principal, path.display());
    Ok(())
}

/// Load and unseal a principal key.
///
/// # Errors
///
/// `InvalidPassphrase` when the passphrase is wrong, `InvalidFileFormat`
/// for malformed files, `Io` for filesystem errors.
pub fn load_principal_key(path: &Path, passphrase: &str) -> Result<PrincipalKey> {
    let key_file = read_key_file(path)?;

    let salt: [u8; 16] = b64_decode(&key_file.encryption.salt, "salt")?
        .try_into()
        .map_err(|_| RegistryError::InvalidFileFormat("salt must be 16 bytes".into()))?;
    let nonce: [u8; 12] = b64_decode(&key_file.encryption.nonce, "nonce")?
        .try_into()
        .map_err(|_| RegistryError::InvalidFileFormat("nonce must be 12 bytes".into()))?;
    let ciphertext = b64_decode(&key_file.encrypted_key, "encrypted_key")?;

    let mut file_key = derive_file_key(passphrase, &salt)?;
    let opened = encryption::open(&file_key, &SealedBox { nonce, ciphertext });
    file_key.zeroize();
    let mut plaintext = opened?;

    let signing_bytes: Result<[u8; 32]> = plaintext
        .as_slice()
        .try_into()
        .map_err(|_| RegistryError::InvalidFileFormat("signing key must be 32 bytes".into()));
    plaintext.zeroize();
    let mut signing_bytes = signing_bytes?;

    let key = PrincipalKey::from_parts(&signing_bytes, key_file.created_at, key_file.name);
    signing_bytes.zeroize();

    if key.principal() != key_file.principal {
        return Err(RegistryError::InvalidFileFormat(
            "stored principal does not match the sealed key".into(),
        ));
    }
    Ok(key)
}

/// Read the principal named by a key file without decrypting it.
pub fn read_principal(path: &Path) -> Result<Principal> {
    Ok(read_key_file(path)?.principal)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn read_key_file(path: &Path) -> Result<KeyFile> {
    let bytes = std::fs::read(path)?;
    let key_file: KeyFile = serde_json::from_slice(&bytes)
        .map_err(|e| RegistryError::InvalidFileFormat(format!("failed to parse .akey file: {e}")))?;

    if key_file.version != AKEY_VERSION || key_file.format != AKEY_FORMAT {
        return Err(RegistryError::InvalidFileFormat(format!(
            "unsupported .akey file version={} format={}",
            key_file.version, key_file.format,
        )));
    }
    Ok(key_file)
}

/// passphrase → Argon2id(salt) → HKDF-SHA256(KEY_FILE_CONTEXT)
fn derive_file_key(passphrase: &str, salt: &[u8; 16]) -> Result<[u8; 32]> {
    let mut master = encryption::derive_passphrase_key(passphrase.as_bytes(), salt)?;
    let derived = derivation::derive_key(&master, derivation::KEY_FILE_CONTEXT);
    master.zeroize();
    derived
}

fn b64_encode(bytes: &[u8]) -> String {
    base64::Engine::encode(&base64::engine::general_purpose::STANDARD, bytes)
}

fn b64_decode(value: &str, field: &str) -> Result<Vec<u8>> {
    base64::Engine::decode(&base64::engine::general_purpose::STANDARD, value)
        .map_err(|e| RegistryError::InvalidFileFormat(format!("invalid {field} base64: {e}")))
}
