//! Key derivation using HKDF-SHA256.
//!
//! Used to turn an Argon2id master key into the symmetric key that seals
//! a principal key file.

use hkdf::Hkdf;
use sha2::Sha256;

use crate::error::{RegistryError, Result};

/// HKDF info string for key file encryption. Must remain stable across
/// versions or existing key files become unreadable.
pub const KEY_FILE_CONTEXT: &str = "agent-trust-registry/key-file";

/// Derive a 32-byte child key from a root key and context string.
///
/// Uses HKDF-SHA256 (RFC 5869) with the root key as IKM and
/// the context as info.
pub fn derive_key(root_key_bytes: &[u8; 32], context: &str) -> Result<[u8; 32]> {
    let hk = Hkdf::<Sha256>::new(None, root_key_bytes);
    let mut output = [0u8; 32];
    hk.expand(context.as_bytes(), &mut output)
        .map_err(|e| RegistryError::DerivationFailed(format!("HKDF expand failed: {e}")))?;
    Ok(output)
}
