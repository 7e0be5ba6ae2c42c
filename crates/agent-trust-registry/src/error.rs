//! Error types for the trust registry.
//!
//! Every rejected operation surfaces one of these variants synchronously
//! and leaves registry state untouched. Private key material is never
//! included in error messages.

/// Registry error types covering all operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Agent already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Caller does not own agent {0}")]
    NotAgentOwner(String),

    #[error("Agent not active: {0}")]
    AgentNotActive(String),

    #[error("Agent already inactive: {0}")]
    AlreadyInactive(String),

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Invalid interaction weight {0}: must be within 1..=100")]
    InvalidWeight(u32),

    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid agent type: {0}")]
    InvalidAgentType(String),

    #[error("Registration signature expired at {deadline} (now {now})")]
    SignatureExpired { deadline: u64, now: u64 },

    #[error("Registration signature invalid")]
    InvalidSignature,

    #[error("Caller is not a trusted verifier: {0}")]
    NotTrustedVerifier(String),

    #[error("Invalid expiry {expires_at}: must be 0 or after {now}")]
    InvalidExpiry { expires_at: u64, now: u64 },

    #[error("Caller not authorized: {0}")]
    NotAuthorized(String),

    #[error("Verification not found for agent {agent} claim {claim}")]
    VerificationNotFound { agent: String, claim: String },

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid passphrase")]
    InvalidPassphrase,

    #[error("Key derivation failed: {0}")]
    DerivationFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Registry directory {0} is locked by another open registry")]
    RegistryLocked(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, RegistryError>;
