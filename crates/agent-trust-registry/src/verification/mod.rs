//! Verification registry types: capability claims and trusted verifiers.

pub mod claim;
pub mod verifiers;

pub use claim::{generate_claim_hash, ClaimHash, Verification};
pub use verifiers::VerifierSet;
