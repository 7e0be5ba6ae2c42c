//! Trusted verifiers and capability claims.

use crate::error::{RegistryError, Result};
use crate::identity::{AgentId, Principal};
use crate::verification::{ClaimHash, Verification};

use super::guard::{require_active, require_admin, require_known, require_trusted_verifier};
use super::{RegistryEvent, TrustRegistry};

impl TrustRegistry {
    // ── Verifier set ──────────────────────────────────────────────────────────

    /// Trust `verifier` to issue and revoke claims. Admin only.
    ///
    /// Returns `false` if the principal was already trusted.
    pub fn add_verifier(&self, caller: &Principal, verifier: &Principal) -> Result<bool> {
        let mut state = self.write();
        require_admin(&state.config, caller, "add_verifier")?;
        if state.verifiers.contains(verifier) {
            return Ok(false);
        }

        let mut verifiers = state.verifiers.clone();
        verifiers.add(verifier.clone());
        self.persist(|txn| txn.save_verifiers(&verifiers))?;

        state.verifiers = verifiers;
        let now = self.clock.now_micros();
        state.events.push(
            now,
            RegistryEvent::VerifierAdded {
                verifier: verifier.clone(),
            },
        );
        log::info!("added trusted verifier {verifier}");
        Ok(true)
    }

    /// Stop trusting `verifier`. Admin only.
    ///
    /// Claims it already issued stay as they are. Returns `false` if the
    /// principal was not trusted.
    pub fn remove_verifier(&self, caller: &Principal, verifier: &Principal) -> Result<bool> {
        let mut state = self.write();
        require_admin(&state.config, caller, "remove_verifier")?;
        if !state.verifiers.contains(verifier) {
            return Ok(false);
        }

        let mut verifiers = state.verifiers.clone();
        verifiers.remove(verifier);
        self.persist(|txn| txn.save_verifiers(&verifiers))?;

        state.verifiers = verifiers;
        let now = self.clock.now_micros();
        state.events.push(
            now,
            RegistryEvent::VerifierRemoved {
                verifier: verifier.clone(),
            },
        );
        log::info!("removed trusted verifier {verifier}");
        Ok(true)
    }

    pub fn is_trusted_verifier(&self, principal: &Principal) -> bool {
        self.read().verifiers.contains(principal)
    }

    /// Trusted verifiers in sorted order.
    pub fn verifiers(&self) -> Vec<Principal> {
        self.read().verifiers.members()
    }

    // ── Claims ────────────────────────────────────────────────────────────────

    /// Attest that `agent_id` holds `claim`, replacing any earlier record
    /// for the same claim.
    ///
    /// `expires_at` is 0 for a claim that never expires, otherwise a time
    /// strictly after now.
    ///
    /// # Errors
    ///
    /// `NotTrustedVerifier`, `AgentNotActive`, `InvalidExpiry`.
    pub fn verify_capability(
        &self,
        caller: &Principal,
        agent_id: &AgentId,
        claim: &ClaimHash,
        claim_uri: &str,
        expires_at: u64,
    ) -> Result<Verification> {
        let mut state = self.write();
        require_trusted_verifier(&state.verifiers, caller)?;
        require_active(state.agents.get(agent_id), agent_id)?;
        claim.validate()?;

        let now = self.clock.now_micros();
        if expires_at != 0 && expires_at <= now {
            return Err(RegistryError::InvalidExpiry { expires_at, now });
        }

        let verification = Verification {
            verifier: caller.clone(),
            claim: claim.clone(),
            claim_uri: claim_uri.to_string(),
            verified_at: now,
            expires_at,
            is_valid: true,
        };
        let mut claims = state.claim_index.get(agent_id).cloned().unwrap_or_default();
        claims.push(claim.clone());

        self.persist(|txn| {
            txn.save_verification(agent_id, &verification)?;
            txn.save_claim_index(agent_id, &claims)
        })?;

        state
            .verifications
            .entry(agent_id.clone())
            .or_default()
            .insert(claim.clone(), verification.clone());
        state.claim_index.insert(agent_id.clone(), claims);
        state.events.push(
            now,
            RegistryEvent::CapabilityVerified {
                agent_id: agent_id.clone(),
                claim: claim.clone(),
                verifier: caller.clone(),
                expires_at,
            },
        );
        log::info!("{caller} verified claim {claim} for {agent_id}");
        Ok(verification)
    }

    /// Invalidate a claim. Only the verifier that issued the current
    /// record, or the admin, may revoke.
    ///
    /// Revoking an already revoked claim succeeds without changes. The
    /// claim index is left untouched.
    pub fn revoke_capability(
        &self,
        caller: &Principal,
        agent_id: &AgentId,
        claim: &ClaimHash,
    ) -> Result<()> {
        let mut state = self.write();
        require_known(state.agents.get(agent_id), agent_id)?;
        let record = state
            .verifications
            .get(agent_id)
            .and_then(|by_claim| by_claim.get(claim))
            .ok_or_else(|| RegistryError::VerificationNotFound {
                agent: agent_id.0.clone(),
                claim: claim.0.clone(),
            })?;

        if &record.verifier != caller && caller != &state.config.admin {
            log::warn!(
                "{caller} rejected: cannot revoke claim {claim} issued by {}",
                record.verifier
            );
            return Err(RegistryError::NotAuthorized(format!(
                "only the issuing verifier or admin may revoke {claim}"
            )));
        }
        if !record.is_valid {
            return Ok(());
        }

        let mut revoked = record.clone();
        revoked.is_valid = false;
        self.persist(|txn| txn.save_verification(agent_id, &revoked))?;

        state
            .verifications
            .entry(agent_id.clone())
            .or_default()
            .insert(claim.clone(), revoked);
        let now = self.clock.now_micros();
        state.events.push(
            now,
            RegistryEvent::CapabilityRevoked {
                agent_id: agent_id.clone(),
                claim: claim.clone(),
                by: caller.clone(),
            },
        );
        log::info!("{caller} revoked claim {claim} for {agent_id}");
        Ok(())
    }

    /// Whether the claim is valid and unexpired right now.
    pub fn is_verified(&self, agent_id: &AgentId, claim: &ClaimHash) -> bool {
        let now = self.clock.now_micros();
        self.read()
            .verifications
            .get(agent_id)
            .and_then(|by_claim| by_claim.get(claim))
            .is_some_and(|v| v.is_current(now))
    }

    /// Every claim ever verified for the agent, in issue order.
    ///
    /// Re-verified claims appear once per issue; revoked and expired claims
    /// are still listed.
    pub fn get_verifications(&self, agent_id: &AgentId) -> Vec<ClaimHash> {
        self.read()
            .claim_index
            .get(agent_id)
            .cloned()
            .unwrap_or_default()
    }

    /// The stored record for a claim, whatever its validity.
    pub fn get_verification_details(
        &self,
        agent_id: &AgentId,
        claim: &ClaimHash,
    ) -> Option<Verification> {
        self.read()
            .verifications
            .get(agent_id)
            .and_then(|by_claim| by_claim.get(claim))
            .cloned()
    }
}
