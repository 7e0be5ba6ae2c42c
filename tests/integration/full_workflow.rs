//! Integration test: full end-to-end workflow.
//!
//! Tests the complete lifecycle:
//! 1. Create principals and a persistent registry
//! 2. Register agents directly and through a relayer
//! 3. Record interactions and read reputation
//! 4. Add a verifier and attest capabilities
//! 5. Expire and revoke claims
//! 6. Deactivate an agent and reopen the registry from disk

use std::sync::Arc;

use agent_trust_registry::{
    generate_agent_id, generate_claim_hash, AgentType, ManualClock, PrincipalKey,
    RegistrationRequest, RegistryError, RegistryEvent, TrustRegistry,
};

const START: u64 = 1_700_000_000_000_000;
const HOUR: u64 = 3_600_000_000;

#[test]
fn full_workflow_registration_to_reload() {
    let dir = tempfile::tempdir().expect("tempdir");
    let clock = Arc::new(ManualClock::new(START));

    // ── Step 1: Principals and registry ─────────────────────────────────
    let admin = PrincipalKey::generate(Some("admin".into()));
    let alice = PrincipalKey::generate(Some("alice".into()));
    let bob = PrincipalKey::generate(Some("bob".into()));
    let relayer = PrincipalKey::generate(Some("relayer".into()));
    let verifier = PrincipalKey::generate(Some("verifier".into()));

    let registry = TrustRegistry::builder(admin.principal())
        .data_dir(dir.path())
        .clock(clock.clone())
        .build()
        .expect("registry should initialize");
    assert!(registry.is_trusted_verifier(&admin.principal()));

    // ── Step 2: Registration ────────────────────────────────────────────
    let scout = generate_agent_id("scout", &alice.principal());
    registry
        .register_agent(&alice.principal(), &scout, "ipfs://scout", AgentType::Autonomous)
        .expect("direct registration should succeed");

    let request = RegistrationRequest {
        agent_id: generate_agent_id("analyst", &bob.principal()),
        metadata_uri: "ipfs://analyst".into(),
        agent_type: AgentType::Mcp,
        owner: bob.principal(),
        deadline: START + HOUR,
    };
    let signature = request.sign(bob.signing_key(), &registry.registry_instance_id());
    let analyst = registry
        .register_agent_with_signature(&relayer.principal(), &request, &signature)
        .expect("relayed registration should succeed")
        .id;

    assert_eq!(registry.get_agents_by_owner(&bob.principal()), vec![analyst.clone()]);
    assert!(registry.get_agents_by_owner(&relayer.principal()).is_empty());

    // ── Step 3: Reputation ──────────────────────────────────────────────
    for weight in [10, 20, 30] {
        registry
            .record_interaction(&alice.principal(), &scout, &analyst, true, weight, "analysis")
            .expect("interaction should be recorded");
    }
    clock.advance(1_000);
    let summary = registry
        .record_interaction(&alice.principal(), &scout, &analyst, false, 50, "analysis")
        .expect("failed interaction should be recorded");
    assert_eq!(summary.score, 35);
    assert_eq!(summary.total_interactions, 4);
    assert_eq!(summary.success_rate, 75);

    let top = registry.get_top_agents(1);
    assert_eq!(top[0].agent_id, analyst);
    assert_eq!(top[0].score, 35);

    // ── Step 4: Capability claims ───────────────────────────────────────
    registry
        .add_verifier(&admin.principal(), &verifier.principal())
        .expect("admin can add verifier");
    let diagnosis = generate_claim_hash("medical-diagnosis");
    let translation = generate_claim_hash("translation");

    registry
        .verify_capability(
            &verifier.principal(),
            &analyst,
            &diagnosis,
            "ipfs://board-cert",
            registry.now() + HOUR,
        )
        .expect("verification should succeed");
    registry
        .verify_capability(&verifier.principal(), &analyst, &translation, "ipfs://t", 0)
        .expect("verification should succeed");
    assert!(registry.is_verified(&analyst, &diagnosis));
    assert!(registry.is_verified(&analyst, &translation));

    // ── Step 5: Expiry and revocation ───────────────────────────────────
    clock.advance(2 * HOUR);
    assert!(!registry.is_verified(&analyst, &diagnosis), "claim should expire");
    assert!(registry.is_verified(&analyst, &translation));

    let err = registry
        .revoke_capability(&alice.principal(), &analyst, &translation)
        .unwrap_err();
    assert!(matches!(err, RegistryError::NotAuthorized(_)));
    registry
        .revoke_capability(&verifier.principal(), &analyst, &translation)
        .expect("issuer can revoke");
    assert!(!registry.is_verified(&analyst, &translation));
    assert_eq!(
        registry.get_verifications(&analyst),
        vec![diagnosis.clone(), translation.clone()]
    );

    // ── Step 6: Deactivation and reload ─────────────────────────────────
    registry
        .deactivate_agent(&admin.principal(), &scout)
        .expect("admin can deactivate");
    let err = registry
        .record_interaction(&bob.principal(), &analyst, &scout, true, 5, "ping")
        .unwrap_err();
    assert!(matches!(err, RegistryError::AgentNotActive(_)));

    let kinds: Vec<&str> = registry
        .events_since(0)
        .iter()
        .map(|r| match r.event {
            RegistryEvent::AgentRegistered { .. } => "registered",
            RegistryEvent::InteractionRecorded { .. } => "interaction",
            RegistryEvent::VerifierAdded { .. } => "verifier",
            RegistryEvent::CapabilityVerified { .. } => "verified",
            RegistryEvent::CapabilityRevoked { .. } => "revoked",
            RegistryEvent::AgentDeactivated { .. } => "deactivated",
            _ => "other",
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            "registered",
            "registered",
            "interaction",
            "interaction",
            "interaction",
            "interaction",
            "verifier",
            "verified",
            "verified",
            "revoked",
            "deactivated",
        ]
    );

    let instance = registry.registry_instance_id();
    drop(registry);

    let reopened = TrustRegistry::builder(admin.principal())
        .data_dir(dir.path())
        .clock(clock.clone())
        .build()
        .expect("registry should reopen");
    assert_eq!(reopened.registry_instance_id(), instance);
    assert!(!reopened.is_agent_active(&scout));
    assert!(reopened.is_agent_active(&analyst));
    assert_eq!(reopened.get_reputation(&analyst).unwrap().score, 35);
    assert_eq!(reopened.get_interaction_history(&analyst, 0, 10).len(), 4);
    assert!(reopened.is_trusted_verifier(&verifier.principal()));
    assert!(!reopened.is_verified(&analyst, &translation));
    assert_eq!(reopened.get_verifications(&analyst).len(), 2);
    assert_eq!(reopened.get_top_agents(10).len(), 1);
}

#[test]
fn relayed_registration_replay_is_rejected() {
    let owner = PrincipalKey::generate(None);
    let registry = TrustRegistry::in_memory(PrincipalKey::generate(None).principal(), "inst-a");
    let request = RegistrationRequest {
        agent_id: generate_agent_id("bot", &owner.principal()),
        metadata_uri: "ipfs://bot".into(),
        agent_type: AgentType::Ai,
        owner: owner.principal(),
        deadline: u64::MAX,
    };
    let signature = request.sign(owner.signing_key(), "inst-a");
    let relayer = PrincipalKey::generate(None).principal();

    registry
        .register_agent_with_signature(&relayer, &request, &signature)
        .expect("first submission succeeds");
    let err = registry
        .register_agent_with_signature(&relayer, &request, &signature)
        .unwrap_err();
    assert!(matches!(err, RegistryError::AlreadyRegistered(_)));

    // Same signature on another registry instance.
    let other = TrustRegistry::in_memory(PrincipalKey::generate(None).principal(), "inst-b");
    let err = other
        .register_agent_with_signature(&relayer, &request, &signature)
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidSignature));
}
