//! Edge cases: boundary weights, identifier limits, unknown records,
//! lazy expiry at exact boundaries, and rejected calls leaving no trace.

use std::sync::Arc;

use agent_trust_registry::{
    generate_claim_hash, AgentId, AgentType, ManualClock, Principal, RegistryError,
    TrustRegistry,
};

const START: u64 = 1_700_000_000_000_000;

fn admin() -> Principal {
    Principal::from("apr_admin")
}

fn owner() -> Principal {
    Principal::from("apr_owner")
}

fn registry_with_agents() -> (TrustRegistry, Arc<ManualClock>, AgentId, AgentId) {
    let clock = Arc::new(ManualClock::new(START));
    let registry = TrustRegistry::builder(admin())
        .registry_instance_id("edge")
        .clock(clock.clone())
        .build()
        .expect("build");
    let a = AgentId::from("agent-a");
    let b = AgentId::from("agent-b");
    for id in [&a, &b] {
        registry
            .register_agent(&owner(), id, "ipfs://x", AgentType::Ai)
            .expect("register");
    }
    (registry, clock, a, b)
}

#[test]
fn edge_weight_boundaries() {
    let (registry, _, a, b) = registry_with_agents();
    for (weight, ok) in [(0, false), (1, true), (100, true), (101, false)] {
        let result = registry.record_interaction(&owner(), &a, &b, false, weight, "edge");
        assert_eq!(result.is_ok(), ok, "weight {weight}");
    }
    // Failure with weight 1 costs nothing; weight 100 costs 50.
    assert_eq!(registry.get_reputation(&b).unwrap().score, -50);
    assert_eq!(registry.get_reputation(&b).unwrap().total_interactions, 2);
    assert_eq!(registry.get_reputation(&b).unwrap().success_rate, 0);
}

#[test]
fn edge_identifier_limits() {
    let registry = TrustRegistry::in_memory(admin(), "ids");
    let longest = AgentId("a".repeat(128));
    let too_long = AgentId("a".repeat(129));

    registry
        .register_agent(&owner(), &longest, "ipfs://x", AgentType::Ai)
        .expect("128 chars is allowed");
    for bad in [
        too_long,
        AgentId::from(""),
        AgentId::from("has space"),
        AgentId::from("a/b"),
    ] {
        let err = registry
            .register_agent(&owner(), &bad, "ipfs://x", AgentType::Ai)
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidIdentifier(_)), "{bad}");
    }
    assert_eq!(registry.agent_count(), 1);
}

#[test]
fn edge_self_interaction_allowed() {
    let (registry, _, a, _) = registry_with_agents();
    let rep = registry
        .record_interaction(&owner(), &a, &a, true, 7, "self")
        .expect("self interaction");
    assert_eq!(rep.score, 7);
}

#[test]
fn edge_inactive_source_still_records() {
    let (registry, _, a, b) = registry_with_agents();
    registry.deactivate_agent(&owner(), &a).expect("deactivate");
    // Only the target must be active.
    registry
        .record_interaction(&owner(), &a, &b, true, 3, "late")
        .expect("inactive source may still report");
    assert_eq!(registry.get_reputation(&b).unwrap().score, 3);
}

#[test]
fn edge_expiry_exact_boundary() {
    let (registry, clock, a, _) = registry_with_agents();
    let claim = generate_claim_hash("boundary");

    let err = registry
        .verify_capability(&admin(), &a, &claim, "ipfs://p", START)
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidExpiry { .. }));

    registry
        .verify_capability(&admin(), &a, &claim, "ipfs://p", START + 1)
        .expect("one microsecond ahead is valid");
    assert!(registry.is_verified(&a, &claim));
    clock.advance(1);
    assert!(!registry.is_verified(&a, &claim));

    // Re-verifying an expired claim makes it current again.
    registry
        .verify_capability(&admin(), &a, &claim, "ipfs://p2", 0)
        .expect("re-verify");
    assert!(registry.is_verified(&a, &claim));
}

#[test]
fn edge_deactivated_agent_keeps_claims() {
    let (registry, _, a, _) = registry_with_agents();
    let claim = generate_claim_hash("kept");
    registry
        .verify_capability(&admin(), &a, &claim, "ipfs://p", 0)
        .expect("verify");
    registry.deactivate_agent(&admin(), &a).expect("deactivate");

    // The record survives deactivation; no new claims can be added.
    assert!(registry.is_verified(&a, &claim));
    let err = registry
        .verify_capability(&admin(), &a, &generate_claim_hash("new"), "ipfs://p", 0)
        .unwrap_err();
    assert!(matches!(err, RegistryError::AgentNotActive(_)));
}

#[test]
fn edge_rejected_calls_emit_no_events() {
    let (registry, _, a, b) = registry_with_agents();
    let before = registry.last_event_seq();

    let stranger = Principal::from("apr_stranger");
    let _ = registry.record_interaction(&stranger, &a, &b, true, 5, "x");
    let _ = registry.record_interaction(&owner(), &a, &b, true, 0, "x");
    let _ = registry.add_verifier(&stranger, &stranger);
    let _ = registry.deactivate_agent(&stranger, &a);
    let _ = registry.verify_capability(&stranger, &a, &generate_claim_hash("x"), "u", 0);
    let _ = registry.update_agent_metadata(&owner(), &a, "");
    let _ = registry.register_agent(&stranger, &a, "ipfs://dup", AgentType::Ai);

    assert_eq!(registry.last_event_seq(), before);
    assert!(registry.events_since(before).is_empty());
    assert_eq!(registry.get_reputation(&b).unwrap().total_interactions, 0);
}

#[test]
fn edge_admin_removed_from_verifiers_keeps_admin_rights() {
    let (registry, _, a, _) = registry_with_agents();
    let claim = generate_claim_hash("x");
    let verifier = Principal::from("apr_v");
    registry.add_verifier(&admin(), &verifier).expect("add");
    registry
        .verify_capability(&verifier, &a, &claim, "ipfs://p", 0)
        .expect("verify");

    registry.remove_verifier(&admin(), &admin()).expect("remove admin");
    let err = registry
        .verify_capability(&admin(), &a, &generate_claim_hash("y"), "ipfs://p", 0)
        .unwrap_err();
    assert!(matches!(err, RegistryError::NotTrustedVerifier(_)));

    // Admin can still revoke and manage the verifier set.
    registry.revoke_capability(&admin(), &a, &claim).expect("revoke");
    assert!(registry.add_verifier(&admin(), &admin()).expect("re-add"));
}
