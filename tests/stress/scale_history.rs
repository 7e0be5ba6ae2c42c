//! Stress test: large interaction histories, pagination over them, and a
//! wide ranking.

use agent_trust_registry::{AgentId, AgentType, Principal, TrustRegistry};

fn owner() -> Principal {
    Principal::from("apr_owner")
}

#[test]
fn stress_10000_interactions_paginate() {
    let registry = TrustRegistry::in_memory(Principal::from("apr_admin"), "scale");
    let source = AgentId::from("source");
    let target = AgentId::from("target");
    for id in [&source, &target] {
        registry
            .register_agent(&owner(), id, "ipfs://x", AgentType::Ai)
            .expect("register");
    }

    for i in 0..10_000u32 {
        registry
            .record_interaction(&owner(), &source, &target, i % 4 != 0, i % 100 + 1, "bulk")
            .expect("record");
    }

    let rep = registry.get_reputation(&target).expect("reputation");
    assert_eq!(rep.total_interactions, 10_000);
    assert_eq!(rep.successful_interactions, 7_500);
    assert_eq!(rep.success_rate, 75);

    // Walk the full history page by page; order is insertion order.
    let mut seen = 0usize;
    let mut offset = 0;
    loop {
        let page = registry.get_interaction_history(&target, offset, 333);
        if page.is_empty() {
            break;
        }
        for (k, interaction) in page.iter().enumerate() {
            let i = (offset + k) as u32;
            assert_eq!(interaction.weight, i % 100 + 1, "entry {i} out of order");
        }
        seen += page.len();
        offset += page.len();
    }
    assert_eq!(seen, 10_000);
    assert!(registry.get_interaction_history(&target, 10_000, 1).is_empty());
    assert!(registry.get_interaction_history(&target, usize::MAX, usize::MAX).is_empty());
}

#[test]
fn stress_ranking_1000_agents() {
    let registry = TrustRegistry::in_memory(Principal::from("apr_admin"), "rank");
    let source = AgentId::from("source");
    registry
        .register_agent(&owner(), &source, "ipfs://s", AgentType::Ai)
        .expect("register");

    for n in 0..1000u32 {
        let id = AgentId(format!("agent-{n:04}"));
        registry
            .register_agent(&owner(), &id, "ipfs://a", AgentType::Autonomous)
            .expect("register");
        registry
            .record_interaction(&owner(), &source, &id, true, n % 100 + 1, "rank")
            .expect("record");
    }

    let top = registry.get_top_agents(50);
    assert_eq!(top.len(), 50);
    assert!(top.windows(2).all(|w| {
        w[0].score > w[1].score || (w[0].score == w[1].score && w[0].agent_id < w[1].agent_id)
    }));
    assert_eq!(top[0].score, 100);
    assert_eq!(top[0].agent_id, AgentId::from("agent-0099"));

    // Deactivate every agent scoring 100; the next tier moves up.
    for n in (99..1000).step_by(100) {
        registry
            .deactivate_agent(&owner(), &AgentId(format!("agent-{n:04}")))
            .expect("deactivate");
    }
    let top = registry.get_top_agents(1);
    assert_eq!(top[0].score, 99);
    assert_eq!(registry.get_top_agents(usize::MAX).len(), 1001 - 10);
}
