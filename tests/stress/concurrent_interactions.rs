//! Stress test: many threads record interactions and claims against a
//! shared registry; totals must add up exactly.

use std::sync::{Arc, Barrier};
use std::thread;

use agent_trust_registry::{
    generate_claim_hash, AgentId, AgentType, Principal, RegistryError, TrustRegistry,
};

const THREADS: usize = 8;
const PER_THREAD: u32 = 250;

fn setup() -> (Arc<TrustRegistry>, Vec<(Principal, AgentId)>, AgentId) {
    let registry = Arc::new(TrustRegistry::in_memory(Principal::from("apr_admin"), "stress"));
    let target = AgentId::from("target");
    registry
        .register_agent(&Principal::from("apr_target_owner"), &target, "ipfs://t", AgentType::Ai)
        .expect("target registration");

    let sources = (0..THREADS)
        .map(|i| {
            let owner = Principal(format!("apr_owner_{i}"));
            let id = AgentId(format!("source-{i}"));
            registry
                .register_agent(&owner, &id, "ipfs://s", AgentType::Sdk)
                .expect("source registration");
            (owner, id)
        })
        .collect();
    (registry, sources, target)
}

#[test]
fn stress_concurrent_interactions_sum_exactly() {
    let (registry, sources, target) = setup();

    let handles: Vec<_> = sources
        .into_iter()
        .enumerate()
        .map(|(t, (owner, source))| {
            let registry = Arc::clone(&registry);
            let target = target.clone();
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    // Odd threads record failures.
                    let success = t % 2 == 0;
                    let weight = i % 100 + 1;
                    registry
                        .record_interaction(&owner, &source, &target, success, weight, "load")
                        .expect("interaction should be recorded");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread panicked");
    }

    let per_thread_gain: i64 = (0..PER_THREAD).map(|i| i64::from(i % 100 + 1)).sum();
    let per_thread_loss: i64 = (0..PER_THREAD).map(|i| i64::from((i % 100 + 1) / 2)).sum();
    let half = (THREADS / 2) as i64;

    let rep = registry.get_reputation(&target).expect("reputation");
    assert_eq!(rep.total_interactions, (THREADS as u64) * u64::from(PER_THREAD));
    assert_eq!(rep.successful_interactions, (THREADS as u64 / 2) * u64::from(PER_THREAD));
    assert_eq!(rep.success_rate, 50);
    assert_eq!(rep.score, half * per_thread_gain - half * per_thread_loss);
    assert_eq!(
        registry.interaction_count(&target),
        THREADS * PER_THREAD as usize
    );
    assert_eq!(registry.get_top_agents(1)[0].agent_id, target);
}

#[test]
fn stress_concurrent_registration_single_winner() {
    let registry = Arc::new(TrustRegistry::in_memory(Principal::from("apr_admin"), "race"));
    let contested = AgentId::from("contested");

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let registry = Arc::clone(&registry);
            let contested = contested.clone();
            thread::spawn(move || {
                registry.register_agent(
                    &Principal(format!("apr_racer_{i}")),
                    &contested,
                    "ipfs://c",
                    AgentType::Ai,
                )
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .collect();
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one registration should win");
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, RegistryError::AlreadyRegistered(_))));

    let owner = registry.get_agent_metadata(&contested).expect("agent").owner;
    assert_eq!(registry.get_agents_by_owner(&owner), vec![contested]);
}

#[test]
fn stress_concurrent_verifications_and_reads() {
    let (registry, _, target) = setup();
    let verifier = Principal::from("apr_verifier");
    registry
        .add_verifier(&Principal::from("apr_admin"), &verifier)
        .expect("add verifier");

    let writer = {
        let registry = Arc::clone(&registry);
        let target = target.clone();
        thread::spawn(move || {
            for i in 0..200 {
                let claim = generate_claim_hash(&format!("capability-{}", i % 20));
                registry
                    .verify_capability(&verifier, &target, &claim, "ipfs://e", 0)
                    .expect("verify");
            }
        })
    };
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let target = target.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    let claims = registry.get_verifications(&target);
                    for claim in &claims {
                        assert!(registry.get_verification_details(&target, claim).is_some());
                    }
                }
            })
        })
        .collect();

    writer.join().expect("writer panicked");
    for r in readers {
        r.join().expect("reader panicked");
    }
    assert_eq!(registry.get_verifications(&target).len(), 200);
    assert!(registry.is_verified(&target, &generate_claim_hash("capability-7")));
}

#[test]
fn stress_concurrent_opens_single_holder() {
    let dir = tempfile::tempdir().expect("tempdir");
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let path = dir.path().to_path_buf();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let opened = TrustRegistry::open(path, Principal::from("apr_admin"));
                // Keep any handle alive until every thread has tried.
                barrier.wait();
                opened.map(|_| ())
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, RegistryError::RegistryLocked(_))));
}
