//! Integration tests for the CLI binary.
//!
//! Drives the `atr` binary against temporary key and data directories.
//! Passphrases are supplied through `ATR_PASSPHRASE`.
//!
//! This test is registered as a [[test]] in the agent-trust-registry-cli
//! crate so that CARGO_BIN_EXE_atr is available.

use std::path::PathBuf;
use std::process::{Command, Output};

use agent_trust_registry::{generate_agent_id, Principal};

/// Get a Command pointing to the `atr` binary.
fn atr_binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_atr"))
}

struct Env {
    _dir: tempfile::TempDir,
    keys: PathBuf,
    data: PathBuf,
}

impl Env {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let keys = dir.path().join("keys");
        let data = dir.path().join("registry");
        Self {
            _dir: dir,
            keys,
            data,
        }
    }

    fn run(&self, as_key: &str, args: &[&str]) -> Output {
        atr_binary()
            .env("ATR_PASSPHRASE", "test-passphrase")
            .arg("--key-dir")
            .arg(&self.keys)
            .arg("--data-dir")
            .arg(&self.data)
            .arg("--as")
            .arg(as_key)
            .args(args)
            .output()
            .expect("failed to execute atr")
    }

    fn run_ok(&self, as_key: &str, args: &[&str]) -> String {
        let output = self.run(as_key, args);
        assert!(
            output.status.success(),
            "atr {args:?} should succeed, stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    fn principal(&self, name: &str) -> Principal {
        Principal(self.run_ok(name, &["key", "show"]).trim().to_string())
    }
}

#[test]
fn cli_responds_to_help() {
    let output = atr_binary()
        .arg("--help")
        .output()
        .expect("failed to execute atr --help");

    assert!(
        output.status.success(),
        "atr --help should exit with success, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("atr") || stdout.contains("AgentTrustRegistry") || stdout.contains("Usage"),
        "atr --help output should contain usage information, got: {stdout}"
    );
}

#[test]
fn cli_responds_to_version() {
    let output = atr_binary()
        .arg("--version")
        .output()
        .expect("failed to execute atr --version");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("0.1") || stdout.contains("atr"),
        "atr --version should contain version info, got: {stdout}"
    );
}

#[test]
fn cli_exits_with_error_on_unknown_flag() {
    let output = atr_binary()
        .arg("--nonexistent-flag")
        .output()
        .expect("failed to execute atr");

    assert!(
        !output.status.success(),
        "atr with unknown flag should exit with error"
    );
}

#[test]
fn cli_requires_initialized_registry() {
    let env = Env::new();
    let output = env.run("default", &["top"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("atr init"), "unexpected stderr: {stderr}");
}

#[test]
fn cli_register_interact_verify() {
    let env = Env::new();

    env.run_ok("admin", &["key", "new"]);
    env.run_ok("alice", &["key", "new"]);
    assert!(env.keys.join("admin.akey").exists());

    let out = env.run_ok("admin", &["init", "--instance-id", "cli-test"]);
    assert!(out.contains("cli-test"));

    let out = env.run_ok(
        "alice",
        &["register", "--name", "scout", "--metadata", "ipfs://scout"],
    );
    let scout = generate_agent_id("scout", &env.principal("alice"));
    assert!(out.contains(&scout.0), "register output: {out}");

    let out = env.run_ok(
        "alice",
        &["interact", "--from", &scout.0, "--to", &scout.0, "--weight", "40"],
    );
    assert!(out.contains("Score:        40"), "interact output: {out}");

    let out = env.run_ok("admin", &["top"]);
    assert!(out.contains(&scout.0));

    // Only the admin manages verifiers.
    let alice = env.principal("alice");
    let output = env.run("alice", &["verifier", "add", &alice.0]);
    assert!(!output.status.success());

    env.run_ok(
        "admin",
        &[
            "verify",
            &scout.0,
            "--capability",
            "code-review",
            "--evidence",
            "ipfs://proof",
            "--expires-in",
            "1d",
        ],
    );
    let out = env.run_ok("alice", &["check", &scout.0, "--capability", "code-review"]);
    assert!(out.contains("VERIFIED") && !out.contains("NOT VERIFIED"), "check output: {out}");

    env.run_ok("admin", &["revoke", &scout.0, "--capability", "code-review"]);
    let out = env.run_ok("alice", &["check", &scout.0, "--capability", "code-review"]);
    assert!(out.contains("NOT VERIFIED"), "check output: {out}");

    let out = env.run_ok("alice", &["show", &scout.0]);
    assert!(out.contains("active"));
}
