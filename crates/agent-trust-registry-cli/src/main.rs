//! AgentTrustRegistry CLI: the `atr` command.
//!
//! Manages principal keys, registers agents, records interactions, and
//! issues or revokes capability claims against a registry stored on disk.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use agent_trust_registry::storage::{
    load_principal_key, read_principal, save_principal_key, RegistryStore,
};
use agent_trust_registry::time::format_micros;
use agent_trust_registry::{
    generate_agent_id, generate_claim_hash, AgentId, AgentType, ClaimHash, Principal,
    PrincipalKey, RegistrationRequest, TrustRegistry,
};

/// Read from the environment before prompting, for scripted use.
const PASSPHRASE_ENV: &str = "ATR_PASSPHRASE";

// ── Directory helpers ─────────────────────────────────────────────────────────

fn agentic_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME not set; pass --data-dir and --key-dir")?;
    Ok(PathBuf::from(home).join(".agentic"))
}

struct Dirs {
    data: PathBuf,
    keys: PathBuf,
}

impl Dirs {
    fn resolve(data_dir: Option<PathBuf>, key_dir: Option<PathBuf>) -> Result<Self> {
        let data = match data_dir {
            Some(dir) => dir,
            None => agentic_dir()?.join("registry"),
        };
        let keys = match key_dir {
            Some(dir) => dir,
            None => agentic_dir()?.join("keys"),
        };
        Ok(Self { data, keys })
    }

    fn key_path(&self, name: &str) -> PathBuf {
        self.keys.join(format!("{name}.akey"))
    }
}

// ── Passphrase helper ─────────────────────────────────────────────────────────

fn read_passphrase(prompt: &str) -> Result<String> {
    if let Ok(passphrase) = std::env::var(PASSPHRASE_ENV) {
        return Ok(passphrase);
    }
    eprint!("{prompt}");
    let mut passphrase = String::new();
    std::io::stdin()
        .read_line(&mut passphrase)
        .context("failed to read passphrase")?;
    Ok(passphrase.trim().to_string())
}

// ── Time helpers ──────────────────────────────────────────────────────────────

/// Parse a duration like "24h", "7d", "1h30m" or "90s" into microseconds.
fn parse_duration_to_micros(s: &str) -> Result<u64> {
    let s = s.trim();
    let mut total_micros: u64 = 0;
    let mut current = String::new();

    for ch in s.chars() {
        if ch.is_ascii_digit() {
            current.push(ch);
            continue;
        }
        let val: u64 = current
            .parse()
            .map_err(|_| anyhow!("invalid duration: {s}"))?;
        current.clear();
        let unit: u64 = match ch {
            'd' => 86_400,
            'h' => 3_600,
            'm' => 60,
            's' => 1,
            _ => return Err(anyhow!("unknown duration unit '{ch}' in '{s}'")),
        };
        total_micros = val
            .checked_mul(unit * 1_000_000)
            .and_then(|v| total_micros.checked_add(v))
            .ok_or_else(|| anyhow!("duration '{s}' is too large"))?;
    }

    if !current.is_empty() {
        return Err(anyhow!("duration '{s}' is missing a unit (d/h/m/s)"));
    }
    if total_micros == 0 {
        return Err(anyhow!("duration must be > 0"));
    }
    Ok(total_micros)
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// AgentTrustRegistry CLI: register agents, track reputation, and attest
/// capabilities.
#[derive(Parser, Debug)]
#[command(
    name = "atr",
    about = "AgentTrustRegistry CLI",
    version,
    long_about = "atr: AgentTrustRegistry CLI\n\nRegister agents, record weighted interactions,\nand manage verifier-attested capability claims."
)]
struct Cli {
    /// Registry data directory (default: ~/.agentic/registry)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Principal key directory (default: ~/.agentic/keys)
    #[arg(long, global = true)]
    key_dir: Option<PathBuf>,

    /// Act as the principal stored in this key file
    #[arg(long = "as", global = true, default_value = "default")]
    as_key: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage principal keys
    Key {
        #[command(subcommand)]
        subcommand: KeyCommands,
    },

    /// Initialize a registry administered by the --as principal
    Init {
        /// Fixed registry instance id (default: random)
        #[arg(long)]
        instance_id: Option<String>,
    },

    /// Show registry configuration
    Info,

    /// Register an agent owned by the --as principal
    Register {
        /// Agent name; the id is derived from name and owner
        #[arg(long)]
        name: String,

        /// Metadata URI
        #[arg(long)]
        metadata: String,

        /// Agent type (ai, mcp, sdk, autonomous)
        #[arg(long = "type", default_value = "ai")]
        agent_type: String,
    },

    /// Sign a registration so that someone else can submit it
    SignRegistration {
        /// Agent name; the id is derived from name and owner
        #[arg(long)]
        name: String,

        /// Metadata URI
        #[arg(long)]
        metadata: String,

        /// Agent type (ai, mcp, sdk, autonomous)
        #[arg(long = "type", default_value = "ai")]
        agent_type: String,

        /// How long the signature stays valid (e.g. 1h, 7d)
        #[arg(long, default_value = "1h")]
        valid_for: String,

        /// Output file (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Submit a signed registration as relayer
    SubmitRegistration {
        /// File produced by sign-registration
        file: PathBuf,
    },

    /// Replace an agent's metadata URI
    Update {
        agent_id: String,

        #[arg(long)]
        metadata: String,
    },

    /// Permanently deactivate an agent
    Deactivate { agent_id: String },

    /// Show an agent and its reputation
    Show { agent_id: String },

    /// List agents owned by a principal (default: the --as principal)
    Owned {
        #[arg(long)]
        owner: Option<String>,
    },

    /// Record an interaction against an agent
    Interact {
        /// Source agent, owned by the --as principal
        #[arg(long)]
        from: String,

        /// Target agent
        #[arg(long)]
        to: String,

        /// Weight 1..=100
        #[arg(long)]
        weight: u32,

        /// Record a failure instead of a success
        #[arg(long)]
        failed: bool,

        /// Free-form interaction type
        #[arg(long = "type", default_value = "task")]
        interaction_type: String,
    },

    /// Show an agent's interaction history
    History {
        agent_id: String,

        #[arg(long, default_value = "0")]
        offset: usize,

        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Show the highest-ranked active agents
    Top {
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Manage trusted verifiers
    Verifier {
        #[command(subcommand)]
        subcommand: VerifierCommands,
    },

    /// Attest that an agent holds a capability
    Verify {
        agent_id: String,

        #[command(flatten)]
        claim: ClaimArgs,

        /// Evidence URI
        #[arg(long)]
        evidence: String,

        /// Validity period (e.g. 30d); omit for a claim that never expires
        #[arg(long)]
        expires_in: Option<String>,
    },

    /// Revoke a capability claim
    Revoke {
        agent_id: String,

        #[command(flatten)]
        claim: ClaimArgs,
    },

    /// Check whether a capability is currently verified
    Check {
        agent_id: String,

        #[command(flatten)]
        claim: ClaimArgs,
    },

    /// List every claim issued for an agent
    Claims { agent_id: String },

    /// Archive old interactions of an agent (admin only)
    Compact {
        agent_id: String,

        /// Number of newest interactions to keep
        #[arg(long)]
        keep: usize,
    },
}

#[derive(Subcommand, Debug)]
enum KeyCommands {
    /// Create a new principal key (named by --as unless --name is given)
    New {
        #[arg(long)]
        name: Option<String>,
    },
    /// Show the principal of a key file
    Show {
        #[arg(long)]
        name: Option<String>,
    },
    /// List key files
    List,
}

#[derive(Subcommand, Debug)]
enum VerifierCommands {
    /// Trust a principal to issue claims (admin only)
    Add { principal: String },
    /// Stop trusting a principal (admin only)
    Remove { principal: String },
    /// List trusted verifiers
    List,
}

#[derive(clap::Args, Debug)]
#[group(required = true, multiple = false)]
struct ClaimArgs {
    /// Capability name, hashed into the claim id
    #[arg(long)]
    capability: Option<String>,

    /// Claim hash, if already known
    #[arg(long)]
    claim: Option<String>,
}

impl ClaimArgs {
    fn claim_hash(&self) -> Result<ClaimHash> {
        match (&self.capability, &self.claim) {
            (_, Some(hash)) => Ok(ClaimHash(hash.clone())),
            (Some(capability), None) => Ok(generate_claim_hash(capability)),
            (None, None) => Err(anyhow!("either --capability or --claim is required")),
        }
    }
}

/// A registration request with the owner's signature, as exchanged
/// between owner and relayer.
#[derive(Debug, Serialize, Deserialize)]
struct SignedRegistration {
    registry_instance_id: String,
    request: RegistrationRequest,
    signature: String,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let verbose = cli.verbose;
    let as_key = cli.as_key.clone();

    let result = Dirs::resolve(cli.data_dir, cli.key_dir).and_then(|dirs| {
        let ctx = Ctx {
            dirs,
            as_key,
            verbose,
        };
        run(&ctx, cli.command)
    });

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

struct Ctx {
    dirs: Dirs,
    as_key: String,
    verbose: bool,
}

fn run(ctx: &Ctx, command: Commands) -> Result<()> {
    match command {
        Commands::Key { subcommand } => match subcommand {
            KeyCommands::New { name } => cmd_key_new(ctx, name.as_deref().unwrap_or(&ctx.as_key)),
            KeyCommands::Show { name } => {
                cmd_key_show(ctx, name.as_deref().unwrap_or(&ctx.as_key))
            }
            KeyCommands::List => cmd_key_list(ctx),
        },
        Commands::Init { instance_id } => cmd_init(ctx, instance_id),
        Commands::Info => cmd_info(ctx),
        Commands::Register {
            name,
            metadata,
            agent_type,
        } => cmd_register(ctx, &name, &metadata, &agent_type),
        Commands::SignRegistration {
            name,
            metadata,
            agent_type,
            valid_for,
            output,
        } => cmd_sign_registration(
            ctx,
            &name,
            &metadata,
            &agent_type,
            &valid_for,
            output.as_deref(),
        ),
        Commands::SubmitRegistration { file } => cmd_submit_registration(ctx, &file),
        Commands::Update { agent_id, metadata } => cmd_update(ctx, &agent_id, &metadata),
        Commands::Deactivate { agent_id } => cmd_deactivate(ctx, &agent_id),
        Commands::Show { agent_id } => cmd_show(ctx, &agent_id),
        Commands::Owned { owner } => cmd_owned(ctx, owner),
        Commands::Interact {
            from,
            to,
            weight,
            failed,
            interaction_type,
        } => cmd_interact(ctx, &from, &to, !failed, weight, &interaction_type),
        Commands::History {
            agent_id,
            offset,
            limit,
        } => cmd_history(ctx, &agent_id, offset, limit),
        Commands::Top { limit } => cmd_top(ctx, limit),
        Commands::Verifier { subcommand } => match subcommand {
            VerifierCommands::Add { principal } => cmd_verifier_add(ctx, &principal),
            VerifierCommands::Remove { principal } => cmd_verifier_remove(ctx, &principal),
            VerifierCommands::List => cmd_verifier_list(ctx),
        },
        Commands::Verify {
            agent_id,
            claim,
            evidence,
            expires_in,
        } => cmd_verify(
            ctx,
            &agent_id,
            &claim.claim_hash()?,
            &evidence,
            expires_in.as_deref(),
        ),
        Commands::Revoke { agent_id, claim } => cmd_revoke(ctx, &agent_id, &claim.claim_hash()?),
        Commands::Check { agent_id, claim } => cmd_check(ctx, &agent_id, &claim.claim_hash()?),
        Commands::Claims { agent_id } => cmd_claims(ctx, &agent_id),
        Commands::Compact { agent_id, keep } => cmd_compact(ctx, &agent_id, keep),
    }
}

// ── Shared helpers ────────────────────────────────────────────────────────────

/// Open the registry under `--data-dir`, which must already be initialized.
fn open_registry(ctx: &Ctx) -> Result<TrustRegistry> {
    let config = {
        // The store lock is released before the registry takes it.
        let store =
            RegistryStore::open(&ctx.dirs.data).context("failed to open registry store")?;
        store
            .load_config()
            .context("failed to read registry configuration")?
            .ok_or_else(|| {
                anyhow!(
                    "no registry at {} (run `atr init` first)",
                    ctx.dirs.data.display()
                )
            })?
    };
    TrustRegistry::open(&ctx.dirs.data, config.admin).context("failed to load registry")
}

/// Unlock the `--as` key to act as its principal.
fn unlock_caller(ctx: &Ctx) -> Result<PrincipalKey> {
    let path = ctx.dirs.key_path(&ctx.as_key);
    if !path.exists() {
        return Err(anyhow!(
            "key '{}' not found (expected at {}; run `atr key new`)",
            ctx.as_key,
            path.display()
        ));
    }
    let passphrase = read_passphrase(&format!("Passphrase for key '{}': ", ctx.as_key))?;
    load_principal_key(&path, &passphrase).context("failed to unlock key")
}

fn caller_principal(ctx: &Ctx) -> Result<Principal> {
    Ok(unlock_caller(ctx)?.principal())
}

fn parse_agent_type(s: &str) -> Result<AgentType> {
    s.parse::<AgentType>()
        .map_err(|_| anyhow!("unknown agent type '{s}' (expected ai, mcp, sdk or autonomous)"))
}

// ── Key commands ──────────────────────────────────────────────────────────────

/// `atr key new [--name NAME]`
fn cmd_key_new(ctx: &Ctx, name: &str) -> Result<()> {
    let path = ctx.dirs.key_path(name);
    if path.exists() {
        return Err(anyhow!("key '{name}' already exists at {}", path.display()));
    }
    std::fs::create_dir_all(&ctx.dirs.keys).context("failed to create key directory")?;

    let passphrase = read_passphrase("Enter passphrase for new key: ")?;
    if passphrase.is_empty() {
        return Err(anyhow!("passphrase cannot be empty"));
    }
    if std::env::var(PASSPHRASE_ENV).is_err() {
        let confirm = read_passphrase("Confirm passphrase: ")?;
        if passphrase != confirm {
            return Err(anyhow!("passphrases do not match"));
        }
    }

    let key = PrincipalKey::generate(Some(name.to_string()));
    save_principal_key(&key, &path, &passphrase).context("failed to save key")?;

    println!("Created key '{name}'");
    println!("  Principal: {}", key.principal());
    println!("  File:      {}", path.display());
    if ctx.verbose {
        println!("  Created:   {}", format_micros(key.created_at));
    }
    Ok(())
}

/// `atr key show [--name NAME]`
fn cmd_key_show(ctx: &Ctx, name: &str) -> Result<()> {
    let path = ctx.dirs.key_path(name);
    let principal = read_principal(&path)
        .with_context(|| format!("failed to read key '{name}' at {}", path.display()))?;
    println!("{principal}");
    Ok(())
}

/// `atr key list`
fn cmd_key_list(ctx: &Ctx) -> Result<()> {
    let dir = &ctx.dirs.keys;
    if !dir.exists() {
        println!("No keys found (directory {} does not exist)", dir.display());
        return Ok(());
    }

    let mut entries: Vec<(String, PathBuf)> = std::fs::read_dir(dir)
        .context("failed to read key directory")?
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let path = e.path();
            if path.extension().is_some_and(|x| x == "akey") {
                let stem = path.file_stem()?.to_string_lossy().into_owned();
                Some((stem, path))
            } else {
                None
            }
        })
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    if entries.is_empty() {
        println!("No keys found in {}", dir.display());
        return Ok(());
    }

    println!("{:<20} PRINCIPAL", "NAME");
    println!("{}", "-".repeat(72));
    for (name, path) in &entries {
        match read_principal(path) {
            Ok(principal) => println!("{name:<20} {principal}"),
            Err(e) => println!("{name:<20} (failed to read: {e})"),
        }
    }
    Ok(())
}

// ── Registry commands ─────────────────────────────────────────────────────────

/// `atr init [--instance-id ID]`
fn cmd_init(ctx: &Ctx, instance_id: Option<String>) -> Result<()> {
    {
        let store =
            RegistryStore::open(&ctx.dirs.data).context("failed to open registry store")?;
        if let Some(config) = store.load_config()? {
            return Err(anyhow!(
                "registry already initialized at {} (admin {})",
                ctx.dirs.data.display(),
                config.admin
            ));
        }
    }

    let admin = caller_principal(ctx)?;
    let mut builder = TrustRegistry::builder(admin).data_dir(&ctx.dirs.data);
    if let Some(id) = instance_id {
        builder = builder.registry_instance_id(id);
    }
    let registry = builder.build().context("failed to initialize registry")?;

    println!("Initialized registry at {}", ctx.dirs.data.display());
    println!("  Instance: {}", registry.registry_instance_id());
    println!("  Admin:    {}", registry.admin());
    Ok(())
}

/// `atr info`
fn cmd_info(ctx: &Ctx) -> Result<()> {
    let registry = open_registry(ctx)?;
    let config = registry.config();
    println!("Registry: {}", ctx.dirs.data.display());
    println!("  Instance:  {}", config.registry_instance_id);
    println!("  Admin:     {}", config.admin);
    println!("  Created:   {}", format_micros(config.created_at));
    println!("  Agents:    {}", registry.agent_count());
    println!("  Verifiers: {}", registry.verifiers().len());
    Ok(())
}

// ── Agent commands ────────────────────────────────────────────────────────────

/// `atr register --name NAME --metadata URI [--type TYPE]`
fn cmd_register(ctx: &Ctx, name: &str, metadata: &str, agent_type: &str) -> Result<()> {
    let agent_type = parse_agent_type(agent_type)?;
    let registry = open_registry(ctx)?;
    let owner = caller_principal(ctx)?;
    let agent_id = generate_agent_id(name, &owner);

    let agent = registry
        .register_agent(&owner, &agent_id, metadata, agent_type)
        .context("registration failed")?;

    println!("Registered agent '{name}'");
    println!("  ID:    {}", agent.id);
    println!("  Owner: {}", agent.owner);
    if ctx.verbose {
        println!("  Type:       {}", agent.agent_type);
        println!("  Metadata:   {}", agent.metadata_uri);
        println!("  Registered: {}", format_micros(agent.registered_at));
    }
    Ok(())
}

/// `atr sign-registration --name NAME --metadata URI [--type TYPE] [--valid-for DUR] [-o FILE]`
fn cmd_sign_registration(
    ctx: &Ctx,
    name: &str,
    metadata: &str,
    agent_type: &str,
    valid_for: &str,
    output: Option<&Path>,
) -> Result<()> {
    let agent_type = parse_agent_type(agent_type)?;
    let validity = parse_duration_to_micros(valid_for)?;
    let registry = open_registry(ctx)?;
    let owner_key = unlock_caller(ctx)?;
    let owner = owner_key.principal();

    let registry_instance_id = registry.registry_instance_id();
    let request = RegistrationRequest {
        agent_id: generate_agent_id(name, &owner),
        metadata_uri: metadata.to_string(),
        agent_type,
        owner,
        deadline: registry.now().saturating_add(validity),
    };
    let signature = request.sign(owner_key.signing_key(), &registry_instance_id);
    let signed = SignedRegistration {
        registry_instance_id,
        request,
        signature,
    };

    let json = serde_json::to_string_pretty(&signed).context("failed to serialize request")?;
    match output {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Signed registration for {}", signed.request.agent_id);
            println!("  File:     {}", path.display());
            println!(
                "  Deadline: {}",
                format_micros(signed.request.deadline)
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// `atr submit-registration FILE`
fn cmd_submit_registration(ctx: &Ctx, file: &Path) -> Result<()> {
    let bytes =
        std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let signed: SignedRegistration =
        serde_json::from_slice(&bytes).context("failed to parse signed registration")?;

    let registry = open_registry(ctx)?;
    if signed.registry_instance_id != registry.registry_instance_id() && ctx.verbose {
        eprintln!(
            "warning: request was signed for registry {}, this is {}",
            signed.registry_instance_id,
            registry.registry_instance_id()
        );
    }
    let relayer = caller_principal(ctx)?;
    let agent = registry
        .register_agent_with_signature(&relayer, &signed.request, &signed.signature)
        .context("signed registration rejected")?;

    println!("Registered agent {}", agent.id);
    println!("  Owner:   {}", agent.owner);
    println!("  Relayer: {relayer}");
    Ok(())
}

/// `atr update AGENT_ID --metadata URI`
fn cmd_update(ctx: &Ctx, agent_id: &str, metadata: &str) -> Result<()> {
    let registry = open_registry(ctx)?;
    let caller = caller_principal(ctx)?;
    let agent = registry
        .update_agent_metadata(&caller, &AgentId::from(agent_id), metadata)
        .context("update failed")?;
    println!("Updated agent {}", agent.id);
    println!("  Metadata: {}", agent.metadata_uri);
    Ok(())
}

/// `atr deactivate AGENT_ID`
fn cmd_deactivate(ctx: &Ctx, agent_id: &str) -> Result<()> {
    let registry = open_registry(ctx)?;
    let caller = caller_principal(ctx)?;
    registry
        .deactivate_agent(&caller, &AgentId::from(agent_id))
        .context("deactivation failed")?;
    println!("Deactivated agent {agent_id}");
    Ok(())
}

/// `atr show AGENT_ID`
fn cmd_show(ctx: &Ctx, agent_id: &str) -> Result<()> {
    let registry = open_registry(ctx)?;
    let id = AgentId::from(agent_id);
    let agent = registry.get_agent_metadata(&id)?;
    let reputation = registry.get_reputation_data(&id)?;

    println!("Agent: {}", agent.id);
    println!("  Owner:      {}", agent.owner);
    println!("  Type:       {}", agent.agent_type);
    println!("  Metadata:   {}", agent.metadata_uri);
    println!("  Registered: {}", format_micros(agent.registered_at));
    println!(
        "  Status:     {}",
        if agent.is_active { "active" } else { "inactive" }
    );
    println!("  Score:        {}", reputation.score);
    println!(
        "  Interactions: {} ({} successful, {}%)",
        reputation.total_interactions,
        reputation.successful_interactions,
        reputation.success_rate()
    );
    if ctx.verbose {
        println!("  Total weight:   {}", reputation.total_weight);
        println!("  Success weight: {}", reputation.success_weight);
        if reputation.last_interaction_at > 0 {
            println!(
                "  Last interaction: {}",
                format_micros(reputation.last_interaction_at)
            );
        }
    }
    Ok(())
}

/// `atr owned [--owner PRINCIPAL]`
fn cmd_owned(ctx: &Ctx, owner: Option<String>) -> Result<()> {
    let owner = match owner {
        Some(p) => Principal(p),
        None => read_principal(&ctx.dirs.key_path(&ctx.as_key))
            .with_context(|| format!("failed to read key '{}'", ctx.as_key))?,
    };
    let registry = open_registry(ctx)?;
    let agents = registry.get_agents_by_owner(&owner);
    if agents.is_empty() {
        println!("No agents owned by {owner}");
        return Ok(());
    }
    println!("{:<66} STATUS", "AGENT");
    println!("{}", "-".repeat(76));
    for id in &agents {
        let status = if registry.is_agent_active(id) {
            "active"
        } else {
            "inactive"
        };
        println!("{:<66} {status}", id.0);
    }
    Ok(())
}

// ── Reputation commands ───────────────────────────────────────────────────────

/// `atr interact --from ID --to ID --weight N [--failed] [--type TYPE]`
fn cmd_interact(
    ctx: &Ctx,
    from: &str,
    to: &str,
    success: bool,
    weight: u32,
    interaction_type: &str,
) -> Result<()> {
    let registry = open_registry(ctx)?;
    let caller = caller_principal(ctx)?;
    let summary = registry
        .record_interaction(
            &caller,
            &AgentId::from(from),
            &AgentId::from(to),
            success,
            weight,
            interaction_type,
        )
        .context("failed to record interaction")?;

    println!(
        "Recorded {} interaction (weight {weight}) against {to}",
        if success { "successful" } else { "failed" }
    );
    println!("  Score:        {}", summary.score);
    println!(
        "  Interactions: {} ({}% successful)",
        summary.total_interactions, summary.success_rate
    );
    Ok(())
}

/// `atr history AGENT_ID [--offset N] [--limit N]`
fn cmd_history(ctx: &Ctx, agent_id: &str, offset: usize, limit: usize) -> Result<()> {
    let registry = open_registry(ctx)?;
    let id = AgentId::from(agent_id);
    let page = registry.get_interaction_history(&id, offset, limit);
    if page.is_empty() {
        println!("No interactions for {agent_id} at offset {offset}");
        return Ok(());
    }

    println!("{:<22} {:<8} {:<7} {:<12} FROM", "TIME", "RESULT", "WEIGHT", "TYPE");
    println!("{}", "-".repeat(76));
    for i in &page {
        println!(
            "{:<22} {:<8} {:<7} {:<12} {}",
            format_micros(i.timestamp),
            if i.success { "success" } else { "failure" },
            i.weight,
            i.interaction_type,
            i.from_agent
        );
    }
    if ctx.verbose {
        println!(
            "\nShowing {} of {} interaction(s)",
            page.len(),
            registry.interaction_count(&id)
        );
    }
    Ok(())
}

/// `atr top [--limit N]`
fn cmd_top(ctx: &Ctx, limit: usize) -> Result<()> {
    let registry = open_registry(ctx)?;
    let ranked = registry.get_top_agents(limit);
    if ranked.is_empty() {
        println!("No active agents");
        return Ok(());
    }
    println!("{:<5} {:<66} SCORE", "RANK", "AGENT");
    println!("{}", "-".repeat(80));
    for (i, entry) in ranked.iter().enumerate() {
        println!("{:<5} {:<66} {}", i + 1, entry.agent_id.0, entry.score);
    }
    Ok(())
}

/// `atr compact AGENT_ID --keep N`
fn cmd_compact(ctx: &Ctx, agent_id: &str, keep: usize) -> Result<()> {
    let registry = open_registry(ctx)?;
    let caller = caller_principal(ctx)?;
    let archived = registry
        .compact_interactions(&caller, &AgentId::from(agent_id), keep)
        .context("compaction failed")?;
    println!("Archived {archived} interaction(s) of {agent_id}");
    Ok(())
}

// ── Verification commands ─────────────────────────────────────────────────────

/// `atr verifier add PRINCIPAL`
fn cmd_verifier_add(ctx: &Ctx, principal: &str) -> Result<()> {
    let registry = open_registry(ctx)?;
    let caller = caller_principal(ctx)?;
    if registry.add_verifier(&caller, &Principal::from(principal))? {
        println!("Added trusted verifier {principal}");
    } else {
        println!("{principal} is already a trusted verifier");
    }
    Ok(())
}

/// `atr verifier remove PRINCIPAL`
fn cmd_verifier_remove(ctx: &Ctx, principal: &str) -> Result<()> {
    let registry = open_registry(ctx)?;
    let caller = caller_principal(ctx)?;
    if registry.remove_verifier(&caller, &Principal::from(principal))? {
        println!("Removed trusted verifier {principal}");
    } else {
        println!("{principal} is not a trusted verifier");
    }
    Ok(())
}

/// `atr verifier list`
fn cmd_verifier_list(ctx: &Ctx) -> Result<()> {
    let registry = open_registry(ctx)?;
    let admin = registry.admin();
    for verifier in registry.verifiers() {
        if verifier == admin {
            println!("{verifier} (admin)");
        } else {
            println!("{verifier}");
        }
    }
    Ok(())
}

/// `atr verify AGENT_ID (--capability NAME | --claim HASH) --evidence URI [--expires-in DUR]`
fn cmd_verify(
    ctx: &Ctx,
    agent_id: &str,
    claim: &ClaimHash,
    evidence: &str,
    expires_in: Option<&str>,
) -> Result<()> {
    let registry = open_registry(ctx)?;
    let expires_at = match expires_in {
        Some(d) => registry.now().saturating_add(parse_duration_to_micros(d)?),
        None => 0,
    };
    let caller = caller_principal(ctx)?;
    let verification = registry
        .verify_capability(&caller, &AgentId::from(agent_id), claim, evidence, expires_at)
        .context("verification failed")?;

    println!("Verified claim {} for {agent_id}", verification.claim);
    println!("  Verifier: {}", verification.verifier);
    if verification.expires_at == 0 {
        println!("  Expires:  never");
    } else {
        println!("  Expires:  {}", format_micros(verification.expires_at));
    }
    Ok(())
}

/// `atr revoke AGENT_ID (--capability NAME | --claim HASH)`
fn cmd_revoke(ctx: &Ctx, agent_id: &str, claim: &ClaimHash) -> Result<()> {
    let registry = open_registry(ctx)?;
    let caller = caller_principal(ctx)?;
    registry
        .revoke_capability(&caller, &AgentId::from(agent_id), claim)
        .context("revocation failed")?;
    println!("Revoked claim {claim} for {agent_id}");
    Ok(())
}

/// `atr check AGENT_ID (--capability NAME | --claim HASH)`
fn cmd_check(ctx: &Ctx, agent_id: &str, claim: &ClaimHash) -> Result<()> {
    let registry = open_registry(ctx)?;
    let id = AgentId::from(agent_id);
    let verified = registry.is_verified(&id, claim);
    println!(
        "Claim {claim}: {}",
        if verified { "VERIFIED" } else { "NOT VERIFIED" }
    );

    if ctx.verbose {
        if let Some(v) = registry.get_verification_details(&id, claim) {
            println!("  Verifier: {}", v.verifier);
            println!("  Evidence: {}", v.claim_uri);
            println!("  Issued:   {}", format_micros(v.verified_at));
            if v.expires_at > 0 {
                println!("  Expires:  {}", format_micros(v.expires_at));
            }
            println!("  Revoked:  {}", !v.is_valid);
        }
    }
    Ok(())
}

/// `atr claims AGENT_ID`
fn cmd_claims(ctx: &Ctx, agent_id: &str) -> Result<()> {
    let registry = open_registry(ctx)?;
    let id = AgentId::from(agent_id);
    let claims = registry.get_verifications(&id);
    if claims.is_empty() {
        println!("No claims for {agent_id}");
        return Ok(());
    }

    let now = registry.now();
    println!("{:<66} STATUS", "CLAIM");
    println!("{}", "-".repeat(80));
    for claim in &claims {
        let status = match registry.get_verification_details(&id, claim) {
            Some(v) if v.is_current(now) => "valid",
            Some(v) if !v.is_valid => "revoked",
            Some(_) => "expired",
            None => "missing",
        };
        println!("{:<66} {status}", claim.0);
    }
    Ok(())
}
