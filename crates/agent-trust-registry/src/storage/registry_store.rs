//! Registry persistence.
//!
//! Stores the four registry collections plus registry metadata as JSON
//! files under a directory tree:
//!
//! ```text
//! {base_dir}/
//! ├── .lock                                 held exclusively while open
//! ├── registry.json                         RegistryConfig
//! ├── verifiers.json                        trusted verifier set
//! ├── agents/{agent_id}.json
//! ├── reputations/{agent_id}.json
//! ├── owners/{hex(principal)}.json          owned agents, registration order
//! ├── interactions/{agent_id}.jsonl         append-only, one record per line
//! ├── interactions/{agent_id}.archive.jsonl
//! ├── verifications/{agent_id}/{claim}.json
//! └── claims/{agent_id}.json                claim index, duplicates kept
//! ```
//!
//! Every record is wrapped as `{ "version": 1, "record": { ... } }`.
//! Whole-file writes go through a sibling temp file and a rename, so a
//! reader never observes a half-written record. A mutation that spans
//! several files runs inside a [`StoreTransaction`], which puts every file
//! back the way it was unless the transaction is committed.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};
use crate::identity::{AgentId, AgentIdentity, Principal};
use crate::reputation::{Interaction, ReputationData};
use crate::verification::{ClaimHash, Verification, VerifierSet};

// ── File format constants ─────────────────────────────────────────────────────

const RECORD_FILE_VERSION: u32 = 1;

const LOCK_FILE: &str = ".lock";
const CONFIG_FILE: &str = "registry.json";
const VERIFIERS_FILE: &str = "verifiers.json";

const AGENTS_DIR: &str = "agents";
const REPUTATIONS_DIR: &str = "reputations";
const OWNERS_DIR: &str = "owners";
const INTERACTIONS_DIR: &str = "interactions";
const VERIFICATIONS_DIR: &str = "verifications";
const CLAIMS_DIR: &str = "claims";

const ARCHIVE_SUFFIX: &str = ".archive.jsonl";

// ── On-disk structure ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct RecordFile<T> {
    version: u32,
    record: T,
}

/// Everything a registry needs to resume, as read back from disk.
#[derive(Debug, Default)]
pub struct StoredState {
    pub agents: Vec<AgentIdentity>,
    pub reputations: HashMap<AgentId, ReputationData>,
    pub owners: HashMap<Principal, Vec<AgentId>>,
    pub interactions: HashMap<AgentId, Vec<Interaction>>,
    pub verifications: HashMap<AgentId, Vec<Verification>>,
    pub claim_index: HashMap<AgentId, Vec<ClaimHash>>,
}

// ── RegistryStore ─────────────────────────────────────────────────────────────

/// Filesystem-backed store for registry collections.
///
/// Holds an exclusive lock on `{base_dir}/.lock` for its whole lifetime, so
/// at most one store (in any process) writes a directory at a time.
#[derive(Debug)]
pub struct RegistryStore {
    base_dir: PathBuf,
    _lock: File,
}

impl RegistryStore {
    /// Open (creating if needed) a store rooted at `base_dir`.
    ///
    /// # Errors
    ///
    /// `RegistryLocked` if another store already holds the directory,
    /// `Io` if a directory or the lock file cannot be created.
    pub fn open(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        for sub in [
            AGENTS_DIR,
            REPUTATIONS_DIR,
            OWNERS_DIR,
            INTERACTIONS_DIR,
            VERIFICATIONS_DIR,
            CLAIMS_DIR,
        ] {
            std::fs::create_dir_all(base_dir.join(sub))?;
        }

        let lock = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(base_dir.join(LOCK_FILE))?;
        lock.try_lock_exclusive().map_err(|e| {
            if e.kind() == fs2::lock_contended_error().kind() {
                RegistryError::RegistryLocked(base_dir.display().to_string())
            } else {
                RegistryError::Io(e)
            }
        })?;

        log::debug!("locked registry store at {}", base_dir.display());
        Ok(Self {
            base_dir,
            _lock: lock,
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Start a group of writes that land together or not at all.
    pub fn transaction(&self) -> StoreTransaction<'_> {
        StoreTransaction {
            store: self,
            undo: Vec::new(),
            committed: false,
        }
    }

    // ── Registry metadata ─────────────────────────────────────────────────────

    pub fn load_config(&self) -> Result<Option<RegistryConfig>> {
        self.read_optional(&self.config_path())
    }

    pub fn save_config(&self, config: &RegistryConfig) -> Result<()> {
        self.write_record(&self.config_path(), config)
    }

    pub fn load_verifiers(&self) -> Result<Option<VerifierSet>> {
        self.read_optional(&self.verifiers_path())
    }

    pub fn save_verifiers(&self, verifiers: &VerifierSet) -> Result<()> {
        self.write_record(&self.verifiers_path(), verifiers)
    }

    // ── Interaction archive ───────────────────────────────────────────────────

    /// Read back archived interactions, oldest first.
    pub fn load_archived_interactions(&self, agent_id: &AgentId) -> Result<Vec<Interaction>> {
        read_lines(&self.archive_path(agent_id))
    }

    // ── Bulk load ─────────────────────────────────────────────────────────────

    /// Read every collection back into memory.
    ///
    /// Agents without a reputation file start from zero totals.
    pub fn load_state(&self) -> Result<StoredState> {
        let mut state = StoredState::default();

        for (stem, path) in self.json_files(&self.base_dir.join(AGENTS_DIR))? {
            let agent: AgentIdentity = self.read_record(&path)?;
            let agent_id = AgentId(stem);

            if let Some(rep) = self.read_optional(&self.keyed_path(REPUTATIONS_DIR, &agent_id.0))? {
                state.reputations.insert(agent_id.clone(), rep);
            }

            let interactions = read_lines(&self.interaction_log_path(&agent_id))?;
            if !interactions.is_empty() {
                state.interactions.insert(agent_id.clone(), interactions);
            }

            let verification_dir = self.base_dir.join(VERIFICATIONS_DIR).join(&agent_id.0);
            if verification_dir.is_dir() {
                let mut records = Vec::new();
                for (_, path) in self.json_files(&verification_dir)? {
                    records.push(self.read_record::<Verification>(&path)?);
                }
                state.verifications.insert(agent_id.clone(), records);
            }

            if let Some(claims) = self.read_optional(&self.keyed_path(CLAIMS_DIR, &agent_id.0))? {
                state.claim_index.insert(agent_id.clone(), claims);
            }

            state.agents.push(agent);
        }

        for (stem, path) in self.json_files(&self.base_dir.join(OWNERS_DIR))? {
            let owner_bytes = hex::decode(&stem).map_err(|e| {
                RegistryError::InvalidFileFormat(format!("bad owner file name {stem}: {e}"))
            })?;
            let owner = String::from_utf8(owner_bytes).map_err(|e| {
                RegistryError::InvalidFileFormat(format!("bad owner file name {stem}: {e}"))
            })?;
            let agents: Vec<AgentId> = self.read_record(&path)?;
            state.owners.insert(Principal(owner), agents);
        }

        log::debug!(
            "loaded {} agents from {}",
            state.agents.len(),
            self.base_dir.display()
        );
        Ok(state)
    }

    // ── Paths ─────────────────────────────────────────────────────────────────

    fn config_path(&self) -> PathBuf {
        self.base_dir.join(CONFIG_FILE)
    }

    fn verifiers_path(&self) -> PathBuf {
        self.base_dir.join(VERIFIERS_FILE)
    }

    fn keyed_path(&self, sub_dir: &str, key: &str) -> PathBuf {
        self.base_dir.join(sub_dir).join(format!("{key}.json"))
    }

    fn owners_path(&self, owner: &Principal) -> PathBuf {
        self.keyed_path(OWNERS_DIR, &hex::encode(owner.0.as_bytes()))
    }

    fn verification_path(&self, agent_id: &AgentId, claim: &ClaimHash) -> PathBuf {
        self.base_dir
            .join(VERIFICATIONS_DIR)
            .join(&agent_id.0)
            .join(format!("{}.json", claim.0))
    }

    fn interaction_log_path(&self, agent_id: &AgentId) -> PathBuf {
        self.base_dir
            .join(INTERACTIONS_DIR)
            .join(format!("{}.jsonl", agent_id.0))
    }

    fn archive_path(&self, agent_id: &AgentId) -> PathBuf {
        self.base_dir
            .join(INTERACTIONS_DIR)
            .join(format!("{}{ARCHIVE_SUFFIX}", agent_id.0))
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn write_record<T: Serialize>(&self, path: &Path, record: &T) -> Result<()> {
        let file = RecordFile {
            version: RECORD_FILE_VERSION,
            record,
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| RegistryError::SerializationError(e.to_string()))?;
        write_atomic(path, json.as_bytes())
    }

    fn read_record<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let bytes = std::fs::read(path)?;
        let file: RecordFile<T> = serde_json::from_slice(&bytes).map_err(|e| {
            RegistryError::InvalidFileFormat(format!("failed to parse {}: {e}", path.display()))
        })?;
        check_version(file.version, path)?;
        Ok(file.record)
    }

    fn read_optional<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }
        self.read_record(path).map(Some)
    }

    /// `(stem, path)` for every `*.json` file directly under `dir`.
    fn json_files(&self, dir: &Path) -> Result<Vec<(String, PathBuf)>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(stem) = name_str.strip_suffix(".json") {
                files.push((stem.to_string(), entry.path()));
            }
        }
        files.sort();
        Ok(files)
    }
}

// ── StoreTransaction ──────────────────────────────────────────────────────────

/// How to put one file back.
#[derive(Debug)]
enum Undo {
    /// Rewrite the previous contents, or remove the file if it was absent.
    Restore {
        path: PathBuf,
        previous: Option<Vec<u8>>,
    },
    /// Cut an append-only log back to its previous length, or remove it if
    /// it was absent.
    Truncate { path: PathBuf, len: Option<u64> },
}

/// Writes that either all stay on disk or are all undone.
///
/// Each write first records how to reverse itself. Dropping the
/// transaction without calling [`commit`](Self::commit) replays those
/// records newest first.
#[derive(Debug)]
pub struct StoreTransaction<'a> {
    store: &'a RegistryStore,
    undo: Vec<Undo>,
    committed: bool,
}

impl StoreTransaction<'_> {
    pub fn save_verifiers(&mut self, verifiers: &VerifierSet) -> Result<()> {
        let path = self.store.verifiers_path();
        self.write_record(path, verifiers)
    }

    pub fn save_agent(&mut self, agent: &AgentIdentity) -> Result<()> {
        let path = self.store.keyed_path(AGENTS_DIR, &agent.id.0);
        self.write_record(path, agent)
    }

    pub fn save_reputation(&mut self, agent_id: &AgentId, reputation: &ReputationData) -> Result<()> {
        let path = self.store.keyed_path(REPUTATIONS_DIR, &agent_id.0);
        self.write_record(path, reputation)
    }

    pub fn save_owned_agents(&mut self, owner: &Principal, agents: &[AgentId]) -> Result<()> {
        let path = self.store.owners_path(owner);
        self.write_record(path, &agents)
    }

    pub fn save_verification(&mut self, agent_id: &AgentId, verification: &Verification) -> Result<()> {
        let path = self.store.verification_path(agent_id, &verification.claim);
        self.write_record(path, verification)
    }

    pub fn save_claim_index(&mut self, agent_id: &AgentId, claims: &[ClaimHash]) -> Result<()> {
        let path = self.store.keyed_path(CLAIMS_DIR, &agent_id.0);
        self.write_record(path, &claims)
    }

    /// Append one interaction to its target's log.
    pub fn append_interaction(&mut self, interaction: &Interaction) -> Result<()> {
        let path = self.store.interaction_log_path(&interaction.to_agent);
        self.remember_len(&path)?;
        append_lines(&path, std::slice::from_ref(interaction))
    }

    /// Move `archived` into the archive log and replace the live log with
    /// `retained`.
    pub fn archive_interactions(
        &mut self,
        agent_id: &AgentId,
        archived: &[Interaction],
        retained: &[Interaction],
    ) -> Result<()> {
        let archive = self.store.archive_path(agent_id);
        self.remember_len(&archive)?;
        append_lines(&archive, archived)?;

        let live = self.store.interaction_log_path(agent_id);
        self.remember_contents(&live)?;
        write_atomic(&live, &encode_lines(retained)?)
    }

    /// Keep every write made so far.
    pub fn commit(mut self) {
        self.undo.clear();
        self.committed = true;
    }

    fn write_record<T: Serialize>(&mut self, path: PathBuf, record: &T) -> Result<()> {
        self.remember_contents(&path)?;
        self.store.write_record(&path, record)
    }

    fn remember_contents(&mut self, path: &Path) -> Result<()> {
        let previous = match std::fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        self.undo.push(Undo::Restore {
            path: path.to_path_buf(),
            previous,
        });
        Ok(())
    }

    fn remember_len(&mut self, path: &Path) -> Result<()> {
        let len = match std::fs::metadata(path) {
            Ok(meta) => Some(meta.len()),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        self.undo.push(Undo::Truncate {
            path: path.to_path_buf(),
            len,
        });
        Ok(())
    }

    fn rollback(&mut self) {
        while let Some(step) = self.undo.pop() {
            let (path, outcome) = match step {
                Undo::Restore {
                    path,
                    previous: Some(bytes),
                } => {
                    let outcome = write_atomic(&path, &bytes);
                    (path, outcome)
                }
                Undo::Restore {
                    path,
                    previous: None,
                }
                | Undo::Truncate { path, len: None } => {
                    let outcome = remove_if_present(&path);
                    (path, outcome)
                }
                Undo::Truncate {
                    path,
                    len: Some(len),
                } => {
                    let outcome = OpenOptions::new()
                        .write(true)
                        .open(&path)
                        .and_then(|file| file.set_len(len))
                        .map_err(RegistryError::from);
                    (path, outcome)
                }
            };
            match outcome {
                Ok(()) => log::debug!("rolled back {}", path.display()),
                Err(e) => log::error!("failed to roll back {}: {e}", path.display()),
            }
        }
    }
}

impl Drop for StoreTransaction<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.rollback();
        }
    }
}

// ── Free helpers ──────────────────────────────────────────────────────────────

fn check_version(version: u32, path: &Path) -> Result<()> {
    if version != RECORD_FILE_VERSION {
        return Err(RegistryError::InvalidFileFormat(format!(
            "unsupported record version {version} in {}",
            path.display()
        )));
    }
    Ok(())
}

fn encode_line(interaction: &Interaction) -> Result<String> {
    let file = RecordFile {
        version: RECORD_FILE_VERSION,
        record: interaction,
    };
    let mut line = serde_json::to_string(&file)
        .map_err(|e| RegistryError::SerializationError(e.to_string()))?;
    line.push('\n');
    Ok(line)
}

fn encode_lines(interactions: &[Interaction]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    for interaction in interactions {
        buf.extend_from_slice(encode_line(interaction)?.as_bytes());
    }
    Ok(buf)
}

fn append_lines(path: &Path, interactions: &[Interaction]) -> Result<()> {
    if interactions.is_empty() {
        return Ok(());
    }
    let buf = encode_lines(interactions)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(&buf)?;
    file.sync_data()?;
    Ok(())
}

fn read_lines(path: &Path) -> Result<Vec<Interaction>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let reader = BufReader::new(File::open(path)?);
    let mut out = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let file: RecordFile<Interaction> = serde_json::from_str(&line).map_err(|e| {
            RegistryError::InvalidFileFormat(format!(
                "failed to parse {} line {}: {e}",
                path.display(),
                n + 1
            ))
        })?;
        check_version(file.version, path)?;
        out.push(file.record);
    }
    Ok(out)
}

fn remove_if_present(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

/// Write `data` to `path` via a sibling temp file and rename.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);
    std::fs::write(&tmp_path, data)?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
