use crate::{
    error::{NexusError, Result},
    model::{ChatLogEntry, Problem, ProblemStatus, SessionOwner, SessionRecord},
    validation,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

pub const STORE_FILE_NAME: &str = "nexus.json";
pub const LOCK_FILE_NAME: &str = "nexus.json.lock";

const LOCK_TIMEOUT: Duration = Duration::from_secs(5);
const LOCK_RETRY: Duration = Duration::from_millis(20);
/// A lock older than this was left by a process that died mid-write.
const STALE_LOCK_AGE: Duration = Duration::from_secs(30);

/// Everything the store persists, written as one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    problems: BTreeMap<String, Problem>,
    #[serde(default)]
    work_sessions: Vec<SessionRecord>,
    #[serde(default)]
    chat_logs: Vec<ChatLogEntry>,
    #[serde(default)]
    next_session_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session_owner: Option<SessionOwner>,
}

impl StoreData {
    /// Drop the owner record once its problem has left IN_PROGRESS.
    fn release_finished_owner(&mut self) {
        let finished = self.session_owner.as_ref().is_some_and(|owner| {
            self.problems
                .get(&owner.problem_id)
                .is_none_or(|p| p.status != ProblemStatus::InProgress)
        });
        if finished {
            self.session_owner = None;
        }
    }
}

/// Durable storage for problems, work sessions and chat logs.
///
/// `nexus.json` is the only copy of the state. Several `nexus` processes may
/// share a data directory, so every read loads the document from disk and
/// every write runs under `nexus.json.lock`: reload, apply the change, write
/// a temp file in the data directory and rename it over `nexus.json`. A write
/// that fails at any step leaves the previous document in place.
pub struct ProblemStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl ProblemStore {
    pub fn open(data_path: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_path).map_err(|e| {
            NexusError::Storage(format!(
                "Failed to create data directory {}: {}",
                data_path.display(),
                e
            ))
        })?;

        let store = Self {
            path: data_path.join(STORE_FILE_NAME),
            lock_path: data_path.join(LOCK_FILE_NAME),
        };
        let data = store.load()?;

        tracing::debug!(
            path = %store.path.display(),
            problems = data.problems.len(),
            sessions = data.work_sessions.len(),
            "Opened problem store"
        );

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert or replace a problem by id.
    pub fn save_problem(&mut self, problem: &Problem) -> Result<()> {
        self.save_problems(std::slice::from_ref(problem))
    }

    /// Insert or replace several problems in one commit. Nothing is written
    /// unless every problem is valid.
    pub fn save_problems(&mut self, problems: &[Problem]) -> Result<()> {
        if problems.is_empty() {
            return Ok(());
        }
        for problem in problems {
            validation::validate_problem(problem)?;
        }
        tracing::debug!(count = problems.len(), "Saving problems");

        self.update(|data| {
            for problem in problems {
                data.problems.insert(problem.id.clone(), problem.clone());
            }
            Ok(())
        })
    }

    /// Apply `change` to the stored problem and write it back in one commit.
    pub fn modify_problem<F>(&mut self, id: &str, change: F) -> Result<Problem>
    where
        F: FnOnce(&mut Problem) -> Result<()>,
    {
        self.update(|data| {
            let problem = data
                .problems
                .get_mut(id)
                .ok_or_else(|| NexusError::NotFound(id.to_string()))?;
            change(problem)?;
            validation::validate_problem(problem)?;
            Ok(problem.clone())
        })
    }

    pub fn get_problems(&self, status: Option<ProblemStatus>) -> Result<Vec<Problem>> {
        let mut problems: Vec<Problem> = self
            .load()?
            .problems
            .into_values()
            .filter(|p| status.is_none_or(|s| p.status == s))
            .collect();
        problems.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(problems)
    }

    pub fn get_problem(&self, id: &str) -> Result<Problem> {
        self.load()?
            .problems
            .remove(id)
            .ok_or_else(|| NexusError::NotFound(id.to_string()))
    }

    pub fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.load()?.problems.contains_key(id))
    }

    pub fn known_ids(&self) -> Result<HashSet<String>> {
        Ok(self.load()?.problems.into_keys().collect())
    }

    /// The process holding the open work session, if any.
    pub fn session_owner(&self) -> Result<Option<SessionOwner>> {
        Ok(self.load()?.session_owner)
    }

    /// Move `expected` to IN_PROGRESS as `claimed` and record `owner`.
    ///
    /// Fails with a conflict when any problem is already IN_PROGRESS or the
    /// stored problem no longer matches `expected`.
    pub fn claim_problem(
        &mut self,
        expected: &Problem,
        claimed: &Problem,
        owner: SessionOwner,
    ) -> Result<()> {
        validation::validate_problem(claimed)?;
        if claimed.id != expected.id || owner.problem_id != claimed.id {
            return Err(NexusError::Validation(format!(
                "Claim for {} does not match problem {}",
                owner.problem_id, expected.id
            )));
        }

        self.update(|data| {
            if let Some(busy) = data
                .problems
                .values()
                .find(|p| p.status == ProblemStatus::InProgress)
            {
                return Err(NexusError::Conflict(format!(
                    "Problem {} is already in progress",
                    busy.id
                )));
            }
            let current = data
                .problems
                .get(&expected.id)
                .ok_or_else(|| NexusError::NotFound(expected.id.clone()))?;
            if current.status != expected.status || current.updated_at != expected.updated_at {
                return Err(NexusError::Conflict(format!(
                    "Problem {} was modified since it was loaded; reload and try again",
                    expected.id
                )));
            }
            data.problems.insert(claimed.id.clone(), claimed.clone());
            data.session_owner = Some(owner);
            Ok(())
        })
    }

    /// Take over the session on a problem left IN_PROGRESS. Returns the problem.
    pub fn adopt_session(&mut self, owner: SessionOwner) -> Result<Problem> {
        self.update(|data| {
            if let Some(current) = data
                .session_owner
                .as_ref()
                .filter(|o| o.problem_id == owner.problem_id && o.held_elsewhere())
            {
                return Err(NexusError::Conflict(format!(
                    "Problem {} has an open session in process {}",
                    current.problem_id, current.pid
                )));
            }
            let problem = data
                .problems
                .get(&owner.problem_id)
                .filter(|p| p.status == ProblemStatus::InProgress)
                .cloned()
                .ok_or_else(|| {
                    NexusError::Conflict(format!(
                        "Problem {} is no longer in progress",
                        owner.problem_id
                    ))
                })?;
            data.session_owner = Some(owner);
            Ok(problem)
        })
    }

    /// Append a closed session. Returns the record with its assigned id.
    pub fn save_session(&mut self, record: &SessionRecord) -> Result<SessionRecord> {
        self.update(|data| stage_session(data, record))
    }

    /// Append a closed session and upsert its problem in one commit.
    ///
    /// The stored problem must still be IN_PROGRESS under this session;
    /// otherwise another process closed it first and this is a conflict.
    pub fn close_session(
        &mut self,
        record: &SessionRecord,
        problem: &Problem,
    ) -> Result<SessionRecord> {
        validation::validate_problem(problem)?;
        if record.problem_id != problem.id {
            return Err(NexusError::Validation(format!(
                "Session belongs to {} but problem is {}",
                record.problem_id, problem.id
            )));
        }

        let record = self.update(|data| {
            let in_progress = data
                .problems
                .get(&problem.id)
                .is_some_and(|p| p.status == ProblemStatus::InProgress);
            let owned_elsewhere = data
                .session_owner
                .as_ref()
                .is_some_and(|owner| owner.problem_id != problem.id);
            if !in_progress || owned_elsewhere {
                return Err(NexusError::Conflict(format!(
                    "Problem {} is no longer in progress",
                    problem.id
                )));
            }

            let record = stage_session(data, record)?;
            data.problems.insert(problem.id.clone(), problem.clone());
            Ok(record)
        })?;

        tracing::info!(
            id = %problem.id,
            session = record.id,
            outcome = %record.outcome,
            hours = record.elapsed_hours,
            "Closed work session"
        );
        Ok(record)
    }

    pub fn sessions_for(&self, problem_id: &str) -> Result<Vec<SessionRecord>> {
        Ok(self
            .load()?
            .work_sessions
            .into_iter()
            .filter(|s| s.problem_id == problem_id)
            .collect())
    }

    pub fn append_chat_log(&mut self, entry: &ChatLogEntry) -> Result<()> {
        self.append_chat_logs(std::slice::from_ref(entry))
    }

    /// Append chat entries in one commit.
    pub fn append_chat_logs(&mut self, entries: &[ChatLogEntry]) -> Result<()> {
        for entry in entries {
            validation::validate_id(&entry.problem_id)?;
        }
        self.update(|data| {
            data.chat_logs.extend_from_slice(entries);
            Ok(())
        })
    }

    pub fn chat_logs_for(&self, problem_id: &str) -> Result<Vec<ChatLogEntry>> {
        Ok(self
            .load()?
            .chat_logs
            .into_iter()
            .filter(|e| e.problem_id == problem_id)
            .collect())
    }

    fn load(&self) -> Result<StoreData> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(StoreData::default()),
            Err(e) => {
                return Err(NexusError::Storage(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };
        serde_json::from_str(&content).map_err(|e| {
            NexusError::Storage(format!("Corrupt store {}: {}", self.path.display(), e))
        })
    }

    /// Reload the document under the lock, apply `change` and write it back.
    fn update<T, F>(&mut self, change: F) -> Result<T>
    where
        F: FnOnce(&mut StoreData) -> Result<T>,
    {
        let _lock = StoreLock::acquire(&self.lock_path)?;
        let mut data = self.load()?;
        let value = change(&mut data)?;
        data.release_finished_owner();

        let content = serde_json::to_string_pretty(&data)
            .map_err(|e| NexusError::Storage(format!("Failed to serialize store: {}", e)))?;
        atomic_write(&self.path, &content)?;
        Ok(value)
    }
}

fn stage_session(data: &mut StoreData, record: &SessionRecord) -> Result<SessionRecord> {
    validation::validate_id(&record.problem_id)?;
    if record.end_time < record.start_time {
        return Err(NexusError::Validation(
            "Session ends before it starts".to_string(),
        ));
    }
    data.next_session_id += 1;
    let mut record = record.clone();
    record.id = data.next_session_id;
    data.work_sessions.push(record.clone());
    Ok(record)
}

/// Exclusive write access to the store, held as a lock file next to it.
///
/// The file is created with `create_new`, so only one process can hold it.
/// Dropping the guard removes it.
struct StoreLock {
    path: PathBuf,
}

impl StoreLock {
    fn acquire(path: &Path) -> Result<Self> {
        let deadline = Instant::now() + LOCK_TIMEOUT;
        loop {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(mut file) => {
                    let lock = Self {
                        path: path.to_path_buf(),
                    };
                    writeln!(file, "{}", std::process::id()).map_err(|e| {
                        NexusError::Storage(format!("Failed to write lock file: {}", e))
                    })?;
                    return Ok(lock);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if lock_is_stale(path) {
                        tracing::warn!(path = %path.display(), "Removing stale store lock");
                        // Another waiter may have removed it already
                        let _ = std::fs::remove_file(path);
                        continue;
                    }
                    if Instant::now() >= deadline {
                        return Err(NexusError::Conflict(format!(
                            "Store is locked by another process ({})",
                            path.display()
                        )));
                    }
                    std::thread::sleep(LOCK_RETRY);
                }
                Err(e) => {
                    return Err(NexusError::Storage(format!(
                        "Failed to create lock file {}: {}",
                        path.display(),
                        e
                    )));
                }
            }
        }
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove store lock");
        }
    }
}

fn lock_is_stale(path: &Path) -> bool {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| modified.elapsed().ok())
        .is_some_and(|age| age > STALE_LOCK_AGE)
}

/// Atomically write content to a file using temp file + rename
fn atomic_write(target_path: &Path, content: &str) -> Result<()> {
    let target_dir = target_path
        .parent()
        .ok_or_else(|| NexusError::Storage("Target path has no parent directory".to_string()))?;

    // Temp file must live next to the target for the rename to be atomic
    let mut temp_file = NamedTempFile::new_in(target_dir)
        .map_err(|e| NexusError::Storage(format!("Failed to create temp file: {}", e)))?;

    temp_file
        .write_all(content.as_bytes())
        .map_err(|e| NexusError::Storage(format!("Failed to write to temp file: {}", e)))?;

    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| NexusError::Storage(format!("Failed to sync temp file: {}", e)))?;

    temp_file
        .persist(target_path)
        .map_err(|e| NexusError::Storage(format!("Failed to persist temp file: {}", e)))?;

    Ok(())
}
