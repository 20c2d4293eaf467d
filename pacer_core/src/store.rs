//! JSONL data service for session records.
//!
//! Records are appended to a JSON Lines file under an exclusive `fs2` lock so
//! a second `pacer` process cannot interleave a half-written line.

use crate::recorder::SessionStore;
use crate::{Error, Result, SessionRecord};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// File name of the session log inside the data directory
pub const SESSIONS_FILE: &str = "sessions.jsonl";

/// Append-only JSONL session store
#[derive(Clone, Debug)]
pub struct JsonlSessionStore {
    path: PathBuf,
}

impl JsonlSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<data_dir>/sessions.jsonl`
    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(SESSIONS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, record: &SessionRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.lock_exclusive()?;

        let mut writer = BufWriter::new(&file);
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;
        tracing::debug!("Appended session {} to {:?}", record.id, self.path);
        Ok(())
    }
}

impl SessionStore for JsonlSessionStore {
    fn save_session(&self, record: &SessionRecord) -> Result<SessionRecord> {
        self.append(record)
            .map_err(|e| Error::Persistence(format!("{:?}: {}", self.path, e)))?;
        Ok(record.clone())
    }
}

/// Read every record in file order, skipping lines that fail to parse
pub fn read_sessions(path: &Path) -> Result<Vec<SessionRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let mut sessions = Vec::new();
    for (line_num, line) in BufReader::new(&file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<SessionRecord>(&line) {
            Ok(record) => sessions.push(record),
            Err(e) => tracing::warn!("Skipping session at line {}: {}", line_num + 1, e),
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} sessions from {:?}", sessions.len(), path);
    Ok(sessions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn record(plan: &str) -> SessionRecord {
        SessionRecord {
            id: Uuid::new_v4(),
            plan_id: plan.into(),
            plan_name: format!("{} plan", plan),
            plan_notes: String::new(),
            date: Utc::now(),
            duration_minutes: 20,
            calories_burned: 150,
            completed_exercises: vec![],
        }
    }

    #[test]
    fn test_save_and_read_back() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonlSessionStore::in_data_dir(&temp_dir.path().join("nested"));

        let first = store.save_session(&record("plan_0")).unwrap();
        store.save_session(&record("plan_1")).unwrap();

        let sessions = read_sessions(store.path()).unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, first.id);
        assert_eq!(sessions[1].plan_id, "plan_1");
    }

    #[test]
    fn test_corrupt_lines_are_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(SESSIONS_FILE);
        let store = JsonlSessionStore::new(&path);
        store.save_session(&record("plan_0")).unwrap();

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{not json").unwrap();
        drop(file);
        store.save_session(&record("plan_2")).unwrap();

        let sessions = read_sessions(&path).unwrap();
        assert_eq!(sessions.len(), 2);
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let sessions = read_sessions(&temp_dir.path().join("none.jsonl")).unwrap();
        assert!(sessions.is_empty());
    }

    #[test]
    fn test_unwritable_path_is_persistence_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        // A directory where the file should be
        let store = JsonlSessionStore::new(temp_dir.path());
        assert!(matches!(
            store.save_session(&record("plan_0")),
            Err(Error::Persistence(_))
        ));
    }
}
