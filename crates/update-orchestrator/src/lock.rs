//! Advisory lockfile inside the skill directory (§4.5 invariant, §5: "a
//! concurrent second orchestration against the same skill fails fast with
//! `SkillBusyError`"). Grounded on the store's own single-writer
//! `FileLock` (`cdc_store::store::FileLock`).

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::{OrchestratorError, Result};

pub struct SkillLock {
    path: PathBuf,
}

impl SkillLock {
    pub fn acquire(skill_path: &Path) -> Result<Self> {
        let lock_path = skill_path.join(".cdc-orchestrator.lock");
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
            .map_err(|_| OrchestratorError::SkillBusy {
                skill: skill_path.display().to_string(),
            })?;
        Ok(Self { path: lock_path })
    }
}

impl Drop for SkillLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_lock_on_same_skill_fails() {
        let dir = tempfile::tempdir().unwrap();
        let lock = SkillLock::acquire(dir.path()).unwrap();
        let second = SkillLock::acquire(dir.path());
        assert!(matches!(second, Err(OrchestratorError::SkillBusy { .. })));
        drop(lock);
        assert!(SkillLock::acquire(dir.path()).is_ok());
    }
}
