//! Backup/restore of a skill directory around the risky validation window
//! (§4.5 steps 3 and 5).

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

pub fn backup_path_for(skill_path: &Path) -> PathBuf {
    let name = skill_path.file_name().unwrap_or_default();
    skill_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{}.backup", name.to_string_lossy()))
}

pub fn create_backup(skill_path: &Path) -> Result<PathBuf> {
    let backup = backup_path_for(skill_path);
    if backup.exists() {
        fs::remove_dir_all(&backup)?;
    }
    copy_dir_recursive(skill_path, &backup)?;
    Ok(backup)
}

pub fn restore_backup(skill_path: &Path, backup_path: &Path) -> Result<()> {
    if skill_path.exists() {
        fs::remove_dir_all(skill_path)?;
    }
    copy_dir_recursive(backup_path, skill_path)?;
    Ok(())
}

pub fn remove_backup(backup_path: &Path) -> Result<()> {
    if backup_path.exists() {
        fs::remove_dir_all(backup_path)?;
    }
    Ok(())
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let dest_path = dst.join(entry.file_name());
        if file_type.is_dir() {
            copy_dir_recursive(&entry.path(), &dest_path)?;
        } else {
            fs::copy(entry.path(), &dest_path)?;
        }
    }
    Ok(())
}
