use crate::repository;
use anyhow::Result;
use std::path::Path;

/// Scaffold a new, empty repository at `path`.
pub fn git_init(path: &Path) -> Result<()> {
    repository::create(path)?;
    Ok(())
}
