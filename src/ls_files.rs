use crate::index::Index;
use crate::repository::Repository;
use anyhow::Result;
use chrono::{Local, TimeZone};
use std::io::{Write, stdout};

/// `ls-files [--verbose]`: print the staging index's entries. Plain mode
/// prints one name per line; `--verbose` additionally prints each entry's
/// mode, stage, and timestamps, mirroring `git ls-files --debug`.
pub fn git_ls_files(repo: &Repository, verbose: bool) -> Result<()> {
    let index = Index::read(&repo.gitdir.join("index"))?;
    let mut out = stdout().lock();
    for entry in &index.entries {
        if !verbose {
            writeln!(out, "{}", entry.name)?;
            continue;
        }
        writeln!(out, "{}", entry.name)?;
        writeln!(out, "  mode: {:o}  stage: {}", entry.mode, entry.stage)?;
        writeln!(
            out,
            "  ctime: {}  mtime: {}",
            format_stamp(entry.ctime_secs),
            format_stamp(entry.mtime_secs)
        )?;
        writeln!(out, "  uid: {}  gid: {}  size: {}", entry.uid, entry.gid, entry.size)?;
        writeln!(out, "  object: {}", hex::encode(entry.id))?;
    }
    Ok(())
}

fn format_stamp(secs: u32) -> String {
    Local
        .timestamp_opt(secs as i64, 0)
        .single()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| secs.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexEntry;
    use crate::repository;

    #[test]
    fn lists_entry_names() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository::create(dir.path()).unwrap();
        let mut index = Index::new();
        index.entries.push(IndexEntry {
            ctime_secs: 1700000000,
            ctime_nanos: 0,
            mtime_secs: 1700000000,
            mtime_nanos: 0,
            dev: 0,
            ino: 0,
            mode: 0o100644,
            uid: 0,
            gid: 0,
            size: 3,
            id: [1; 20],
            assume_valid: false,
            stage: 0,
            name: "a.txt".to_string(),
        });
        index.write(&repo.gitdir.join("index")).unwrap();
        assert!(git_ls_files(&repo, false).is_ok());
        assert!(git_ls_files(&repo, true).is_ok());
    }
}
