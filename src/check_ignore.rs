use crate::ignore::IgnoreEngine;
use crate::index::Index;
use crate::repository::Repository;
use anyhow::Result;
use std::io::{Write, stdout};

/// `check-ignore PATH...`: print each path that the ignore engine reports as
/// ignored.
pub fn git_check_ignore(repo: &Repository, paths: &[String]) -> Result<()> {
    let index = Index::read(&repo.gitdir.join("index"))?;
    let engine = IgnoreEngine::load(repo, &index)?;
    let mut out = stdout().lock();
    for path in paths {
        if engine.is_ignored(path) {
            writeln!(out, "{path}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{self, GitObject};
    use crate::repository;

    #[test]
    fn reports_only_ignored_paths() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository::create(dir.path()).unwrap();
        std::fs::write(repo.gitdir.join("info/exclude"), "*.log\n").unwrap();

        let out = {
            let index = Index::read(&repo.gitdir.join("index")).unwrap();
            let engine = IgnoreEngine::load(&repo, &index).unwrap();
            (engine.is_ignored("debug.log"), engine.is_ignored("readme.md"))
        };
        assert_eq!(out, (true, false));
        let _ = object::write(&GitObject::Blob(vec![]), Some(&repo));
    }
}
