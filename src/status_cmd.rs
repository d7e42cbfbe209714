use crate::ignore::IgnoreEngine;
use crate::index::Index;
use crate::repository::Repository;
use crate::status::{self, Branch};
use anyhow::Result;
use std::io::{Write, stdout};

/// `status`: summarize branch identity, HEAD vs index, and index vs worktree.
pub fn git_status(repo: &Repository) -> Result<()> {
    let index = Index::read(&repo.gitdir.join("index"))?;
    let ignore = IgnoreEngine::load(repo, &index)?;

    let branch = status::branch_identity(repo)?;
    let head_index = status::head_vs_index(repo, &index)?;
    let worktree = status::index_vs_worktree(repo, &index, &ignore)?;

    let mut out = stdout().lock();
    match branch {
        Branch::Named(name) => writeln!(out, "On branch {name}")?,
        Branch::Detached(id) => writeln!(out, "HEAD detached at {}", &id[..7])?,
    }

    writeln!(out, "\nChanges to be committed:")?;
    for path in &head_index.added {
        writeln!(out, "  new file:   {path}")?;
    }
    for path in &head_index.modified {
        writeln!(out, "  modified:   {path}")?;
    }
    for path in &head_index.deleted {
        writeln!(out, "  deleted:    {path}")?;
    }

    writeln!(out, "\nChanges not staged for commit:")?;
    for path in &worktree.modified {
        writeln!(out, "  modified:   {path}")?;
    }
    for path in &worktree.deleted {
        writeln!(out, "  deleted:    {path}")?;
    }

    writeln!(out, "\nUntracked files:")?;
    for path in &worktree.untracked {
        writeln!(out, "  {path}")?;
    }

    Ok(())
}
