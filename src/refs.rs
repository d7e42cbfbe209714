use crate::error::GitError;
use crate::repository::Repository;
use anyhow::{Context, Result, bail};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Maximum number of symbolic hops `resolve` will follow before declaring a
/// cycle. The on-disk data is adversarial by assumption (spec design notes).
const MAX_RESOLVE_DEPTH: u32 = 16;

/// A node in the tree-shaped reference listing produced by `list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefNode {
    Leaf(String),
    Branch(BTreeMap<String, RefNode>),
}

/// Resolve `name` (a path relative to the gitdir, e.g. `HEAD` or
/// `refs/heads/main`) to a direct 40-hex object id, following symbolic
/// references transitively. Returns `None` if the ref file does not exist.
pub fn resolve(repo: &Repository, name: &str) -> Result<Option<String>> {
    resolve_depth(repo, name, 0)
}

fn resolve_depth(repo: &Repository, name: &str, depth: u32) -> Result<Option<String>> {
    if depth > MAX_RESOLVE_DEPTH {
        bail!(GitError::ReferenceCycle(name.to_string()));
    }
    let path = repo.gitdir.join(name);
    if !path.is_file() {
        return Ok(None);
    }
    let contents = fs::read_to_string(&path).with_context(|| format!("reading ref {name}"))?;
    let contents = contents.trim_end_matches('\n');
    if let Some(target) = contents.strip_prefix("ref: ") {
        resolve_depth(repo, target.trim(), depth + 1)
    } else {
        Ok(Some(contents.to_string()))
    }
}

/// Read the raw content of a ref file without following symbolic pointers:
/// either `Direct(id)` or `Symbolic(target)`.
pub enum RawRef {
    Direct(String),
    Symbolic(String),
}

pub fn read_raw(repo: &Repository, name: &str) -> Result<Option<RawRef>> {
    let path = repo.gitdir.join(name);
    if !path.is_file() {
        return Ok(None);
    }
    let contents = fs::read_to_string(&path).with_context(|| format!("reading ref {name}"))?;
    let contents = contents.trim_end_matches('\n');
    Ok(Some(match contents.strip_prefix("ref: ") {
        Some(target) => RawRef::Symbolic(target.trim().to_string()),
        None => RawRef::Direct(contents.to_string()),
    }))
}

/// Walk `<gitdir>/refs` in lexical order and resolve every leaf, producing a
/// tree mirroring the directory structure.
pub fn list(repo: &Repository) -> Result<BTreeMap<String, RefNode>> {
    list_dir(repo, &repo.gitdir.join("refs"), "refs")
}

fn list_dir(repo: &Repository, dir: &Path, rel: &str) -> Result<BTreeMap<String, RefNode>> {
    let mut out = BTreeMap::new();
    if !dir.is_dir() {
        return Ok(out);
    }
    let mut names: Vec<_> = fs::read_dir(dir)
        .with_context(|| format!("listing {}", dir.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();

    for name in names {
        let child_path = dir.join(&name);
        let child_rel = format!("{rel}/{name}");
        if child_path.is_dir() {
            let sub = list_dir(repo, &child_path, &child_rel)?;
            out.insert(name, RefNode::Branch(sub));
        } else if let Some(id) = resolve(repo, &child_rel)? {
            out.insert(name, RefNode::Leaf(id));
        }
    }

    Ok(out)
}

/// Write `<id>\n` to the ref file `name`, creating parent directories as
/// needed. Uses write-to-temp-then-rename so concurrent readers never observe
/// a truncated ref.
pub fn create(repo: &Repository, name: &str, id: &str) -> Result<()> {
    let path = repo.gitdir.join(name);
    let dir = path.parent().expect("ref path always has a parent");
    fs::create_dir_all(dir).with_context(|| format!("creating directory {}", dir.display()))?;

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;
    writeln!(tmp, "{id}")?;
    tmp.persist(&path)
        .with_context(|| format!("persisting ref {name}"))?;
    Ok(())
}
