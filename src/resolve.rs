use crate::codec::{BLOB, COMMIT, TAG, TREE};
use crate::error::GitError;
use crate::object::{self, GitObject};
use crate::refs;
use crate::repository::Repository;
use anyhow::{Result, bail};
use std::fs;

fn looks_like_hex(s: &str) -> bool {
    (4..=40).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// All object ids `name` could plausibly refer to, per spec §4.7's five
/// resolution rules. Results are unioned, not prioritized; the caller
/// disambiguates.
pub fn candidates(repo: &Repository, name: &str) -> Result<Vec<String>> {
    let mut out = Vec::new();

    if name == "HEAD" {
        if let Some(id) = refs::resolve(repo, "HEAD")? {
            out.push(id);
        }
    }

    if looks_like_hex(name) {
        let lower = name.to_lowercase();
        let shard = &lower[..2];
        let rest = &lower[2..];
        let shard_dir = repo.path(&["objects", shard]);
        if shard_dir.is_dir() {
            for entry in fs::read_dir(&shard_dir)? {
                let entry = entry?;
                let filename = entry.file_name().to_string_lossy().into_owned();
                if filename.starts_with(rest) {
                    out.push(format!("{shard}{filename}"));
                }
            }
        }
    }

    for prefix in ["refs/tags/", "refs/heads/", "refs/remotes/"] {
        if let Some(id) = refs::resolve(repo, &format!("{prefix}{name}"))? {
            out.push(id);
        }
    }

    out.sort();
    out.dedup();
    Ok(out)
}

/// Resolve `name` to exactly one object id, failing loudly on zero or
/// multiple candidates.
pub fn resolve_name(repo: &Repository, name: &str) -> Result<String> {
    let mut found = candidates(repo, name)?;
    match found.len() {
        0 => bail!(GitError::UnknownReference(name.to_string())),
        1 => Ok(found.remove(0)),
        _ => bail!(GitError::AmbiguousReference(name.to_string(), found)),
    }
}

/// Maximum number of tag/commit dereferences `follow` will chase before
/// declaring a cycle (spec design notes: recursion bounds on type-directed
/// follow, since the on-disk data can be adversarial).
const MAX_FOLLOW_DEPTH: u32 = 16;

/// Repeatedly dereference `id` until an object of kind `want` is reached:
/// a tag's `object` header is followed, a commit's `tree` header is followed
/// when a tree is wanted, anything else is a dead end.
pub fn follow(repo: &Repository, id: &str, want: &str) -> Result<String> {
    let mut current = id.to_string();
    let mut depth = 0u32;
    loop {
        if depth > MAX_FOLLOW_DEPTH {
            bail!(GitError::ReferenceCycle(current));
        }
        depth += 1;
        let Some(obj) = object::read(repo, &current)? else {
            bail!(GitError::UnknownReference(current));
        };
        let kind = obj.kind();
        if kind == want {
            return Ok(current);
        }
        match &obj {
            GitObject::Tag(kvlm) => {
                let Some(target) = kvlm.get(b"object") else {
                    bail!(GitError::TypeMismatch(current.clone(), kind_static(kind), kind_static(want)));
                };
                current = String::from_utf8_lossy(target).into_owned();
            }
            GitObject::Commit(kvlm) if want == TREE => {
                let Some(target) = kvlm.get(b"tree") else {
                    bail!(GitError::TypeMismatch(current.clone(), "commit", "tree"));
                };
                current = String::from_utf8_lossy(target).into_owned();
            }
            _ => {
                bail!(GitError::TypeMismatch(current.clone(), kind_static(kind), kind_static(want)));
            }
        }
    }
}

/// Resolve `name` and follow it to an object of kind `want` in one step.
pub fn find(repo: &Repository, name: &str, want: &str) -> Result<String> {
    let id = resolve_name(repo, name)?;
    follow(repo, &id, want)
}

fn kind_static(kind: &str) -> &'static str {
    match kind {
        BLOB => "blob",
        TREE => "tree",
        COMMIT => "commit",
        TAG => "tag",
        _ => "unknown",
    }
}
