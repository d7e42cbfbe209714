use crate::ignore::IgnoreEngine;
use crate::index::Index;
use crate::object::{self, GitObject};
use crate::refs::{self, RawRef};
use crate::repository::Repository;
use crate::resolve;
use anyhow::{Context, Result};
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Branch {
    Named(String),
    Detached(String),
}

#[derive(Debug, Default, Clone)]
pub struct HeadIndexDiff {
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
}

#[derive(Debug, Default, Clone)]
pub struct WorktreeDiff {
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
    pub untracked: Vec<String>,
}

pub struct Status {
    pub branch: Branch,
    pub head_index: HeadIndexDiff,
    pub worktree: WorktreeDiff,
}

/// Read `HEAD`; report the branch name if it points into `refs/heads/...`,
/// else the directly-referenced id (detached HEAD).
pub fn branch_identity(repo: &Repository) -> Result<Branch> {
    match refs::read_raw(repo, "HEAD")?.context("HEAD is missing")? {
        RawRef::Symbolic(target) => {
            let name = target
                .strip_prefix("refs/heads/")
                .unwrap_or(&target)
                .to_string();
            Ok(Branch::Named(name))
        }
        RawRef::Direct(id) => Ok(Branch::Detached(id)),
    }
}

/// Flatten the tree reachable from `tree_id` into `path -> id`, recursing
/// into subtrees.
fn flatten_tree(repo: &Repository, tree_id: &str, prefix: &str) -> Result<BTreeMap<String, String>> {
    let mut out = BTreeMap::new();
    let Some(obj) = object::read(repo, tree_id)? else {
        return Ok(out);
    };
    let GitObject::Tree(tree) = obj else {
        return Ok(out);
    };
    for entry in &tree.entries {
        let path = if prefix.is_empty() {
            entry.path.clone()
        } else {
            format!("{prefix}/{}", entry.path)
        };
        if entry.mode.starts_with("04") {
            out.extend(flatten_tree(repo, &hex::encode(entry.id), &path)?);
        } else {
            out.insert(path, hex::encode(entry.id));
        }
    }
    Ok(out)
}

/// Compare the tree reachable from HEAD against the index's stage-0 entries.
pub fn head_vs_index(repo: &Repository, index: &Index) -> Result<HeadIndexDiff> {
    let mut diff = HeadIndexDiff::default();

    let mut head_map = match refs::resolve(repo, "HEAD")? {
        Some(commit_id) => {
            let tree_id = resolve::follow(repo, &commit_id, crate::codec::TREE)?;
            flatten_tree(repo, &tree_id, "")?
        }
        None => BTreeMap::new(),
    };

    for entry in index.staged() {
        let id = hex::encode(entry.id);
        match head_map.remove(&entry.name) {
            Some(head_id) if head_id == id => {}
            Some(_) => diff.modified.push(entry.name.clone()),
            None => diff.added.push(entry.name.clone()),
        }
    }

    diff.deleted.extend(head_map.into_keys());
    diff.added.sort();
    diff.modified.sort();
    diff.deleted.sort();
    Ok(diff)
}

/// Compare the index's stage-0 entries against the actual worktree files,
/// and list untracked worktree files not referenced by the index or ignored.
pub fn index_vs_worktree(repo: &Repository, index: &Index, ignore: &IgnoreEngine) -> Result<WorktreeDiff> {
    let mut diff = WorktreeDiff::default();
    let indexed: std::collections::HashSet<&str> =
        index.staged().map(|e| e.name.as_str()).collect();

    for entry in index.staged() {
        let path = repo.worktree.join(&entry.name);
        let Ok(meta) = fs::symlink_metadata(&path) else {
            diff.deleted.push(entry.name.clone());
            continue;
        };

        let (ctime_secs, ctime_nanos, mtime_secs, mtime_nanos) = stat_times(&meta);
        let stat_matches = ctime_secs == entry.ctime_secs
            && ctime_nanos == entry.ctime_nanos
            && mtime_secs == entry.mtime_secs
            && mtime_nanos == entry.mtime_nanos;

        if stat_matches {
            continue;
        }

        let contents = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
        let hash = hash_blob(&contents);
        if hash != hex::encode(entry.id) {
            diff.modified.push(entry.name.clone());
        }
    }

    for relative in walk_worktree(repo)? {
        if indexed.contains(relative.as_str()) {
            continue;
        }
        if ignore.is_ignored(&relative) {
            continue;
        }
        diff.untracked.push(relative);
    }

    diff.modified.sort();
    diff.deleted.sort();
    diff.untracked.sort();
    Ok(diff)
}

fn hash_blob(contents: &[u8]) -> String {
    let mut header = Vec::new();
    header.extend_from_slice(b"blob ");
    header.extend_from_slice(contents.len().to_string().as_bytes());
    header.push(0);
    header.extend_from_slice(contents);
    let mut hasher = Sha1::new();
    hasher.update(&header);
    hex::encode(hasher.finalize())
}

#[cfg(unix)]
fn stat_times(meta: &fs::Metadata) -> (u32, u32, u32, u32) {
    use std::os::unix::fs::MetadataExt;
    (
        meta.ctime() as u32,
        meta.ctime_nsec() as u32,
        meta.mtime() as u32,
        meta.mtime_nsec() as u32,
    )
}

#[cfg(not(unix))]
fn stat_times(_meta: &fs::Metadata) -> (u32, u32, u32, u32) {
    (0, 0, 0, 0)
}

/// Walk the worktree, excluding the gitdir subtree, returning repo-relative
/// forward-slash paths.
fn walk_worktree(repo: &Repository) -> Result<Vec<String>> {
    let mut out = Vec::new();
    let walker = ignore::WalkBuilder::new(&repo.worktree)
        .hidden(false)
        .git_ignore(false)
        .git_exclude(false)
        .git_global(false)
        .ignore(false)
        .parents(false)
        .build();

    for entry in walker {
        let entry = entry.context("walking worktree")?;
        if entry.depth() == 0 {
            continue;
        }
        if entry.file_name() == ".git" {
            continue;
        }
        if entry.file_type().is_some_and(|t| t.is_dir()) {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(&repo.worktree)
            .unwrap_or(entry.path());
        out.push(path_to_slash(relative));
    }
    Ok(out)
}

fn path_to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexEntry;
    use crate::object::{self, GitObject};
    use crate::repository;
    use crate::tree::{Tree, TreeEntry};

    fn entry(name: &str, id: [u8; 20]) -> IndexEntry {
        IndexEntry {
            ctime_secs: 0,
            ctime_nanos: 0,
            mtime_secs: 0,
            mtime_nanos: 0,
            dev: 0,
            ino: 0,
            mode: 0o100644,
            uid: 0,
            gid: 0,
            size: 0,
            id,
            assume_valid: false,
            stage: 0,
            name: name.to_string(),
        }
    }

    #[test]
    fn head_vs_index_detects_added_modified_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository::create(dir.path()).unwrap();

        let blob_a = object::write(&GitObject::Blob(b"a".to_vec()), Some(&repo)).unwrap();
        let blob_b_old = object::write(&GitObject::Blob(b"b-old".to_vec()), Some(&repo)).unwrap();
        let blob_b_new = object::write(&GitObject::Blob(b"b-new".to_vec()), Some(&repo)).unwrap();
        let blob_c = object::write(&GitObject::Blob(b"c".to_vec()), Some(&repo)).unwrap();

        let mut id_a = [0u8; 20];
        id_a.copy_from_slice(&hex::decode(&blob_a).unwrap());
        let mut id_b_old = [0u8; 20];
        id_b_old.copy_from_slice(&hex::decode(&blob_b_old).unwrap());
        let mut id_b_new = [0u8; 20];
        id_b_new.copy_from_slice(&hex::decode(&blob_b_new).unwrap());
        let mut id_c = [0u8; 20];
        id_c.copy_from_slice(&hex::decode(&blob_c).unwrap());

        let tree = Tree {
            entries: vec![
                TreeEntry { mode: "100644".into(), path: "a.txt".into(), id: id_a },
                TreeEntry { mode: "100644".into(), path: "b.txt".into(), id: id_b_old },
                TreeEntry { mode: "100644".into(), path: "c.txt".into(), id: id_c },
            ],
        };
        let tree_id = object::write(&GitObject::Tree(tree), Some(&repo)).unwrap();

        let mut commit = crate::kvlm::Kvlm::new();
        commit.push("tree", tree_id.clone());
        commit.message = b"msg\n".to_vec();
        let commit_id = object::write(&GitObject::Commit(commit), Some(&repo)).unwrap();
        crate::refs::create(&repo, "refs/heads/master", &commit_id).unwrap();

        let mut index = Index::new();
        index.entries.push(entry("a.txt", id_a));
        index.entries.push(entry("b.txt", id_b_new));
        index.entries.push(entry("d.txt", id_c));

        let diff = head_vs_index(&repo, &index).unwrap();
        assert_eq!(diff.added, vec!["d.txt"]);
        assert_eq!(diff.modified, vec!["b.txt"]);
        assert_eq!(diff.deleted, vec!["c.txt"]);
    }

    #[test]
    fn branch_identity_detached_vs_named() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository::create(dir.path()).unwrap();
        crate::refs::create(&repo, "refs/heads/master", &"a".repeat(40)).unwrap();
        assert_eq!(branch_identity(&repo).unwrap(), Branch::Named("master".to_string()));

        fs::write(repo.gitdir.join("HEAD"), format!("{}\n", "b".repeat(40))).unwrap();
        assert_eq!(branch_identity(&repo).unwrap(), Branch::Detached("b".repeat(40)));
    }

    #[test]
    fn worktree_diff_reflects_edits_and_untracked_files() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository::create(dir.path()).unwrap();
        fs::write(dir.path().join("tracked.txt"), b"original\n").unwrap();

        let index = crate::index::stage_worktree(&repo).unwrap();
        index.write(&repo.gitdir.join("index")).unwrap();

        // Unmodified: no worktree vs index drift yet.
        let ignore = IgnoreEngine::load(&repo, &index).unwrap();
        let diff = index_vs_worktree(&repo, &index, &ignore).unwrap();
        assert!(diff.modified.is_empty());
        assert!(diff.deleted.is_empty());

        // Edit the tracked file's content (stat-based drift plus real hash change).
        std::thread::sleep(std::time::Duration::from_millis(10));
        fs::write(dir.path().join("tracked.txt"), b"changed\n").unwrap();
        fs::write(dir.path().join("new.txt"), b"new\n").unwrap();

        let diff = index_vs_worktree(&repo, &index, &ignore).unwrap();
        assert_eq!(diff.modified, vec!["tracked.txt"]);
        assert_eq!(diff.untracked, vec!["new.txt"]);

        fs::remove_file(dir.path().join("tracked.txt")).unwrap();
        let diff = index_vs_worktree(&repo, &index, &ignore).unwrap();
        assert_eq!(diff.deleted, vec!["tracked.txt"]);
    }
}
