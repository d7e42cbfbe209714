use crate::index::{Index, IndexEntry};
use crate::object::{self, GitObject};
use crate::repository::Repository;
use crate::tree::{Tree, TreeEntry};
use anyhow::Result;
use std::collections::BTreeMap;

/// `write-tree`: build and persist a tree object from the repository's
/// staging index, recursing one tree object per directory level.
///
/// Per the index's own contract (spec §4.8, §4.2), the tree a commit records
/// is always built from what was staged, not from a fresh walk of the
/// worktree — staging mutation itself is out of this crate's exposed command
/// surface, but `write-tree`/`commit` still need to honor that contract for
/// any index a caller hands them.
pub fn git_write_tree(repo: &Repository, index: &Index) -> Result<String> {
    let entries: Vec<&IndexEntry> = index.staged().collect();
    build_tree(repo, &entries, "")
}

/// Build (and persist) the tree for the directory level whose members are
/// `entries`, where each entry's `name` still carries `prefix` as a leading
/// component. Returns the new tree's id.
fn build_tree(repo: &Repository, entries: &[&IndexEntry], prefix: &str) -> Result<String> {
    let mut direct: Vec<TreeEntry> = Vec::new();
    let mut subdirs: BTreeMap<String, Vec<&IndexEntry>> = BTreeMap::new();

    for entry in entries {
        let rel = if prefix.is_empty() {
            entry.name.as_str()
        } else {
            entry.name.strip_prefix(prefix).and_then(|s| s.strip_prefix('/')).unwrap_or(&entry.name)
        };
        match rel.split_once('/') {
            None => direct.push(TreeEntry {
                mode: mode_string(entry),
                path: rel.to_string(),
                id: entry.id,
            }),
            Some((dir, _rest)) => {
                subdirs.entry(dir.to_string()).or_default().push(entry);
            }
        }
    }

    for (dir, members) in subdirs {
        let sub_prefix = if prefix.is_empty() { dir.clone() } else { format!("{prefix}/{dir}") };
        let sub_id = build_tree(repo, &members, &sub_prefix)?;
        let mut id = [0u8; 20];
        id.copy_from_slice(&hex::decode(&sub_id)?);
        direct.push(TreeEntry { mode: "040000".to_string(), path: dir, id });
    }

    let tree = Tree { entries: direct };
    object::write(&GitObject::Tree(tree), Some(repo))
}

/// The on-disk tree mode for an index entry, derived from its packed
/// type+permission bits (spec §4.8's mode field).
fn mode_string(entry: &IndexEntry) -> String {
    match entry.mode_type() {
        0b1010 => "120000".to_string(),
        0b1110 => "160000".to_string(),
        _ if entry.mode_perms() & 0o111 != 0 => "100755".to_string(),
        _ => "100644".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository;

    fn entry(name: &str, id: [u8; 20], perms: u16) -> IndexEntry {
        IndexEntry {
            ctime_secs: 0,
            ctime_nanos: 0,
            mtime_secs: 0,
            mtime_nanos: 0,
            dev: 0,
            ino: 0,
            mode: 0b1000_000_000_000_000 | perms,
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
    fn nests_directories_from_flat_index() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository::create(dir.path()).unwrap();

        let a_id = object::write(&GitObject::Blob(b"a".to_vec()), Some(&repo)).unwrap();
        let b_id = object::write(&GitObject::Blob(b"b".to_vec()), Some(&repo)).unwrap();
        let mut a_bytes = [0u8; 20];
        a_bytes.copy_from_slice(&hex::decode(&a_id).unwrap());
        let mut b_bytes = [0u8; 20];
        b_bytes.copy_from_slice(&hex::decode(&b_id).unwrap());

        let mut index = Index::new();
        index.entries.push(entry("top.txt", a_bytes, 0o644));
        index.entries.push(entry("sub/nested.txt", b_bytes, 0o644));

        let root_id = git_write_tree(&repo, &index).unwrap();
        let Some(GitObject::Tree(root)) = object::read(&repo, &root_id).unwrap() else {
            panic!("expected a tree")
        };
        assert_eq!(root.entries.len(), 2);
        let sub_entry = root.entries.iter().find(|e| e.path == "sub").unwrap();
        assert_eq!(sub_entry.mode, "040000");

        let sub_id = hex::encode(sub_entry.id);
        let Some(GitObject::Tree(sub)) = object::read(&repo, &sub_id).unwrap() else {
            panic!("expected nested tree")
        };
        assert_eq!(sub.entries[0].path, "nested.txt");
    }

    #[test]
    fn empty_index_yields_empty_tree_id() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository::create(dir.path()).unwrap();
        let root_id = git_write_tree(&repo, &Index::new()).unwrap();
        assert_eq!(root_id, "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
    }
}
