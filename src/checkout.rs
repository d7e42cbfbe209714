use crate::object::{self, GitObject};
use crate::repository::Repository;
use crate::resolve;
use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;

/// `checkout COMMIT PATH`: materialize the tree reachable from `COMMIT` into
/// `PATH`, which must not exist or must be empty.
pub fn git_checkout(repo: &Repository, commit: &str, target: &Path) -> Result<()> {
    let tree_id = resolve::find(repo, commit, "tree")?;

    if target.exists() {
        if !target.is_dir() {
            bail!("{} is not a directory", target.display());
        }
        if fs::read_dir(target)?.next().is_some() {
            bail!("{} is not empty", target.display());
        }
    } else {
        fs::create_dir_all(target)
            .with_context(|| format!("creating checkout directory {}", target.display()))?;
    }

    materialize(repo, &tree_id, target)
}

fn materialize(repo: &Repository, tree_id: &str, dest: &Path) -> Result<()> {
    let Some(GitObject::Tree(tree)) = object::read(repo, tree_id)? else {
        bail!("{tree_id} is not a tree object");
    };

    for entry in &tree.entries {
        let entry_path = dest.join(&entry.path);
        let id_hex = hex::encode(entry.id);
        if entry.mode.starts_with("04") {
            fs::create_dir_all(&entry_path)
                .with_context(|| format!("creating {}", entry_path.display()))?;
            materialize(repo, &id_hex, &entry_path)?;
        } else {
            let Some(GitObject::Blob(data)) = object::read(repo, &id_hex)? else {
                bail!("{id_hex} is not a blob object");
            };
            fs::write(&entry_path, &data)
                .with_context(|| format!("writing {}", entry_path.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kvlm::Kvlm;
    use crate::repository;
    use crate::tree::{Tree, TreeEntry};

    #[test]
    fn materializes_nested_tree_onto_disk() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository::create(dir.path()).unwrap();

        let blob_id = object::write(&GitObject::Blob(b"hi\n".to_vec()), Some(&repo)).unwrap();
        let mut blob_bytes = [0u8; 20];
        blob_bytes.copy_from_slice(&hex::decode(&blob_id).unwrap());

        let sub = Tree {
            entries: vec![TreeEntry { mode: "100644".into(), path: "nested.txt".into(), id: blob_bytes }],
        };
        let sub_id = object::write(&GitObject::Tree(sub), Some(&repo)).unwrap();
        let mut sub_bytes = [0u8; 20];
        sub_bytes.copy_from_slice(&hex::decode(&sub_id).unwrap());

        let root = Tree {
            entries: vec![TreeEntry { mode: "040000".into(), path: "dir".into(), id: sub_bytes }],
        };
        let root_id = object::write(&GitObject::Tree(root), Some(&repo)).unwrap();

        let mut commit = Kvlm::new();
        commit.push("tree", root_id);
        commit.message = b"msg\n".to_vec();
        let commit_id = object::write(&GitObject::Commit(commit), Some(&repo)).unwrap();

        let target = dir.path().join("checkout-dest");
        git_checkout(&repo, &commit_id, &target).unwrap();
        let contents = fs::read(target.join("dir").join("nested.txt")).unwrap();
        assert_eq!(contents, b"hi\n");
    }

    #[test]
    fn refuses_nonempty_target() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository::create(dir.path()).unwrap();
        let tree_id = object::write(&GitObject::Tree(Tree::default()), Some(&repo)).unwrap();
        let mut commit = Kvlm::new();
        commit.push("tree", tree_id);
        commit.message = b"msg\n".to_vec();
        let commit_id = object::write(&GitObject::Commit(commit), Some(&repo)).unwrap();

        let target = dir.path().join("occupied");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("existing"), b"x").unwrap();
        assert!(git_checkout(&repo, &commit_id, &target).is_err());
    }
}
