use crate::repository::Repository;
use crate::resolve;
use anyhow::Result;

/// `rev-parse [--wyag-type TYPE] NAME`: resolve `NAME` (optionally following
/// type-directed dereferencing toward `TYPE`) and print the canonical id.
pub fn git_rev_parse(repo: &Repository, name: &str, wyag_type: Option<&str>) -> Result<String> {
    match wyag_type {
        Some(kind) => resolve::find(repo, name, kind),
        None => resolve::resolve_name(repo, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kvlm::Kvlm;
    use crate::object::{self, GitObject};
    use crate::repository;
    use crate::tree::Tree;

    #[test]
    fn resolves_head_symbolic_chain() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository::create(dir.path()).unwrap();
        crate::refs::create(&repo, "refs/heads/main", &"c".repeat(40)).unwrap();
        std::fs::write(repo.gitdir.join("HEAD"), "ref: refs/heads/main\n").unwrap();
        assert_eq!(git_rev_parse(&repo, "HEAD", None).unwrap(), "c".repeat(40));
    }

    #[test]
    fn follows_to_requested_type() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository::create(dir.path()).unwrap();
        let tree_id = object::write(&GitObject::Tree(Tree::default()), Some(&repo)).unwrap();
        let mut commit = Kvlm::new();
        commit.push("tree", tree_id.clone());
        commit.message = b"msg\n".to_vec();
        let commit_id = object::write(&GitObject::Commit(commit), Some(&repo)).unwrap();

        assert_eq!(git_rev_parse(&repo, &commit_id, Some("tree")).unwrap(), tree_id);
    }
}
