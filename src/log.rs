use crate::object::{self, GitObject};
use crate::repository::Repository;
use crate::resolve;
use anyhow::{Result, bail};
use std::collections::HashSet;
use std::io::{Write, stdout};

/// `log [COMMIT]`: write a DOT-language graph of `COMMIT`'s ancestry
/// (default `HEAD`) to stdout.
pub fn git_log(repo: &Repository, commit: &str) -> Result<()> {
    let start = resolve::find(repo, commit, "commit")?;
    let mut out = stdout().lock();
    writeln!(out, "digraph wyaglog{{")?;
    writeln!(out, "  node[shape=rect]")?;
    let mut seen = HashSet::new();
    walk(repo, &start, &mut seen, &mut out)?;
    writeln!(out, "}}")?;
    Ok(())
}

fn walk(repo: &Repository, id: &str, seen: &mut HashSet<String>, out: &mut impl Write) -> Result<()> {
    if !seen.insert(id.to_string()) {
        return Ok(());
    }
    let Some(GitObject::Commit(kvlm)) = object::read(repo, id)? else {
        bail!("{id} is not a commit object");
    };

    let message = String::from_utf8_lossy(&kvlm.message);
    let first_line = message.lines().next().unwrap_or("");
    let escaped = first_line.replace('\\', "\\\\").replace('"', "\\\"");
    writeln!(out, "  c_{id} [label=\"{}: {escaped}\"]", &id[..7])?;

    for parent in kvlm.get_all(b"parent") {
        let parent_id = String::from_utf8_lossy(parent).into_owned();
        writeln!(out, "  c_{id} -> c_{parent_id};")?;
        walk(repo, &parent_id, seen, out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kvlm::Kvlm;
    use crate::repository;
    use crate::tree::Tree;

    #[test]
    fn visits_every_ancestor_once() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository::create(dir.path()).unwrap();
        let tree_id = object::write(&GitObject::Tree(Tree::default()), Some(&repo)).unwrap();

        let mut root = Kvlm::new();
        root.push("tree", tree_id.clone());
        root.message = b"root\n".to_vec();
        let root_id = object::write(&GitObject::Commit(root), Some(&repo)).unwrap();

        let mut child = Kvlm::new();
        child.push("tree", tree_id.clone());
        child.push("parent", root_id.clone());
        child.message = b"with \"quotes\" and \\backslash\n".to_vec();
        let child_id = object::write(&GitObject::Commit(child), Some(&repo)).unwrap();

        let mut out = Vec::new();
        let mut seen = HashSet::new();
        walk(&repo, &child_id, &mut seen, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(&format!("c_{child_id} -> c_{root_id}")));
        assert!(text.contains("\\\"quotes\\\""));
        assert!(text.contains("\\\\backslash"));
        assert_eq!(seen.len(), 2);
    }
}
