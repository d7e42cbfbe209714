use crate::refs::{self, RefNode};
use crate::repository::Repository;
use anyhow::Result;
use std::io::{Write, stdout};

/// `show-ref`: print every reference under `refs/` and its id, one per line,
/// in the conventional `<id> <ref-path>` order.
pub fn git_show_ref(repo: &Repository) -> Result<()> {
    let tree = refs::list(repo)?;
    let mut out = stdout().lock();
    print_node(&RefNode::Branch(tree), "refs", &mut out)
}

fn print_node(node: &RefNode, path: &str, out: &mut impl Write) -> Result<()> {
    match node {
        RefNode::Leaf(id) => {
            writeln!(out, "{id} {path}")?;
        }
        RefNode::Branch(children) => {
            for (name, child) in children {
                print_node(child, &format!("{path}/{name}"), out)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository;

    #[test]
    fn prints_every_reference() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository::create(dir.path()).unwrap();
        refs::create(&repo, "refs/heads/main", &"a".repeat(40)).unwrap();
        refs::create(&repo, "refs/tags/v1", &"b".repeat(40)).unwrap();

        let mut out = Vec::new();
        let tree = refs::list(&repo).unwrap();
        print_node(&RefNode::Branch(tree), "refs", &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(&format!("{} refs/heads/main", "a".repeat(40))));
        assert!(text.contains(&format!("{} refs/tags/v1", "b".repeat(40))));
    }
}
