use crate::object::{self, GitObject};
use crate::repository::Repository;
use crate::resolve;
use crate::tree::Tree;
use anyhow::{Context, Result, bail};
use std::io::{Write, stdout};

/// `ls-tree [-r] TREEISH`: print the entries of the tree `TREEISH` resolves
/// to. `-r` recurses into subtrees and prints only their leaves (the
/// subtrees themselves are not printed).
pub fn git_ls_tree(repo: &Repository, recursive: bool, treeish: &str) -> Result<()> {
    let tree_id = resolve::find(repo, treeish, "tree")?;
    let mut out = stdout().lock();
    print_tree(repo, &tree_id, recursive, "", &mut out)
}

fn print_tree(
    repo: &Repository,
    tree_id: &str,
    recursive: bool,
    prefix: &str,
    out: &mut impl Write,
) -> Result<()> {
    let Some(GitObject::Tree(tree)) = object::read(repo, tree_id)? else {
        bail!("{tree_id} is not a tree object");
    };
    for entry in tree.sorted_entries() {
        let path = if prefix.is_empty() {
            entry.path.clone()
        } else {
            format!("{prefix}/{}", entry.path)
        };
        let id_hex = hex::encode(entry.id);
        let kind = Tree::kind_of_mode(&entry.mode);
        if recursive && kind == "tree" {
            print_tree(repo, &id_hex, recursive, &path, out)?;
            continue;
        }
        writeln!(out, "{} {kind} {id_hex}\t{path}", entry.mode)
            .context("writing ls-tree entry to stdout")?;
    }
    Ok(())
}
