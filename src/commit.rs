use crate::config::Config;
use crate::kvlm::Kvlm;
use crate::object::{self, GitObject};
use crate::refs::{self, RawRef};
use crate::repository::Repository;
use crate::write_tree::git_write_tree;
use anyhow::{Context, Result, bail};
use chrono::Local;

/// `commit-tree`: build a commit object naming `tree_id`, with zero or more
/// parents, and the given message. Returns the new commit's id.
pub fn git_write_commit(repo: &Repository, tree_id: &str, parents: &[String], message: String) -> Result<String> {
    let mut kvlm = Kvlm::new();
    kvlm.push("tree", tree_id.to_string());
    for parent in parents {
        kvlm.push("parent", parent.clone());
    }
    let header = identity_header()?;
    kvlm.push("author", header.clone());
    kvlm.push("committer", header);
    kvlm.message = {
        let mut m = message.into_bytes();
        if m.last() != Some(&b'\n') {
            m.push(b'\n');
        }
        m
    };
    object::write(&GitObject::Commit(kvlm), Some(repo))
}

/// `commit -m MESSAGE`: build a tree from the staging index, commit it with
/// the current `HEAD` commit (if any) as the sole parent, and advance the
/// branch `HEAD` points at.
pub fn git_commit(repo: &Repository, message: String) -> Result<String> {
    let index = crate::index::Index::read(&repo.gitdir.join("index"))?;
    let tree_id = git_write_tree(repo, &index)?;

    let parents: Vec<String> = match refs::resolve(repo, "HEAD")? {
        Some(id) => vec![id],
        None => Vec::new(),
    };

    let commit_id = git_write_commit(repo, &tree_id, &parents, message)?;

    let Some(RawRef::Symbolic(branch_ref)) = refs::read_raw(repo, "HEAD")? else {
        bail!("cannot commit in a detached HEAD state");
    };
    refs::create(repo, &branch_ref, &commit_id)?;
    Ok(commit_id)
}

/// The `<name> <email> <timestamp> <tz>` header shared by `author`,
/// `committer`, and annotated tags' `tagger` field.
pub fn identity_header() -> Result<String> {
    let (name, email) = author_identity()?;
    Ok(format!("{name} <{email}> {}", author_timestamp()))
}

fn author_timestamp() -> String {
    let now = Local::now();
    let offset = now.offset().local_minus_utc();
    let sign = if offset < 0 { '-' } else { '+' };
    let hours = offset.abs() / 3600;
    let minutes = (offset.abs() % 3600) / 60;
    format!("{} {sign}{hours:02}{minutes:02}", now.timestamp())
}

/// Author/committer identity from `~/.gitconfig`'s `[user]` section,
/// falling back to a placeholder if the file or fields are missing.
fn author_identity() -> Result<(String, String)> {
    let Some(home) = std::env::home_dir() else {
        return Ok(default_identity());
    };
    let path = home.join(".gitconfig");
    if !path.exists() {
        return Ok(default_identity());
    }
    let config = Config::read(&path).context("reading ~/.gitconfig")?;
    let name = config.get("user", "name").unwrap_or("Unknown").to_string();
    let email = config.get("user", "email").unwrap_or("unknown@localhost").to_string();
    Ok((name, email))
}

fn default_identity() -> (String, String) {
    ("Unknown".to_string(), "unknown@localhost".to_string())
}
