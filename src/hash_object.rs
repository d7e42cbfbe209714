use crate::codec::{BLOB, COMMIT, TAG, TREE};
use crate::object::{self, GitObject};
use crate::repository::Repository;
use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;

/// `hash-object [-w] [-t TYPE] FILE`: compute the id `FILE` would have as an
/// object of the given type, optionally persisting it.
pub fn git_hash_object(repo: Option<&Repository>, path: &Path, kind: &str, write: bool) -> Result<String> {
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let obj = match kind {
        BLOB => GitObject::Blob(data),
        TREE => GitObject::Tree(crate::tree::Tree::parse(&data)?),
        COMMIT => GitObject::Commit(crate::kvlm::Kvlm::parse(&data)?),
        TAG => GitObject::Tag(crate::kvlm::Kvlm::parse(&data)?),
        other => bail!("unknown object type {other:?}"),
    };
    object::write(&obj, if write { repo } else { None })
}
