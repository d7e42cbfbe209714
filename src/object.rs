use crate::codec::{self, BLOB, COMMIT, TAG, TREE};
use crate::kvlm::Kvlm;
use crate::repository::Repository;
use crate::tree::Tree;
use anyhow::{Context, Result, bail};
use sha1::{Digest, Sha1};
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;

/// One of the four object variants. Each carries only its own payload shape;
/// the envelope (type tag + length) lives in `codec`, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitObject {
    Blob(Vec<u8>),
    Tree(Tree),
    Commit(Kvlm),
    Tag(Kvlm),
}

impl GitObject {
    pub fn kind(&self) -> &'static str {
        match self {
            GitObject::Blob(_) => BLOB,
            GitObject::Tree(_) => TREE,
            GitObject::Commit(_) => COMMIT,
            GitObject::Tag(_) => TAG,
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        match self {
            GitObject::Blob(data) => data.clone(),
            GitObject::Tree(tree) => tree.serialize(),
            GitObject::Commit(kvlm) | GitObject::Tag(kvlm) => kvlm.serialize(),
        }
    }

    fn from_parts(kind: &str, payload: &[u8]) -> Result<Self> {
        Ok(match kind {
            BLOB => GitObject::Blob(payload.to_vec()),
            TREE => GitObject::Tree(Tree::parse(payload).context("parsing tree object")?),
            COMMIT => GitObject::Commit(Kvlm::parse(payload).context("parsing commit object")?),
            TAG => GitObject::Tag(Kvlm::parse(payload).context("parsing tag object")?),
            other => bail!("unknown object type tag {other:?}"),
        })
    }

    pub fn as_tree(&self) -> Option<&Tree> {
        match self {
            GitObject::Tree(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_commit(&self) -> Option<&Kvlm> {
        match self {
            GitObject::Commit(k) => Some(k),
            _ => None,
        }
    }

    pub fn as_tag(&self) -> Option<&Kvlm> {
        match self {
            GitObject::Tag(k) => Some(k),
            _ => None,
        }
    }
}

/// Compute the id (sha1 hex digest) of an object's envelope without touching
/// the filesystem.
pub fn hash(obj: &GitObject) -> Result<String> {
    let payload = obj.serialize();
    let envelope_hash = {
        let mut header = Vec::new();
        header.extend_from_slice(obj.kind().as_bytes());
        header.push(b' ');
        header.extend_from_slice(payload.len().to_string().as_bytes());
        header.push(0);
        header.extend_from_slice(&payload);
        let mut hasher = Sha1::new();
        hasher.update(&header);
        hasher.finalize()
    };
    Ok(hex::encode(envelope_hash))
}

/// Path of the loose object file `<gitdir>/objects/<id[0:2]>/<id[2:]>`.
fn object_path(repo: &Repository, id: &str) -> std::path::PathBuf {
    repo.path(&["objects", &id[0..2], &id[2..]])
}

/// Read and parse the object named `id`, or `None` if no such object exists.
pub fn read(repo: &Repository, id: &str) -> Result<Option<GitObject>> {
    let path = object_path(repo, id);
    if !path.is_file() {
        return Ok(None);
    }
    let raw = fs::read(&path).with_context(|| format!("reading object {id}"))?;
    let (kind, payload) = codec::decode(&raw).with_context(|| format!("malformed object {id}"))?;
    Ok(Some(GitObject::from_parts(&kind, &payload)?))
}

/// Serialize and hash `obj`; if `repo` is given, persist it under the sharded
/// object directory unless a file with that id already exists (objects are
/// immutable, writes are idempotent).
pub fn write(obj: &GitObject, repo: Option<&Repository>) -> Result<String> {
    let payload = obj.serialize();
    let id = hash(obj)?;

    if let Some(repo) = repo {
        let path = object_path(repo, &id);
        if !path.exists() {
            let dir = path.parent().expect("object path always has a parent");
            fs::create_dir_all(dir)
                .with_context(|| format!("creating object directory {}", dir.display()))?;
            let encoded = codec::encode(obj.kind(), &payload)?;
            let mut tmp = NamedTempFile::new_in(dir)
                .with_context(|| format!("creating temp file in {}", dir.display()))?;
            tmp.write_all(&encoded)?;
            tmp.persist(&path)
                .with_context(|| format!("persisting object {id}"))?;
        }
    }

    Ok(id)
}
