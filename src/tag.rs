use crate::kvlm::Kvlm;
use crate::object::{self, GitObject};
use crate::refs::{self, RefNode};
use crate::repository::Repository;
use crate::resolve;
use anyhow::Result;
use std::io::{Write, stdout};

/// `tag` with no `NAME`: list every tag name, one per line, lexically sorted
/// (the listing is naturally sorted since `refs::list` walks directories in
/// lexical order).
pub fn git_tag_list(repo: &Repository) -> Result<()> {
    let tree = refs::list(repo)?;
    let mut out = stdout().lock();
    if let Some(RefNode::Branch(tags)) = tree.get("tags") {
        for name in tags.keys() {
            writeln!(out, "{name}")?;
        }
    }
    Ok(())
}

/// `tag [-a] NAME [OBJECT]`: create a tag named `NAME` pointing at `OBJECT`
/// (default `HEAD`). Lightweight tags are a direct reference to the
/// resolved object id; annotated tags (`-a`) create a tag object carrying
/// `object`/`type`/`tag`/`tagger` headers and `message`.
pub fn git_tag_create(
    repo: &Repository,
    annotated: bool,
    name: &str,
    object_name: Option<&str>,
    message: Option<String>,
) -> Result<()> {
    let target = object_name.unwrap_or("HEAD");
    let id = resolve::resolve_name(repo, target)?;

    let ref_id = if annotated {
        let Some(obj) = object::read(repo, &id)? else {
            anyhow::bail!("object {id} not found");
        };
        let mut kvlm = Kvlm::new();
        kvlm.push("object", id.clone());
        kvlm.push("type", obj.kind());
        kvlm.push("tag", name.to_string());
        kvlm.push("tagger", crate::commit::identity_header()?);
        kvlm.message = {
            let mut m = message.unwrap_or_default().into_bytes();
            if m.last() != Some(&b'\n') {
                m.push(b'\n');
            }
            m
        };
        object::write(&GitObject::Tag(kvlm), Some(repo))?
    } else {
        id
    };

    refs::create(repo, &format!("refs/tags/{name}"), &ref_id)
}
