use crate::object;
use crate::repository::Repository;
use crate::resolve;
use anyhow::{Context, Result, bail};
use std::io::{Write, stdout};

/// `cat-file TYPE OBJECT`: write the object's raw payload to stdout.
pub fn git_cat_file(repo: &Repository, kind: &str, object_name: &str) -> Result<()> {
    let id = resolve::find(repo, object_name, kind)?;
    let Some(obj) = object::read(repo, &id)? else {
        bail!("object {id} not found after resolving {object_name}");
    };
    stdout()
        .write_all(&obj.serialize())
        .context("writing object payload to stdout")
}
