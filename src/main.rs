use crate::cat_file::git_cat_file;
use crate::check_ignore::git_check_ignore;
use crate::checkout::git_checkout;
use crate::codec::{BLOB, COMMIT, TAG, TREE};
use crate::commit::{git_commit, git_write_commit};
use crate::hash_object::git_hash_object;
use crate::init::git_init;
use crate::log::git_log;
use crate::ls_files::git_ls_files;
use crate::ls_tree::git_ls_tree;
use crate::rev_parse::git_rev_parse;
use crate::show_ref::git_show_ref;
use crate::status_cmd::git_status;
use crate::tag::{git_tag_create, git_tag_list};
use crate::write_tree::git_write_tree;
use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cat_file;
mod check_ignore;
mod checkout;
mod codec;
mod commit;
mod config;
mod error;
mod hash_object;
mod ignore;
mod index;
mod init;
mod kvlm;
mod log;
mod ls_files;
mod ls_tree;
mod object;
mod refs;
mod repository;
mod resolve;
mod rev_parse;
mod show_ref;
mod status;
mod status_cmd;
mod tag;
mod tree;
mod write_tree;

#[derive(Parser, Debug)]
pub struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scaffold a new repository.
    Init {
        #[clap(default_value = ".")]
        path: PathBuf,
    },
    /// Write an object's payload to stdout.
    CatFile {
        #[clap(value_parser = ["blob", "commit", "tag", "tree"])]
        kind: String,
        object: String,
    },
    /// Compute (and optionally persist) the id of a file as an object.
    HashObject {
        #[clap(short = 'w')]
        write: bool,
        #[clap(short = 't', long = "type", default_value = "blob")]
        kind: String,
        file: PathBuf,
    },
    /// Write a DOT-language ancestry graph to stdout.
    Log {
        #[clap(default_value = "HEAD")]
        commit: String,
    },
    /// Print a tree's entries.
    LsTree {
        #[clap(short = 'r')]
        recursive: bool,
        treeish: String,
    },
    /// Materialize a tree onto an empty directory.
    Checkout { commit: String, path: PathBuf },
    /// Print every reference and its id.
    ShowRef,
    /// List tags, or create a lightweight/annotated one.
    Tag {
        #[clap(short = 'a')]
        annotate: bool,
        #[clap(short = 'm')]
        message: Option<String>,
        name: Option<String>,
        object: Option<String>,
    },
    /// Resolve a name and print the canonical id.
    RevParse {
        #[clap(long = "wyag-type")]
        wyag_type: Option<String>,
        name: String,
    },
    /// Print the staging index's contents.
    LsFiles {
        #[clap(long, short = 'v')]
        verbose: bool,
    },
    /// Print every given path that the ignore engine reports as ignored.
    CheckIgnore { paths: Vec<String> },
    /// Summarize branch, HEAD vs index, and index vs worktree.
    Status,
    /// Build and persist a tree object from the staging index.
    WriteTree,
    /// Build a commit object naming a tree, with zero or more parents.
    CommitTree {
        #[clap(short = 'm')]
        message: String,
        #[clap(short = 'p')]
        parent: Vec<String>,
        tree: String,
    },
    /// Commit the staged index atop the current branch.
    Commit {
        #[clap(short = 'm')]
        message: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let cwd = std::env::current_dir()?;

    match args.command {
        Command::Init { path } => {
            git_init(&path)?;
        }
        Command::CatFile { kind, object } => {
            let repo = repository::find(&cwd, true)?.expect("required find always returns Some");
            git_cat_file(&repo, &kind, &object)?;
        }
        Command::HashObject { write, kind, file } => {
            let repo = if write { repository::find(&cwd, true)? } else { None };
            validate_type(&kind)?;
            let id = git_hash_object(repo.as_ref(), &file, &kind, write)?;
            println!("{id}");
        }
        Command::Log { commit } => {
            let repo = repository::find(&cwd, true)?.expect("required find always returns Some");
            git_log(&repo, &commit)?;
        }
        Command::LsTree { recursive, treeish } => {
            let repo = repository::find(&cwd, true)?.expect("required find always returns Some");
            git_ls_tree(&repo, recursive, &treeish)?;
        }
        Command::Checkout { commit, path } => {
            let repo = repository::find(&cwd, true)?.expect("required find always returns Some");
            git_checkout(&repo, &commit, &path)?;
        }
        Command::ShowRef => {
            let repo = repository::find(&cwd, true)?.expect("required find always returns Some");
            git_show_ref(&repo)?;
        }
        Command::Tag { annotate, message, name, object } => {
            let repo = repository::find(&cwd, true)?.expect("required find always returns Some");
            match name {
                None => git_tag_list(&repo)?,
                Some(name) => git_tag_create(&repo, annotate, &name, object.as_deref(), message)?,
            }
        }
        Command::RevParse { wyag_type, name } => {
            let repo = repository::find(&cwd, true)?.expect("required find always returns Some");
            let id = git_rev_parse(&repo, &name, wyag_type.as_deref())?;
            println!("{id}");
        }
        Command::LsFiles { verbose } => {
            let repo = repository::find(&cwd, true)?.expect("required find always returns Some");
            git_ls_files(&repo, verbose)?;
        }
        Command::CheckIgnore { paths } => {
            let repo = repository::find(&cwd, true)?.expect("required find always returns Some");
            git_check_ignore(&repo, &paths)?;
        }
        Command::Status => {
            let repo = repository::find(&cwd, true)?.expect("required find always returns Some");
            git_status(&repo)?;
        }
        Command::WriteTree => {
            let repo = repository::find(&cwd, true)?.expect("required find always returns Some");
            let idx = index::Index::read(&repo.gitdir.join("index"))?;
            let id = git_write_tree(&repo, &idx)?;
            println!("{id}");
        }
        Command::CommitTree { message, parent, tree } => {
            let repo = repository::find(&cwd, true)?.expect("required find always returns Some");
            let id = git_write_commit(&repo, &tree, &parent, message)?;
            println!("{id}");
        }
        Command::Commit { message } => {
            let repo = repository::find(&cwd, true)?.expect("required find always returns Some");
            let id = git_commit(&repo, message)?;
            println!("{id}");
        }
    }
    Ok(())
}

fn validate_type(kind: &str) -> Result<()> {
    match kind {
        BLOB | TREE | COMMIT | TAG => Ok(()),
        other => bail!("unknown object type {other:?}"),
    }
}

