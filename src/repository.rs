use crate::config::Config;
use crate::error::GitError;
use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};

/// A git repository: a worktree directory plus its `.git` metadata directory
/// (the *gitdir*) and parsed configuration.
pub struct Repository {
    pub worktree: PathBuf,
    pub gitdir: PathBuf,
    pub config: Config,
}

impl Repository {
    /// Open a repository rooted at `path`. If `force` is set, skip all the
    /// existence/version checks — used while scaffolding a brand new repo.
    pub fn open(path: impl AsRef<Path>, force: bool) -> Result<Self> {
        let worktree = path.as_ref().to_path_buf();
        let gitdir = worktree.join(".git");

        if !force && !gitdir.is_dir() {
            bail!(GitError::NotARepository(worktree.display().to_string()));
        }

        let config_path = gitdir.join("config");
        let config = if config_path.exists() {
            Config::read(&config_path)?
        } else if force {
            Config::new()
        } else {
            bail!("configuration file missing");
        };

        if !force {
            let version = config
                .get("core", "repositoryformatversion")
                .context("core.repositoryformatversion missing from config")?
                .parse::<i64>()
                .context("core.repositoryformatversion is not an integer")?;
            if version != 0 {
                bail!(GitError::UnsupportedFormatVersion(version));
            }
        }

        Ok(Repository {
            worktree,
            gitdir,
            config,
        })
    }

    /// Join path components under the gitdir.
    pub fn path(&self, parts: &[&str]) -> PathBuf {
        let mut p = self.gitdir.clone();
        for part in parts {
            p.push(part);
        }
        p
    }

    /// Like `path`, but ensures the parent directories of the final component
    /// exist (creating them if `mkdir` is set).
    pub fn file(&self, parts: &[&str], mkdir: bool) -> Result<PathBuf> {
        if parts.is_empty() {
            return Ok(self.gitdir.clone());
        }
        self.dir(&parts[..parts.len() - 1], mkdir)?;
        Ok(self.path(parts))
    }

    /// Resolve (and optionally create) a directory under the gitdir.
    pub fn dir(&self, parts: &[&str], mkdir: bool) -> Result<PathBuf> {
        let path = self.path(parts);
        if path.exists() {
            if path.is_dir() {
                return Ok(path);
            }
            bail!("not a directory: {}", path.display());
        }
        if mkdir {
            fs::create_dir_all(&path)
                .with_context(|| format!("creating directory {}", path.display()))?;
            Ok(path)
        } else {
            bail!("directory does not exist: {}", path.display())
        }
    }
}

/// Walk upward from `start` (canonicalized) until a directory containing a
/// `.git` child is found, or the filesystem root is reached.
pub fn find(start: impl AsRef<Path>, required: bool) -> Result<Option<Repository>> {
    let mut path = fs::canonicalize(start.as_ref())
        .with_context(|| format!("resolving path {}", start.as_ref().display()))?;
    loop {
        if path.join(".git").is_dir() {
            return Ok(Some(Repository::open(&path, false)?));
        }
        match path.parent() {
            Some(parent) if parent != path => {
                path = parent.to_path_buf();
            }
            _ => {
                if required {
                    bail!(GitError::NotARepository(
                        start.as_ref().display().to_string()
                    ));
                }
                return Ok(None);
            }
        }
    }
}

/// Scaffold a new repository rooted at `path`. Refuses if the gitdir already
/// exists and is non-empty.
pub fn create(path: impl AsRef<Path>) -> Result<Repository> {
    let repo = Repository::open(path.as_ref(), true)?;

    if repo.worktree.exists() {
        if !repo.worktree.is_dir() {
            bail!("{} is not a directory", repo.worktree.display());
        }
        if repo.gitdir.exists() && fs::read_dir(&repo.gitdir)?.next().is_some() {
            bail!("{} is not empty", repo.worktree.display());
        }
    } else {
        fs::create_dir_all(&repo.worktree)
            .with_context(|| format!("creating worktree {}", repo.worktree.display()))?;
    }

    repo.dir(&["branches"], true)?;
    repo.dir(&["objects"], true)?;
    repo.dir(&["refs", "tags"], true)?;
    repo.dir(&["refs", "heads"], true)?;
    repo.dir(&["refs", "remotes"], true)?;
    repo.dir(&["info"], true)?;

    fs::write(
        repo.file(&["description"], true)?,
        "Unnamed repository; edit this file 'description' to name the repository.\n",
    )?;
    fs::write(repo.file(&["HEAD"], true)?, "ref: refs/heads/master\n")?;
    fs::write(repo.file(&["info", "exclude"], true)?, "")?;

    let config = Config::default_repo_config();
    config.write(&repo.file(&["config"], true)?)?;

    Repository::open(&repo.worktree, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_then_find() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("project");
        create(&sub).unwrap();
        let nested = sub.join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        let found = find(&nested, true).unwrap().unwrap();
        assert_eq!(
            fs::canonicalize(found.worktree).unwrap(),
            fs::canonicalize(&sub).unwrap()
        );
    }

    #[test]
    fn refuses_nonempty_gitdir() {
        let dir = tempfile::tempdir().unwrap();
        create(dir.path()).unwrap();
        assert!(create(dir.path()).is_err());
    }

    #[test]
    fn find_without_repo_is_none_when_not_required() {
        let dir = tempfile::tempdir().unwrap();
        let res = find(dir.path(), false).unwrap();
        assert!(res.is_none());
    }
}
