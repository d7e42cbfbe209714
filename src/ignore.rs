use crate::index::Index;
use crate::object::{self, GitObject};
use crate::repository::Repository;
use anyhow::{Context, Result};
use glob::Pattern;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// A single ignore rule: a glob pattern and whether a match means "ignored"
/// (`true`) or "explicitly un-ignored" (`false`, from a `!`-prefixed line).
#[derive(Debug, Clone)]
struct Rule {
    pattern: Pattern,
    include: bool,
}

/// Absolute (process-global) rules plus scoped rules keyed by the directory
/// that contained the `.gitignore` blob they came from.
#[derive(Debug, Default)]
pub struct IgnoreEngine {
    absolute: Vec<Rule>,
    scoped: BTreeMap<String, Vec<Rule>>,
}

impl IgnoreEngine {
    /// Load the two absolute scopes (XDG global ignore file, repo-local
    /// `info/exclude`) plus every `.gitignore` blob reachable from the index.
    pub fn load(repo: &Repository, index: &Index) -> Result<Self> {
        let mut engine = IgnoreEngine::default();

        if let Some(global_path) = global_ignore_path() {
            if let Ok(text) = fs::read_to_string(&global_path) {
                engine.absolute.extend(parse_rules(&text));
            }
        }

        let exclude_path = repo.path(&["info", "exclude"]);
        if let Ok(text) = fs::read_to_string(&exclude_path) {
            engine.absolute.extend(parse_rules(&text));
        }

        for entry in &index.entries {
            if Path::new(&entry.name).file_name().and_then(|n| n.to_str()) != Some(".gitignore") {
                continue;
            }
            let id = hex::encode(entry.id);
            let Some(obj) = object::read(repo, &id)? else {
                // spec design notes (c): tolerate a missing referenced blob.
                eprintln!("warning: .gitignore blob {id} for {} is missing, skipping", entry.name);
                continue;
            };
            let GitObject::Blob(data) = obj else {
                eprintln!("warning: {} does not reference a blob, skipping", entry.name);
                continue;
            };
            let text = String::from_utf8_lossy(&data).into_owned();
            let dir = Path::new(&entry.name)
                .parent()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default();
            engine.scoped.entry(dir).or_default().extend(parse_rules(&text));
        }

        Ok(engine)
    }

    /// Is `path` (a repo-relative, forward-slash-separated path) ignored?
    pub fn is_ignored(&self, path: &str) -> bool {
        for dir in parent_dirs(path) {
            if let Some(rules) = self.scoped.get(&dir) {
                if let Some(flag) = match_rules(rules, path) {
                    return flag;
                }
            }
        }
        match_rules(&self.absolute, path).unwrap_or(false)
    }
}

/// The directory containing `path`, then its parent, ... down to `""` (repo
/// root), deepest first.
fn parent_dirs(path: &str) -> Vec<String> {
    let components: Vec<&str> = path.split('/').collect();
    let dir_components = &components[..components.len().saturating_sub(1)];
    let mut dirs = Vec::with_capacity(dir_components.len() + 1);
    for depth in (0..=dir_components.len()).rev() {
        dirs.push(dir_components[..depth].join("/"));
    }
    dirs
}

fn match_rules(rules: &[Rule], path: &str) -> Option<bool> {
    let file_name = Path::new(path).file_name().and_then(|n| n.to_str());
    let mut result = None;
    for rule in rules {
        let matches = rule.pattern.matches(path) || file_name.is_some_and(|n| rule.pattern.matches(n));
        if matches {
            result = Some(rule.include);
        }
    }
    result
}

fn parse_rules(text: &str) -> Vec<Rule> {
    text.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<Rule> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let (pattern_str, include) = if let Some(rest) = trimmed.strip_prefix('!') {
        (rest, false)
    } else if let Some(rest) = trimmed.strip_prefix('\\') {
        (rest, true)
    } else {
        (trimmed, true)
    };
    let pattern = Pattern::new(pattern_str).ok()?;
    Some(Rule { pattern, include })
}

fn global_ignore_path() -> Option<PathBuf> {
    let config_home = env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env::home_dir().map(|h| h.join(".config")))?;
    Some(config_home.join("git").join("ignore"))
}
