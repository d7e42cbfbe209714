use anyhow::{Context, Result, bail};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// A minimal INI-style reader/writer for `.git/config`.
///
/// Only what the repository format needs: `[section]` headers and
/// `key = value` lines within them. No interpolation, no sub-sections.
#[derive(Debug, Default, Clone)]
pub struct Config {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl Config {
    pub fn new() -> Self {
        Config::default()
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&text)
    }

    fn parse(text: &str) -> Result<Self> {
        let mut cfg = Config::new();
        let mut section = String::new();
        for (lineno, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                section = name.trim().to_string();
                cfg.sections.entry(section.clone()).or_default();
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                bail!("malformed config line {}: {:?}", lineno + 1, raw_line);
            };
            if section.is_empty() {
                bail!("config value outside of any section at line {}", lineno + 1);
            }
            cfg.sections
                .entry(section.clone())
                .or_default()
                .insert(key.trim().to_string(), value.trim().to_string());
        }
        Ok(cfg)
    }

    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections.get(section)?.get(key).map(|s| s.as_str())
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let mut out = String::new();
        for (section, entries) in &self.sections {
            out.push('[');
            out.push_str(section);
            out.push_str("]\n");
            for (key, value) in entries {
                out.push('\t');
                out.push_str(key);
                out.push_str(" = ");
                out.push_str(value);
                out.push('\n');
            }
        }
        fs::write(path, out).with_context(|| format!("writing config file {}", path.display()))
    }

    pub fn default_repo_config() -> Self {
        let mut cfg = Config::new();
        cfg.set("core", "repositoryformatversion", "0");
        cfg.set("core", "filemode", "false");
        cfg.set("core", "bare", "false");
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_default_config() {
        let cfg = Config::default_repo_config();
        assert_eq!(cfg.get("core", "repositoryformatversion"), Some("0"));
        assert_eq!(cfg.get("core", "filemode"), Some("false"));
        assert_eq!(cfg.get("core", "bare"), Some("false"));
    }

    #[test]
    fn parses_written_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        let cfg = Config::default_repo_config();
        cfg.write(&path).unwrap();
        let parsed = Config::read(&path).unwrap();
        assert_eq!(parsed.get("core", "repositoryformatversion"), Some("0"));
    }
}
