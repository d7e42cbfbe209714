use anyhow::{Result, bail};
use std::cmp::Ordering;

/// A single `(mode, path, id)` triple. `mode` is always stored normalized to
/// six ASCII-octal bytes (directories get a leading `0` added back in); the
/// leading zero is stripped again on serialize so round-tripped bytes match
/// the on-disk convention (`40000`, not `040000`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: String,
    pub path: String,
    pub id: [u8; 20],
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Tree {
    pub entries: Vec<TreeEntry>,
}

impl TreeEntry {
    fn is_dir(&self) -> bool {
        self.mode.starts_with("04")
    }

    /// The on-disk mode string: directories drop the normalization's leading
    /// zero, everything else is already in its native 6-byte form.
    fn disk_mode(&self) -> &str {
        self.mode.strip_prefix('0').unwrap_or(&self.mode)
    }

    /// The key entries are compared by for the canonical sort: directory
    /// paths sort as if suffixed with `/`.
    fn sort_key(&self) -> String {
        if self.is_dir() {
            format!("{}/", self.path)
        } else {
            self.path.clone()
        }
    }
}

impl Tree {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut entries = Vec::new();
        let mut pos = 0usize;

        while pos < data.len() {
            let Some(space) = data[pos..].iter().position(|&b| b == b' ') else {
                bail!("malformed tree: missing space after mode");
            };
            let mode_end = pos + space;
            let mode_bytes = &data[pos..mode_end];
            if mode_bytes.len() != 5 && mode_bytes.len() != 6 {
                bail!("malformed tree: mode must be 5 or 6 bytes, got {}", mode_bytes.len());
            }
            let mode = std::str::from_utf8(mode_bytes)
                .map_err(|_| anyhow::anyhow!("malformed tree: mode is not ASCII"))?;
            let mode = if mode.len() == 5 {
                format!("0{mode}")
            } else {
                mode.to_string()
            };

            let Some(nul_rel) = data[mode_end..].iter().position(|&b| b == 0) else {
                bail!("malformed tree: missing NUL after path");
            };
            let path_start = mode_end + 1;
            let path_end = mode_end + nul_rel;
            let path = std::str::from_utf8(&data[path_start..path_end])
                .map_err(|_| anyhow::anyhow!("malformed tree: path is not UTF-8"))?
                .to_string();
            if path.contains('/') {
                bail!("malformed tree: path component contains '/': {path}");
            }

            let id_start = path_end + 1;
            let id_end = id_start + 20;
            if data.len() < id_end {
                bail!("malformed tree: truncated object id");
            }
            let mut id = [0u8; 20];
            id.copy_from_slice(&data[id_start..id_end]);

            entries.push(TreeEntry { mode, path, id });
            pos = id_end;
        }

        Ok(Tree { entries })
    }

    /// Entries in the canonical on-disk order (§4.4's sort rule).
    pub fn sorted_entries(&self) -> Vec<TreeEntry> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| -> Ordering { a.sort_key().cmp(&b.sort_key()) });
        sorted
    }

    /// The kind (`tree`/`blob`/`commit`) an entry's normalized mode denotes.
    pub fn kind_of_mode(mode: &str) -> &'static str {
        match &mode[..2] {
            "04" => "tree",
            "10" | "12" => "blob",
            "16" => "commit",
            _ => "blob",
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let sorted = self.sorted_entries();

        let mut out = Vec::new();
        for entry in &sorted {
            out.extend_from_slice(entry.disk_mode().as_bytes());
            out.push(b' ');
            out.extend_from_slice(entry.path.as_bytes());
            out.push(0);
            out.extend_from_slice(&entry.id);
        }
        out
    }
}
