use crate::error::GitError;
use anyhow::{Context, Result, bail};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

const SIGNATURE: &[u8; 4] = b"DIRC";
const SUPPORTED_VERSION: u32 = 2;
const ENTRY_PREFIX_LEN: usize = 62;
const NAME_LEN_MASK: u16 = 0x0FFF;
const FLAG_ASSUME_VALID: u16 = 0x8000;
const FLAG_EXTENDED: u16 = 0x4000;
const STAGE_SHIFT: u16 = 12;
const STAGE_MASK: u16 = 0b11;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub ctime_secs: u32,
    pub ctime_nanos: u32,
    pub mtime_secs: u32,
    pub mtime_nanos: u32,
    pub dev: u32,
    pub ino: u32,
    pub mode: u16,
    pub uid: u32,
    pub gid: u32,
    pub size: u32,
    pub id: [u8; 20],
    pub assume_valid: bool,
    pub stage: u8,
    pub name: String,
}

impl IndexEntry {
    pub fn mode_type(&self) -> u8 {
        ((self.mode >> 12) & 0xF) as u8
    }

    pub fn mode_perms(&self) -> u16 {
        self.mode & 0x1FF
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Index {
    pub version: u32,
    pub entries: Vec<IndexEntry>,
}

impl Index {
    pub fn new() -> Self {
        Index { version: SUPPORTED_VERSION, entries: Vec::new() }
    }

    pub fn read(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Ok(Index::new());
        }
        let data = fs::read(path).with_context(|| format!("reading index {}", path.display()))?;
        Self::parse(&data)
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 12 || &data[0..4] != SIGNATURE {
            bail!(GitError::MalformedIndex("bad signature".into()));
        }
        let version = be_u32(&data[4..8]);
        if version != SUPPORTED_VERSION {
            bail!(GitError::MalformedIndex(format!("unsupported version {version}")));
        }
        let count = be_u32(&data[8..12]) as usize;

        let mut entries = Vec::with_capacity(count);
        let mut pos = 12usize;
        for _ in 0..count {
            let (entry, consumed) = parse_entry(data, pos)?;
            entries.push(entry);
            pos += consumed;
        }

        Ok(Index { version, entries })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(SIGNATURE);
        out.extend_from_slice(&self.version.to_be_bytes());
        out.extend_from_slice(&(self.entries.len() as u32).to_be_bytes());
        for entry in &self.entries {
            serialize_entry(&mut out, entry);
        }
        out
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let dir = path.parent().expect("index path always has a parent");
        fs::create_dir_all(dir).with_context(|| format!("creating directory {}", dir.display()))?;
        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("creating temp file in {}", dir.display()))?;
        tmp.write_all(&self.serialize())?;
        tmp.persist(path).with_context(|| format!("persisting index {}", path.display()))?;
        Ok(())
    }

    /// Entries whose stage is 0 (the ordinary, non-conflicted case), in
    /// ascending name order as the index guarantees.
    pub fn staged(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter().filter(|e| e.stage == 0)
    }
}

/// Stage every regular file under the worktree into `index`, hashing and
/// writing each as a blob object. Staging commands are outside this crate's
/// exposed command surface (spec.md §1's Non-goals), so this only exists as
/// a fixture builder for tests that need a populated index without
/// hand-writing entry bytes.
#[cfg(test)]
pub fn stage_worktree(repo: &crate::repository::Repository) -> anyhow::Result<Index> {
    use crate::object::{self, GitObject};
    use std::os::unix::fs::MetadataExt;

    let mut index = Index::new();
    let walker = ::ignore::WalkBuilder::new(&repo.worktree)
        .hidden(false)
        .git_ignore(false)
        .git_exclude(false)
        .git_global(false)
        .ignore(false)
        .parents(false)
        .build();

    for entry in walker {
        let entry = entry?;
        if entry.depth() == 0 || entry.file_name() == ".git" {
            continue;
        }
        if entry.file_type().is_some_and(|t| t.is_dir()) {
            continue;
        }
        let path = entry.path();
        let data = fs::read(path)?;
        let id_hex = object::write(&GitObject::Blob(data), Some(repo))?;
        let mut id = [0u8; 20];
        id.copy_from_slice(&hex::decode(&id_hex)?);
        let meta = entry.metadata()?;
        let name = path
            .strip_prefix(&repo.worktree)?
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        index.entries.push(IndexEntry {
            ctime_secs: meta.ctime() as u32,
            ctime_nanos: meta.ctime_nsec() as u32,
            mtime_secs: meta.mtime() as u32,
            mtime_nanos: meta.mtime_nsec() as u32,
            dev: meta.dev() as u32,
            ino: meta.ino() as u32,
            mode: 0b1000_000_000_000_000 | (meta.mode() as u16 & 0o777),
            uid: meta.uid(),
            gid: meta.gid(),
            size: meta.size() as u32,
            id,
            assume_valid: false,
            stage: 0,
            name,
        });
    }

    index.entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(index)
}

fn be_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes(bytes.try_into().unwrap())
}

fn parse_entry(data: &[u8], start: usize) -> Result<(IndexEntry, usize)> {
    if data.len() < start + ENTRY_PREFIX_LEN {
        bail!(GitError::MalformedIndex("truncated entry".into()));
    }
    let f = |lo: usize, hi: usize| be_u32(&data[start + lo..start + hi]);

    let ctime_secs = f(0, 4);
    let ctime_nanos = f(4, 8);
    let mtime_secs = f(8, 12);
    let mtime_nanos = f(12, 16);
    let dev = f(16, 20);
    let ino = f(20, 24);
    let reserved = u16::from_be_bytes(data[start + 24..start + 26].try_into().unwrap());
    if reserved != 0 {
        bail!(GitError::MalformedIndex("reserved field is non-zero".into()));
    }
    let mode = u16::from_be_bytes(data[start + 26..start + 28].try_into().unwrap());
    let uid = f(28, 32);
    let gid = f(32, 36);
    let size = f(36, 40);
    let mut id = [0u8; 20];
    id.copy_from_slice(&data[start + 40..start + 60]);
    let flags = u16::from_be_bytes(data[start + 60..start + 62].try_into().unwrap());

    if flags & FLAG_EXTENDED != 0 {
        bail!(GitError::MalformedIndex("extended flag set but not supported".into()));
    }
    let assume_valid = flags & FLAG_ASSUME_VALID != 0;
    let stage = ((flags >> STAGE_SHIFT) & STAGE_MASK) as u8;
    let declared_name_len = (flags & NAME_LEN_MASK) as usize;

    let name_start = start + ENTRY_PREFIX_LEN;
    let name_bytes = if declared_name_len < NAME_LEN_MASK as usize {
        let end = name_start + declared_name_len;
        if data.len() < end {
            bail!(GitError::MalformedIndex("truncated entry name".into()));
        }
        &data[name_start..end]
    } else {
        let Some(nul_rel) = data[name_start..].iter().position(|&b| b == 0) else {
            bail!(GitError::MalformedIndex("unterminated saturated-length name".into()));
        };
        &data[name_start..name_start + nul_rel]
    };
    let name = std::str::from_utf8(name_bytes)
        .map_err(|_| GitError::MalformedIndex("name is not valid UTF-8".into()))?
        .to_string();

    // Entry length is padded to a multiple of 8 from the start of the entry,
    // with at least one NUL terminator after the name.
    let unpadded = ENTRY_PREFIX_LEN + name_bytes.len() + 1;
    let consumed = (unpadded + 7) & !7;

    Ok((
        IndexEntry {
            ctime_secs,
            ctime_nanos,
            mtime_secs,
            mtime_nanos,
            dev,
            ino,
            mode,
            uid,
            gid,
            size,
            id,
            assume_valid,
            stage,
            name,
        },
        consumed,
    ))
}

fn serialize_entry(out: &mut Vec<u8>, entry: &IndexEntry) {
    let entry_start = out.len();

    out.extend_from_slice(&entry.ctime_secs.to_be_bytes());
    out.extend_from_slice(&entry.ctime_nanos.to_be_bytes());
    out.extend_from_slice(&entry.mtime_secs.to_be_bytes());
    out.extend_from_slice(&entry.mtime_nanos.to_be_bytes());
    out.extend_from_slice(&entry.dev.to_be_bytes());
    out.extend_from_slice(&entry.ino.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes()); // reserved
    out.extend_from_slice(&entry.mode.to_be_bytes());
    out.extend_from_slice(&entry.uid.to_be_bytes());
    out.extend_from_slice(&entry.gid.to_be_bytes());
    out.extend_from_slice(&entry.size.to_be_bytes());
    out.extend_from_slice(&entry.id);

    let name_bytes = entry.name.as_bytes();
    let name_len = (name_bytes.len() as u16).min(NAME_LEN_MASK);
    let mut flags = name_len;
    flags |= (entry.stage as u16 & STAGE_MASK) << STAGE_SHIFT;
    if entry.assume_valid {
        flags |= FLAG_ASSUME_VALID;
    }
    out.extend_from_slice(&flags.to_be_bytes());
    out.extend_from_slice(name_bytes);

    let unpadded = out.len() - entry_start + 1; // +1 for at least one NUL
    let padded = (unpadded + 7) & !7;
    let current = out.len() - entry_start;
    for _ in 0..(padded - current) {
        out.push(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry(name: &str, ctime_secs: u32) -> IndexEntry {
        IndexEntry {
            ctime_secs,
            ctime_nanos: 0,
            mtime_secs: ctime_secs,
            mtime_nanos: 0,
            dev: 1,
            ino: 2,
            mode: 0b1000_000_110_100_100, // regular file, 0644
            uid: 1000,
            gid: 1000,
            size: 6,
            id: [0xab; 20],
            assume_valid: false,
            stage: 0,
            name: name.to_string(),
        }
    }

    #[test]
    fn round_trips_n_entries() {
        let mut index = Index::new();
        index.entries.push(sample_entry("a.txt", 1));
        index.entries.push(sample_entry("dir/b.txt", 2));
        let bytes = index.serialize();
        let reparsed = Index::parse(&bytes).unwrap();
        assert_eq!(reparsed, index);
        assert_eq!(reparsed.serialize(), bytes);
    }

    #[test]
    fn mutating_ctime_changes_exactly_four_bytes() {
        let mut index = Index::new();
        index.entries.push(sample_entry("a.txt", 100));
        let before = index.serialize();

        index.entries[0].ctime_secs = 200;
        let after = index.serialize();

        assert_eq!(before.len(), after.len());
        let diff: Vec<usize> = before
            .iter()
            .zip(after.iter())
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(diff.len(), 4);
        assert_eq!(diff, vec![12, 13, 14, 15]);
    }

    #[test]
    fn pads_entries_to_eight_byte_boundary() {
        let mut index = Index::new();
        index.entries.push(sample_entry("a", 1)); // name_len 1 -> unpadded 63, padded 64
        let bytes = index.serialize();
        assert_eq!(bytes.len() - 12, 64);
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut index = Index::new();
        index.version = 3;
        let bytes = index.serialize();
        assert!(Index::parse(&bytes).is_err());
    }
}
