use anyhow::{Result, bail};

/// Key-value list with message: the ordered-multimap-plus-trailing-message
/// grammar shared by commit and tag objects.
///
/// Keys are preserved in first-appearance order and duplicates accumulate in
/// arrival order, matching a commit's repeated `parent` headers. The trailing
/// message is tracked as its own field rather than folded into the entry list
/// under a sentinel key — a plain `Vec<u8>` field is the more natural shape in
/// Rust, and `serialize(parse(x)) == x` holds either way.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Kvlm {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    pub message: Vec<u8>,
}

impl Kvlm {
    pub fn new() -> Self {
        Kvlm::default()
    }

    /// Append a key/value pair, preserving duplicates.
    pub fn push(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.entries.push((key.into(), value.into()));
    }

    /// All values for `key`, in arrival order.
    pub fn get_all(&self, key: &[u8]) -> Vec<&[u8]> {
        self.entries
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
            .collect()
    }

    /// The first value for `key`, if any.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.entries.iter().map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut kvlm = Kvlm::new();
        let mut pos = 0usize;

        loop {
            let Some(space) = data[pos..].iter().position(|&b| b == b' ') else {
                bail!("malformed kvlm: expected key/space, none found");
            };
            let Some(newline) = data[pos..].iter().position(|&b| b == b'\n') else {
                bail!("malformed kvlm: unterminated header line");
            };

            if newline < space {
                // Blank line reached (newline before any space): headers end here.
                pos += 1;
                break;
            }

            let key_end = pos + space;
            let key = data[pos..key_end].to_vec();

            // Collect the value, folding continuation lines (a leading single
            // space on the next line) back into embedded newlines.
            let mut end = pos + space;
            loop {
                let next_newline = match data[end + 1..].iter().position(|&b| b == b'\n') {
                    Some(i) => end + 1 + i,
                    None => bail!("malformed kvlm: unterminated value"),
                };
                if data.get(next_newline + 1) == Some(&b' ') {
                    end = next_newline;
                    continue;
                }
                end = next_newline;
                break;
            }

            let raw_value = &data[key_end + 1..end];
            let value = unfold_continuations(raw_value);
            kvlm.entries.push((key, value));
            pos = end + 1;

            if pos >= data.len() {
                bail!("malformed kvlm: missing blank line before message");
            }
        }

        kvlm.message = data[pos..].to_vec();
        Ok(kvlm)
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (key, value) in &self.entries {
            out.extend_from_slice(key);
            out.push(b' ');
            out.extend_from_slice(&fold_continuations(value));
            out.push(b'\n');
        }
        out.push(b'\n');
        out.extend_from_slice(&self.message);
        out
    }
}

/// `\n ` -> `\n` (strip the single leading space that marks a continuation).
fn unfold_continuations(value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    let mut i = 0;
    while i < value.len() {
        out.push(value[i]);
        if value[i] == b'\n' && value.get(i + 1) == Some(&b' ') {
            i += 1;
        }
        i += 1;
    }
    out
}

/// `\n` -> `\n ` (re-add the single leading space before each continuation).
fn fold_continuations(value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for &b in value {
        out.push(b);
        if b == b'\n' {
            out.push(b' ');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<u8> {
        b"tree 29ff16c9c14e2652b22f8b78bb08a5a07930c147\n\
parent 206941306e8a8af65b66eaaaea388a7ae24d49a0\n\
author Thibault Polge <thibault@thb.lt> 1527025023 +0200\n\
committer Thibault Polge <thibault@thb.lt> 1527025044 +0200\n\
gpgsig -----BEGIN PGP SIGNATURE-----\n\
\n\
 iQIzBAABCAAdFiEExwXquOM8bWb4Q2zVGxM2FxoLkGQFAlsEjZQACgkQGxM2FxoL\n\
 kGQdGwQAGtgN\n\
 -----END PGP SIGNATURE-----\n\
\n\
Create first draft\n"
            .to_vec()
    }

    #[test]
    fn round_trips_folded_gpgsig() {
        let data = sample();
        let kvlm = Kvlm::parse(&data).unwrap();
        assert_eq!(kvlm.serialize(), data);
        assert_eq!(kvlm.message, b"Create first draft\n");
        assert!(kvlm.get(b"gpgsig").unwrap().starts_with(b"-----BEGIN"));
    }

    #[test]
    fn preserves_duplicate_parents_in_order() {
        let data = b"tree aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\n\
parent bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb\n\
parent cccccccccccccccccccccccccccccccccccccccc\n\
\n\
Merge\n"
            .to_vec();
        let kvlm = Kvlm::parse(&data).unwrap();
        let parents = kvlm.get_all(b"parent");
        assert_eq!(parents, vec![
            b"bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb".as_slice(),
            b"cccccccccccccccccccccccccccccccccccccccc".as_slice(),
        ]);
        assert_eq!(kvlm.serialize(), data);
    }

    #[test]
    fn empty_message_round_trips() {
        let data = b"tree aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\n\n".to_vec();
        let kvlm = Kvlm::parse(&data).unwrap();
        assert_eq!(kvlm.message, b"");
        assert_eq!(kvlm.serialize(), data);
    }
}
