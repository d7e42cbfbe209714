use anyhow::{Result, bail};
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use std::io::{Read, Write};

/// The four object type tags, as they appear verbatim in the envelope header.
pub const BLOB: &str = "blob";
pub const TREE: &str = "tree";
pub const COMMIT: &str = "commit";
pub const TAG: &str = "tag";

/// Prepend the envelope header (`type SP length NUL`) to `payload` and
/// zlib-compress the result.
pub fn encode(kind: &str, payload: &[u8]) -> Result<Vec<u8>> {
    let mut envelope = Vec::with_capacity(payload.len() + kind.len() + 16);
    envelope.extend_from_slice(kind.as_bytes());
    envelope.push(b' ');
    envelope.extend_from_slice(payload.len().to_string().as_bytes());
    envelope.push(0);
    envelope.extend_from_slice(payload);

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&envelope)?;
    Ok(encoder.finish()?)
}

/// Decompress `bytes` and split the envelope into `(type tag, payload)`,
/// validating the declared length against the actual payload length.
pub fn decode(bytes: &[u8]) -> Result<(String, Vec<u8>)> {
    let mut decoder = ZlibDecoder::new(bytes);
    let mut raw = Vec::new();
    decoder.read_to_end(&mut raw)?;

    let Some(space) = raw.iter().position(|&b| b == b' ') else {
        bail!("malformed object: missing space after type tag");
    };
    let kind = std::str::from_utf8(&raw[..space])
        .map_err(|_| anyhow::anyhow!("malformed object: type tag is not ASCII"))?
        .to_string();

    let Some(nul_rel) = raw[space..].iter().position(|&b| b == 0) else {
        bail!("malformed object: missing NUL after length");
    };
    let nul = space + nul_rel;
    let len_str = std::str::from_utf8(&raw[space + 1..nul])
        .map_err(|_| anyhow::anyhow!("malformed object: length is not ASCII"))?;
    let declared_len: usize = len_str
        .parse()
        .map_err(|_| anyhow::anyhow!("malformed object: length {len_str:?} is not a number"))?;

    let payload = raw[nul + 1..].to_vec();
    if payload.len() != declared_len {
        bail!(
            "malformed object: declared length {} does not match actual length {}",
            declared_len,
            payload.len()
        );
    }

    match kind.as_str() {
        BLOB | TREE | COMMIT | TAG => Ok((kind, payload)),
        other => bail!("unknown object type tag {other:?}"),
    }
}
