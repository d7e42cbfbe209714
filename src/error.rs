use thiserror::Error;

/// Stable error kinds a caller can match on, per the taxonomy in the design notes.
/// Everything else still flows through `anyhow::Error` for context-chaining.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("not a git repository (or any parent up to mount point): {0}")]
    NotARepository(String),

    #[error("unsupported repositoryformatversion {0}")]
    UnsupportedFormatVersion(i64),

    #[error("malformed object {0}: {1}")]
    MalformedObject(String, String),

    #[error("unknown type tag {0} for object {1}")]
    UnknownType(String, String),

    #[error("no such reference or object: {0}")]
    UnknownReference(String),

    #[error("ambiguous reference {0}: candidates {1:?}")]
    AmbiguousReference(String, Vec<String>),

    #[error("{0} is a {1}, not a {2}")]
    TypeMismatch(String, &'static str, &'static str),

    #[error("reference cycle detected resolving {0}")]
    ReferenceCycle(String),

    #[error("malformed index: {0}")]
    MalformedIndex(String),
}
