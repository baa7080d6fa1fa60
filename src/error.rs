use std::path::PathBuf;

use sii_parser::SiiError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported prefab version {found} (expected {expected})")]
    UnsupportedVersion { found: i32, expected: i32 },

    #[error("buffer overflow: need {need} bytes, have {have}")]
    BufferOverflow { need: usize, have: usize },

    #[error("invalid prefab: {0}")]
    InvalidPrefab(String),

    #[error("malformed row at line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    #[error("malformed definition {name:?}: {reason}")]
    MalformedDefinition { name: String, reason: String },

    #[error("sii: {0}")]
    Sii(#[from] SiiError),

    #[error("ambiguous {kind} {key:?}: {count} prefabs match")]
    Ambiguous { kind: &'static str, key: String, count: usize },

    #[error("unresolved {kind} reference {key:?}")]
    UnresolvedReference { kind: &'static str, key: String },

    #[error("{}: {source}", path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Broad classification used by callers deciding how to report a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Format,
    Ambiguity,
    UnresolvedReference,
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedVersion { .. }
            | Self::BufferOverflow { .. }
            | Self::InvalidPrefab(_)
            | Self::MalformedRow { .. }
            | Self::MalformedDefinition { .. } => ErrorKind::Format,
            Self::Sii(SiiError::Io { .. }) => ErrorKind::Io,
            Self::Sii(_) => ErrorKind::Format,
            Self::Ambiguous { .. } => ErrorKind::Ambiguity,
            Self::UnresolvedReference { .. } => ErrorKind::UnresolvedReference,
            Self::InFile { source, .. } => source.kind(),
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Attach the file being processed
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        Self::InFile { path: path.into(), source: Box::new(self) }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
