/// Grammar errors, all tagged with the 1-based line they occurred on.
#[derive(Debug, thiserror::Error)]
pub enum SiiError {
    #[error("line {line}: expected header \"SiiNunit\" but found \"{text}\"")]
    MissingHeader { line: usize, text: String },

    #[error("line {line}: expected \"{{\" but found \"{text}\"")]
    ExpectedOpenBrace { line: usize, text: String },

    #[error("line {line}: expected \"type : name {{\" but found \"{text}\"")]
    ExpectedBlockStart { line: usize, text: String },

    #[error("line {line}: expected \"key : value\" but found \"{text}\"")]
    ExpectedItem { line: usize, text: String },

    #[error("line {line}: trailing data \"{text}\" after final \"}}\"")]
    TrailingData { line: usize, text: String },

    #[error("line {line}: not valid UTF-8")]
    InvalidText { line: usize },

    #[error("unexpected end of input after line {line}")]
    UnexpectedEof { line: usize },

    #[error("line {line}: io error: {source}")]
    Io {
        line: usize,
        #[source]
        source: std::io::Error,
    },
}

impl SiiError {
    pub fn line(&self) -> usize {
        match self {
            Self::MissingHeader { line, .. }
            | Self::ExpectedOpenBrace { line, .. }
            | Self::ExpectedBlockStart { line, .. }
            | Self::ExpectedItem { line, .. }
            | Self::TrailingData { line, .. }
            | Self::InvalidText { line }
            | Self::UnexpectedEof { line }
            | Self::Io { line, .. } => *line,
        }
    }

    /// Offending line text, if the error was raised on a specific line.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::MissingHeader { text, .. }
            | Self::ExpectedOpenBrace { text, .. }
            | Self::ExpectedBlockStart { text, .. }
            | Self::ExpectedItem { text, .. }
            | Self::TrailingData { text, .. } => Some(text),
            Self::InvalidText { .. } | Self::UnexpectedEof { .. } | Self::Io { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SiiError>;
