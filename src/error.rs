use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why an assignment line was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    #[error("invalid key-value pair")]
    InvalidKeyValuePair,
    #[error("key cannot be empty")]
    EmptyKey,
    #[error("value cannot be empty")]
    EmptyValue,
}

/// A rejected line, located by its 1-based position in the source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}: {text}")]
pub struct SyntaxError {
    pub line: usize,
    /// The offending line with surrounding whitespace removed.
    pub text: String,
    pub kind: SyntaxErrorKind,
}

impl SyntaxError {
    #[must_use]
    pub(crate) fn new(line: usize, text: &str, kind: SyntaxErrorKind) -> Self {
        Self {
            line,
            text: text.to_owned(),
            kind,
        }
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(".ini format is the only supported format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },
    #[error("failed to open {}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("failed to parse input string: {source}")]
    ParseString { source: ParseError },
    #[error("failed to parse file {}: {source}", path.display())]
    ParseFile { path: PathBuf, source: ParseError },
    #[error("failed to write {}", path.display())]
    Write { path: PathBuf, source: io::Error },
    /// An entry that would not read back as itself once written.
    #[error("cannot write {}: {reason}", entry_label(section.as_deref(), key.as_deref()))]
    Unrepresentable {
        /// `None` for a global key.
        section: Option<String>,
        /// `None` when the section name itself is the problem.
        key: Option<String>,
        reason: &'static str,
    },
}

fn entry_label(section: Option<&str>, key: Option<&str>) -> String {
    match (section, key) {
        (Some(section), Some(key)) => format!("key {key:?} in section {section:?}"),
        (Some(section), None) => format!("section {section:?}"),
        (None, Some(key)) => format!("global key {key:?}"),
        (None, None) => "entry".to_owned(),
    }
}

impl Error {
    /// The located syntax error behind a failed parse, if that is what failed.
    #[must_use]
    pub fn syntax(&self) -> Option<&SyntaxError> {
        match self {
            Self::ParseString {
                source: ParseError::Syntax(err),
            }
            | Self::ParseFile {
                source: ParseError::Syntax(err),
                ..
            } => Some(err),
            Self::UnsupportedFormat { .. }
            | Self::Open { .. }
            | Self::ParseString { .. }
            | Self::ParseFile { .. }
            | Self::Write { .. }
            | Self::Unrepresentable { .. } => None,
        }
    }
}
