/// What a single trimmed line of input means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Line<'a> {
    /// Blank line or a comment starting with `;` or `#`.
    Skip,
    /// `[name]`, with every leading `[` and trailing `]` removed.
    Section(&'a str),
    /// Anything else; expected to be `key=value`.
    Assignment(&'a str),
}

impl<'a> Line<'a> {
    /// Classify a line that has already been trimmed of surrounding whitespace.
    #[must_use]
    pub(crate) fn classify(line: &'a str) -> Self {
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            Self::Skip
        } else if line.starts_with('[') && line.ends_with(']') {
            Self::Section(line.trim_start_matches('[').trim_end_matches(']'))
        } else {
            Self::Assignment(line)
        }
    }
}

/// Split an assignment on its first `=`, trimming both halves.
#[must_use]
pub(crate) fn split_assignment(line: &str) -> Option<(&str, &str)> {
    line.split_once('=')
        .map(|(key, value)| (key.trim(), value.trim()))
}

/// Why `key` would not read back as the same key once written as `key=...`.
#[must_use]
pub(crate) fn key_problem(key: &str) -> Option<&'static str> {
    if key.contains(['\n', '\r']) {
        Some("key contains a line break")
    } else if key.trim().is_empty() {
        Some("key cannot be empty")
    } else if key != key.trim() {
        Some("key has leading or trailing whitespace")
    } else if key.contains('=') {
        Some("key contains '='")
    } else if key.starts_with([';', '#', '[']) {
        Some("key starts with a comment or section marker")
    } else {
        None
    }
}

/// Why `name` would not read back as the same section once written as `[name]`.
#[must_use]
pub(crate) fn section_name_problem(name: &str) -> Option<&'static str> {
    if name.contains(['\n', '\r']) {
        Some("section name contains a line break")
    } else if name.starts_with('[') || name.ends_with(']') {
        Some("section name has extra brackets")
    } else {
        None
    }
}
