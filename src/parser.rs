use std::io::{BufRead, Lines};

use tracing::{debug, trace};

use crate::Ini;
use crate::error::{ParseError, SyntaxError, SyntaxErrorKind};
use crate::escape::unescape;
use crate::line::{Line, split_assignment};
use crate::section::Section;

/// Which namespace assignments currently land in.
#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    /// No header seen yet; assignments are global keys.
    NoSection,
    InSection(String),
}

/// Represents an on-going parse over a source of lines.
#[derive(Debug)]
pub(crate) struct Parser<R> {
    lines: Lines<R>,
    state: State,
    /// 1-based number of the last line read, counting blanks and comments.
    line: usize,
}

impl<R: BufRead> Parser<R> {
    #[must_use]
    pub(crate) fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            state: State::NoSection,
            line: 0,
        }
    }

    /// Feed every line into `ini`, stopping at the first error.
    ///
    /// On failure `ini` keeps whatever was applied before the offending line.
    pub(crate) fn parse_into(mut self, ini: &mut Ini) -> Result<(), ParseError> {
        while let Some(raw) = self.lines.next() {
            let raw = raw?;
            self.line += 1;

            let line = raw.trim();
            match Line::classify(line) {
                Line::Skip => trace!(line = self.line, "skipped"),
                Line::Section(name) => self.enter_section(ini, name),
                Line::Assignment(text) => self.assign(ini, text)?,
            }
        }

        debug!(
            lines = self.line,
            sections = ini.sections.len(),
            global_keys = ini.global_keys.len(),
            "parse complete"
        );

        Ok(())
    }

    fn enter_section(&mut self, ini: &mut Ini, name: &str) {
        // Re-entering a known section keeps its existing keys.
        if ini.sections.contains_key(name) {
            trace!(line = self.line, section = name, "re-entered section");
        } else {
            debug!(line = self.line, section = name, "new section");
            ini.sections.insert(name.to_owned(), Section::new());
        }

        self.state = State::InSection(name.to_owned());
    }

    fn assign(&self, ini: &mut Ini, text: &str) -> Result<(), SyntaxError> {
        let error = |kind| SyntaxError::new(self.line, text, kind);

        let (key, value) =
            split_assignment(text).ok_or_else(|| error(SyntaxErrorKind::InvalidKeyValuePair))?;

        if key.is_empty() {
            return Err(error(SyntaxErrorKind::EmptyKey));
        }
        if value.is_empty() {
            return Err(error(SyntaxErrorKind::EmptyValue));
        }

        let value = unescape(value);
        trace!(line = self.line, key, "assignment");

        match &self.state {
            State::NoSection => {
                ini.global_keys.insert(key.to_owned(), value);
            }
            State::InSection(name) => {
                ini.sections
                    .entry(name.clone())
                    .or_default()
                    .insert(key, value);
            }
        }

        Ok(())
    }
}
