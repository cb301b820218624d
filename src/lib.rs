#![warn(
    clippy::correctness,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::style,
    clippy::pedantic
)]

//! Reader and writer for line-oriented INI files.
//!
//! ```text
//! ; comments start with ';' or '#'
//! name = global value
//!
//! [section]
//! key = "quoted\tvalue"
//! ```
//!
//! Assignments that appear before the first header are kept as global keys, apart from every
//! section. Values expand `\n`, `\r` and `\t` and lose any surrounding double quotes; everything
//! is a string.

mod error;
mod escape;
mod line;
mod parser;
mod section;

use std::ffi::OsStr;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;
use tracing::debug;

pub use crate::error::{Error, ParseError, SyntaxError, SyntaxErrorKind};
pub use crate::section::{Entries, Section};

use crate::escape::{escape, value_problem};
use crate::line::{key_problem, section_name_problem};
use crate::parser::Parser;

const EXTENSION: &str = "ini";

/// An in-memory INI document.
///
/// Sections keep the order in which they were first seen or created. Parsing into an existing
/// document merges with what it already holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ini {
    pub(crate) sections: IndexMap<String, Section>,
    pub(crate) global_keys: IndexMap<String, String>,
}

impl Ini {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a fresh document from an `.ini` file.
    ///
    /// # Errors
    ///
    /// See [`Ini::merge_from_file`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let mut ini = Self::new();
        ini.merge_from_file(path)?;
        Ok(ini)
    }

    /// Parse `text` into this document, keeping everything already loaded.
    ///
    /// Sections that already exist are extended and keys that already exist are overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseString`] wrapping the first syntax error. The document may have been
    /// partially updated by the lines before it.
    pub fn merge_from_str(&mut self, text: &str) -> Result<(), Error> {
        self.merge_from_reader(text.as_bytes())
            .map_err(|source| Error::ParseString { source })
    }

    /// Parse every line of `reader` into this document.
    ///
    /// # Errors
    ///
    /// Fails on the first syntax error or read failure.
    pub fn merge_from_reader<R: BufRead>(&mut self, reader: R) -> Result<(), ParseError> {
        Parser::new(reader).parse_into(self)
    }

    /// Parse an `.ini` file into this document, keeping everything already loaded.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedFormat`] if the extension is not exactly `ini`; the filesystem is
    ///   not touched.
    /// - [`Error::Open`] if the file cannot be opened.
    /// - [`Error::ParseFile`] on a syntax or read error.
    pub fn merge_from_file(&mut self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        check_extension(path)?;

        let file = File::open(path).map_err(|source| Error::Open {
            path: path.to_owned(),
            source,
        })?;
        debug!(path = %path.display(), "opened");

        self.merge_from_reader(BufReader::new(file))
            .map_err(|source| Error::ParseFile {
                path: path.to_owned(),
                source,
            })
    }

    /// Serialize this document to an `.ini` file, replacing its contents.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedFormat`] for a non-`.ini` path.
    /// - [`Error::Unrepresentable`] if an entry would be rejected or misread when the file is
    ///   parsed again. Nothing is written.
    /// - [`Error::Write`] if writing fails.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        check_extension(path)?;
        self.check_writable()?;

        fs::write(path, self.to_string()).map_err(|source| Error::Write {
            path: path.to_owned(),
            source,
        })?;
        debug!(path = %path.display(), sections = self.sections.len(), "written");

        Ok(())
    }

    fn check_writable(&self) -> Result<(), Error> {
        let entries = self
            .global_keys
            .iter()
            .map(|(key, value)| (None::<&str>, key.as_str(), value.as_str()));
        let section_entries = self.sections.iter().flat_map(|(name, section)| {
            section
                .iter()
                .map(move |(key, value)| (Some(name.as_str()), key, value))
        });

        for name in self.sections.keys() {
            if let Some(reason) = section_name_problem(name) {
                return Err(Error::Unrepresentable {
                    section: Some(name.clone()),
                    key: None,
                    reason,
                });
            }
        }

        for (section, key, value) in entries.chain(section_entries) {
            if let Some(reason) = key_problem(key).or_else(|| value_problem(value)) {
                return Err(Error::Unrepresentable {
                    section: section.map(str::to_owned),
                    key: Some(key.to_owned()),
                    reason,
                });
            }
        }

        Ok(())
    }

    /// Section names in the order they were first seen.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    #[must_use]
    pub fn sections(&self) -> &IndexMap<String, Section> {
        &self.sections
    }

    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    #[must_use]
    pub fn contains_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// Keys assigned before the first section header, in the order they first appeared.
    #[must_use]
    pub fn global_keys(&self) -> &IndexMap<String, String> {
        &self.global_keys
    }

    #[must_use]
    pub fn get_global(&self, key: &str) -> Option<&str> {
        self.global_keys.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections.get(section)?.get(key)
    }

    /// Like [`Ini::get`], but reports a missing section or key as `("", false)`.
    #[must_use]
    pub fn get_or_empty(&self, section: &str, key: &str) -> (&str, bool) {
        match self.get(section, key) {
            Some(value) => (value, true),
            None => ("", false),
        }
    }

    /// Write `key = value` into `section`, creating the section at the end if it is new.
    ///
    /// Global keys are never touched.
    pub fn set(&mut self, section: &str, key: impl Into<String>, value: impl Into<String>) {
        if let Some(entries) = self.sections.get_mut(section) {
            entries.insert(key, value);
        } else {
            let mut entries = Section::new();
            entries.insert(key, value);
            self.sections.insert(section.to_owned(), entries);
        }
    }
}

fn check_extension(path: &Path) -> Result<(), Error> {
    if path.extension() == Some(OsStr::new(EXTENSION)) {
        Ok(())
    } else {
        Err(Error::UnsupportedFormat {
            path: path.to_owned(),
        })
    }
}

impl FromStr for Ini {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut ini = Self::new();
        ini.merge_from_str(s)?;
        Ok(ini)
    }
}

/// Global keys first, in insertion order, then each section in order with its keys sorted.
///
/// Newlines, carriage returns and tabs in values are written as `\n`, `\r` and `\t`. Values with
/// leading or trailing quotes or whitespace, or containing a literal `\n`, `\r` or `\t`, do not
/// survive a round trip.
///
/// Entries are written as they are. Blank values, keys containing `=` or a line break, keys with
/// surrounding whitespace or starting with `;`, `#` or `[`, and section names with extra brackets
/// or a line break produce text that fails to parse or parses differently;
/// [`Ini::write_to_file`] refuses them.
impl fmt::Display for Ini {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.global_keys {
            writeln!(f, "{key}={}", escape(value))?;
        }

        for (name, section) in &self.sections {
            writeln!(f, "[{name}]")?;

            for (key, value) in section {
                writeln!(f, "{key}={}", escape(value))?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    const TWO_SECTIONS: &str = "
[section1]
key1=value1
key2=value2

[section2]
keyA=valueA
keyB=valueB
";

    #[test]
    fn load_from_string() {
        let ini = TWO_SECTIONS
            .parse::<Ini>()
            .expect("failed to parse hardcoded INI text");

        assert_eq!(
            ini.section_names().collect::<Vec<_>>(),
            vec!["section1", "section2"]
        );
        assert_eq!(ini.get_or_empty("section1", "key1"), ("value1", true));
        assert_eq!(ini.get_or_empty("section2", "keyB"), ("valueB", true));
    }

    #[test]
    fn empty_string() {
        let ini = "".parse::<Ini>().expect("empty text should parse");

        assert_eq!(ini, Ini::new());
        assert_eq!(ini.to_string(), "");
    }

    #[test]
    fn missing_section_or_key() {
        let ini = TWO_SECTIONS
            .parse::<Ini>()
            .expect("failed to parse hardcoded INI text");

        assert_eq!(ini.get_or_empty("section1", "key3"), ("", false));
        assert_eq!(ini.get_or_empty("nope", "key1"), ("", false));
        assert_eq!(ini.get("section1", "key3"), None);
    }

    #[test]
    fn invalid_string_is_wrapped() {
        let err = "\n[section1]\nkey1=value1\nkey2\nkey3=value3\n"
            .parse::<Ini>()
            .expect_err("line without separator should fail");

        assert_eq!(
            err.to_string(),
            "failed to parse input string: line 4: invalid key-value pair: key2"
        );
        assert_eq!(err.syntax().map(|e| e.line), Some(4));
        assert!(err.source().is_some());
    }

    #[test]
    fn merging_accumulates() {
        let mut ini = Ini::new();
        ini.merge_from_str("top=1\n[a]\nx=1\n")
            .expect("failed to parse hardcoded INI text");
        ini.merge_from_str("top=2\n[b]\ny=2\n[a]\nz=3\n")
            .expect("failed to parse hardcoded INI text");

        assert_eq!(ini.section_names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(ini.get("a", "x"), Some("1"));
        assert_eq!(ini.get("a", "z"), Some("3"));
        assert_eq!(ini.get_global("top"), Some("2"));
    }

    #[test]
    fn each_merge_starts_outside_any_section() {
        let mut ini = Ini::new();
        ini.merge_from_str("[a]\nx=1\n")
            .expect("failed to parse hardcoded INI text");
        ini.merge_from_str("y=2\n")
            .expect("failed to parse hardcoded INI text");

        assert_eq!(ini.get("a", "y"), None);
        assert_eq!(ini.get_global("y"), Some("2"));
    }

    #[test]
    fn set_creates_and_overwrites() {
        let mut ini = Ini::new();
        ini.set("section1", "key1", "value1");
        ini.set("section1", "key1", "newValue1");
        ini.set("section1", "key2", "value2");

        assert_eq!(ini.get("section1", "key1"), Some("newValue1"));
        assert_eq!(ini.get("section1", "key2"), Some("value2"));
        assert!(ini.global_keys().is_empty());
    }

    #[test]
    fn set_does_not_duplicate_section_names() {
        let mut ini = Ini::new();
        ini.set("a", "k1", "v1");
        ini.set("b", "k1", "v1");
        ini.set("a", "k2", "v2");

        assert_eq!(ini.section_names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn set_after_parse_appends_new_sections() {
        let mut ini = TWO_SECTIONS
            .parse::<Ini>()
            .expect("failed to parse hardcoded INI text");
        ini.set("section0", "k", "v");
        ini.set("section1", "key3", "value3");

        assert_eq!(
            ini.section_names().collect::<Vec<_>>(),
            vec!["section1", "section2", "section0"]
        );
        assert_eq!(ini.section("section1").map(Section::len), Some(3));
    }

    #[test]
    fn to_string_orders_sections_and_keys() {
        let mut ini = Ini::new();
        ini.set("section1", "key2", "value2");
        ini.set("section1", "key1", "value1");
        ini.set("section2", "keyB", "valueB");
        ini.set("section2", "keyA", "valueA");

        assert_eq!(
            ini.to_string(),
            "[section1]\nkey1=value1\nkey2=value2\n[section2]\nkeyA=valueA\nkeyB=valueB\n"
        );
    }

    #[test]
    fn to_string_writes_globals_first_in_insertion_order() {
        let ini = "zeta=1\nalpha=2\nzeta=3\n[s]\nk=v\n"
            .parse::<Ini>()
            .expect("failed to parse hardcoded INI text");

        assert_eq!(ini.to_string(), "zeta=3\nalpha=2\n[s]\nk=v\n");
    }

    #[test]
    fn control_characters_survive_a_round_trip() {
        let ini = "[s]\nmsg = \"line1\\nline2\\tend\"\n"
            .parse::<Ini>()
            .expect("failed to parse hardcoded INI text");

        assert_eq!(ini.get("s", "msg"), Some("line1\nline2\tend"));

        let text = ini.to_string();
        assert_eq!(text, "[s]\nmsg=line1\\nline2\\tend\n");

        let reparsed = text.parse::<Ini>().expect("serialized text should parse");
        assert_eq!(reparsed, ini);
    }

    #[test]
    fn edge_quotes_are_lost_on_round_trip() {
        let mut ini = Ini::new();
        ini.set("s", "k", "\"quoted\"");

        let reparsed = ini
            .to_string()
            .parse::<Ini>()
            .expect("serialized text should parse");

        assert_eq!(reparsed.get("s", "k"), Some("quoted"));
    }

    #[test]
    fn parse_file() {
        let dir = tempfile::tempdir().expect("failed to create temporary directory");
        let path = dir.path().join("test.ini");
        let content = "\t\t[section1]\n\t\tkey1=value1\nkey2=value2\n\n[section2]\nkeyA=valueA\n";
        fs::write(&path, content).expect("failed to write temporary INI file");

        let ini = Ini::from_file(&path).expect("failed to parse temporary INI file");

        assert_eq!(ini.get("section1", "key1"), Some("value1"));
        assert_eq!(ini.get("section1", "key2"), Some("value2"));
        assert_eq!(ini.get("section2", "keyA"), Some("valueA"));
    }

    #[test]
    fn parse_file_rejects_other_extensions() {
        let dir = tempfile::tempdir().expect("failed to create temporary directory");
        let path = dir.path().join("test.txt");
        fs::write(&path, "[section1]\nkey1=value1\n").expect("failed to write temporary file");

        let err = Ini::from_file(&path).expect_err("non-.ini path should be rejected");

        assert!(matches!(err, Error::UnsupportedFormat { .. }));
    }

    #[test]
    fn extension_is_checked_before_opening() {
        // A bare ".ini" is a hidden file with no extension.
        for path in ["missing.txt", "missing.INI", "missing.ini.bak", "missing", ".ini"] {
            let err = Ini::from_file(path).expect_err("non-.ini path should be rejected");

            assert!(matches!(err, Error::UnsupportedFormat { .. }), "{path}");
        }
    }

    #[test]
    fn parse_missing_file() {
        let dir = tempfile::tempdir().expect("failed to create temporary directory");
        let path = dir.path().join("non_existent.ini");

        let err = Ini::from_file(&path).expect_err("missing file should fail");

        assert!(matches!(err, Error::Open { .. }));
        assert!(err.source().is_some());
    }

    #[test]
    fn parse_file_syntax_error() {
        let dir = tempfile::tempdir().expect("failed to create temporary directory");
        let path = dir.path().join("broken.ini");
        fs::write(&path, "[s]\n= nokey\n").expect("failed to write temporary INI file");

        let err = Ini::from_file(&path).expect_err("empty key should fail");

        assert!(matches!(err, Error::ParseFile { .. }));
        assert_eq!(
            err.syntax().map(|e| (e.line, e.kind)),
            Some((2, SyntaxErrorKind::EmptyKey))
        );
    }

    #[test]
    fn write_then_read_file() {
        let dir = tempfile::tempdir().expect("failed to create temporary directory");
        let path = dir.path().join("out.ini");

        let mut ini = Ini::new();
        ini.set("server", "host", "localhost");
        ini.set("server", "port", "8080");
        ini.write_to_file(&path).expect("failed to write INI file");

        let reread = Ini::from_file(&path).expect("failed to read back INI file");
        assert_eq!(reread, ini);
    }

    #[test]
    fn write_refuses_empty_value() {
        let dir = tempfile::tempdir().expect("failed to create temporary directory");
        let path = dir.path().join("out.ini");

        let mut ini = Ini::new();
        ini.set("s", "k", "");
        let err = ini.write_to_file(&path).expect_err("empty value should be refused");

        assert!(matches!(
            err,
            Error::Unrepresentable { ref section, ref key, reason: "value cannot be empty" }
                if section.as_deref() == Some("s") && key.as_deref() == Some("k")
        ));
        assert!(!path.exists());
    }

    #[test]
    fn write_refuses_quotes_only_value_from_parse() {
        let dir = tempfile::tempdir().expect("failed to create temporary directory");
        let path = dir.path().join("out.ini");

        let ini = "empty = \"\"\n"
            .parse::<Ini>()
            .expect("failed to parse hardcoded INI text");
        assert_eq!(ini.get_global("empty"), Some(""));

        let err = ini.write_to_file(&path).expect_err("empty value should be refused");

        assert!(matches!(
            err,
            Error::Unrepresentable { section: None, ref key, .. } if key.as_deref() == Some("empty")
        ));
    }

    #[test]
    fn write_refuses_keys_that_would_be_misread() {
        let dir = tempfile::tempdir().expect("failed to create temporary directory");
        let path = dir.path().join("out.ini");

        for key in ["a=b", ";c", "#d", "[e", " pad", "two\nlines"] {
            let mut ini = Ini::new();
            ini.set("s", key, "v");

            let err = ini.write_to_file(&path).expect_err("key should be refused");
            assert!(matches!(err, Error::Unrepresentable { .. }), "{key:?}");
        }
        assert!(!path.exists());
    }

    #[test]
    fn write_refuses_bracketed_section_name() {
        let dir = tempfile::tempdir().expect("failed to create temporary directory");
        let path = dir.path().join("out.ini");

        let mut ini = Ini::new();
        ini.set("[x", "k", "v");
        let err = ini.write_to_file(&path).expect_err("section name should be refused");

        assert!(matches!(err, Error::Unrepresentable { key: None, .. }));
    }

    #[test]
    fn unrepresentable_entries_are_still_displayed() {
        let mut ini = Ini::new();
        ini.set("s", "a=b", "v");

        let reparsed = ini
            .to_string()
            .parse::<Ini>()
            .expect("serialized text should parse");

        assert_eq!(reparsed.get("s", "a=b"), None);
        assert_eq!(reparsed.get("s", "a"), Some("b=v"));
    }

    #[test]
    fn write_rejects_other_extensions() {
        let err = Ini::new()
            .write_to_file("out.json")
            .expect_err("non-.ini path should be rejected");

        assert!(matches!(err, Error::UnsupportedFormat { .. }));
    }
}
