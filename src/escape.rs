//! Value escaping.
//!
//! Only values are transformed; keys and section names are taken verbatim.

/// Expand the two-character sequences `\n`, `\r` and `\t` into the control characters they
/// name, then strip every leading and trailing `"`.
#[must_use]
pub(crate) fn unescape(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }

        let replacement = match chars.peek() {
            Some('n') => '\n',
            Some('r') => '\r',
            Some('t') => '\t',
            _ => {
                result.push(c);
                continue;
            }
        };

        _ = chars.next();
        result.push(replacement);
    }

    result.trim_matches('"').to_owned()
}

/// Encode control characters back into their two-character form so a serialized value stays on
/// one line.
#[must_use]
pub(crate) fn escape(value: &str) -> String {
    let mut result = String::with_capacity(value.len());

    for c in value.chars() {
        match c {
            '\n' => result.push_str(r"\n"),
            '\r' => result.push_str(r"\r"),
            '\t' => result.push_str(r"\t"),
            c => result.push(c),
        }
    }

    result
}

/// Why `value` cannot be written at all; a value that is empty once escaped and trimmed is
/// rejected by the parser.
#[must_use]
pub(crate) fn value_problem(value: &str) -> Option<&'static str> {
    if escape(value).trim().is_empty() {
        Some("value cannot be empty")
    } else {
        None
    }
}
