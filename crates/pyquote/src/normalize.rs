//! Source normalization: makes a function's text parse on its own.
//!
//! Definitions nested in a class or another function keep their indentation when their
//! source is retrieved, and an indented `def` is not a valid module.

use std::borrow::Cow;

use crate::{error::SourceUnavailable, function::PyFunction};

/// Returns the source of `function` with the first line's indentation removed from every line.
///
/// The `SourceUnavailable` condition is passed through untouched so callers can fall back
/// to decompiling the function.
pub fn get_source(function: &(impl PyFunction + ?Sized)) -> Result<String, SourceUnavailable> {
    let raw = function.source()?;
    Ok(normalize_indentation(&raw).into_owned())
}

/// Strips the leading whitespace of the first line from every line of `source`.
///
/// A line that is indented less than the first line (or with non-whitespace inside the
/// prefix width) loses only the whitespace it has. Text whose first line is not
/// indented is returned as is, so normalizing is idempotent.
#[must_use]
pub fn normalize_indentation(source: &str) -> Cow<'_, str> {
    let first_line = source.lines().next().unwrap_or_default();
    let indent = first_line.len() - first_line.trim_start_matches([' ', '\t']).len();
    if indent == 0 {
        return Cow::Borrowed(source);
    }

    let lines: Vec<&str> = source.lines().map(|line| strip_indent(line, indent)).collect();
    Cow::Owned(lines.join("\n"))
}

fn strip_indent(line: &str, indent: usize) -> &str {
    let strip = line
        .bytes()
        .take(indent)
        .take_while(|b| matches!(b, b' ' | b'\t'))
        .count();
    &line[strip..]
}
