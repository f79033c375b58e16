//! Serializing quotations back to Python text, and the parse round-trip built on it.

use ruff_python_ast::{ModModule, Stmt};
use ruff_python_codegen::{Generator, Indentation, Stylist};
use ruff_python_parser::{Parsed, parse_module};
use ruff_source_file::LineEnding;

use crate::error::Error;

/// Indentation and line ending used when unparsing statements.
///
/// Templates remember the style of the source they were parsed from so rendered code
/// reads like the code it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeStyle {
    indentation: Indentation,
    line_ending: LineEnding,
}

impl Default for CodeStyle {
    /// Four spaces and `\n`.
    fn default() -> Self {
        Self {
            indentation: Indentation::default(),
            line_ending: LineEnding::Lf,
        }
    }
}

impl CodeStyle {
    /// Detects the style of already parsed `source`.
    pub(crate) fn detect(parsed: &Parsed<ModModule>, source: &str) -> Self {
        let stylist = Stylist::from_tokens(parsed.tokens(), source);
        Self {
            indentation: stylist.indentation().clone(),
            line_ending: stylist.line_ending(),
        }
    }

    /// Serializes `stmts` to Python source, one statement after another.
    #[must_use]
    pub fn unparse(&self, stmts: &[Stmt]) -> String {
        stmts
            .iter()
            .map(|stmt| Generator::new(&self.indentation, self.line_ending).stmt(stmt))
            .collect::<Vec<_>>()
            .join(self.line_ending.as_str())
    }

    /// Unparses `stmts` and parses the text again.
    ///
    /// Every node of the result is produced by the parser, so text ranges are consistent
    /// with the returned code and node shapes are exactly those Python text can express.
    pub fn canonicalize(&self, stmts: &[Stmt]) -> Result<Vec<Stmt>, Error> {
        let source = self.unparse(stmts);
        let parsed = parse_module(&source).map_err(|e| Error::Canonicalize {
            msg: format!("{}\n{source}", e.error).into(),
        })?;
        Ok(parsed.into_syntax().body.into())
    }
}

/// Serializes `stmts` to Python source with the default style.
#[must_use]
pub fn unparse(stmts: &[Stmt]) -> String {
    CodeStyle::default().unparse(stmts)
}

/// Round-trips `stmts` through text with the default style.
pub fn canonicalize(stmts: &[Stmt]) -> Result<Vec<Stmt>, Error> {
    CodeStyle::default().canonicalize(stmts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> (Parsed<ModModule>, Vec<Stmt>) {
        let parsed = parse_module(source).unwrap();
        let body = parsed.syntax().body.clone();
        (parsed, body.into())
    }

    #[test]
    fn unparse_joins_statements() {
        let (_, body) = parse("a = 1\nif a:\n    b = 2\n");
        assert_eq!(unparse(&body), "a = 1\nif a:\n    b = 2");
    }

    #[test]
    fn detected_style_keeps_indentation() {
        let source = "def f():\n  return 1\n";
        let (parsed, body) = parse(source);
        let style = CodeStyle::detect(&parsed, source);
        assert_eq!(style.unparse(&body), "def f():\n  return 1");
    }

    #[test]
    fn round_trip_is_stable() {
        let (_, body) = parse("for i in range(3):\n    total += i * 2\nelse:\n    print(total)\n");
        let once = unparse(&body);
        let again = unparse(&canonicalize(&body).unwrap());
        assert_eq!(once, again);
    }
}
