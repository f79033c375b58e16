use std::{borrow::Cow, fmt};

use ruff_text_size::TextSize;

/// Raised by [`PyFunction::source`](crate::PyFunction::source) when a function has no source text,
/// e.g. because it was constructed at run time.
///
/// Kept as its own type rather than an [`Error`] variant so the tree adapter can recognise
/// it and switch to the decompiler path without inspecting messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnavailable {
    /// Name of the function whose source was requested.
    pub function: String,
}

impl SourceUnavailable {
    #[must_use]
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
        }
    }
}

impl fmt::Display for SourceUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not get source code for function `{}`", self.function)
    }
}

impl std::error::Error for SourceUnavailable {}

/// A 1-based line and column in some source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CodeLoc {
    pub line: u32,
    pub column: u32,
}

impl CodeLoc {
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Converts a byte offset into `source` to a line and column.
    ///
    /// Columns count characters, not bytes. Offsets past the end of the text are
    /// clamped to the final position.
    #[must_use]
    pub fn from_offset(source: &str, offset: TextSize) -> Self {
        let offset = usize::from(offset).min(source.len());
        let before = source.get(..offset).unwrap_or(source);
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let line = before.matches('\n').count() + 1;
        let column = before[line_start..].chars().count() + 1;
        Self {
            line: u32::try_from(line).unwrap_or(u32::MAX),
            column: u32::try_from(column).unwrap_or(u32::MAX),
        }
    }
}

impl fmt::Display for CodeLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Errors produced while quoting, templating or validating Python functions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The decompiler hook failed or is not implemented for this function.
    Decompile { function: String, msg: Cow<'static, str> },
    /// The (normalized) source text of a function or snippet is not valid Python.
    Parse { msg: Cow<'static, str>, position: CodeLoc },
    /// A built-in name set could not be loaded from JSON.
    BuiltinNames { msg: Cow<'static, str>, position: CodeLoc },
    /// The source parsed, but does not start with a function definition.
    NotAFunction { function: String },
    /// No function with this qualified name exists in the module.
    FunctionNotFound { qualname: String, filename: String },
    /// A template was rendered with more fragments than it has parameters.
    Arity {
        template: String,
        expected: usize,
        supplied: usize,
    },
    /// A statement fragment was substituted where only an expression can stand.
    FragmentPlacement { name: String, msg: Cow<'static, str> },
    /// Unparsing then re-parsing a rendered template failed.
    Canonicalize { msg: Cow<'static, str> },
    /// A quotation reads names that are neither bound, imported nor built in.
    Unaccounted { names: Vec<String> },
}

impl Error {
    pub(crate) fn parse(msg: impl Into<Cow<'static, str>>, position: CodeLoc) -> Self {
        Self::Parse {
            msg: msg.into(),
            position,
        }
    }

    /// Builds a parse error from ruff's parser error, locating it within `source`.
    pub(crate) fn from_ruff(error: &ruff_python_parser::ParseError, source: &str) -> Self {
        Self::parse(error.error.to_string(), CodeLoc::from_offset(source, error.location.start()))
    }

    pub fn decompile(function: impl Into<String>, msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Decompile {
            function: function.into(),
            msg: msg.into(),
        }
    }

    pub(crate) fn placement(name: &str, msg: impl Into<Cow<'static, str>>) -> Self {
        Self::FragmentPlacement {
            name: name.to_owned(),
            msg: msg.into(),
        }
    }

    /// Returns true for the validator's missing-binding defect.
    #[must_use]
    pub fn is_unaccounted(&self) -> bool {
        matches!(self, Self::Unaccounted { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decompile { function, msg } => write!(f, "could not decompile function `{function}`: {msg}"),
            Self::Parse { msg, position } => write!(f, "syntax error at {position}: {msg}"),
            Self::BuiltinNames { msg, position } => write!(f, "invalid builtin name set at {position}: {msg}"),
            Self::NotAFunction { function } => {
                write!(f, "source of `{function}` does not start with a function definition")
            }
            Self::FunctionNotFound { qualname, filename } => {
                write!(f, "no function named `{qualname}` in {filename}")
            }
            Self::Arity {
                template,
                expected,
                supplied,
            } => write!(
                f,
                "template `{template}` takes at most {expected} fragment(s) but {supplied} were supplied"
            ),
            Self::FragmentPlacement { name, msg } => write!(f, "cannot substitute `{name}`: {msg}"),
            Self::Canonicalize { msg } => write!(f, "rendered template does not round-trip: {msg}"),
            Self::Unaccounted { names } => {
                write!(f, "quotation uses unaccounted for names: {}", names.join(", "))
            }
        }
    }
}

impl std::error::Error for Error {}
