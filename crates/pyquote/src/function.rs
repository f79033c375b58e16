//! Python functions as seen by the quoting machinery.
//!
//! A [`PyFunction`] is anything that can hand over its definition text, or failing that, a
//! reconstructed definition node. Three implementations are provided: functions with known
//! source text, functions looked up by qualified name inside a module, and functions built
//! programmatically whose definition node is all there is.

use std::borrow::Cow;

use ruff_python_ast::{self as ast, ExceptHandler, Stmt, StmtFunctionDef};
use ruff_python_parser::parse_module;
use ruff_text_size::Ranged;

use crate::error::{Error, SourceUnavailable};

/// A Python function that can be quoted or turned into a template.
pub trait PyFunction {
    /// The function's name, used in error messages.
    fn name(&self) -> &str;

    /// Returns the raw definition text as it appears in its file, indentation included.
    fn source(&self) -> Result<Cow<'_, str>, SourceUnavailable>;

    /// Reconstructs the definition node when [`source`](Self::source) is unavailable.
    ///
    /// Implementors backed by compiled code plug a decompiler in here. The default has no
    /// compiled form to work from.
    fn decompile(&self) -> Result<StmtFunctionDef, Error> {
        Err(Error::decompile(self.name(), "no compiled form is available"))
    }
}

impl<T: PyFunction + ?Sized> PyFunction for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn source(&self) -> Result<Cow<'_, str>, SourceUnavailable> {
        (**self).source()
    }

    fn decompile(&self) -> Result<StmtFunctionDef, Error> {
        (**self).decompile()
    }
}

/// A function whose definition text is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFunction {
    name: String,
    source: String,
}

impl SourceFunction {
    /// Creates a function from its definition text.
    ///
    /// `source` may be indented; it is normalized before parsing.
    #[must_use]
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }
}

impl PyFunction for SourceFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn source(&self) -> Result<Cow<'_, str>, SourceUnavailable> {
        Ok(Cow::Borrowed(&self.source))
    }
}

/// A function built at run time, without any source text.
///
/// Its stored definition is returned by [`PyFunction::decompile`], which is the path the
/// tree adapter takes whenever source retrieval fails.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicFunction {
    definition: StmtFunctionDef,
}

impl DynamicFunction {
    #[must_use]
    pub fn new(definition: StmtFunctionDef) -> Self {
        Self { definition }
    }
}

impl PyFunction for DynamicFunction {
    fn name(&self) -> &str {
        self.definition.name.as_str()
    }

    fn source(&self) -> Result<Cow<'_, str>, SourceUnavailable> {
        Err(SourceUnavailable::new(self.name()))
    }

    fn decompile(&self) -> Result<StmtFunctionDef, Error> {
        Ok(self.definition.clone())
    }
}

/// The text of a Python module, used to look up function definitions by name.
#[derive(Debug, Clone)]
pub struct ModuleSource {
    filename: String,
    source: String,
}

impl ModuleSource {
    #[must_use]
    pub fn new(source: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            source: source.into(),
        }
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Finds a function by its dotted qualified name, e.g. `make_call`, `Builder.emit` or
    /// `outer.<locals>.inner`.
    ///
    /// Like Python's own qualified names, the lookup sees through `if`, `try`, `with`, loop
    /// and `match` blocks. When a name is defined more than once, the last definition wins.
    ///
    /// The returned source spans whole lines from the first decorator to the end of the
    /// definition and keeps the original indentation.
    pub fn function(&self, qualname: &str) -> Result<SourceFunction, Error> {
        let module = parse_module(&self.source)
            .map_err(|e| Error::from_ruff(&e, &self.source))?
            .into_syntax();
        let not_found = || Error::FunctionNotFound {
            qualname: qualname.to_owned(),
            filename: self.filename.clone(),
        };

        let mut segments = qualname.split('.').filter(|segment| *segment != "<locals>").peekable();
        let mut body: &[Stmt] = &module.body;
        while let Some(segment) = segments.next() {
            let mut found = None;
            last_definition(body, segment, &mut found);
            match (found, segments.peek().is_none()) {
                (Some(Stmt::FunctionDef(function)), true) => {
                    let name = function.name.as_str().to_owned();
                    return Ok(SourceFunction::new(name, self.definition_lines(function)));
                }
                (Some(Stmt::FunctionDef(ast::StmtFunctionDef { body: inner, .. })), false)
                | (Some(Stmt::ClassDef(ast::StmtClassDef { body: inner, .. })), false) => body = inner,
                _ => return Err(not_found()),
            }
        }
        Err(not_found())
    }

    /// Returns the full lines covering `function` and its decorators.
    fn definition_lines(&self, function: &StmtFunctionDef) -> &str {
        let start = function
            .decorator_list
            .first()
            .map_or_else(|| function.start(), |decorator| decorator.start());
        let start = usize::from(start);
        let end = usize::from(function.end());

        let line_start = self.source[..start].rfind('\n').map_or(0, |i| i + 1);
        let line_end = self.source[end..].find('\n').map_or(self.source.len(), |i| end + i);
        &self.source[line_start..line_end]
    }
}

/// Records in `found` the last function or class named `name` bound directly in `body`.
///
/// Definitions under `if`, `try`, `with`, loops and `match` belong to the same scope, so
/// their blocks are searched too. Function and class bodies open a new scope and are not.
fn last_definition<'a>(body: &'a [Stmt], name: &str, found: &mut Option<&'a Stmt>) {
    for stmt in body {
        match stmt {
            Stmt::FunctionDef(function) if function.name.as_str() == name => *found = Some(stmt),
            Stmt::ClassDef(class) if class.name.as_str() == name => *found = Some(stmt),
            Stmt::If(ast::StmtIf {
                body, elif_else_clauses, ..
            }) => {
                last_definition(body, name, found);
                for clause in elif_else_clauses {
                    last_definition(&clause.body, name, found);
                }
            }
            Stmt::Try(ast::StmtTry {
                body,
                handlers,
                orelse,
                finalbody,
                ..
            }) => {
                last_definition(body, name, found);
                for ExceptHandler::ExceptHandler(handler) in handlers {
                    last_definition(&handler.body, name, found);
                }
                last_definition(orelse, name, found);
                last_definition(finalbody, name, found);
            }
            Stmt::With(ast::StmtWith { body, .. }) => last_definition(body, name, found),
            Stmt::For(ast::StmtFor { body, orelse, .. }) | Stmt::While(ast::StmtWhile { body, orelse, .. }) => {
                last_definition(body, name, found);
                last_definition(orelse, name, found);
            }
            Stmt::Match(ast::StmtMatch { cases, .. }) => {
                for case in cases {
                    last_definition(&case.body, name, found);
                }
            }
            _ => {}
        }
    }
}
