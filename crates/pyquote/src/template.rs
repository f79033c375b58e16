//! Templates: functions whose positional parameters are slots for syntax fragments.
//!
//! ```text
//! def log_call(target, args):
//!     logger.debug("calling")
//!     return target(*args)
//! ```
//!
//! Rendering this template with the fragments `self.run` and `(a, b)` returns the body with
//! every read of `target` and `args` replaced by those fragments. A fragment holding several
//! statements can fill a slot that stands alone as an expression statement; it is emitted as
//! an `if True:` block, the always-executed container for a statement sequence.

use std::cell::RefCell;

use ahash::AHashMap;
use ruff_python_ast::{
    self as ast, Expr, ExprContext, Stmt, StmtFunctionDef,
    visitor::transformer::{Transformer, walk_expr, walk_stmt},
};
use ruff_python_parser::parse_module;

use crate::{adapter::load_definition, codegen::CodeStyle, error::Error, fragment::Fragment, function::PyFunction};

/// Anything that renders fragments into a statement sequence.
///
/// Implemented by [`Template`] and by the validating wrapper returned from
/// [`validate_template`](crate::validate_template).
pub trait Render {
    /// Name of the function the template was built from.
    fn name(&self) -> &str;

    /// Substitutes `fragments` positionally for the template parameters.
    fn render(&self, fragments: Vec<Fragment>) -> Result<Vec<Stmt>, Error>;
}

/// A function body parameterized by the function's positional parameter names.
///
/// The definition is parsed once and never modified; each render works on its own copy,
/// so one template can be rendered from several threads at once.
#[derive(Debug, Clone)]
pub struct Template {
    definition: StmtFunctionDef,
    params: Vec<String>,
    style: CodeStyle,
}

/// Builds a [`Template`] from `function`.
pub fn quoted_template(function: &(impl PyFunction + ?Sized)) -> Result<Template, Error> {
    Template::new(function)
}

impl Template {
    /// Extracts the definition of `function` and its positional parameter names.
    ///
    /// Positional-only parameters come first, then positional-or-keyword ones, each in
    /// declaration order. `*args`, keyword-only parameters and `**kwargs` are not slots.
    pub fn new(function: &(impl PyFunction + ?Sized)) -> Result<Self, Error> {
        let (definition, style) = load_definition(function)?;
        let params = definition
            .parameters
            .posonlyargs
            .iter()
            .chain(&definition.parameters.args)
            .map(|param| param.parameter.name.as_str().to_owned())
            .collect();
        Ok(Self {
            definition,
            params,
            style,
        })
    }

    /// Parameter names, in slot order.
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// The template's definition node, as parsed or decompiled.
    #[must_use]
    pub fn definition(&self) -> &StmtFunctionDef {
        &self.definition
    }

    #[must_use]
    pub fn style(&self) -> &CodeStyle {
        &self.style
    }

    /// Renders the template body with `fragments` substituted for the parameters.
    ///
    /// Fragments pair with parameters by position. Supplying fewer fragments than
    /// parameters is partial application: the remaining parameters stay in the output as
    /// free names. Supplying more is an [`Error::Arity`].
    ///
    /// The rewritten body is unparsed and parsed again before it is returned, so the
    /// result is exactly what the parser produces for the rendered code.
    pub fn render(&self, fragments: Vec<Fragment>) -> Result<Vec<Stmt>, Error> {
        if fragments.len() > self.params.len() {
            return Err(Error::Arity {
                template: self.name().to_owned(),
                expected: self.params.len(),
                supplied: fragments.len(),
            });
        }

        let replacements = self.params.iter().map(String::as_str).zip(&fragments).collect();
        let replacer = NameReplacer::new(replacements);
        let mut body = self.definition.body.clone();
        for stmt in &mut body {
            replacer.visit_stmt(stmt);
        }
        replacer.finish()?;

        self.style.canonicalize(&body)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.definition.name.as_str()
    }
}

impl Render for Template {
    fn name(&self) -> &str {
        Self::name(self)
    }

    fn render(&self, fragments: Vec<Fragment>) -> Result<Vec<Stmt>, Error> {
        Self::render(self, fragments)
    }
}

/// Replaces reads of mapped names with their fragments.
///
/// Only `Load` occurrences are replaced: assignment targets and `del` targets keep their
/// names. Substituted fragments are not visited again.
struct NameReplacer<'f> {
    replacements: AHashMap<&'f str, &'f Fragment>,
    /// First fragment that could not be placed; the transformer API cannot return errors.
    error: RefCell<Option<Error>>,
}

impl<'f> NameReplacer<'f> {
    fn new(replacements: AHashMap<&'f str, &'f Fragment>) -> Self {
        Self {
            replacements,
            error: RefCell::new(None),
        }
    }

    fn lookup(&self, expr: &Expr) -> Option<(&'f str, &'f Fragment)> {
        let Expr::Name(ast::ExprName {
            id,
            ctx: ExprContext::Load,
            ..
        }) = expr
        else {
            return None;
        };
        self.replacements
            .get_key_value(id.as_str())
            .map(|(name, fragment)| (*name, *fragment))
    }

    /// Replacement for a statement that consists of a mapped name alone.
    fn statement_replacement(&self, stmt: &Stmt) -> Option<Stmt> {
        let Stmt::Expr(ast::StmtExpr { value, .. }) = stmt else {
            return None;
        };
        let (_, Fragment::Stmts(stmts)) = self.lookup(value)? else {
            return None;
        };
        Some(match stmts.as_slice() {
            [] => static_stmt("pass"),
            [single] => single.clone(),
            _ => always_true_block(stmts.clone()),
        })
    }

    fn fail(&self, error: Error) {
        self.error.borrow_mut().get_or_insert(error);
    }

    fn finish(self) -> Result<(), Error> {
        match self.error.into_inner() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl Transformer for NameReplacer<'_> {
    fn visit_stmt(&self, stmt: &mut Stmt) {
        if let Some(replacement) = self.statement_replacement(stmt) {
            *stmt = replacement;
        } else {
            walk_stmt(self, stmt);
        }
    }

    fn visit_expr(&self, expr: &mut Expr) {
        let Some((name, fragment)) = self.lookup(expr) else {
            walk_expr(self, expr);
            return;
        };
        match fragment {
            Fragment::Expr(replacement) => *expr = replacement.clone(),
            Fragment::Stmts(stmts) => match stmts.as_slice() {
                [Stmt::Expr(ast::StmtExpr { value, .. })] => *expr = (**value).clone(),
                [_] => self.fail(Error::placement(name, "a statement cannot be used as an expression")),
                _ => self.fail(Error::placement(
                    name,
                    format!("{} statements cannot be used as an expression", stmts.len()),
                )),
            },
        }
    }
}

/// Wraps `body` in `if True:`, a statement that always runs every statement in it.
fn always_true_block(body: Vec<Stmt>) -> Stmt {
    let mut block = static_stmt("if True:\n    pass");
    if let Stmt::If(ast::StmtIf { body: slot, .. }) = &mut block {
        *slot = body.into();
    }
    block
}

fn static_stmt(source: &str) -> Stmt {
    let mut body = parse_module(source)
        .expect("static statement source is valid Python")
        .into_syntax()
        .body;
    body.swap_remove(0)
}
