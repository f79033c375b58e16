//! Static check that a quotation only reads names it can see.
//!
//! A name read by generated code has to come from somewhere: a binding in the quotation
//! itself, an import, or builtins. Anything else almost always means a missing import that
//! would only show up as a `NameError` once the generated code runs.
//!
//! The check is coarse. Bindings are collected over the whole traversal, so a
//! name bound in a nested function or class body counts as accounted for everywhere,
//! including reads in the enclosing code. This can hide a genuinely missing name in an outer
//! scope; callers that need lexical scoping must not rely on this validator for it.

use std::sync::LazyLock;

use ahash::AHashSet;
use indexmap::IndexSet;
use ruff_python_ast::{
    self as ast, ExceptHandler, Expr, ExprContext, Parameter, Pattern, Stmt, TypeParam,
    visitor::{Visitor, walk_except_handler, walk_expr, walk_parameter, walk_pattern, walk_stmt, walk_type_param},
};

use crate::{builtins::BuiltinNames, error::Error, fragment::Fragment, template::Render};

static PYTHON3_BUILTINS: LazyLock<BuiltinNames> = LazyLock::new(BuiltinNames::python3);

/// Collects the names a quotation reads and the names it binds.
#[derive(Debug)]
pub struct QuotationValidator<'b> {
    builtins: &'b BuiltinNames,
    /// Names read (or deleted), in order of first use.
    used: IndexSet<String>,
    /// Names bound anywhere in the traversal.
    accounted: AHashSet<String>,
}

impl<'b> QuotationValidator<'b> {
    #[must_use]
    pub fn new(builtins: &'b BuiltinNames) -> Self {
        Self {
            builtins,
            used: IndexSet::new(),
            accounted: AHashSet::new(),
        }
    }

    /// Visits every statement of `quotation`.
    ///
    /// Can be called repeatedly; the collected sets only grow.
    pub fn visit_quotation(&mut self, quotation: &[Stmt]) {
        for stmt in quotation {
            self.visit_stmt(stmt);
        }
    }

    /// Names read but never bound, imported or built in, in order of first use.
    #[must_use]
    pub fn unaccounted_for_names(&self) -> Vec<&str> {
        self.used
            .iter()
            .map(String::as_str)
            .filter(|name| !self.accounted.contains(*name) && !self.builtins.contains(name))
            .collect()
    }

    fn bind(&mut self, name: &str) {
        if !self.accounted.contains(name) {
            self.accounted.insert(name.to_owned());
        }
    }

    fn read(&mut self, name: &str) {
        if !self.used.contains(name) {
            self.used.insert(name.to_owned());
        }
    }
}

impl<'a> Visitor<'a> for QuotationValidator<'_> {
    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        match stmt {
            Stmt::FunctionDef(ast::StmtFunctionDef { name, .. }) | Stmt::ClassDef(ast::StmtClassDef { name, .. }) => {
                self.bind(name.as_str());
            }
            Stmt::Import(ast::StmtImport { names, .. }) => {
                for alias in names {
                    // `import a.b` binds `a`
                    let bound = match &alias.asname {
                        Some(asname) => asname.as_str(),
                        None => alias.name.as_str().split('.').next().unwrap_or_default(),
                    };
                    self.bind(bound);
                }
            }
            Stmt::ImportFrom(ast::StmtImportFrom { names, .. }) => {
                for alias in names {
                    // a star import binds names we cannot know
                    if alias.name.as_str() == "*" {
                        continue;
                    }
                    let bound = alias.asname.as_ref().unwrap_or(&alias.name);
                    self.bind(bound.as_str());
                }
            }
            _ => {}
        }
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &'a Expr) {
        if let Expr::Name(ast::ExprName { id, ctx, .. }) = expr {
            match ctx {
                ExprContext::Load | ExprContext::Del => self.read(id.as_str()),
                ExprContext::Store => self.bind(id.as_str()),
                ExprContext::Invalid => {}
            }
        }
        walk_expr(self, expr);
    }

    fn visit_parameter(&mut self, parameter: &'a Parameter) {
        self.bind(parameter.name.as_str());
        walk_parameter(self, parameter);
    }

    fn visit_except_handler(&mut self, except_handler: &'a ExceptHandler) {
        if let ExceptHandler::ExceptHandler(ast::ExceptHandlerExceptHandler { name: Some(name), .. }) = except_handler {
            self.bind(name.as_str());
        }
        walk_except_handler(self, except_handler);
    }

    fn visit_pattern(&mut self, pattern: &'a Pattern) {
        match pattern {
            Pattern::MatchAs(ast::PatternMatchAs { name: Some(name), .. })
            | Pattern::MatchStar(ast::PatternMatchStar { name: Some(name), .. })
            | Pattern::MatchMapping(ast::PatternMatchMapping { rest: Some(name), .. }) => self.bind(name.as_str()),
            _ => {}
        }
        walk_pattern(self, pattern);
    }

    fn visit_type_param(&mut self, type_param: &'a TypeParam) {
        let name = match type_param {
            TypeParam::TypeVar(ast::TypeParamTypeVar { name, .. })
            | TypeParam::ParamSpec(ast::TypeParamParamSpec { name, .. })
            | TypeParam::TypeVarTuple(ast::TypeParamTypeVarTuple { name, .. }) => name,
        };
        self.bind(name.as_str());
        walk_type_param(self, type_param);
    }
}

/// Returns the names `quotation` reads without binding, importing, or finding them in
/// Python 3 builtins.
#[must_use]
pub fn unaccounted_for_names(quotation: &[Stmt]) -> Vec<String> {
    let mut validator = QuotationValidator::new(&PYTHON3_BUILTINS);
    validator.visit_quotation(quotation);
    validator.unaccounted_for_names().into_iter().map(str::to_owned).collect()
}

/// Returns `quotation` unchanged if every name it reads is accounted for.
///
/// Fails with [`Error::Unaccounted`] otherwise. This is a defect in the template that
/// produced the quotation, typically a missing import, and should not be recovered from.
pub fn validate(quotation: Vec<Stmt>) -> Result<Vec<Stmt>, Error> {
    validate_with(&PYTHON3_BUILTINS, quotation)
}

/// [`validate`] against a specific set of built-in names.
pub fn validate_with(builtins: &BuiltinNames, quotation: Vec<Stmt>) -> Result<Vec<Stmt>, Error> {
    let mut validator = QuotationValidator::new(builtins);
    validator.visit_quotation(&quotation);
    let names = validator.unaccounted_for_names();
    if names.is_empty() {
        Ok(quotation)
    } else {
        Err(Error::Unaccounted {
            names: names.into_iter().map(str::to_owned).collect(),
        })
    }
}

/// A template whose every rendering is validated before it is returned.
#[derive(Debug, Clone)]
pub struct ValidatedTemplate<T> {
    template: T,
    builtins: BuiltinNames,
}

impl<T> ValidatedTemplate<T> {
    /// The wrapped template.
    #[must_use]
    pub fn inner(&self) -> &T {
        &self.template
    }
}

/// Wraps `template` so each rendered output is checked with [`validate`].
///
/// The template's own source is never checked: substitution can both introduce free
/// names and replace them, so only the rendered code is meaningful.
pub fn validate_template<T: Render>(template: T) -> ValidatedTemplate<T> {
    validate_template_with(template, PYTHON3_BUILTINS.clone())
}

/// [`validate_template`] against a specific set of built-in names.
pub fn validate_template_with<T: Render>(template: T, builtins: BuiltinNames) -> ValidatedTemplate<T> {
    ValidatedTemplate { template, builtins }
}

impl<T: Render> Render for ValidatedTemplate<T> {
    fn name(&self) -> &str {
        self.template.name()
    }

    fn render(&self, fragments: Vec<Fragment>) -> Result<Vec<Stmt>, Error> {
        let rendered = self.template.render(fragments)?;
        validate_with(&self.builtins, rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::quote_source;

    fn unaccounted(source: &str) -> Vec<String> {
        unaccounted_for_names(&quote_source(source).unwrap())
    }

    #[test]
    fn builtins_locals_and_imports_are_accounted() {
        let source = "\
import os.path
from json import dumps as to_json, loads
total = len([1, 2])
print(os.path.join('a', to_json(loads('{}'))), total)
";
        assert_eq!(unaccounted(source), Vec::<String>::new());
    }

    #[test]
    fn missing_import_is_reported_in_order() {
        assert_eq!(unaccounted("json.dumps(sys.argv)\njson.loads('')"), ["json", "sys"]);
    }

    #[test]
    fn reads_before_binding_still_count() {
        // bindings are order-insensitive
        assert_eq!(unaccounted("print(x)\nx = 1"), Vec::<String>::new());
    }

    #[test]
    fn function_and_class_bindings() {
        let source = "\
def helper(a, *args, b=None, **kw):
    return a, args, b, kw
class Thing:
    pass
helper(Thing)
items = [lambda y: y for _ in range(3)]
";
        assert_eq!(unaccounted(source), Vec::<String>::new());
    }

    #[test]
    fn except_match_and_with_bindings() {
        let source = "\
try:
    pass
except ValueError as err:
    print(err)
with open('f') as handle:
    handle.read()
match handle:
    case [first, *rest]:
        print(first, rest)
    case {'k': v, **others}:
        print(v, others)
    case str() as text:
        print(text)
";
        assert_eq!(unaccounted(source), Vec::<String>::new());
    }

    #[test]
    fn nested_bindings_leak_into_outer_scope() {
        let source = "\
def outer():
    hidden = 1
    return hidden
print(hidden)
";
        assert_eq!(unaccounted(source), Vec::<String>::new());
    }

    #[test]
    fn star_import_binds_nothing() {
        assert_eq!(unaccounted("from os import *\ngetcwd()"), ["getcwd"]);
    }

    #[test]
    fn deletes_are_reads() {
        assert_eq!(unaccounted("del gone"), ["gone"]);
    }

    #[test]
    fn validate_is_identity_or_error() {
        let quotation = quote_source("x = 1\nprint(x)").unwrap();
        assert_eq!(validate(quotation.clone()).unwrap(), quotation);

        let err = validate(quote_source("requests.get(url)").unwrap()).unwrap_err();
        assert_eq!(
            err,
            Error::Unaccounted {
                names: vec!["requests".to_owned(), "url".to_owned()]
            }
        );
    }

    #[test]
    fn custom_builtins() {
        let builtins = BuiltinNames::new("sandbox", ["emit"]);
        assert!(validate_with(&builtins, quote_source("emit(1)").unwrap()).is_ok());
        assert!(validate_with(&builtins, quote_source("print(1)").unwrap()).is_err());
    }
}
