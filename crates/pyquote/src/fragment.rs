use ruff_python_ast::{Expr, Stmt};
use ruff_python_parser::parse_expression;

use crate::{error::Error, quote::quote_source};

/// A piece of syntax substituted for a template parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// A single expression node.
    Expr(Expr),
    /// An ordered sequence of statements. A sequence of one statement is a single node.
    Stmts(Vec<Stmt>),
}

impl Fragment {
    /// Parses `source` as an expression if it is one, otherwise as statements.
    pub fn parse(source: &str) -> Result<Self, Error> {
        match parse_expression(source) {
            Ok(parsed) => Ok(Self::Expr(*parsed.into_syntax().body)),
            Err(_) => quote_source(source).map(Self::Stmts),
        }
    }

    /// Number of nodes in the fragment.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Expr(_) => 1,
            Self::Stmts(stmts) => stmts.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Expr> for Fragment {
    fn from(expr: Expr) -> Self {
        Self::Expr(expr)
    }
}

impl From<Stmt> for Fragment {
    fn from(stmt: Stmt) -> Self {
        Self::Stmts(vec![stmt])
    }
}

impl From<Vec<Stmt>> for Fragment {
    fn from(stmts: Vec<Stmt>) -> Self {
        Self::Stmts(stmts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expressions_parse_as_expressions() {
        let fragment = Fragment::parse("foo(1, bar)").unwrap();
        assert!(matches!(fragment, Fragment::Expr(Expr::Call(_))));
        assert_eq!(fragment.len(), 1);
    }

    #[test]
    fn statements_parse_as_statements() {
        let fragment = Fragment::parse("a = 1\nb = 2").unwrap();
        assert!(matches!(&fragment, Fragment::Stmts(stmts) if stmts.len() == 2));
        assert!(Fragment::parse("").unwrap().is_empty());
    }

    #[test]
    fn invalid_text_is_a_parse_error() {
        assert!(matches!(Fragment::parse("a = ("), Err(Error::Parse { .. })));
    }
}
