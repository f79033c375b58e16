use ruff_python_ast::Stmt;
use ruff_python_parser::parse_module;

use crate::{adapter::get_ast, error::Error, function::PyFunction};

/// Returns the body of `function` as a quotation: the statements as syntax, not as code to run.
///
/// No validation happens here; pass the result to [`validate`](crate::validate) to check
/// for missing imports.
pub fn quoted(function: &(impl PyFunction + ?Sized)) -> Result<Vec<Stmt>, Error> {
    Ok(get_ast(function)?.body.into())
}

/// Parses module-level Python text into a quotation.
pub fn quote_source(source: &str) -> Result<Vec<Stmt>, Error> {
    let parsed = parse_module(source).map_err(|e| Error::from_ruff(&e, source))?;
    Ok(parsed.into_syntax().body.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{codegen::unparse, function::SourceFunction};

    #[test]
    fn quotes_function_body() {
        let function = SourceFunction::new(
            "body",
            "    def body():\n        import os\n        os.getcwd()\n        return 1\n",
        );
        let body = quoted(&function).unwrap();
        assert_eq!(body.len(), 3);
        assert_eq!(unparse(&body), "import os\nos.getcwd()\nreturn 1");
    }

    #[test]
    fn quote_source_reports_bad_text() {
        assert!(matches!(quote_source("x = = 1"), Err(Error::Parse { .. })));
        assert_eq!(quote_source("").unwrap(), Vec::new());
    }
}
