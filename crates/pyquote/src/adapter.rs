use ruff_python_ast::{Stmt, StmtFunctionDef};
use ruff_python_parser::parse_module;

use crate::{
    codegen::CodeStyle,
    error::Error,
    function::PyFunction,
    normalize::get_source,
};

/// Returns the definition node of `function`.
///
/// The normalized source is parsed when available. Otherwise the function's decompiler is
/// asked for the node, and its result is returned as is.
pub fn get_ast(function: &(impl PyFunction + ?Sized)) -> Result<StmtFunctionDef, Error> {
    load_definition(function).map(|(definition, _)| definition)
}

/// Like [`get_ast`], also returning the code style of the source the node came from.
///
/// Decompiled definitions have no source text and get the default style.
pub(crate) fn load_definition(function: &(impl PyFunction + ?Sized)) -> Result<(StmtFunctionDef, CodeStyle), Error> {
    match get_source(function) {
        Ok(source) => parse_definition(&source, function.name()),
        Err(_unavailable) => Ok((function.decompile()?, CodeStyle::default())),
    }
}

fn parse_definition(source: &str, name: &str) -> Result<(StmtFunctionDef, CodeStyle), Error> {
    let parsed = parse_module(source).map_err(|e| Error::from_ruff(&e, source))?;
    let style = CodeStyle::detect(&parsed, source);
    match parsed.into_syntax().body.into_iter().next() {
        Some(Stmt::FunctionDef(definition)) => Ok((definition, style)),
        _ => Err(Error::NotAFunction {
            function: name.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::{DynamicFunction, SourceFunction};

    #[test]
    fn indented_source_parses() {
        let function = SourceFunction::new("f", "    def f(a, b):\n        return a + b\n");
        let definition = get_ast(&function).unwrap();
        assert_eq!(definition.name.as_str(), "f");
        assert_eq!(definition.parameters.args.len(), 2);
        assert_eq!(definition.body.len(), 1);
    }

    #[test]
    fn async_and_decorated_definitions() {
        let function = SourceFunction::new("f", "@cache\nasync def f():\n    await g()\n");
        let definition = get_ast(&function).unwrap();
        assert!(definition.is_async);
        assert_eq!(definition.decorator_list.len(), 1);
    }

    #[test]
    fn missing_source_falls_back_to_decompiler() {
        let source = SourceFunction::new("g", "def g(x):\n    return x\n");
        let definition = get_ast(&source).unwrap();
        let dynamic = DynamicFunction::new(definition.clone());
        assert_eq!(get_ast(&dynamic).unwrap(), definition);
    }

    #[test]
    fn non_function_source_is_rejected() {
        let function = SourceFunction::new("C", "class C:\n    pass\n");
        assert_eq!(
            get_ast(&function).unwrap_err(),
            Error::NotAFunction {
                function: "C".to_owned()
            }
        );
    }

    #[test]
    fn syntax_errors_are_located() {
        let function = SourceFunction::new("f", "def f(:\n    pass\n");
        let Error::Parse { position, .. } = get_ast(&function).unwrap_err() else {
            panic!("expected a parse error");
        };
        assert_eq!(position.line, 1);
    }
}
