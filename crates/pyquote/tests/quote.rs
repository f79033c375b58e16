use std::borrow::Cow;

use pretty_assertions::assert_eq;
use pyquote::{
    Error, ModuleSource, PyFunction, SourceFunction, SourceUnavailable, canonicalize, get_ast, get_source,
    normalize_indentation, quote_source, quoted, unparse,
};
use ruff_python_ast::{Stmt, StmtFunctionDef};

/// A function backed only by compiled code, with a decompiler that rebuilds its definition.
struct Compiled {
    name: &'static str,
    decompiled: &'static str,
}

impl PyFunction for Compiled {
    fn name(&self) -> &str {
        self.name
    }

    fn source(&self) -> Result<Cow<'_, str>, SourceUnavailable> {
        Err(SourceUnavailable::new(self.name))
    }

    fn decompile(&self) -> Result<StmtFunctionDef, Error> {
        match quote_source(self.decompiled)?.into_iter().next() {
            Some(Stmt::FunctionDef(definition)) => Ok(definition),
            _ => Err(Error::decompile(self.name, "bytecode is not a function")),
        }
    }
}

#[test]
fn get_source_strips_nesting_indentation() {
    let function = SourceFunction::new("f", "        def f():\n            return 1\n");
    assert_eq!(get_source(&function).unwrap(), "def f():\n    return 1");
}

#[test]
fn get_source_propagates_unavailable() {
    let function = Compiled {
        name: "lambda_made",
        decompiled: "def lambda_made():\n    pass",
    };
    assert_eq!(get_source(&function).unwrap_err(), SourceUnavailable::new("lambda_made"));
}

#[test]
fn normalization_is_idempotent() {
    let module = ModuleSource::new(
        "class A:\n    class B:\n        def deep(self):\n            if self:\n                return [\n                    1,\n                ]\n",
        "deep.py",
    );
    let raw = module.function("A.B.deep").unwrap();
    let once = get_source(&raw).unwrap();
    assert_eq!(normalize_indentation(&once), once);
    assert!(once.starts_with("def deep(self):"));
}

#[test]
fn quoted_uses_the_decompiler_without_source() {
    let function = Compiled {
        name: "built",
        decompiled: "def built(a):\n    return a * 2\n",
    };
    assert_eq!(unparse(&quoted(&function).unwrap()), "return a * 2");
}

#[test]
fn decompiler_failures_surface() {
    let function = Compiled {
        name: "opaque",
        decompiled: "x = 1",
    };
    let err = get_ast(&function).unwrap_err();
    assert_eq!(err.to_string(), "could not decompile function `opaque`: bytecode is not a function");
}

#[test]
fn default_decompiler_is_unavailable() {
    struct NoSource;
    impl PyFunction for NoSource {
        fn name(&self) -> &str {
            "no_source"
        }
        fn source(&self) -> Result<Cow<'_, str>, SourceUnavailable> {
            Err(SourceUnavailable::new("no_source"))
        }
    }
    assert!(matches!(quoted(&NoSource), Err(Error::Decompile { .. })));
}

#[test]
fn parse_failures_propagate() {
    let function = SourceFunction::new("broken", "def broken(:\n    pass\n");
    assert!(matches!(quoted(&function), Err(Error::Parse { .. })));
}

#[test]
fn round_trip_is_behaviorally_stable() {
    let quotation = quoted(&SourceFunction::new(
        "body",
        "def body(items):\n    total = 0\n    for item in items:\n        if item > 0:\n            total += item\n    return total\n",
    ))
    .unwrap();
    let text = unparse(&quotation);
    assert_eq!(unparse(&canonicalize(&quotation).unwrap()), text);
}
