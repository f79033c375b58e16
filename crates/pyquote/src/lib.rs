#![doc = include_str!("../../../README.md")]
#![expect(clippy::needless_pass_by_value, reason = "render APIs take fragment vectors by value")]
mod adapter;
mod builtins;
mod codegen;
mod error;
mod fragment;
mod function;
mod normalize;
mod quote;
mod template;
mod validate;

pub use crate::{
    adapter::get_ast,
    builtins::{BuiltinException, BuiltinFunction, BuiltinNames},
    codegen::{CodeStyle, canonicalize, unparse},
    error::{CodeLoc, Error, SourceUnavailable},
    fragment::Fragment,
    function::{DynamicFunction, ModuleSource, PyFunction, SourceFunction},
    normalize::{get_source, normalize_indentation},
    quote::{quote_source, quoted},
    template::{Render, Template, quoted_template},
    validate::{
        QuotationValidator, ValidatedTemplate, unaccounted_for_names, validate, validate_template,
        validate_template_with, validate_with,
    },
};
