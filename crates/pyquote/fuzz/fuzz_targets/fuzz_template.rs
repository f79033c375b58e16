//! Fuzz target: quote, template and validate arbitrary Python source.
//!
//! The input is split at the first NUL byte into a function definition and a fragment.
//! Every stage may fail with an error, but none of them may panic.

#![no_main]

use libfuzzer_sys::fuzz_target;

use pyquote::{Fragment, SourceFunction, quoted, quoted_template, unaccounted_for_names};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    // Skip excessively large inputs.
    if input.len() > 8192 {
        return;
    }

    let (definition, fragment) = input.split_once('\0').unwrap_or((input, "None"));
    let function = SourceFunction::new("fuzz", definition);

    if let Ok(body) = quoted(&function) {
        let _ = unaccounted_for_names(&body);
    }

    let (Ok(template), Ok(fragment)) = (quoted_template(&function), Fragment::parse(fragment)) else {
        return;
    };
    let fragments = vec![fragment; template.params().len()];
    if let Ok(rendered) = template.render(fragments) {
        let _ = unaccounted_for_names(&rendered);
    }
});
