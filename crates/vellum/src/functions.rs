// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Helper functions bound to every template namespace.
//!
//! | Name | Kind | Usage |
//! |------|------|-------|
//! | `contains` | function | `{% if contains(haystack=page_title, needle="Admin") %}` |
//! | `dump` | function | `{{ dump(value=params) }}` |
//! | `dump` | filter | `{{ content \| dump }}` |

use std::collections::HashMap;
use tera::{Tera, Value};

fn string_arg<'a>(fn_name: &str, args: &'a HashMap<String, Value>, key: &str) -> tera::Result<&'a str> {
    match args.get(key) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(tera::Error::msg(format!(
            "`{}`: argument `{}` must be a string, got {}",
            fn_name, key, other
        ))),
        None => Err(tera::Error::msg(format!(
            "`{}` requires a `{}` argument",
            fn_name, key
        ))),
    }
}

/// Substring test: true when `haystack` contains `needle`.
pub fn contains_function(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let haystack = string_arg("contains", args, "haystack")?;
    let needle = string_arg("contains", args, "needle")?;
    Ok(Value::Bool(haystack.contains(needle)))
}

/// Pretty-printed structural dump of any value, for debugging templates.
pub fn dump_function(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let value = args.get("value").unwrap_or(&Value::Null);
    dump_value(value)
}

/// Filter form of [`dump_function`].
pub fn dump_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    dump_value(value)
}

fn dump_value(value: &Value) -> tera::Result<Value> {
    serde_json::to_string_pretty(value)
        .map(Value::String)
        .map_err(|e| tera::Error::msg(format!("`dump` failed: {}", e)))
}

/// Registers the helper set on a Tera instance.
pub fn register_functions(tera: &mut Tera) {
    tera.register_function("contains", contains_function);
    tera.register_function("dump", dump_function);
    tera.register_filter("dump", dump_filter);
}
