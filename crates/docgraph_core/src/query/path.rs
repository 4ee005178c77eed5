//! Field path splitting.

use docgraph_store::BindVars;
use serde_json::Value;

/// Splits a dotted field path into bind-variable segments.
///
/// Every segment is bound to its own variable `<prefix>_<i>`; the returned
/// expression only references those variables, so field path content can
/// never change the structure of a query. Empty segments (leading,
/// trailing or repeated dots) are dropped.
///
/// ```rust
/// use docgraph_core::query::split_field;
///
/// let (expr, vars) = split_field("owner..name.", "field_0");
/// assert_eq!(expr, "@field_0_0.@field_0_1");
/// assert_eq!(vars["field_0_0"], "owner");
/// assert_eq!(vars["field_0_1"], "name");
/// ```
pub fn split_field(path: &str, prefix: &str) -> (String, BindVars) {
    let mut parts = Vec::new();
    let mut bind_vars = BindVars::new();

    for (i, segment) in path.split('.').filter(|s| !s.is_empty()).enumerate() {
        let var = format!("{}_{}", prefix, i);
        parts.push(format!("@{}", var));
        bind_vars.insert(var, Value::String(segment.to_string()));
    }

    (parts.join("."), bind_vars)
}
