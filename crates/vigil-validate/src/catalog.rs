//! The bundled catalog of template filter and test names.
//!
//! Covers the Jinja builtins plus the host runtime's extensions. The strict
//! template mode checks names against this catalog; it is additive-only, so
//! an out-of-date catalog produces warnings, never errors.

/// Known filter names, sorted for binary search.
pub const FILTERS: &[&str] = &[
    "abs",
    "acos",
    "add",
    "as_datetime",
    "as_local",
    "as_timedelta",
    "as_timestamp",
    "asin",
    "atan",
    "atan2",
    "attr",
    "average",
    "base64_decode",
    "base64_encode",
    "batch",
    "bitwise_and",
    "bitwise_or",
    "bitwise_xor",
    "bool",
    "capitalize",
    "center",
    "contains",
    "cos",
    "default",
    "dictsort",
    "distance",
    "escape",
    "filesizeformat",
    "first",
    "float",
    "forceescape",
    "format",
    "from_json",
    "groupby",
    "indent",
    "int",
    "is_defined",
    "is_number",
    "items",
    "join",
    "last",
    "length",
    "list",
    "log",
    "lower",
    "map",
    "max",
    "median",
    "min",
    "multiply",
    "ordinal",
    "pprint",
    "random",
    "regex_findall",
    "regex_findall_index",
    "regex_match",
    "regex_replace",
    "regex_search",
    "reject",
    "rejectattr",
    "replace",
    "reverse",
    "round",
    "safe",
    "select",
    "selectattr",
    "sin",
    "slice",
    "slugify",
    "sort",
    "sqrt",
    "string",
    "striptags",
    "sum",
    "tan",
    "timestamp_custom",
    "timestamp_local",
    "timestamp_utc",
    "title",
    "to_json",
    "tojson",
    "trim",
    "truncate",
    "unique",
    "upper",
    "urlencode",
    "urlize",
    "version",
    "wordcount",
    "wordwrap",
];

/// Known test names, sorted for binary search.
pub const TESTS: &[&str] = &[
    "boolean",
    "callable",
    "contains",
    "datetime",
    "defined",
    "divisibleby",
    "eq",
    "equalto",
    "escaped",
    "even",
    "false",
    "filter",
    "float",
    "ge",
    "greaterthan",
    "gt",
    "has_value",
    "in",
    "integer",
    "iterable",
    "le",
    "lessthan",
    "list",
    "lower",
    "lt",
    "mapping",
    "match",
    "ne",
    "none",
    "number",
    "odd",
    "sameas",
    "search",
    "sequence",
    "string",
    "test",
    "true",
    "undefined",
    "upper",
];

#[must_use]
pub fn is_known_filter(name: &str) -> bool {
    FILTERS.binary_search(&name).is_ok()
}

#[must_use]
pub fn is_known_test(name: &str) -> bool {
    TESTS.binary_search(&name).is_ok()
}
