//! Scalar coercion of raw command-line tokens.
//!
//! Tokens arrive as whitespace-delimited text; before binding them to a
//! field the shell attempts a fixed coercion ladder: boolean literals,
//! the `none` null literal, all-digit integers, dotted floats, and
//! finally plain strings. JSON-literal fields and fields marked verbatim
//! bypass the ladder entirely.

use serde_json::{Number, Value};

/// Coerces a raw token into a typed value.
///
/// Attempted in order: `true`/`false` (case-insensitive) to bool, `none`
/// to null, all-digit strings to int, strings containing `.` that parse
/// as a float to float; anything else stays a string. Negative numbers
/// deliberately stay strings, matching the all-digit rule.
///
/// # Examples
///
/// ```
/// use schema_shell_core::coerce_scalar;
/// use serde_json::json;
///
/// assert_eq!(coerce_scalar("True"), json!(true));
/// assert_eq!(coerce_scalar("none"), json!(null));
/// assert_eq!(coerce_scalar("42"), json!(42));
/// assert_eq!(coerce_scalar("1.5"), json!(1.5));
/// assert_eq!(coerce_scalar("ceos1"), json!("ceos1"));
/// assert_eq!(coerce_scalar("-3"), json!("-3"));
/// ```
pub fn coerce_scalar(token: &str) -> Value {
    if token.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if token.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if token.eq_ignore_ascii_case("none") {
        return Value::Null;
    }
    if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(n) = token.parse::<i64>() {
            return Value::Number(n.into());
        }
    }
    if token.contains('.') {
        if let Ok(f) = token.parse::<f64>() {
            if let Some(n) = Number::from_f64(f) {
                return Value::Number(n);
            }
        }
    }
    Value::String(token.to_string())
}

/// Truthiness of a result value.
///
/// Null, `false`, empty strings, and empty collections are falsy; the
/// shell writes nothing for falsy results.
///
/// # Examples
///
/// ```
/// use schema_shell_core::is_truthy;
/// use serde_json::json;
///
/// assert!(!is_truthy(&json!(null)));
/// assert!(!is_truthy(&json!("")));
/// assert!(!is_truthy(&json!([])));
/// assert!(is_truthy(&json!("text")));
/// assert!(is_truthy(&json!(0.0)));
/// ```
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(_) => true,
    }
}

/// Plain-text rendering of a value, used when no outputter applies and by
/// the line-oriented pipe filters.
///
/// Strings pass through unquoted; everything else renders as pretty JSON.
pub fn to_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}
