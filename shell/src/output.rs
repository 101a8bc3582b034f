//! Builtin outputters and the shared pipe-functions subtree.
//!
//! Outputters are final-stage renderers attached to nodes, fields, or
//! returned directly by handlers. The pipe-functions subtree is a ready
//! made [`PipeTarget::Node`](schema_shell_core::PipeTarget) providing
//! `include` / `exclude` line filters and `json` / `yaml` / `pprint`
//! reformatters for any command output.

use std::rc::Rc;

use schema_shell_core::{
    FieldSchema, Handler, HandlerCall, NodeConfig, Outputter, PipeTarget, RunResult, SchemaNode,
    ValueMap, to_display,
};
use serde_json::Value;

/// Ready made outputters.
pub mod outputters {
    use super::*;

    /// Renders the result as pretty-printed JSON.
    pub fn json() -> Outputter {
        Outputter::new(|value, _| {
            Some(serde_json::to_string_pretty(value).unwrap_or_else(|_| to_display(value)))
        })
    }

    /// Renders the result as YAML.
    pub fn yaml() -> Outputter {
        Outputter::new(|value, _| {
            Some(serde_yaml::to_string(value).map_or_else(
                |_| to_display(value),
                |text| text.trim_end().to_string(),
            ))
        })
    }

    /// Renders string results as-is and anything else as indented JSON.
    pub fn pretty() -> Outputter {
        Outputter::new(|value, _| Some(to_display(value)))
    }

    /// Renders an array of flat objects as a width-aligned text table.
    ///
    /// Options: `headers` (array of column names, defaults to the keys of
    /// the rows in first-seen order) and `sortby` (column to sort rows on).
    pub fn table() -> Outputter {
        Outputter::new(|value, kwargs| Some(render_table(value, kwargs)))
    }

    fn render_table(value: &Value, kwargs: &ValueMap) -> String {
        let Some(rows) = value.as_array() else {
            return to_display(value);
        };

        let headers: Vec<String> = match kwargs.get("headers").and_then(Value::as_array) {
            Some(names) => names
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            None => {
                let mut seen = Vec::new();
                for row in rows {
                    if let Some(obj) = row.as_object() {
                        for key in obj.keys() {
                            if !seen.contains(key) {
                                seen.push(key.clone());
                            }
                        }
                    }
                }
                seen
            }
        };
        if headers.is_empty() {
            return to_display(value);
        }

        let mut cells: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                headers
                    .iter()
                    .map(|h| {
                        row.as_object()
                            .and_then(|obj| obj.get(h))
                            .map(cell_text)
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();

        if let Some(sortby) = kwargs.get("sortby").and_then(Value::as_str) {
            if let Some(column) = headers.iter().position(|h| h == sortby) {
                cells.sort_by(|a, b| a[column].cmp(&b[column]));
            }
        }

        let widths: Vec<usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                cells
                    .iter()
                    .map(|row| row[i].len())
                    .max()
                    .unwrap_or(0)
                    .max(h.len())
            })
            .collect();

        let mut lines = Vec::with_capacity(cells.len() + 2);
        lines.push(format_row(&headers, &widths));
        lines.push(
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("  "),
        );
        for row in &cells {
            lines.push(format_row(row, &widths));
        }
        lines.join("\n")
    }

    fn format_row<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{:<width$}", cell.as_ref()))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    }

    fn cell_text(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Builds the shared pipe-functions subtree.
///
/// Attach it to a node with
/// [`NodeConfig::with_pipe`](schema_shell_core::NodeConfig::with_pipe):
///
/// ```
/// use schema_shell_core::{NodeConfig, PipeTarget, SchemaNode};
/// use schema_shell_repl::pipe_functions;
///
/// let show = SchemaNode::namespace("show")
///     .with_config(NodeConfig::new().with_pipe(PipeTarget::Node(pipe_functions())));
/// ```
pub fn pipe_functions() -> Rc<SchemaNode> {
    Rc::new(
        SchemaNode::namespace("pipe")
            .with_description("Output filtering and formatting functions")
            .with_config(NodeConfig::new().with_pipe(PipeTarget::SelfTarget))
            .with_child(
                SchemaNode::field(
                    "include",
                    FieldSchema::any().with_handler(Handler::new(include_lines)),
                )
                .with_description("Keep only lines containing all patterns"),
            )
            .with_child(
                SchemaNode::field(
                    "exclude",
                    FieldSchema::any().with_handler(Handler::new(exclude_lines)),
                )
                .with_description("Drop lines containing any pattern"),
            )
            .with_child(
                SchemaNode::field("json", FieldSchema::callable(Handler::new(format_json)))
                    .with_description("Format output as JSON"),
            )
            .with_child(
                SchemaNode::field("yaml", FieldSchema::callable(Handler::new(format_yaml)))
                    .with_description("Format output as YAML"),
            )
            .with_child(
                SchemaNode::field("pprint", FieldSchema::callable(Handler::new(format_pretty)))
                    .with_description("Pretty-print output"),
            ),
    )
}

fn patterns(args: &ValueMap, key: &str) -> Vec<String> {
    match args.get(key) {
        Some(Value::Array(items)) => items.iter().map(pattern_text).collect(),
        Some(single) => vec![pattern_text(single)],
        None => Vec::new(),
    }
}

fn pattern_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn filter_lines(
    call: HandlerCall<'_>,
    key: &str,
    keep: impl Fn(&str, &[String]) -> bool,
) -> Result<RunResult, schema_shell_core::HandlerError> {
    let patterns = patterns(&call.args, key);
    let text = call.input.as_ref().map(to_display).unwrap_or_default();
    let kept: Vec<&str> = text
        .lines()
        .filter(|line| keep(line, &patterns))
        .collect();
    Ok(RunResult::Value(Value::String(kept.join("\n"))))
}

fn include_lines(call: HandlerCall<'_>) -> Result<RunResult, schema_shell_core::HandlerError> {
    filter_lines(call, "include", |line, patterns| {
        patterns.iter().all(|p| line.contains(p.as_str()))
    })
}

fn exclude_lines(call: HandlerCall<'_>) -> Result<RunResult, schema_shell_core::HandlerError> {
    filter_lines(call, "exclude", |line, patterns| {
        !patterns.iter().any(|p| line.contains(p.as_str()))
    })
}

fn piped_value(call: &HandlerCall<'_>) -> Value {
    match &call.input {
        // piped text that parses as JSON is reformatted structurally
        Some(Value::String(s)) => serde_json::from_str(s).unwrap_or(Value::String(s.clone())),
        Some(other) => other.clone(),
        None => Value::Null,
    }
}

fn format_json(call: HandlerCall<'_>) -> Result<RunResult, schema_shell_core::HandlerError> {
    let value = piped_value(&call);
    let text = serde_json::to_string_pretty(&value)?;
    Ok(RunResult::Value(Value::String(text)))
}

fn format_yaml(call: HandlerCall<'_>) -> Result<RunResult, schema_shell_core::HandlerError> {
    let value = piped_value(&call);
    let text = serde_yaml::to_string(&value)?;
    Ok(RunResult::Value(Value::String(text.trim_end().to_string())))
}

fn format_pretty(call: HandlerCall<'_>) -> Result<RunResult, schema_shell_core::HandlerError> {
    let value = piped_value(&call);
    Ok(RunResult::Value(Value::String(to_display(&value))))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn call(args: ValueMap, input: Value) -> HandlerCall<'static> {
        HandlerCall {
            args,
            input: Some(input),
            root: None,
        }
    }

    fn args(key: &str, value: Value) -> ValueMap {
        let mut map = ValueMap::new();
        map.insert(key.to_string(), value);
        map
    }

    fn text_of(result: RunResult) -> String {
        match result {
            RunResult::Value(Value::String(s)) => s,
            other => panic!("expected string value, got {other:?}"),
        }
    }

    #[test]
    fn test_include_keeps_matching_lines() {
        let input = json!("alpha one\nbeta two\nalpha two");
        let result = include_lines(call(args("include", json!("alpha")), input)).unwrap();
        assert_eq!(text_of(result), "alpha one\nalpha two");
    }

    #[test]
    fn test_include_requires_all_patterns() {
        let input = json!("alpha one\nbeta two\nalpha two");
        let result =
            include_lines(call(args("include", json!(["alpha", "two"])), input)).unwrap();
        assert_eq!(text_of(result), "alpha two");
    }

    #[test]
    fn test_exclude_drops_matching_lines() {
        let input = json!("alpha one\nbeta two\nalpha two");
        let result = exclude_lines(call(args("exclude", json!("alpha")), input)).unwrap();
        assert_eq!(text_of(result), "beta two");
    }

    #[test]
    fn test_json_formatter_parses_piped_text() {
        let result = format_json(call(ValueMap::new(), json!("{\"b\": 1}"))).unwrap();
        assert_eq!(text_of(result), "{\n  \"b\": 1\n}");
    }

    #[test]
    fn test_yaml_formatter() {
        let result = format_yaml(call(ValueMap::new(), json!({"a": 1}))).unwrap();
        assert_eq!(text_of(result), "a: 1");
    }

    #[test]
    fn test_json_outputter_renders_pretty() {
        let out = outputters::json();
        let text = out.render(&json!({"a": 1}), &ValueMap::new()).unwrap();
        assert_eq!(text, "{\n  \"a\": 1\n}");
    }

    #[test]
    fn test_table_outputter_aligns_columns() {
        let rows = json!([
            {"host": "ceos1", "status": "up"},
            {"host": "spine-switch-1", "status": "down"},
        ]);
        let text = outputters::table().render(&rows, &ValueMap::new()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        // the status column starts at the same offset on every row
        let column = lines[0].find("status").unwrap();
        assert_eq!(column, "spine-switch-1  ".len());
        assert_eq!(lines[2].find("up"), Some(column));
        assert_eq!(lines[3], "spine-switch-1  down");
        assert!(lines[1].starts_with("--------------"));
    }

    #[test]
    fn test_table_sortby_and_headers() {
        let rows = json!([
            {"host": "b", "status": "up"},
            {"host": "a", "status": "down"},
        ]);
        let mut kwargs = ValueMap::new();
        kwargs.insert("sortby".to_string(), json!("host"));
        kwargs.insert("headers".to_string(), json!(["host"]));
        let text = outputters::table().render(&rows, &kwargs).unwrap();
        assert_eq!(text.lines().count(), 4);
        assert!(text.lines().nth(2).unwrap().starts_with('a'));
        assert!(!text.contains("status"));
    }

    #[test]
    fn test_table_falls_back_for_non_tabular_values() {
        let text = outputters::table()
            .render(&json!("plain"), &ValueMap::new())
            .unwrap();
        assert_eq!(text, "plain");
    }

    #[test]
    fn test_pipe_functions_tree_shape() {
        let tree = pipe_functions();
        for name in ["include", "exclude", "json", "yaml", "pprint"] {
            assert!(tree.child(name).is_some(), "missing {name}");
        }
        assert!(tree.config().is_some_and(|c| c.pipe.is_supported()));
    }
}
