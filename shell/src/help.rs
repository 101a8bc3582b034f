//! Help rendering and tab-completion support.
//!
//! Help reuses the resolver: the line (minus its trailing `?`) is resolved
//! with presence handling disabled, and what gets rendered depends on
//! where resolution stopped. An open field shows its value hints, a fully
//! matched node lists its remaining options, an ambiguous prefix lists
//! the candidates.

use std::io::{self, BufRead, Write};

use schema_shell_core::{FieldSchema, ValueType};

use crate::dispatch::find_handler;
use crate::resolve::{Frame, Resolution, resolve};
use crate::shell::{RESERVED, Shell};

impl<R: BufRead, W: Write> Shell<R, W> {
    /// Prints help for a partial command line.
    ///
    /// `verbose` adds type, default, and required details to field rows.
    pub fn print_help(&mut self, line: &str, verbose: bool) -> io::Result<()> {
        let line = line.trim();
        if let Some((name, description)) = RESERVED.iter().find(|(name, _)| *name == line) {
            return self.write_rows(&[((*name).to_string(), (*description).to_string())]);
        }

        let active = self.active_node().clone();
        match resolve(&active, line, true) {
            Resolution::NoMatch { node, token } => {
                writeln!(
                    self.output,
                    "Incorrect command, '{token}' not part of '{node}' fields"
                )?;
                Ok(())
            }
            Resolution::Ambiguous { candidates, .. } => {
                let rows: Vec<(String, String)> = candidates
                    .into_iter()
                    .map(|c| (c.name, c.description.unwrap_or_default()))
                    .collect();
                self.write_rows(&rows)
            }
            Resolution::Complete(trace) => {
                let Some(segment) = trace.segments.last() else {
                    return Ok(());
                };
                let Some(leaf) = segment.last() else {
                    return Ok(());
                };
                let rows = match pending_field(leaf) {
                    Some(field) => field_rows(leaf, field, verbose),
                    None => node_rows(segment, leaf, line.is_empty(), verbose),
                };
                self.write_rows(&rows)
            }
        }
    }

    /// Completion candidates for a partial line, sorted.
    pub fn complete(&self, line: &str) -> Vec<String> {
        let mut names = match resolve(self.active_node(), line, true) {
            Resolution::NoMatch { .. } => Vec::new(),
            Resolution::Ambiguous { candidates, .. } => {
                candidates.into_iter().map(|c| c.name).collect()
            }
            Resolution::Complete(trace) => {
                let Some(leaf) = trace.segments.last().and_then(|s| s.last()) else {
                    return Vec::new();
                };
                match pending_field(leaf) {
                    Some(field) => match &field.value_type {
                        ValueType::Enum(variants) => variants.clone(),
                        _ => Vec::new(),
                    },
                    None => unbound_children(leaf)
                        .into_iter()
                        .map(|(name, _)| name)
                        .collect(),
                }
            }
        };
        names.sort();
        names
    }

    fn write_rows(&mut self, rows: &[(String, String)]) -> io::Result<()> {
        let width = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
        for (name, description) in rows {
            writeln!(self.output, " {name:<width$}    {description}")?;
        }
        Ok(())
    }
}

/// The field awaiting a value in this frame, if any.
fn pending_field(leaf: &Frame) -> Option<&FieldSchema> {
    leaf.fields
        .last()
        .filter(|f| f.is_pending())
        .map(|f| &f.schema)
}

fn field_description(leaf: &Frame, schema: &FieldSchema) -> String {
    leaf.fields
        .last()
        .and_then(|f| leaf.node.child(&f.name))
        .and_then(|c| c.description.clone())
        .unwrap_or_else(|| schema.value_type.to_string())
}

/// Help rows for a field awaiting a value.
fn field_rows(leaf: &Frame, schema: &FieldSchema, verbose: bool) -> Vec<(String, String)> {
    let description = field_description(leaf, schema);
    let mut rows = Vec::new();
    match &schema.value_type {
        ValueType::Enum(variants) => {
            for variant in variants {
                rows.push((variant.clone(), String::new()));
            }
        }
        ValueType::Callable => {
            rows.push(("<ENTER>".to_string(), "Execute command".to_string()));
        }
        _ => {
            if schema.multiline {
                rows.push((
                    "input".to_string(),
                    "Collect value from terminal multi-line input".to_string(),
                ));
            }
            let description = if verbose {
                annotate(description, schema)
            } else {
                description
            };
            rows.push(("<value>".to_string(), description));
            if schema.handler.is_some() {
                rows.push(("<ENTER>".to_string(), "Execute command".to_string()));
            }
            if schema.presence.is_some() {
                rows.push(("<ENTER>".to_string(), "Use presence value".to_string()));
            }
        }
    }
    rows
}

/// Help rows for a fully matched node: remaining options plus the
/// applicable action hints.
fn node_rows(
    segment: &[Frame],
    leaf: &Frame,
    at_prompt: bool,
    verbose: bool,
) -> Vec<(String, String)> {
    let mut rows: Vec<(String, String)> = unbound_children(leaf)
        .into_iter()
        .map(|(name, child)| {
            let description = child.description.clone().unwrap_or_default();
            let description = match (verbose, child.as_field()) {
                (true, Some(field)) => annotate(description, field),
                _ => description,
            };
            (name, description)
        })
        .collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0));

    if at_prompt {
        for (name, description) in RESERVED {
            rows.push(((*name).to_string(), (*description).to_string()));
        }
    }
    if leaf.config.subshell && leaf.entry.is_some() {
        rows.push(("<ENTER>".to_string(), "Enter command subshell".to_string()));
    } else if find_handler(segment).is_some() {
        rows.push(("<ENTER>".to_string(), "Execute command".to_string()));
    }
    if leaf.config.pipe.is_supported() {
        rows.push(("|".to_string(), "Pipe output to another command".to_string()));
    }
    rows
}

/// Children of the leaf node not yet bound on this frame.
fn unbound_children(leaf: &Frame) -> Vec<(String, &schema_shell_core::SchemaNode)> {
    let bound: Vec<&str> = leaf
        .fields
        .iter()
        .filter(|f| !f.is_pending())
        .map(|f| f.name.as_str())
        .collect();
    leaf.node
        .as_namespace()
        .map(|ns| {
            ns.children
                .iter()
                .filter(|c| !bound.contains(&c.name.as_str()))
                .map(|c| (c.display_name().to_string(), c))
                .collect()
        })
        .unwrap_or_default()
}

fn annotate(description: String, schema: &FieldSchema) -> String {
    let mut parts = vec![format!("type: {}", schema.value_type)];
    if let Some(default) = &schema.default {
        parts.push(format!("default: {default}"));
    }
    if schema.required {
        parts.push("required".to_string());
    }
    if description.is_empty() {
        parts.join(", ")
    } else {
        format!("{description} [{}]", parts.join(", "))
    }
}
