//! The command-line resolver state machine.
//!
//! Consumes tokens against the active schema node, descending into child
//! namespaces, binding values to fields, handling aliases, enum variants,
//! presence flags, and pipe segmentation. The outcome is a tagged
//! [`Resolution`] rather than an error: ambiguous prefixes and unmatched
//! tokens are legitimate control flow for the help and completion callers.

use schema_shell_core::{
    FieldSchema, NodeConfig, PipeTarget, SchemaNode, ValueMap, ValueType, coerce_scalar,
};
use serde_json::Value;
use tracing::{debug, error};

use crate::token::TokenQueue;

/// Value state of one bound field.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    /// Field name seen, no value yet.
    Pending,
    /// Single value.
    One(Value),
    /// Multiple accumulated values.
    Many(Vec<Value>),
}

/// One field bound during resolution of one command invocation.
#[derive(Debug, Clone)]
pub struct ParsedField {
    /// Canonical field name (aliases already resolved).
    pub name: String,
    /// Snapshot of the field's schema.
    pub schema: FieldSchema,
    /// Collected value state.
    pub value: BoundValue,
}

impl ParsedField {
    fn open(name: String, schema: FieldSchema) -> Self {
        Self {
            name,
            schema,
            value: BoundValue::Pending,
        }
    }

    /// Whether no value has been supplied yet.
    pub fn is_pending(&self) -> bool {
        matches!(self.value, BoundValue::Pending)
    }

    /// The bound value: `None` while pending, a single value, or an array
    /// when multiple tokens were bound.
    pub fn bound(&self) -> Option<Value> {
        match &self.value {
            BoundValue::Pending => None,
            BoundValue::One(v) => Some(v.clone()),
            BoundValue::Many(vs) => Some(Value::Array(vs.clone())),
        }
    }

    /// Assigns a typed value: first value sets it, a second converts to a
    /// list, subsequent values append.
    pub fn assign(&mut self, value: Value) {
        self.value = match std::mem::replace(&mut self.value, BoundValue::Pending) {
            BoundValue::Pending => BoundValue::One(value),
            BoundValue::One(first) => BoundValue::Many(vec![first, value]),
            BoundValue::Many(mut vs) => {
                vs.push(value);
                BoundValue::Many(vs)
            }
        };
    }

    /// Replaces whatever was collected with a single value.
    pub fn replace(&mut self, value: Value) {
        self.value = BoundValue::One(value);
    }

    /// Binds a raw token, applying scalar coercion unless the field is a
    /// JSON literal (raw text accumulates into one string) or marked
    /// verbatim.
    pub fn push_raw(&mut self, raw: &str) {
        if self.schema.value_type == ValueType::Json {
            match &mut self.value {
                BoundValue::One(Value::String(s)) => s.push_str(raw),
                _ => self.value = BoundValue::One(Value::String(raw.to_string())),
            }
            return;
        }
        if self.schema.verbatim {
            self.assign(Value::String(raw.to_string()));
        } else {
            self.assign(coerce_scalar(raw));
        }
    }
}

/// One schema node visited while resolving one pipeline segment.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Snapshot of the visited node (always a namespace).
    pub node: SchemaNode,
    /// Runtime configuration of the node.
    pub config: NodeConfig,
    /// Token that reached this frame, canonical; `None` for segment roots.
    pub entry: Option<String>,
    /// Canonical path from the segment root.
    pub path: Vec<String>,
    /// Fields bound at this frame, in order of first appearance.
    pub fields: Vec<ParsedField>,
    /// The node's own declared field defaults; populated for the first
    /// pipeline segment only.
    pub defaults: ValueMap,
}

impl Frame {
    fn root(node: &SchemaNode, with_defaults: bool) -> Self {
        Self {
            config: node.config().cloned().unwrap_or_default(),
            defaults: if with_defaults {
                node.defaults()
            } else {
                ValueMap::new()
            },
            node: node.clone(),
            entry: None,
            path: Vec::new(),
            fields: Vec::new(),
        }
    }

    fn descend(node: SchemaNode, parent_path: &[String], with_defaults: bool) -> Self {
        let mut path = parent_path.to_vec();
        path.push(node.name.clone());
        Self {
            config: node.config().cloned().unwrap_or_default(),
            defaults: if with_defaults {
                node.defaults()
            } else {
                ValueMap::new()
            },
            entry: Some(node.name.clone()),
            path,
            node,
            fields: Vec::new(),
        }
    }

    /// Bound field values at this frame, keyed by canonical name.
    pub fn bound_values(&self) -> ValueMap {
        let mut out = ValueMap::new();
        for field in &self.fields {
            if let Some(v) = field.bound() {
                out.insert(field.name.clone(), v);
            }
        }
        out
    }
}

/// One pipeline segment: frames from root to leaf.
pub type Segment = Vec<Frame>;

/// Fully resolved command line.
#[derive(Debug, Clone)]
pub struct CommandTrace {
    /// Pipeline segments, left to right; segment 0 is the primary command.
    pub segments: Vec<Segment>,
    /// Set when a `|` hit a node with no pipe configuration; names that
    /// node. Segments resolved before the offending pipe remain valid.
    pub pipe_error: Option<String>,
}

/// A possible completion for an ambiguous token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// The matching spelling (canonical name, alias, or enum variant).
    pub name: String,
    /// Help text, when the candidate is a schema child.
    pub description: Option<String>,
}

/// Outcome of resolving one input line.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Every token was consumed; the trace is ready for dispatch.
    Complete(CommandTrace),
    /// A token was a strict prefix of one or more candidates. Used by the
    /// execution path to report an incomplete command, and by help and
    /// completion to offer the candidates.
    Ambiguous {
        /// Name of the node the token was matched against.
        node: String,
        /// The offending token.
        token: String,
        /// Matching candidates, sorted.
        candidates: Vec<Candidate>,
    },
    /// A token matched nothing: no child, no alias, no prefix.
    NoMatch {
        /// Name of the node the token was matched against.
        node: String,
        /// The offending token.
        token: String,
    },
}

/// Resolves one input line against the active schema node.
///
/// `is_help` disables presence handling for the trailing field, so that
/// `command flag ?` shows help for `flag` instead of closing it.
pub fn resolve(active: &SchemaNode, line: &str, is_help: bool) -> Resolution {
    let mut queue = TokenQueue::new(line);
    let mut segments: Vec<Segment> = vec![vec![Frame::root(active, true)]];
    // index of the field awaiting a value in the current segment's last frame
    let mut open: Option<usize> = None;
    let mut pipe_error = None;

    while let Some(token) = queue.next() {
        let si = segments.len() - 1;
        let fi = segments[si].len() - 1;

        // pipe boundary: start a new segment at the configured target
        if token == "|" {
            apply_presence(&mut segments[si][fi], open);
            let target = segments[si][fi].config.pipe.clone();
            match target {
                PipeTarget::None => {
                    let node = segments[si][fi].node.name.clone();
                    error!(node = %node, "node does not support pipe handling");
                    pipe_error = Some(node);
                    break;
                }
                PipeTarget::SelfTarget => {
                    let node = segments[si][fi].node.clone();
                    segments.push(vec![Frame::root(&node, false)]);
                }
                PipeTarget::Node(target) => {
                    segments.push(vec![Frame::root(&target, false)]);
                }
            }
            open = None;
            continue;
        }

        // quoted and bracketed values, only while a field awaits a value
        if let Some(idx) = open {
            let trimmed = token.trim();
            if trimmed.starts_with('{') {
                let value = queue.collect_bracketed(&token, '}');
                segments[si][fi].fields[idx].push_raw(&value);
                continue;
            }
            if trimmed.starts_with('[') {
                let value = queue.collect_bracketed(&token, ']');
                segments[si][fi].fields[idx].push_raw(&value);
                continue;
            }
            if token.contains('"') {
                let value = queue.collect_quoted(&token, '"');
                segments[si][fi].fields[idx].push_raw(&value);
                continue;
            }
            if token.contains('\'') {
                let value = queue.collect_quoted(&token, '\'');
                segments[si][fi].fields[idx].push_raw(&value);
                continue;
            }
        }

        // exact child match by name or alias
        if let Some(child) = segments[si][fi].node.child(&token).cloned() {
            apply_presence(&mut segments[si][fi], open);
            if child.is_namespace() {
                let parent_path = segments[si][fi].path.clone();
                let first_segment = si == 0;
                debug!(node = %child.name, "descending into namespace");
                segments[si].push(Frame::descend(child, &parent_path, first_segment));
                open = None;
            } else if let Some(schema) = child.as_field().cloned() {
                let frame = &mut segments[si][fi];
                let opened = ParsedField::open(child.name.clone(), schema);
                // re-specification replaces the earlier binding in place
                match frame.fields.iter().position(|f| f.name == child.name) {
                    Some(pos) => {
                        frame.fields[pos] = opened;
                        open = Some(pos);
                    }
                    None => {
                        frame.fields.push(opened);
                        open = Some(frame.fields.len() - 1);
                    }
                }
            }
            continue;
        }

        // enum variant matching for the awaiting field
        if let Some(idx) = open {
            let enum_variants = match &segments[si][fi].fields[idx].schema.value_type {
                ValueType::Enum(variants) => Some(variants.clone()),
                _ => None,
            };
            if let Some(variants) = enum_variants {
                if variants.iter().any(|v| v == &token) {
                    segments[si][fi].fields[idx].assign(Value::String(token));
                    continue;
                }
                let mut hits: Vec<Candidate> = variants
                    .iter()
                    .filter(|v| v.starts_with(&token))
                    .map(|v| Candidate {
                        name: v.clone(),
                        description: None,
                    })
                    .collect();
                hits.sort_by(|a, b| a.name.cmp(&b.name));
                if !hits.is_empty() {
                    return Resolution::Ambiguous {
                        node: segments[si][fi].node.name.clone(),
                        token,
                        candidates: hits,
                    };
                }
                // no exact or partial variant match: falls through to the
                // value rule and fails validation later
            }
        }

        // strict prefix of a child name or alias
        let candidates = prefix_candidates(&segments[si][fi].node, &token);
        if !candidates.is_empty() {
            return Resolution::Ambiguous {
                node: segments[si][fi].node.name.clone(),
                token,
                candidates,
            };
        }

        // plain value for the awaiting field
        if let Some(idx) = open {
            segments[si][fi].fields[idx].push_raw(&token);
            continue;
        }

        return Resolution::NoMatch {
            node: segments[si][fi].node.name.clone(),
            token,
        };
    }

    // presence for a field left open at end of line
    if !is_help {
        let si = segments.len() - 1;
        let fi = segments[si].len() - 1;
        apply_presence(&mut segments[si][fi], open);
    }

    Resolution::Complete(CommandTrace {
        segments,
        pipe_error,
    })
}

/// Reassembles a segment's bound values into a nested record mirroring
/// the schema's nesting, leaf to root.
pub fn assemble_record(segment: &[Frame]) -> ValueMap {
    let mut data = ValueMap::new();
    for frame in segment.iter().rev() {
        let mut level = data;
        for (name, value) in frame.bound_values() {
            level.insert(name, value);
        }
        if let Some(entry) = &frame.entry {
            let mut wrapped = ValueMap::new();
            wrapped.insert(entry.clone(), Value::Object(level));
            data = wrapped;
        } else {
            data = level;
        }
    }
    data
}

fn apply_presence(frame: &mut Frame, open: Option<usize>) {
    if let Some(idx) = open {
        let field = &mut frame.fields[idx];
        if field.is_pending() {
            if let Some(presence) = field.schema.presence.clone() {
                field.assign(presence);
            }
        }
    }
}

fn prefix_candidates(node: &SchemaNode, prefix: &str) -> Vec<Candidate> {
    let mut out = Vec::new();
    if let Some(ns) = node.as_namespace() {
        for child in &ns.children {
            if child.name.starts_with(prefix) {
                out.push(Candidate {
                    name: child.name.clone(),
                    description: child.description.clone(),
                });
            } else if let Some(alias) = child.aliases.iter().find(|a| a.starts_with(prefix)) {
                out.push(Candidate {
                    name: alias.clone(),
                    description: child.description.clone(),
                });
            }
        }
    }
    out.sort_by(|a, b| a.name.cmp(&b.name));
    out
}
