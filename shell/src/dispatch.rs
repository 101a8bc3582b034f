//! Command dispatch: turning a resolved trace into handler invocations,
//! sub-shell navigation, validation failures, or error text.
//!
//! All dispatch outcomes are written to the shell's output stream; the
//! only thing surfaced to the caller is whether the session continues.

use std::io::{self, BufRead, Write};

use schema_shell_core::{
    Handler, HandlerCall, Outputter, Processor, RunResult, ValueMap, check_required, is_truthy,
    to_display, validate_record,
};
use serde_json::Value;
use tracing::debug;

use crate::resolve::{Frame, Resolution, Segment, assemble_record, resolve};
use crate::shell::{Shell, ShellLevel, Signal};

/// Handler selected for one segment, with the field-level declarations
/// that travel with it.
pub(crate) struct ResolvedHandler {
    handler: Handler,
    pass_root: bool,
    processors: Vec<Processor>,
    outputter: Option<Outputter>,
    outputter_kwargs: ValueMap,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    /// Resolves, validates, and executes one command line.
    pub(crate) fn execute(&mut self, line: &str) -> io::Result<Signal> {
        let active = self.active_node().clone();
        let mut trace = match resolve(&active, line, false) {
            Resolution::Complete(trace) => trace,
            Resolution::NoMatch { node, token } => {
                writeln!(
                    self.output,
                    "Incorrect command, '{token}' not part of '{node}' fields"
                )?;
                return Ok(Signal::Continue);
            }
            Resolution::Ambiguous { candidates, .. } => {
                let names: Vec<&str> = candidates.iter().map(|c| c.name.as_str()).collect();
                writeln!(
                    self.output,
                    "Incomplete command, possible completions: {}",
                    names.join(", ")
                )?;
                return Ok(Signal::Continue);
            }
        };

        self.collect_multiline_fields(&mut trace.segments)?;

        let navigating = trace.segments.len() == 1
            && trace.segments[0].last().is_some_and(|leaf| {
                leaf.config.subshell
                    && leaf.entry.is_some()
                    && merged_arguments(&trace.segments[0]).is_empty()
            });

        // every segment is validated before anything runs
        let mut errors = Vec::new();
        for segment in &trace.segments {
            let record = assemble_record(segment);
            errors.extend(validate_record(&segment[0].node, &record));
            if !navigating {
                if let Some(leaf) = segment.last() {
                    errors.extend(check_required(&leaf.node, &leaf.bound_values()));
                }
            }
        }
        if !errors.is_empty() {
            for error in errors {
                writeln!(self.output, "{error}")?;
            }
            return Ok(Signal::Continue);
        }

        if let Some(node) = &trace.pipe_error {
            writeln!(self.output, "'{node}' does not support pipe handling")?;
        }

        if navigating {
            self.enter_subshells(&trace.segments[0])?;
            return Ok(Signal::Continue);
        }

        let mut ret: Option<Value> = None;
        let mut outputter: Option<(Outputter, ValueMap)> = None;
        for (si, segment) in trace.segments.iter().enumerate() {
            let Some(leaf) = segment.last() else {
                continue;
            };
            let Some(resolved) = find_handler(segment) else {
                writeln!(
                    self.output,
                    "Incorrect command, provide more arguments for '{}'",
                    leaf.node.name
                )?;
                return Ok(Signal::Continue);
            };

            let mut args = ValueMap::new();
            if si == 0 {
                if let Some(level) = self.levels().last() {
                    merge(&mut args, level.defaults.clone());
                }
                for frame in segment {
                    merge(&mut args, frame.defaults.clone());
                }
            }
            merge(&mut args, merged_arguments(segment));
            let input = if si == 0 { None } else { ret.take() };

            debug!(node = %leaf.node.name, segment = si, "dispatching");
            let call = HandlerCall {
                args,
                input,
                root: resolved.pass_root.then_some(self.root()),
            };
            let result = match resolved.handler.call(call) {
                Ok(result) => result,
                Err(e) => {
                    writeln!(self.output, "Command execution failed: {e}")?;
                    return Ok(Signal::Continue);
                }
            };

            // outputter resolution belongs to the first segment only;
            // later segments contribute values, never renderers
            let mut value = match result {
                RunResult::Exit => return Ok(Signal::Exit),
                RunResult::Value(v) => v,
                RunResult::WithOutputter(v, o) => {
                    if si == 0 {
                        outputter = Some((o, ValueMap::new()));
                    }
                    v
                }
                RunResult::WithOptions(v, o, kwargs) => {
                    if si == 0 {
                        outputter = Some((o, kwargs));
                    }
                    v
                }
            };

            for processor in &resolved.processors {
                value = processor.apply(value);
            }
            if si == 0 {
                for processor in &leaf.config.processors {
                    value = processor.apply(value);
                }
                if outputter.is_none() {
                    if let Some(o) = resolved.outputter {
                        outputter = Some((o, resolved.outputter_kwargs));
                    } else if let Some(o) = leaf.config.outputter.clone() {
                        outputter = Some((o, leaf.config.outputter_kwargs.clone()));
                    }
                }
            }
            ret = Some(value);
        }

        if let Some(value) = ret {
            // falsy results print nothing
            if is_truthy(&value) {
                match &outputter {
                    Some((o, kwargs)) => {
                        if let Some(text) = o.render(&value, kwargs) {
                            writeln!(self.output, "{text}")?;
                        }
                    }
                    None => writeln!(self.output, "{}", to_display(&value))?,
                }
            }
        }
        Ok(Signal::Continue)
    }

    /// Reads multi-line values for fields bound to the literal `input`.
    fn collect_multiline_fields(&mut self, segments: &mut [Segment]) -> io::Result<()> {
        for segment in segments.iter_mut() {
            for frame in segment.iter_mut() {
                for field in frame.fields.iter_mut() {
                    let wants_input = field.schema.multiline
                        && field.bound() == Some(Value::String("input".to_string()));
                    if wants_input {
                        let text = self.read_multiline()?;
                        field.replace(Value::String(text));
                    }
                }
            }
        }
        Ok(())
    }

    fn read_multiline(&mut self) -> io::Result<String> {
        let mut lines = Vec::new();
        let mut buf = String::new();
        loop {
            buf.clear();
            if self.input.read_line(&mut buf)? == 0 {
                break;
            }
            lines.push(buf.trim_end_matches(['\r', '\n']).to_string());
        }
        Ok(lines.join("\n"))
    }

    /// Pushes a shell level for every sub-shell frame along the segment,
    /// layering traversed defaults on top of the current level's.
    fn enter_subshells(&mut self, segment: &[Frame]) -> io::Result<()> {
        let (base_path, mut defaults) = match self.levels().last() {
            Some(level) => (level.path.clone(), level.defaults.clone()),
            None => (Vec::new(), ValueMap::new()),
        };
        for frame in segment {
            merge(&mut defaults, frame.defaults.clone());
            if frame.config.subshell && frame.entry.is_some() {
                let mut path = base_path.clone();
                path.extend(frame.path.iter().cloned());
                let prompt = frame
                    .config
                    .prompt
                    .clone()
                    .unwrap_or_else(|| format!("{}#", frame.node.name));
                self.push_level(ShellLevel {
                    path,
                    prompt,
                    defaults: defaults.clone(),
                });
                if let Some(intro) = &frame.config.intro {
                    writeln!(self.output, "{intro}")?;
                }
            }
        }
        Ok(())
    }
}

fn merge(into: &mut ValueMap, from: ValueMap) {
    for (key, value) in from {
        into.insert(key, value);
    }
}

/// Explicitly bound values across the segment's frames, leaf winning.
fn merged_arguments(segment: &[Frame]) -> ValueMap {
    let mut out = ValueMap::new();
    for frame in segment {
        merge(&mut out, frame.bound_values());
    }
    out
}

/// Selects the handler for a segment: the most recently specified field
/// with a handler, then the leaf node's own handler, then ancestor nodes
/// when inheritance is enabled.
pub(crate) fn find_handler(segment: &[Frame]) -> Option<ResolvedHandler> {
    let leaf = segment.last()?;
    for field in leaf.fields.iter().rev() {
        if let Some(handler) = &field.schema.handler {
            return Some(ResolvedHandler {
                handler: handler.clone(),
                pass_root: field.schema.pass_root,
                processors: field.schema.processors.clone(),
                outputter: field.schema.outputter.clone(),
                outputter_kwargs: field.schema.outputter_kwargs.clone(),
            });
        }
    }
    if let Some(handler) = &leaf.config.handler {
        return Some(node_handler(handler));
    }
    if leaf.config.use_parent_run {
        for frame in segment.iter().rev().skip(1) {
            if let Some(handler) = &frame.config.handler {
                return Some(node_handler(handler));
            }
            if !frame.config.use_parent_run {
                break;
            }
        }
    }
    None
}

fn node_handler(handler: &Handler) -> ResolvedHandler {
    ResolvedHandler {
        handler: handler.clone(),
        pass_root: false,
        processors: Vec::new(),
        outputter: None,
        outputter_kwargs: ValueMap::new(),
    }
}
