//! The interactive shell: prompt stack, reserved commands, and the
//! line-processing loop.
//!
//! A [`Shell`] owns the schema tree and a stack of [`ShellLevel`]s, one per
//! entered sub-shell. The top of the stack decides the prompt, the node
//! command lines resolve against, and the default values layered under
//! every executed command.

use std::io::{self, BufRead, Write};

use schema_shell_core::{MountError, SchemaNode, ValueMap, mount, remove};
use tracing::debug;

/// What the caller should do after a processed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Keep reading input.
    Continue,
    /// End the session.
    Exit,
}

/// One entry of the sub-shell stack.
#[derive(Debug, Clone)]
pub struct ShellLevel {
    /// Canonical path from the schema root to this level's node.
    pub path: Vec<String>,
    /// Prompt shown while this level is on top.
    pub prompt: String,
    /// Default values accumulated on the way into this level.
    pub defaults: ValueMap,
}

/// Interactive command shell over a schema tree.
///
/// Generic over its input and output streams so sessions can be driven
/// from tests with in-memory buffers.
///
/// # Examples
///
/// ```
/// use schema_shell_repl::Shell;
/// use schema_shell_core::{FieldSchema, SchemaNode};
/// use std::io::Cursor;
///
/// let tree = SchemaNode::namespace("demo")
///     .with_child(SchemaNode::field("target", FieldSchema::string()));
///
/// let mut out = Vec::new();
/// let mut shell = Shell::new(tree, Cursor::new("pwd\nexit\n"), &mut out);
/// shell.run().unwrap();
/// ```
pub struct Shell<R, W> {
    root: SchemaNode,
    levels: Vec<ShellLevel>,
    pub(crate) input: R,
    pub(crate) output: W,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    /// Creates a shell over the given tree and streams.
    pub fn new(root: SchemaNode, input: R, output: W) -> Self {
        let prompt = root
            .config()
            .and_then(|c| c.prompt.clone())
            .unwrap_or_else(|| format!("{}#", root.name));
        Self {
            root,
            levels: vec![ShellLevel {
                path: Vec::new(),
                prompt,
                defaults: ValueMap::new(),
            }],
            input,
            output,
        }
    }

    /// The schema tree.
    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    /// Consumes the shell, returning its output stream.
    pub fn into_output(self) -> W {
        self.output
    }

    /// The current prompt text.
    pub fn prompt(&self) -> &str {
        self.levels
            .last()
            .map(|l| l.prompt.as_str())
            .unwrap_or_default()
    }

    /// The sub-shell stack, root level first.
    pub fn levels(&self) -> &[ShellLevel] {
        &self.levels
    }

    /// Attaches a subtree at `path`, replacing any same-named child.
    pub fn mount(
        &mut self,
        path: &[&str],
        node: SchemaNode,
        description: Option<&str>,
    ) -> Result<(), MountError> {
        mount(&mut self.root, path, node, description)
    }

    /// Detaches and returns the subtree at `path`.
    pub fn remove(&mut self, path: &[&str]) -> Result<SchemaNode, MountError> {
        remove(&mut self.root, path)
    }

    /// The node command lines currently resolve against.
    ///
    /// Falls back to the schema root if the active path no longer exists,
    /// which can happen after removing a mounted subtree from inside it.
    pub fn active_node(&self) -> &SchemaNode {
        let Some(level) = self.levels.last() else {
            return &self.root;
        };
        let mut node = &self.root;
        for segment in &level.path {
            match node.child(segment) {
                Some(child) => node = child,
                None => return &self.root,
            }
        }
        node
    }

    pub(crate) fn push_level(&mut self, level: ShellLevel) {
        debug!(path = ?level.path, "entering sub-shell");
        self.levels.push(level);
    }

    /// Runs the read-eval-print loop until end of input or an exit.
    pub fn run(&mut self) -> io::Result<()> {
        if let Some(intro) = self.root.config().and_then(|c| c.intro.clone()) {
            writeln!(self.output, "{intro}")?;
        }
        let mut line = String::new();
        loop {
            let prompt = self.prompt().to_string();
            write!(self.output, "{prompt} ")?;
            self.output.flush()?;
            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }
            let owned = line.clone();
            if self.process_line(&owned)? == Signal::Exit {
                break;
            }
        }
        Ok(())
    }

    /// Processes one input line: help, reserved commands, or dispatch.
    pub fn process_line(&mut self, line: &str) -> io::Result<Signal> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Signal::Continue);
        }

        // trailing "?" asks for help, "??" for verbose help
        let (line, help_request) = if let Some(stripped) = line.strip_suffix("??") {
            (stripped.trim_end(), Some(true))
        } else if let Some(stripped) = line.strip_suffix('?') {
            (stripped.trim_end(), Some(false))
        } else {
            (line, None)
        };

        let mut parts = line.splitn(2, char::is_whitespace);
        let first = parts.next().unwrap_or_default();
        let rest = parts.next().unwrap_or("").trim();

        // "help <path> ?" and "help <path> ??" ask about the path itself
        if let Some(verbose) = help_request {
            let target = if first == "help" { rest } else { line };
            self.print_help(target, verbose)?;
            return Ok(Signal::Continue);
        }

        match first {
            "exit" => {
                self.levels.pop();
                if self.levels.is_empty() {
                    return Ok(Signal::Exit);
                }
                Ok(Signal::Continue)
            }
            "top" | "end" => {
                self.levels.truncate(1);
                Ok(Signal::Continue)
            }
            "pwd" => {
                let mut path = vec!["Root".to_string()];
                if let Some(level) = self.levels.last() {
                    path.extend(level.path.iter().cloned());
                }
                writeln!(self.output, "{}", path.join("->"))?;
                Ok(Signal::Continue)
            }
            "cls" => {
                write!(self.output, "\x1b[2J\x1b[H")?;
                self.output.flush()?;
                Ok(Signal::Continue)
            }
            "help" => {
                self.print_help(rest, false)?;
                Ok(Signal::Continue)
            }
            _ => self.execute(line),
        }
    }
}

/// Reserved command names with their help descriptions.
pub(crate) const RESERVED: &[(&str, &str)] = &[
    ("exit", "Exit current shell"),
    ("top", "Exit to top shell"),
    ("end", "Exit to top shell"),
    ("pwd", "Print current shell path"),
    ("cls", "Clear the screen"),
    ("help", "Print help for a command"),
];

#[cfg(test)]
mod tests {
    use schema_shell_core::{FieldSchema, NodeConfig};
    use std::io::Cursor;

    use super::*;

    fn tree() -> SchemaNode {
        SchemaNode::namespace("demo").with_child(
            SchemaNode::namespace("nr")
                .with_config(NodeConfig::new().subshell("demo[nr]#"))
                .with_child(SchemaNode::field("target", FieldSchema::string())),
        )
    }

    fn shell(input: &str) -> Shell<Cursor<String>, Vec<u8>> {
        Shell::new(tree(), Cursor::new(input.to_string()), Vec::new())
    }

    fn printed(shell: &Shell<Cursor<String>, Vec<u8>>) -> String {
        String::from_utf8(shell.output.clone()).unwrap()
    }

    #[test]
    fn test_default_prompt_from_root_name() {
        let s = shell("");
        assert_eq!(s.prompt(), "demo#");
    }

    #[test]
    fn test_prompt_from_config() {
        let tree = SchemaNode::namespace("demo")
            .with_config(NodeConfig::new().with_prompt("demo>"));
        let s = Shell::new(tree, Cursor::new(String::new()), Vec::new());
        assert_eq!(s.prompt(), "demo>");
    }

    #[test]
    fn test_exit_at_root_terminates() {
        let mut s = shell("");
        assert_eq!(s.process_line("exit").unwrap(), Signal::Exit);
    }

    #[test]
    fn test_pwd_at_root() {
        let mut s = shell("");
        s.process_line("pwd").unwrap();
        assert_eq!(printed(&s), "Root\n");
    }

    #[test]
    fn test_pwd_inside_subshell() {
        let mut s = shell("");
        s.process_line("nr").unwrap();
        s.process_line("pwd").unwrap();
        assert_eq!(printed(&s), "Root->nr\n");
    }

    #[test]
    fn test_exit_pops_one_level() {
        let mut s = shell("");
        s.process_line("nr").unwrap();
        assert_eq!(s.prompt(), "demo[nr]#");
        assert_eq!(s.process_line("exit").unwrap(), Signal::Continue);
        assert_eq!(s.prompt(), "demo#");
    }

    #[test]
    fn test_top_is_noop_at_root() {
        let mut s = shell("");
        assert_eq!(s.process_line("top").unwrap(), Signal::Continue);
        assert_eq!(s.levels().len(), 1);
    }

    #[test]
    fn test_empty_line_is_ignored() {
        let mut s = shell("");
        s.process_line("   ").unwrap();
        assert!(printed(&s).is_empty());
    }

    #[test]
    fn test_active_node_follows_path() {
        let mut s = shell("");
        s.process_line("nr").unwrap();
        assert_eq!(s.active_node().name, "nr");
    }

    #[test]
    fn test_active_node_falls_back_after_removal() {
        let mut s = shell("");
        s.process_line("nr").unwrap();
        s.remove(&["nr"]).unwrap();
        assert_eq!(s.active_node().name, "demo");
    }

    #[test]
    fn test_run_stops_at_end_of_input() {
        let mut s = shell("pwd\n");
        s.run().unwrap();
        assert!(printed(&s).contains("Root"));
    }
}
