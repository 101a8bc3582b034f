//! Line-oriented interactive shell engine over a
//! [`schema_shell_core`] command tree.
//!
//! The engine is split along the stages a line passes through:
//!
//! - [`token`] — whitespace tokenization plus quoted and bracketed value
//!   grouping.
//! - [`resolve`] — the resolver state machine turning tokens into a
//!   [`resolve::CommandTrace`] of frames and bound fields.
//! - dispatch — validation, handler selection, pipe threading, sub-shell
//!   navigation, and output rendering.
//! - help — `?` / `??` rendering and completion candidates, reusing the
//!   resolver.
//! - [`output`] — builtin outputters and the shared pipe-functions
//!   subtree.
//!
//! [`Shell`] ties the stages together over a pair of I/O streams.
//!
//! # Example
//!
//! ```
//! use schema_shell_core::{FieldSchema, Handler, NodeConfig, RunResult, SchemaNode};
//! use schema_shell_repl::Shell;
//! use serde_json::{Value, json};
//! use std::io::Cursor;
//!
//! let tree = SchemaNode::namespace("demo").with_child(
//!     SchemaNode::namespace("show").with_child(SchemaNode::field(
//!         "version",
//!         FieldSchema::callable(Handler::new(|_| Ok(RunResult::Value(json!("0.1.0"))))),
//!     )),
//! );
//!
//! let mut out = Vec::new();
//! let mut shell = Shell::new(tree, Cursor::new(""), &mut out);
//! shell.process_line("show version").unwrap();
//! assert_eq!(String::from_utf8(out).unwrap(), "0.1.0\n");
//! ```

mod dispatch;
mod help;
pub mod output;
pub mod resolve;
mod shell;
pub mod token;

pub use output::{outputters, pipe_functions};
pub use resolve::{CommandTrace, Resolution, resolve};
pub use shell::{Shell, ShellLevel, Signal};
