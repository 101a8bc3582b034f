//! Core schema tree types and validation for interactive command shells.
//!
//! This crate defines the foundational types for modeling a command tree:
//!
//! - [`SchemaNode`] — one node of the tree, a [`NodeKind::Namespace`] with
//!   named children or a [`NodeKind::Field`] leaf with a declared
//!   [`ValueType`].
//! - [`FieldSchema`] — leaf metadata: type, default, required, presence
//!   value, multiline flag, handler reference, processors, outputter.
//! - [`NodeConfig`] — per-namespace runtime configuration: subshell flag,
//!   prompt, [`PipeTarget`], processors, outputter, handler.
//! - [`Handler`] / [`Outputter`] / [`Processor`] — callable wrappers for
//!   the executables a shell dispatches to.
//!
//! Trees are built once at startup with the builder methods and may be
//! extended at runtime with [`mount`] / [`remove`]. Collected command
//! values are checked with [`validate_record`] / [`check_required`]
//! before dispatch.
//!
//! # Example
//!
//! ```
//! use schema_shell_core::*;
//! use serde_json::json;
//!
//! let tree = SchemaNode::namespace("root").with_child(
//!     SchemaNode::namespace("cli")
//!         .with_description("Send CLI commands")
//!         .with_child(SchemaNode::field(
//!             "commands",
//!             FieldSchema::string().required(),
//!         ))
//!         .with_child(SchemaNode::field(
//!             "plugin",
//!             FieldSchema::enumeration(&["netmiko", "napalm"])
//!                 .with_default(json!("netmiko")),
//!         )),
//! );
//!
//! let cli = tree.child("cli").unwrap();
//! assert_eq!(cli.defaults().get("plugin"), Some(&json!("netmiko")));
//!
//! let record = json!({"cli": {"commands": "show clock"}});
//! assert!(validate_record(&tree, record.as_object().unwrap()).is_empty());
//! ```

mod mount;
mod types;
mod validate;
mod value;

pub use mount::{MountError, mount, remove};
pub use types::*;
pub use validate::{ValidationError, check_required, validate_record};
pub use value::{coerce_scalar, is_truthy, to_display};
