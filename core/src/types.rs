//! Schema tree definitions for interactive command shells.
//!
//! This module defines the core data model used to describe a command tree:
//! nested namespaces, leaf fields with typed values, and per-node runtime
//! configuration (subshell behavior, pipe targets, handlers, outputters).
//! A tree is constructed once at startup with the builder methods and may be
//! extended or pruned at runtime through [`mount`](crate::mount) /
//! [`remove`](crate::remove).

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keyword arguments and bound field values, keyed by canonical field name.
pub type ValueMap = Map<String, Value>;

/// Error type surfaced by handler invocations.
///
/// Handlers are collaborator code; whatever they fail with is caught at the
/// dispatch boundary and rendered, never allowed to unwind the shell loop.
pub type HandlerError = Box<dyn std::error::Error>;

/// Declared value type of a leaf field.
///
/// Used for help rendering and for validating bound values before dispatch.
///
/// # Examples
///
/// ```
/// use schema_shell_core::ValueType;
///
/// let vt = ValueType::default();
/// assert_eq!(vt, ValueType::Any);
///
/// let plugin = ValueType::Enum(vec!["netmiko".into(), "napalm".into()]);
/// assert!(matches!(plugin, ValueType::Enum(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum ValueType {
    /// String value.
    Str,
    /// Boolean value.
    Bool,
    /// Integer value.
    Int,
    /// Floating point value.
    Float,
    /// One of a fixed set of variant spellings.
    Enum(Vec<String>),
    /// Any of several types.
    Union(Vec<ValueType>),
    /// List of values of one type.
    List(Box<ValueType>),
    /// Raw JSON literal, collected verbatim and parsed at validation time.
    Json,
    /// Field that exists only to be executed; takes no value.
    Callable,
    /// Unconstrained (the default).
    #[default]
    Any,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Str => write!(f, "string"),
            ValueType::Bool => write!(f, "bool"),
            ValueType::Int => write!(f, "int"),
            ValueType::Float => write!(f, "float"),
            ValueType::Enum(variants) => write!(f, "enum[{}]", variants.join(", ")),
            ValueType::Union(types) => {
                let names: Vec<String> = types.iter().map(|t| t.to_string()).collect();
                write!(f, "union[{}]", names.join(", "))
            }
            ValueType::List(inner) => write!(f, "list[{inner}]"),
            ValueType::Json => write!(f, "json"),
            ValueType::Callable => write!(f, "callable"),
            ValueType::Any => write!(f, "any"),
        }
    }
}

/// Arguments supplied to a handler invocation.
///
/// `input` carries the previous pipe segment's return value for segments
/// after the first. `root` is populated only for fields that set
/// [`FieldSchema::pass_root`].
pub struct HandlerCall<'a> {
    /// Merged keyword arguments: shell defaults, command defaults, then
    /// explicitly bound values, later keys winning.
    pub args: ValueMap,
    /// Piped input from the previous segment, if any.
    pub input: Option<Value>,
    /// Root schema node, when requested by the field.
    pub root: Option<&'a SchemaNode>,
}

/// Value returned by a handler.
#[derive(Debug)]
pub enum RunResult {
    /// Plain result value.
    Value(Value),
    /// Result with an explicit outputter overriding any declared one.
    WithOutputter(Value, Outputter),
    /// Result with an explicit outputter and its options.
    WithOptions(Value, Outputter, ValueMap),
    /// End-of-session sentinel; the shell loop terminates.
    Exit,
}

/// Executable bound to a schema node or field.
///
/// # Examples
///
/// ```
/// use schema_shell_core::{Handler, HandlerCall, RunResult};
/// use serde_json::Value;
///
/// let echo = Handler::new(|call: HandlerCall| {
///     Ok(RunResult::Value(Value::Object(call.args)))
/// });
/// ```
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(HandlerCall<'_>) -> Result<RunResult, HandlerError>>);

impl Handler {
    /// Wraps a function as a handler.
    pub fn new(f: impl Fn(HandlerCall<'_>) -> Result<RunResult, HandlerError> + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invokes the handler.
    pub fn call(&self, call: HandlerCall<'_>) -> Result<RunResult, HandlerError> {
        (self.0)(call)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler(..)")
    }
}

/// Final-stage renderer converting a result value into displayed text.
///
/// Returning `None` means the outputter rendered directly to the terminal
/// itself and the shell must not write anything further.
#[derive(Clone)]
pub struct Outputter(Rc<dyn Fn(&Value, &ValueMap) -> Option<String>>);

impl Outputter {
    /// Wraps a function as an outputter.
    pub fn new(f: impl Fn(&Value, &ValueMap) -> Option<String> + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Renders a value, returning the text to display.
    pub fn render(&self, value: &Value, kwargs: &ValueMap) -> Option<String> {
        (self.0)(value, kwargs)
    }
}

impl fmt::Debug for Outputter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Outputter(..)")
    }
}

/// Intermediate unary transform applied to a result before outputting or
/// piping onward.
#[derive(Clone)]
pub struct Processor(Rc<dyn Fn(Value) -> Value>);

impl Processor {
    /// Wraps a function as a processor.
    pub fn new(f: impl Fn(Value) -> Value + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Applies the transform.
    pub fn apply(&self, value: Value) -> Value {
        (self.0)(value)
    }
}

impl fmt::Debug for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Processor(..)")
    }
}

/// Where the `|` separator sends the next pipe segment.
#[derive(Debug, Clone, Default)]
pub enum PipeTarget {
    /// Piping is not supported on this node.
    #[default]
    None,
    /// The next segment resolves against this same node.
    SelfTarget,
    /// The next segment resolves against a designated shared subtree.
    Node(Rc<SchemaNode>),
}

impl PipeTarget {
    /// Whether the node accepts a pipe at all.
    pub fn is_supported(&self) -> bool {
        !matches!(self, PipeTarget::None)
    }
}

/// Runtime configuration attached to a namespace node.
///
/// Explicitly typed with defined defaults, checked by presence of fields
/// rather than reflective attribute probing.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Entering this node with no arguments opens a sub-shell.
    pub subshell: bool,
    /// Prompt text shown while this node's sub-shell is active.
    pub prompt: Option<String>,
    /// Banner written once at shell start (root node only).
    pub intro: Option<String>,
    /// Pipe continuation target.
    pub pipe: PipeTarget,
    /// Transforms applied to this node's execution result, in order.
    pub processors: Vec<Processor>,
    /// Renderer for this node's execution result.
    pub outputter: Option<Outputter>,
    /// Options passed to the outputter.
    pub outputter_kwargs: ValueMap,
    /// Executable bound to this node.
    pub handler: Option<Handler>,
    /// When this node has no handler of its own, search ancestor frames
    /// for one.
    pub use_parent_run: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            subshell: false,
            prompt: None,
            intro: None,
            pipe: PipeTarget::None,
            processors: Vec::new(),
            outputter: None,
            outputter_kwargs: ValueMap::new(),
            handler: None,
            use_parent_run: true,
        }
    }
}

impl NodeConfig {
    /// Creates a config with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the node as a sub-shell with the given prompt.
    pub fn subshell(mut self, prompt: &str) -> Self {
        self.subshell = true;
        self.prompt = Some(prompt.to_string());
        self
    }

    /// Sets the intro banner.
    pub fn with_intro(mut self, intro: &str) -> Self {
        self.intro = Some(intro.to_string());
        self
    }

    /// Sets the prompt without enabling sub-shell behavior.
    pub fn with_prompt(mut self, prompt: &str) -> Self {
        self.prompt = Some(prompt.to_string());
        self
    }

    /// Sets the pipe target.
    pub fn with_pipe(mut self, pipe: PipeTarget) -> Self {
        self.pipe = pipe;
        self
    }

    /// Appends a result processor.
    pub fn with_processor(mut self, processor: Processor) -> Self {
        self.processors.push(processor);
        self
    }

    /// Sets the outputter.
    pub fn with_outputter(mut self, outputter: Outputter) -> Self {
        self.outputter = Some(outputter);
        self
    }

    /// Sets outputter options.
    pub fn with_outputter_kwargs(mut self, kwargs: ValueMap) -> Self {
        self.outputter_kwargs = kwargs;
        self
    }

    /// Binds an executable to the node.
    pub fn with_handler(mut self, handler: Handler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Disables handler inheritance from ancestor nodes.
    pub fn no_parent_run(mut self) -> Self {
        self.use_parent_run = false;
        self
    }
}

/// Schema for a leaf field.
///
/// # Examples
///
/// ```
/// use schema_shell_core::{FieldSchema, ValueType};
/// use serde_json::json;
///
/// let plugin = FieldSchema::enumeration(&["netmiko", "napalm"])
///     .with_default(json!("netmiko"));
/// assert!(!plugin.required);
///
/// let details = FieldSchema::bool().with_presence(json!(true));
/// assert_eq!(details.presence, Some(json!(true)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct FieldSchema {
    /// Declared value type.
    pub value_type: ValueType,
    /// Default value, layered under explicitly bound values.
    pub default: Option<Value>,
    /// Whether the field must be bound for its node to execute.
    pub required: bool,
    /// Value auto-assigned when the field name appears with no value.
    pub presence: Option<Value>,
    /// Whether the literal value `input` triggers multi-line collection.
    pub multiline: bool,
    /// Suppress scalar coercion; tokens stay strings.
    pub verbatim: bool,
    /// Executable referenced by this field.
    pub handler: Option<Handler>,
    /// Supply the root schema to the handler call.
    pub pass_root: bool,
    /// Transforms applied to this field's execution result, in order.
    pub processors: Vec<Processor>,
    /// Renderer for this field's execution result.
    pub outputter: Option<Outputter>,
    /// Options passed to the outputter.
    pub outputter_kwargs: ValueMap,
}

impl FieldSchema {
    /// Creates a field of the given type.
    pub fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            ..Default::default()
        }
    }

    /// String-typed field.
    pub fn string() -> Self {
        Self::new(ValueType::Str)
    }

    /// Bool-typed field.
    pub fn bool() -> Self {
        Self::new(ValueType::Bool)
    }

    /// Int-typed field.
    pub fn int() -> Self {
        Self::new(ValueType::Int)
    }

    /// Unconstrained field.
    pub fn any() -> Self {
        Self::new(ValueType::Any)
    }

    /// JSON-literal field; values accumulate as raw text.
    pub fn json() -> Self {
        Self::new(ValueType::Json)
    }

    /// Enumeration field with the given variant spellings.
    pub fn enumeration(variants: &[&str]) -> Self {
        Self::new(ValueType::Enum(
            variants.iter().map(|v| v.to_string()).collect(),
        ))
    }

    /// Field that executes the given handler and takes no value.
    pub fn callable(handler: Handler) -> Self {
        Self::new(ValueType::Callable).with_handler(handler)
    }

    /// Sets the default value.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Marks the field required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the presence value.
    pub fn with_presence(mut self, value: Value) -> Self {
        self.presence = Some(value);
        self
    }

    /// Enables multi-line input collection.
    pub fn multiline(mut self) -> Self {
        self.multiline = true;
        self
    }

    /// Suppresses scalar coercion of bound tokens.
    pub fn verbatim(mut self) -> Self {
        self.verbatim = true;
        self
    }

    /// Binds an executable to the field.
    pub fn with_handler(mut self, handler: Handler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Requests the root schema as a handler argument.
    pub fn with_root_access(mut self) -> Self {
        self.pass_root = true;
        self
    }

    /// Appends a result processor.
    pub fn with_processor(mut self, processor: Processor) -> Self {
        self.processors.push(processor);
        self
    }

    /// Sets the outputter.
    pub fn with_outputter(mut self, outputter: Outputter) -> Self {
        self.outputter = Some(outputter);
        self
    }

    /// Sets outputter options.
    pub fn with_outputter_kwargs(mut self, kwargs: ValueMap) -> Self {
        self.outputter_kwargs = kwargs;
        self
    }
}

/// A namespace's children and configuration.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    /// Child nodes, looked up by exact name or alias.
    pub children: Vec<SchemaNode>,
    /// Runtime configuration.
    pub config: NodeConfig,
}

impl Namespace {
    /// Finds a child by exact name, falling back to alias match.
    ///
    /// Exact name match always wins over alias match.
    pub fn child(&self, token: &str) -> Option<&SchemaNode> {
        self.children
            .iter()
            .find(|c| c.name == token)
            .or_else(|| {
                self.children
                    .iter()
                    .find(|c| c.aliases.iter().any(|a| a == token))
            })
    }

    /// Children whose name or any alias starts with `prefix`.
    pub fn prefix_matches(&self, prefix: &str) -> Vec<&SchemaNode> {
        self.children
            .iter()
            .filter(|c| {
                c.name.starts_with(prefix) || c.aliases.iter().any(|a| a.starts_with(prefix))
            })
            .collect()
    }
}

/// One node of the command tree: a namespace or a leaf field.
///
/// # Examples
///
/// ```
/// use schema_shell_core::{FieldSchema, SchemaNode};
///
/// let tree = SchemaNode::namespace("show")
///     .with_child(SchemaNode::field("status", FieldSchema::string()));
///
/// assert!(tree.child("status").is_some());
/// assert!(tree.child("missing").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct SchemaNode {
    /// Canonical identifier.
    pub name: String,
    /// Alternate input/display names (e.g. dash-separated spellings).
    pub aliases: Vec<String>,
    /// Help text.
    pub description: Option<String>,
    /// Namespace or leaf field.
    pub kind: NodeKind,
}

/// Tagged node variant.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Node with named children.
    Namespace(Namespace),
    /// Leaf field with a declared value type.
    Field(FieldSchema),
}

impl SchemaNode {
    /// Creates an empty namespace node.
    pub fn namespace(name: &str) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            description: None,
            kind: NodeKind::Namespace(Namespace::default()),
        }
    }

    /// Creates a leaf field node.
    pub fn field(name: &str, schema: FieldSchema) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            description: None,
            kind: NodeKind::Field(schema),
        }
    }

    /// Adds a help description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Adds an alternate input name.
    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    /// Attaches runtime configuration.
    ///
    /// # Panics
    ///
    /// Panics if the node is a leaf field; configuration belongs to
    /// namespaces.
    pub fn with_config(mut self, config: NodeConfig) -> Self {
        match &mut self.kind {
            NodeKind::Namespace(ns) => ns.config = config,
            NodeKind::Field(_) => panic!("cannot configure field node '{}'", self.name),
        }
        self
    }

    /// Appends a child node.
    ///
    /// # Panics
    ///
    /// Panics if the node is a leaf field.
    pub fn with_child(mut self, child: SchemaNode) -> Self {
        match &mut self.kind {
            NodeKind::Namespace(ns) => ns.children.push(child),
            NodeKind::Field(_) => panic!("cannot add child to field node '{}'", self.name),
        }
        self
    }

    /// Whether this node is a namespace.
    pub fn is_namespace(&self) -> bool {
        matches!(self.kind, NodeKind::Namespace(_))
    }

    /// Namespace view of this node.
    pub fn as_namespace(&self) -> Option<&Namespace> {
        match &self.kind {
            NodeKind::Namespace(ns) => Some(ns),
            NodeKind::Field(_) => None,
        }
    }

    /// Mutable namespace view of this node.
    pub fn as_namespace_mut(&mut self) -> Option<&mut Namespace> {
        match &mut self.kind {
            NodeKind::Namespace(ns) => Some(ns),
            NodeKind::Field(_) => None,
        }
    }

    /// Field view of this node.
    pub fn as_field(&self) -> Option<&FieldSchema> {
        match &self.kind {
            NodeKind::Field(f) => Some(f),
            NodeKind::Namespace(_) => None,
        }
    }

    /// Namespace configuration, if this node is a namespace.
    pub fn config(&self) -> Option<&NodeConfig> {
        self.as_namespace().map(|ns| &ns.config)
    }

    /// Finds a child by exact name or alias.
    pub fn child(&self, token: &str) -> Option<&SchemaNode> {
        self.as_namespace().and_then(|ns| ns.child(token))
    }

    /// Whether `token` is this node's name or one of its aliases.
    pub fn matches(&self, token: &str) -> bool {
        self.name == token || self.aliases.iter().any(|a| a == token)
    }

    /// Name shown in help listings; the first alias wins over the
    /// canonical name when present.
    pub fn display_name(&self) -> &str {
        self.aliases.first().map(String::as_str).unwrap_or(&self.name)
    }

    /// Default values declared on this namespace's field children.
    ///
    /// Required fields, callable fields, and null defaults are skipped.
    pub fn defaults(&self) -> ValueMap {
        let mut out = ValueMap::new();
        if let Some(ns) = self.as_namespace() {
            for child in &ns.children {
                if let Some(field) = child.as_field() {
                    if field.required || field.value_type == ValueType::Callable {
                        continue;
                    }
                    match &field.default {
                        Some(Value::Null) | None => {}
                        Some(v) => {
                            out.insert(child.name.clone(), v.clone());
                        }
                    }
                }
            }
        }
        out
    }
}
