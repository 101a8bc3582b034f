//! End-to-end shell sessions driven through in-memory streams.

use schema_shell_core::{
    FieldSchema, Handler, HandlerCall, NodeConfig, PipeTarget, RunResult, SchemaNode,
};
use schema_shell_repl::{Shell, Signal, pipe_functions};
use serde_json::{Value, json};
use std::io::Cursor;

fn echo() -> Handler {
    Handler::new(|call: HandlerCall| Ok(RunResult::Value(Value::Object(call.args))))
}

/// A tree shaped like a network automation shell: a `salt`-style root
/// with an `nr` sub-shell, a `cli` sub-shell under it, and a `show`
/// namespace piped into the shared filter functions.
fn demo_tree() -> SchemaNode {
    SchemaNode::namespace("salt")
        .with_config(NodeConfig::new().with_prompt("salt#"))
        .with_child(
            SchemaNode::namespace("nr")
                .with_description("Nornir proxy commands")
                .with_config(NodeConfig::new().subshell("salt[nr]#"))
                .with_child(SchemaNode::field(
                    "target",
                    FieldSchema::string().with_default(json!("proxy:proxytype:nornir")),
                ))
                .with_child(SchemaNode::field(
                    "tgt_type",
                    FieldSchema::string().with_default(json!("pillar")),
                ))
                .with_child(
                    SchemaNode::namespace("cli")
                        .with_description("Send CLI commands to devices")
                        .with_config(
                            NodeConfig::new().subshell("salt[nr-cli]#").with_handler(echo()),
                        )
                        .with_child(SchemaNode::field(
                            "commands",
                            FieldSchema::string().required(),
                        ))
                        .with_child(SchemaNode::field(
                            "plugin",
                            FieldSchema::enumeration(&["netmiko", "napalm", "pyats", "scrapli"])
                                .with_default(json!("netmiko")),
                        ))
                        .with_child(
                            SchemaNode::field(
                                "add_details",
                                FieldSchema::bool().with_presence(json!(true)),
                            )
                            .with_alias("add-details"),
                        ),
                ),
        )
        .with_child(
            SchemaNode::namespace("show")
                .with_config(NodeConfig::new().with_pipe(PipeTarget::Node(pipe_functions())))
                .with_child(SchemaNode::field(
                    "hosts",
                    FieldSchema::callable(Handler::new(|_| {
                        Ok(RunResult::Value(json!(
                            "ceos1 up\nceos2 down\nvsrx1 up"
                        )))
                    })),
                )),
        )
}

fn session(lines: &[&str]) -> String {
    let mut shell = Shell::new(demo_tree(), Cursor::new(String::new()), Vec::new());
    for line in lines {
        if shell.process_line(line).unwrap() == Signal::Exit {
            break;
        }
    }
    String::from_utf8(shell.into_output()).unwrap()
}

fn last_json(output: &str) -> Value {
    serde_json::from_str(output).unwrap()
}

#[test]
fn test_nested_command_binds_at_leaf() {
    let out = session(&["nr cli commands abc"]);
    let parsed = last_json(&out);
    assert_eq!(parsed["commands"], json!("abc"));
    // defaults of every traversed namespace are layered in
    assert_eq!(parsed["target"], json!("proxy:proxytype:nornir"));
    assert_eq!(parsed["tgt_type"], json!("pillar"));
    assert_eq!(parsed["plugin"], json!("netmiko"));
}

#[test]
fn test_presence_flag_roundtrip() {
    let out = session(&["nr cli commands abc add_details"]);
    assert_eq!(last_json(&out)["add_details"], json!(true));
}

#[test]
fn test_alias_spelling_is_equivalent() {
    let canonical = session(&["nr cli commands abc add_details"]);
    let aliased = session(&["nr cli commands abc add-details"]);
    assert_eq!(canonical, aliased);
}

#[test]
fn test_quote_styles_are_equivalent() {
    let double = session(&["nr cli commands \"show clock\""]);
    let single = session(&["nr cli commands 'show clock'"]);
    assert_eq!(double, single);
    assert_eq!(last_json(&double)["commands"], json!("show clock"));
}

#[test]
fn test_enum_prefix_is_rejected_as_incomplete() {
    let out = session(&["nr cli commands abc plugin n"]);
    assert_eq!(
        out,
        "Incomplete command, possible completions: napalm, netmiko\n"
    );
}

#[test]
fn test_missing_required_field() {
    let out = session(&["nr cli plugin napalm"]);
    assert_eq!(out, "'commands' is a required field\n");
}

#[test]
fn test_subshell_defaults_reset_on_exit() {
    let mut shell = Shell::new(demo_tree(), Cursor::new(String::new()), Vec::new());
    shell.process_line("nr").unwrap();
    assert_eq!(shell.prompt(), "salt[nr]#");
    shell.process_line("exit").unwrap();
    assert_eq!(shell.prompt(), "salt#");
    assert!(shell.levels().last().unwrap().defaults.is_empty());
}

#[test]
fn test_subshell_navigation_and_top() {
    let mut shell = Shell::new(demo_tree(), Cursor::new(String::new()), Vec::new());
    shell.process_line("nr cli").unwrap();
    // one level per traversed sub-shell, so exit steps back one at a time
    assert_eq!(shell.prompt(), "salt[nr-cli]#");
    assert_eq!(shell.levels().len(), 3);
    shell.process_line("top").unwrap();
    assert_eq!(shell.prompt(), "salt#");
}

#[test]
fn test_commands_run_inside_subshell() {
    let out = session(&["nr", "cli", "commands abc", "exit", "exit"]);
    let parsed = last_json(&out);
    assert_eq!(parsed["commands"], json!("abc"));
    assert_eq!(parsed["target"], json!("proxy:proxytype:nornir"));
}

#[test]
fn test_pipe_include_filters_lines() {
    let out = session(&["show hosts | include up"]);
    assert_eq!(out, "ceos1 up\nvsrx1 up\n");
}

#[test]
fn test_pipe_chain_include_exclude() {
    let out = session(&["show hosts | include up | exclude vsrx"]);
    assert_eq!(out, "ceos1 up\n");
}

#[test]
fn test_pipe_unsupported_node() {
    let out = session(&["nr cli commands abc | include up"]);
    assert!(out.starts_with("'cli' does not support pipe handling\n"));
}

#[test]
fn test_help_lists_options() {
    let out = session(&["nr cli ?"]);
    assert!(out.contains("commands"));
    assert!(out.contains("plugin"));
    assert!(out.contains("add-details"));
    assert!(out.contains("Enter command subshell"));
}

#[test]
fn test_mounted_subtree_dispatches() {
    let mut shell = Shell::new(demo_tree(), Cursor::new(String::new()), Vec::new());
    let extension = SchemaNode::namespace("placeholder")
        .with_config(NodeConfig::new().with_handler(echo()))
        .with_child(SchemaNode::field("level", FieldSchema::string()));
    shell
        .mount(&["logging"], extension, Some("Logging controls"))
        .unwrap();
    shell.process_line("logging level debug").unwrap();
    let out = String::from_utf8(shell.into_output()).unwrap();
    assert_eq!(last_json(&out)["level"], json!("debug"));
}

#[test]
fn test_removed_subtree_stops_dispatching() {
    let mut shell = Shell::new(demo_tree(), Cursor::new(String::new()), Vec::new());
    let removed = shell.remove(&["show"]).unwrap();
    assert_eq!(removed.name, "show");
    shell.process_line("show hosts").unwrap();
    let out = String::from_utf8(shell.into_output()).unwrap();
    assert_eq!(out, "Incorrect command, 'show' not part of 'salt' fields\n");
}

#[test]
fn test_mount_missing_parent_errors() {
    let mut shell = Shell::new(demo_tree(), Cursor::new(String::new()), Vec::new());
    let node = SchemaNode::namespace("x");
    assert!(shell.mount(&["nope", "x"], node, None).is_err());
}

#[test]
fn test_full_run_with_intro_and_exit() {
    let mut tree = demo_tree();
    if let Some(ns) = tree.as_namespace_mut() {
        ns.config.intro = Some("Welcome to the salt shell".to_string());
    }
    let mut out = Vec::new();
    let mut shell = Shell::new(tree, Cursor::new("pwd\nexit\n"), &mut out);
    shell.run().unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("Welcome to the salt shell\n"));
    assert!(text.contains("Root\n"));
    assert!(text.contains("salt# "));
}
