//! Demo command tree: a mock network automation shell.
//!
//! Models the kind of tree the engine is built for: a `nr` sub-shell
//! carrying proxy targeting defaults, a `cli` sub-shell under it for
//! sending device commands, and a `show` namespace whose output can be
//! piped through the shared filter functions.

use std::time::{SystemTime, UNIX_EPOCH};

use schema_shell_core::{
    FieldSchema, Handler, HandlerCall, HandlerError, NodeConfig, PipeTarget, RunResult, SchemaNode,
};
use schema_shell_repl::{outputters, pipe_functions};
use serde_json::{Value, json};

/// Builds the demo tree.
pub fn build() -> SchemaNode {
    SchemaNode::namespace("salt")
        .with_config(
            NodeConfig::new()
                .with_prompt("salt#")
                .with_intro("Welcome to the salt shell demo, type ? for help"),
        )
        .with_child(nornir())
        .with_child(show())
}

fn nornir() -> SchemaNode {
    SchemaNode::namespace("nr")
        .with_description("Nornir proxy minion commands")
        .with_config(NodeConfig::new().subshell("salt[nr]#"))
        .with_child(
            SchemaNode::field(
                "target",
                FieldSchema::string().with_default(json!("proxy:proxytype:nornir")),
            )
            .with_description("Minions to target"),
        )
        .with_child(
            SchemaNode::field("tgt_type", FieldSchema::string().with_default(json!("pillar")))
                .with_description("Targeting type"),
        )
        .with_child(
            SchemaNode::namespace("cli")
                .with_description("Send CLI commands to devices")
                .with_config(
                    NodeConfig::new()
                        .subshell("salt[nr-cli]#")
                        .with_handler(Handler::new(run_cli)),
                )
                .with_child(
                    SchemaNode::field("commands", FieldSchema::string().required())
                        .with_description("Commands to send"),
                )
                .with_child(
                    SchemaNode::field(
                        "plugin",
                        FieldSchema::enumeration(&["netmiko", "napalm", "pyats", "scrapli"])
                            .with_default(json!("netmiko")),
                    )
                    .with_description("Connection plugin to use"),
                )
                .with_child(
                    SchemaNode::field("hosts", FieldSchema::string())
                        .with_description("Hosts to run commands on"),
                )
                .with_child(
                    SchemaNode::field("add_details", FieldSchema::bool().with_presence(json!(true)))
                        .with_alias("add-details")
                        .with_description("Include execution details in results"),
                ),
        )
}

fn show() -> SchemaNode {
    SchemaNode::namespace("show")
        .with_description("Show shell and demo state")
        .with_config(NodeConfig::new().with_pipe(PipeTarget::Node(pipe_functions())))
        .with_child(
            SchemaNode::field("version", FieldSchema::callable(Handler::new(version)))
                .with_description("Show shell version"),
        )
        .with_child(
            SchemaNode::field("clock", FieldSchema::callable(Handler::new(clock)))
                .with_description("Show current time"),
        )
        .with_child(
            SchemaNode::field("joke", FieldSchema::callable(Handler::new(joke)))
                .with_description("Print a joke"),
        )
        .with_child(
            SchemaNode::field(
                "hosts",
                FieldSchema::callable(Handler::new(hosts))
                    .with_outputter(outputters::table())
                    .with_outputter_kwargs(
                        json!({"sortby": "hostname"})
                            .as_object()
                            .cloned()
                            .unwrap_or_default(),
                    ),
            )
            .with_description("Show demo host inventory"),
        )
        .with_child(
            SchemaNode::field(
                "inventory",
                FieldSchema::callable(Handler::new(inventory)).with_outputter(outputters::yaml()),
            )
            .with_description("Show inventory details"),
        )
}

/// Pretends to send CLI commands to devices, echoing what would run.
fn run_cli(call: HandlerCall<'_>) -> Result<RunResult, HandlerError> {
    let plugin = text_arg(&call.args, "plugin");
    let target = text_arg(&call.args, "target");
    let commands = list_arg(&call.args, "commands");
    let hosts = match call.args.get("hosts") {
        Some(v) => list_arg_value(v),
        None => vec!["ceos1".to_string(), "ceos2".to_string()],
    };

    let mut lines = Vec::new();
    for host in &hosts {
        lines.push(format!("{host}:"));
        for command in &commands {
            lines.push(format!("  {command}: sent via {plugin} (target {target})"));
        }
    }
    if call.args.get("add_details").and_then(Value::as_bool) == Some(true) {
        lines.push(format!("details: {}", Value::Object(call.args.clone())));
    }
    Ok(RunResult::Value(json!(lines.join("\n"))))
}

fn version(_: HandlerCall<'_>) -> Result<RunResult, HandlerError> {
    Ok(RunResult::Value(json!(env!("CARGO_PKG_VERSION"))))
}

fn clock(_: HandlerCall<'_>) -> Result<RunResult, HandlerError> {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    Ok(RunResult::Value(json!(format!("unix time: {seconds}"))))
}

fn joke(_: HandlerCall<'_>) -> Result<RunResult, HandlerError> {
    Ok(RunResult::Value(json!(
        "Why did the network engineer bring a ladder? To reach the high availability."
    )))
}

fn hosts(_: HandlerCall<'_>) -> Result<RunResult, HandlerError> {
    Ok(RunResult::Value(json!([
        {"hostname": "vsrx1", "platform": "junos", "status": "up"},
        {"hostname": "ceos1", "platform": "eos", "status": "up"},
        {"hostname": "ceos2", "platform": "eos", "status": "down"},
    ])))
}

fn inventory(_: HandlerCall<'_>) -> Result<RunResult, HandlerError> {
    Ok(RunResult::Value(json!({
        "ceos1": {"platform": "eos", "port": 6001},
        "ceos2": {"platform": "eos", "port": 6002},
        "vsrx1": {"platform": "junos", "port": 6003},
    })))
}

fn text_arg(args: &schema_shell_core::ValueMap, key: &str) -> String {
    match args.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn list_arg(args: &schema_shell_core::ValueMap, key: &str) -> Vec<String> {
    args.get(key).map(list_arg_value).unwrap_or_default()
}

fn list_arg_value(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Value::String(s) => vec![s.clone()],
        other => vec![other.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use schema_shell_repl::{Shell, Signal};
    use std::io::Cursor;

    use super::*;

    fn run(lines: &[&str]) -> String {
        let mut shell = Shell::new(build(), Cursor::new(String::new()), Vec::new());
        for line in lines {
            if shell.process_line(line).unwrap() == Signal::Exit {
                break;
            }
        }
        String::from_utf8(shell.into_output()).unwrap()
    }

    #[test]
    fn test_show_version() {
        assert_eq!(run(&["show version"]), format!("{}\n", env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_cli_command_uses_defaults() {
        let out = run(&["nr cli commands \"show clock\""]);
        assert!(out.contains("show clock: sent via netmiko (target proxy:proxytype:nornir)"));
    }

    #[test]
    fn test_cli_add_details() {
        let out = run(&["nr cli commands abc add-details"]);
        assert!(out.contains("details:"));
    }

    #[test]
    fn test_hosts_table_sorted() {
        let out = run(&["show hosts"]);
        let ceos1 = out.find("ceos1").unwrap();
        let vsrx1 = out.find("vsrx1").unwrap();
        assert!(ceos1 < vsrx1);
        assert!(out.contains("hostname"));
    }

    #[test]
    fn test_clock_piped_include() {
        let out = run(&["show clock | include unix"]);
        assert!(out.contains("unix time:"));
        let out = run(&["show clock | include no-such-text"]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_inventory_yaml() {
        let out = run(&["show inventory"]);
        assert!(out.contains("platform: eos"));
    }

    #[test]
    fn test_subshell_prompts() {
        let mut shell = Shell::new(build(), Cursor::new(String::new()), Vec::new());
        shell.process_line("nr").unwrap();
        assert_eq!(shell.prompt(), "salt[nr]#");
        shell.process_line("cli").unwrap();
        assert_eq!(shell.prompt(), "salt[nr-cli]#");
    }
}
