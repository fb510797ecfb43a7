//! Command-line definition

use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .value_name("PATH")
        .value_parser(value_parser!(PathBuf))
        .help("TOML configuration file (default: ./htree.toml when present)")
}

fn endpoint_arg() -> Arg {
    Arg::new("endpoint")
        .long("endpoint")
        .value_name("URL")
        .help("Agent base URL, overrides the configuration file")
}

fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Print the final snapshot as JSON")
}

/// The `htree` command
#[must_use]
pub fn command() -> Command {
    Command::new("htree")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Stream, lay out and inspect hypothesis trees")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON on stderr"),
        )
        .subcommand(
            Command::new("run")
                .about("Run a fresh analysis against the agent")
                .arg(Arg::new("problem").required(true).help("Problem statement"))
                .arg(
                    Arg::new("scratchpad")
                        .long("scratchpad")
                        .value_name("ID")
                        .help("Scratchpad the run belongs to"),
                )
                .arg(endpoint_arg())
                .arg(config_arg())
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("replay")
                .about("Replay a recorded NDJSON or SSE response body")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Recorded body"),
                )
                .arg(
                    Arg::new("chunk-size")
                        .long("chunk-size")
                        .default_value("512")
                        .value_parser(value_parser!(usize))
                        .help("Bytes per replayed read"),
                )
                .arg(config_arg())
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("restart")
                .about("Edit a node of a saved tree and resume analysis from it")
                .arg(
                    Arg::new("tree")
                        .long("tree")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Saved tree, a JSON array of node records"),
                )
                .arg(Arg::new("node").long("node").required(true).help("Node id to edit"))
                .arg(Arg::new("text").long("text").required(true).help("New node text"))
                .arg(
                    Arg::new("reasoning")
                        .long("reasoning")
                        .default_value("")
                        .help("New node reasoning"),
                )
                .arg(
                    Arg::new("problem")
                        .long("problem")
                        .required(true)
                        .help("Problem statement"),
                )
                .arg(endpoint_arg())
                .arg(config_arg())
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("layout")
                .about("Lay out a saved tree offline")
                .arg(
                    Arg::new("tree")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Saved tree, a JSON array of node records"),
                )
                .arg(config_arg())
                .arg(json_arg()),
        )
}
