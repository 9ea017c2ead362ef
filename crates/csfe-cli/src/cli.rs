//! Command line definition

use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, Command};

pub(crate) fn command() -> Command {
    let root = Arg::new("root")
        .long("root")
        .value_name("DIR")
        .default_value(".")
        .value_parser(value_parser!(PathBuf))
        .help("Project directory searched for Python modules");
    let history = Arg::new("history")
        .long("history")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help("Resolution history file [env: CSFE_HISTORY_PATH]");

    Command::new("csfe")
        .version(csfe_core::VERSION)
        .about("Keep blob-field accessors of model classes in sync with their resolution history")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("Raise the log level (repeatable)"),
        )
        .subcommand(
            Command::new("run")
                .about("Reconcile every model class, asking about drift")
                .arg(root.clone())
                .arg(history.clone())
                .arg(
                    Arg::new("adapter")
                        .long("adapter")
                        .value_name("FLAVOR")
                        .value_parser(["sync", "synchronous", "async", "asynchronous"])
                        .help("Transport adapter to generate [env: CSFE_ADAPTER]"),
                )
                .arg(
                    Arg::new("answers")
                        .long("answers")
                        .value_name("FILE")
                        .value_parser(value_parser!(PathBuf))
                        .help("Replay answers from a file, one per line"),
                ),
        )
        .subcommand(
            Command::new("scan")
                .about("List model classes with their binary and string columns")
                .arg(root.clone()),
        )
        .subcommand(
            Command::new("history")
                .about("Print the resolution history")
                .arg(root)
                .arg(history)
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
}

/// Default log filter for a `-v` count
pub(crate) fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
