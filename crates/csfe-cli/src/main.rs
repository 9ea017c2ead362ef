//! `csfe` binary

mod cli;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::ArgMatches;
use csfe_core::{history_path, scan, ConsolePrompt, Prompt, Runner, ScriptedPrompt, Settings};
use csfe_model::{AdapterFlavor, HistoryStore};

fn init_tracing(verbose: u8) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli::log_level(verbose))),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn root_of(args: &ArgMatches) -> PathBuf {
    args.get_one::<PathBuf>("root")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."))
}

fn run(args: &ArgMatches) -> anyhow::Result<ExitCode> {
    let mut settings = Settings::from_env().context("invalid environment")?;
    if let Some(flavor) = args.get_one::<String>("adapter") {
        let flavor: AdapterFlavor = flavor.parse()?;
        settings = settings.with_adapter(flavor);
    }
    let root = root_of(args);
    let mut runner = Runner::new(settings, &root);
    if let Some(path) = args.get_one::<PathBuf>("history") {
        runner = runner.with_history_path(path);
    }

    let mut prompt: Box<dyn Prompt> = match args.get_one::<PathBuf>("answers") {
        Some(path) => Box::new(
            ScriptedPrompt::from_file(path)
                .with_context(|| format!("cannot read answers from {}", path.display()))?,
        ),
        None => Box::new(ConsolePrompt::stdio()),
    };

    let report = runner.run(prompt.as_mut())?;
    println!("{report}");
    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn list(root: &Path) -> anyhow::Result<ExitCode> {
    for entry in scan(root)? {
        println!("{}::{}", entry.path.display(), entry.class);
        println!("  binary: {}", entry.binary.join(", "));
        println!("  string: {}", entry.strings.join(", "));
    }
    Ok(ExitCode::SUCCESS)
}

fn show_history(args: &ArgMatches) -> anyhow::Result<ExitCode> {
    let settings = Settings::from_env().context("invalid environment")?;
    let root = root_of(args);
    let path = history_path(
        args.get_one::<PathBuf>("history").map(PathBuf::as_path),
        &settings,
        &root,
    );
    if !path.exists() {
        anyhow::bail!("no history at {}", path.display());
    }
    let history = HistoryStore::open(&path)?;
    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(history.tree())?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", path.display());
    for class in history.tree().keys() {
        println!("{class}");
        for (field, state) in history.decode_class(class)? {
            match state.resolved() {
                Some(resolution) => println!("  {field}: {resolution}"),
                None => println!("  {field}: partially resolved"),
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let matches = cli::command().get_matches();
    init_tracing(matches.get_count("verbose"));

    let result = match matches.subcommand() {
        Some(("run", args)) => run(args),
        Some(("scan", args)) => list(&root_of(args)),
        Some(("history", args)) => show_history(args),
        _ => Ok(ExitCode::FAILURE),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
