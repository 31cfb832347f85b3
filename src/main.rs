//! Quackers - console test run reporter
//!
//! CLI entry point: replays a JSON-lines stream of test outcomes through the
//! reporter, exactly as a test host would deliver them.

// Allow multiple crate versions from dependencies (can't easily control)
#![allow(clippy::multiple_crate_versions)]

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use quackers::config::debug_requested;
use quackers::telemetry::init_tracing;
use quackers::{describe, ConsoleSink, RawSource, Session};

/// Console test run reporter
///
/// Reads one outcome event per line (JSON) and prints per-test lines and an
/// end-of-run summary. Options come from `QUACKERS_*` environment variables
/// and from `--param` / `--params-file`, which take precedence.
#[derive(Parser, Debug)]
#[command(name = "quackers", version, about)]
struct Cli {
    /// JSON-lines event file (stdin when omitted)
    #[arg(long)]
    events: Option<PathBuf>,

    /// Host parameter, e.g. `-p ShowTotals=true` (repeatable)
    #[arg(short = 'p', long = "param", value_parser = parse_key_val)]
    params: Vec<(String, String)>,

    /// Flat TOML table of host parameters
    #[arg(long)]
    params_file: Option<PathBuf>,

    /// List every option with its default and exit
    #[arg(long)]
    describe: bool,
}

/// Split `KEY=VALUE`. The value may itself contain `=`.
fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Parameters from the file first, then `--param` values on top.
fn collect_params(cli: &Cli) -> Result<RawSource> {
    let mut params = match &cli.params_file {
        Some(path) => RawSource::parameters_from_path(path)?,
        None => RawSource::parameters(Vec::<(String, String)>::new()),
    };
    params.extend(RawSource::parameters(cli.params.iter().cloned()));
    Ok(params)
}

/// One line per option: `name (kind) = default  help`
fn describe_lines() -> Vec<String> {
    describe()
        .iter()
        .map(|option| {
            format!(
                "{:<28} {:<6} = {:<24} {}",
                option.name,
                option.kind().to_string(),
                option.default_value().to_string(),
                option.help
            )
        })
        .collect()
}

fn run(cli: &Cli) -> Result<bool> {
    if cli.describe {
        for line in describe_lines() {
            println!("{line}");
        }
        return Ok(true);
    }

    let env = RawSource::from_env();
    let params = collect_params(cli)?;
    init_tracing(debug_requested(&env, &params));

    let mut err = ConsoleSink::stderr();
    let session = Session::start(&env, &params, ConsoleSink::stdout(), &mut err);

    let totals = match &cli.events {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open events file: {}", path.display()))?;
            session.replay(BufReader::new(file), &mut err)
        }
        None => session.replay(io::stdin().lock(), &mut err),
    };

    Ok(totals.failed == 0)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}
