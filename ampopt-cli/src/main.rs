//! ampopt command line tool
//!
//! Runs the AMP optimizer over an HTML document and prints the result.
//! Diagnostics go to stderr, the optimized document to stdout or `--output`.

mod options;

use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Duration;

use ampopt_common::net::{RemoteGetRequest, ReqwestTransport, StubTransport};
use ampopt_dom::DomTree;
use ampopt_optimizer::{ErrorCollection, optimize};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::options::{ConfigArgs, OptimizeArgs};

/// Server-side optimizer for AMP HTML documents
#[derive(Parser, Debug)]
#[command(name = "ampopt")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    ampopt optimize page.html -o page.optimized.html
    cat page.html | ampopt optimize - --no-esm
    ampopt optimize page.html --offline --runtime-styles v0.css --runtime-css-version 012101281735000
    ampopt config --config ampopt.json --get rewriteAmpUrls.ampUrlPrefix

ENVIRONMENT:
    AMPOPT_LOG    Log filter, e.g. AMPOPT_LOG=ampopt_optimizer=debug"#)]
pub struct Cli {
    /// Log more (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Optimize an AMP document
    Optimize(OptimizeArgs),

    /// Print the effective configuration
    Config {
        #[command(flatten)]
        config: ConfigArgs,

        /// Print a single value, e.g. `rewriteAmpUrls.lts`
        #[arg(long, value_name = "KEY")]
        get: Option<String>,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Optimize(args) => run_optimize(&args),
        Command::Config { config, get } => {
            let configuration = config.load()?;
            let value = match get {
                Some(key) => configuration.get(&key)?,
                None => serde_json::to_value(&configuration)?,
            };
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "error",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("AMPOPT_LOG").unwrap_or_else(|_| level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run_optimize(args: &OptimizeArgs) -> Result<ExitCode> {
    let configuration = args.config.load()?;
    let html = read_input(&args.input)?;
    let mut tree = DomTree::parse_html(&html)?;

    let transport: Box<dyn RemoteGetRequest> = if args.offline {
        Box::new(StubTransport::new())
    } else {
        Box::new(ReqwestTransport::with_timeout(Duration::from_secs(args.timeout))?)
    };

    let errors = optimize(&mut tree, &configuration, transport.as_ref())?;
    report(&errors);

    let mut output = tree.to_html();
    output.push('\n');
    match &args.output {
        Some(path) => fs::write(path, output).with_context(|| format!("failed to write {}", path.display()))?,
        None => io::stdout().lock().write_all(output.as_bytes())?,
    }

    if args.strict && !errors.is_empty() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        return io::read_to_string(io::stdin()).context("failed to read stdin");
    }
    fs::read_to_string(input).with_context(|| format!("failed to read {input}"))
}

fn report(errors: &ErrorCollection) {
    for error in errors {
        eprint!("{} {}: {}", "⚠".yellow(), error.kind.bold(), error.message);
        if let Some(element) = &error.element {
            eprint!(" {}", element.dimmed());
        }
        eprintln!();
    }
}
