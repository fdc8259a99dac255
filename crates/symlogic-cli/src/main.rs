//! symlogic - convert Python logical expressions to symbolic-algebra calls
//!
//! Each positional argument is converted and printed on its own line. With no
//! arguments, every non-empty line of standard input is converted instead.

use anyhow::Context;
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use symlogic_cli::{Converter, DriverConfig, OutputFormat};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// symlogic CLI
#[derive(Parser)]
#[command(name = "symlogic")]
#[command(about = "Convert Python logical expressions to symbolic-algebra calls", long_about = None)]
#[command(version)]
struct Cli {
    /// Expressions to convert (read from stdin, one per line, when omitted)
    expressions: Vec<String>,

    /// Configuration file path
    #[arg(short, long, env = "SYMLOGIC_CONFIG")]
    config: Option<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Deepest expression nesting accepted
    #[arg(long)]
    max_depth: Option<usize>,

    /// Only check that the expressions use supported constructs
    #[arg(long)]
    check: bool,

    /// Log level
    #[arg(long, env = "SYMLOGIC_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "SYMLOGIC_LOG_JSON")]
    log_json: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = DriverConfig::load(cli.config.as_deref())
        .with_context(|| "Failed to load configuration")?;

    // Override with CLI args
    if let Some(format) = cli.format {
        config.format = format;
    }
    if let Some(max_depth) = cli.max_depth {
        config.max_depth = max_depth;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.log_json;

    // Initialize tracing; stdout carries results only
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }

    let converter = Converter::new(config);
    let inputs = if cli.expressions.is_empty() {
        read_stdin_lines()?
    } else {
        cli.expressions
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut failed = false;

    for source in &inputs {
        let result = if cli.check {
            converter.check(source).map(|()| "ok".to_string())
        } else {
            converter.render(source)
        };

        match result {
            Ok(output) => writeln!(out, "{}", output).context("Failed to write output")?,
            Err(e) => {
                failed = true;
                eprintln!("error: {}", e);
            }
        }
    }

    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

fn read_stdin_lines() -> anyhow::Result<Vec<String>> {
    let mut lines = Vec::new();
    for line in io::stdin().lock().lines() {
        let line = line.context("Failed to read standard input")?;
        if !line.trim().is_empty() {
            lines.push(line);
        }
    }
    Ok(lines)
}
