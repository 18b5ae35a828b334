mod config;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgGroup, CommandFactory, Parser};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use config::FileConfig;
use loghuman_logs::{StreamDriver, Variant};

const USAGE: &str = r#"A simple command line utility to transform one line json log messages to a human readable output, for example:

content test.json: { "level": "INFO", "timestamp": "2020-07-14T09:38:14.977Z", "message": "sample output" }
cat test.json | loghuman
tail -f test.json | loghuman
kubectl logs -f -n default pod-name-1 | loghuman"#;

/// Read buffer for stdin; lines longer than this are assembled across reads
const STDIN_BUFFER_BYTES: usize = 64 * 1024;

/// Loghuman - Transforms JSON log messages to a human readable output
#[derive(Parser, Debug)]
#[command(name = "loghuman")]
#[command(author, version, about, long_about = USAGE)]
#[command(group(ArgGroup::new("format").args(["dotnet", "springboot", "zap"])))]
struct Args {
    /// .NET JSON input
    #[arg(short, long)]
    dotnet: bool,

    /// Spring Boot JSON input
    #[arg(short, long)]
    springboot: bool,

    /// Uber zap JSON input
    #[arg(short, long)]
    zap: bool,

    /// Maximum length of a single input line in bytes [default: 1048576]
    #[arg(long, value_name = "BYTES", value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    max_line_bytes: Option<usize>,

    /// Config file (defaults to <config dir>/loghuman/config.toml when present)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Args {
    /// Format selected on the command line; Quarkus has no flag of its own
    fn variant(&self) -> Option<Variant> {
        if self.dotnet {
            Some(Variant::DotNet)
        } else if self.springboot {
            Some(Variant::SpringBoot)
        } else if self.zap {
            Some(Variant::Zap)
        } else {
            None
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Diagnostics go to stderr, stdout carries the converted logs
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr)
        .init();

    if std::io::stdin().is_terminal() {
        eprintln!("Error: input must be piped");
        println!("{}", Args::command().render_long_help());
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` when set, otherwise warnings and above
fn log_filter() -> EnvFilter {
    log_filter_from(&std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default())
}

fn log_filter_from(directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(directives)
}

async fn run(args: Args) -> Result<()> {
    let (file_config, config_path) = FileConfig::discover(args.config.as_deref())?;
    let config = file_config.resolve(args.variant(), args.max_line_bytes);

    tracing::debug!(
        variant = %config.variant,
        max_line_bytes = config.max_line_bytes,
        config_file = ?config_path,
        "starting"
    );

    let input = tokio::io::BufReader::with_capacity(STDIN_BUFFER_BYTES, tokio::io::stdin());
    let mut output = tokio::io::stdout();

    StreamDriver::new(config)
        .run(input, &mut output)
        .await
        .context("failed to convert log stream")?;

    Ok(())
}
