use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use ringdump::ring::{
    pump_all, render_json, render_text, simulate, RingCollector, Source, DEFAULT_CHUNK_SIZE,
    DEFAULT_MAX_SIZE, DEFAULT_RING,
};
use ringdump::utils::{check_sources, parse_chunk_size, parse_size, parse_source};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ringdump", version, about = "Collects debug dump fragments into bounded ring buffers", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Feed sources into ring buffers and print what is retained
    Collect {
        /// Sources as NAME=PATH or PATH, "-" reads stdin [default: default=-]
        #[arg(value_parser = parse_source)]
        sources: Vec<Source>,
        /// Byte budget of each ring
        #[arg(short, long, value_parser = parse_size, default_value_t = DEFAULT_MAX_SIZE)]
        max_size: usize,
        /// Largest fragment read from a source at once
        #[arg(short, long, value_parser = parse_chunk_size, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Append records of the given lengths to an empty ring and show what survives
    Simulate {
        /// Byte budget of the ring
        #[arg(short, long, value_parser = parse_size)]
        max_size: usize,
        /// Record lengths in append order
        #[arg(required = true)]
        lengths: Vec<usize>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}={}", env!("CARGO_CRATE_NAME"), level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn collect(
    sources: Vec<Source>,
    max_size: usize,
    chunk_size: usize,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let sources = if sources.is_empty() {
        vec![Source::stdin(DEFAULT_RING)]
    } else {
        sources
    };
    check_sources(&sources).map_err(anyhow::Error::msg)?;

    let collector = RingCollector::new();
    for source in &sources {
        collector
            .register(&source.name, max_size)
            .await
            .with_context(|| format!("failed to set up ring for {}", source.name))?;
    }

    let mut failed = 0;
    for (name, result) in pump_all(&collector, &sources, chunk_size).await {
        match result {
            Ok(summary) => tracing::info!(
                ring = %name,
                fragments = summary.fragments,
                bytes = summary.bytes,
                "Collected source"
            ),
            Err(e) => {
                tracing::error!(ring = %name, "Source failed: {}", e);
                failed += 1;
            }
        }
    }

    let report = collector.report().await;
    match format {
        OutputFormat::Json => println!("{}", render_json(&report)?),
        OutputFormat::Text => print!("{}", render_text(&report)),
    }

    if failed > 0 {
        bail!("{} of {} sources failed", failed, sources.len());
    }
    Ok(())
}

fn print_simulation(max_size: usize, lengths: &[usize]) {
    println!("{} {} bytes", "Ring budget:".bold(), max_size);
    for step in simulate(max_size, lengths) {
        let status = if step.status.is_success() {
            step.status.as_str().green()
        } else {
            step.status.as_str().red()
        };
        println!(
            "  append {:>8} B  {:<32} {:>8}/{} B  {:?}",
            step.len, status, step.size, max_size, step.retained
        );
    }
}

#[tokio::main]
async fn main() {
    let cli: Cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Collect {
            sources,
            max_size,
            chunk_size,
            format,
        } => collect(sources, max_size, chunk_size, format).await,
        Commands::Simulate { max_size, lengths } => {
            print_simulation(max_size, &lengths);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}
