//! Structural XML diff tool CLI.

use std::fs::File;
use std::io::{self, BufWriter, Write};

use clap::Parser;
use psdiff::{
    DiffConfig, Differ, TextGranularity, WhitespacePolicy, XmlDiffOutput, XmlLoader,
};

/// Structural XML diff tool
#[derive(Parser)]
#[command(name = "psdiff")]
#[command(version)]
#[command(about = "Block-aware structural XML diff", long_about = None)]
struct Cli {
    /// Source file (the "from" version)
    from: String,
    /// Target file (the "to" version)
    to: String,
    /// Output file (default: stdout)
    output: Option<String>,

    /// Similarity threshold for matching blocks (0.0 to 1.0)
    #[arg(short = 't', long, default_value = "0.5")]
    threshold: f32,

    /// Text granularity: text, word or character
    #[arg(short = 'g', long, default_value = "word")]
    granularity: String,

    /// Strip ignorable whitespace before diffing
    #[arg(short = 's', long)]
    strip_whitespace: bool,

    /// Maximum number of diff events before giving up
    #[arg(long, default_value_t = DiffConfig::DEFAULT_MAX_EVENTS)]
    max_events: usize,
}

fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let granularity = match cli.granularity.as_str() {
        "text" => TextGranularity::Text,
        "word" => TextGranularity::Word,
        "character" => TextGranularity::Character,
        other => return Err(format!("unknown granularity: {other}").into()),
    };

    let loader = XmlLoader::new(granularity);
    let from = loader.load_file(&cli.from)?;
    let to = loader.load_file(&cli.to)?;

    let mut config = DiffConfig::default();
    config.similarity_threshold = cli.threshold;
    config.max_events = cli.max_events;
    if cli.strip_whitespace {
        config.whitespace = WhitespacePolicy::Strip;
    }

    let writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout()),
    };

    let differ = Differ::with_config(config);
    let mut output = XmlDiffOutput::new(writer);
    let report = differ.diff(&from, &to, &mut output)?;
    let mut writer = output.finish()?;
    writeln!(writer)?;
    writer.flush()?;

    if report.used_fallback {
        eprintln!("Note: structural diff was unbalanced, used flat comparison.");
    }
    Ok(())
}
