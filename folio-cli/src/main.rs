use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::level_filters::LevelFilter;

use folio_core::{SiteConfig, build_site};

/// Build a single-page document site from markdown files.
///
/// Reads `content/*.md`, resizes images under `content/media/` to 720px
/// wide, and renders everything through `templates.html` into `output/`.
#[derive(Parser)]
#[command(name = "folio", version)]
struct Cli {
    /// Log verbosity, written to stderr
    #[arg(long, value_enum, default_value = "warning", ignore_case = true)]
    log_level: LogLevel,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            // tracing has no level above error
            LogLevel::Error | LogLevel::Critical => LevelFilter::ERROR,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::from(cli.log_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let output_file = build_site(&SiteConfig::default())?;
    println!("Site built successfully: {}", output_file.display());

    Ok(())
}
