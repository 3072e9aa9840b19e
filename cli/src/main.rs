use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use solomon_checker::{load_indirect, load_summary, run_audit};

#[derive(Parser)]
#[command(name = "solomon")]
#[command(about = "Filesystem summary consistency checker", long_about = None)]
struct Cli {
    /// Directory holding the decoded summary files (super.csv, group.csv,
    /// bitmap.csv, inode.csv, directory.csv, optionally indirect.csv)
    summary_dir: PathBuf,

    /// Write the report to this file instead of standard output
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emit the report as JSON instead of finding lines
    #[arg(long)]
    json: bool,

    /// Log the audit's progress at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    let summary = load_summary(&cli.summary_dir)
        .with_context(|| format!("loading summary from {}", cli.summary_dir.display()))?;
    let indirect = load_indirect(&cli.summary_dir)?;
    let report = run_audit(&summary, &indirect);

    let rendered = if cli.json {
        let mut text = serde_json::to_string_pretty(&report)?;
        text.push('\n');
        text
    } else {
        let mut text = String::new();
        for finding in &report.findings {
            text.push_str(&finding.to_string());
            text.push('\n');
        }
        text
    };

    match cli.output {
        Some(path) => fs::write(&path, rendered)
            .with_context(|| format!("writing report to {}", path.display()))?,
        None => std::io::stdout().lock().write_all(rendered.as_bytes())?,
    }

    // Findings are the expected output, not a failure; only a load
    // error exits nonzero.
    Ok(())
}
