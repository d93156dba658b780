use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use sondagem::{process, ParsedReport, ParserConfig};
use std::{path::PathBuf, process::ExitCode, time::Instant};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// One line per file: name, schema, header count, record count
    Summary,
    Json,
    Yaml,
}

/// Classify assessment exports and extract their records
#[derive(Parser, Debug)]
#[command(name = "sondagem")]
#[command(version, about, long_about = None)]
struct Args {
    /// Parser settings (YAML). Flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "summary")]
    format: OutputFormat,

    /// Rows searched for a header line
    #[arg(long)]
    header_scan_limit: Option<usize>,

    /// Files, directories or glob patterns
    #[arg(required = true)]
    inputs: Vec<String>,
}

fn print_reports(reports: &[&ParsedReport], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Summary => {
            println!("{: <40} {: <16} {:>8} {:>8}", "FILE", "SCHEMA", "HEADERS", "RECORDS");
            for r in reports {
                println!(
                    "{: <40} {: <16} {:>8} {:>8}",
                    r.filename,
                    r.schema_type(),
                    r.headers.len(),
                    r.records.len()
                );
            }
        }
        OutputFormat::Json => {
            let out = serde_json::to_string_pretty(reports).context("Failed to encode JSON")?;
            println!("{}", out);
        }
        OutputFormat::Yaml => {
            let out = serde_yaml::to_string(reports).context("Failed to encode YAML")?;
            print!("{}", out);
        }
    }
    Ok(())
}

fn run(args: Args) -> Result<bool> {
    let mut config = match &args.config {
        Some(path) => ParserConfig::from_yaml_file(path)?,
        None => ParserConfig::default(),
    };
    if let Some(limit) = args.header_scan_limit {
        config.header_scan_limit = limit;
    }

    let paths = process::collect_inputs(&args.inputs)?;
    if paths.is_empty() {
        warn!("no input files matched");
        return Ok(true);
    }
    info!("{} files to parse", paths.len());

    let start = Instant::now();
    let results = process::parse_batch(&paths, &config);

    let mut reports = Vec::with_capacity(results.len());
    let mut failed = 0usize;
    for (path, res) in &results {
        match res {
            Ok(report) => reports.push(report),
            Err(e) => {
                failed += 1;
                error!("{}: {:#}", path.display(), e);
            }
        }
    }

    print_reports(&reports, args.format)?;
    info!(parsed = reports.len(), failed, elapsed = ?start.elapsed(), "done");
    if failed > 0 {
        eprintln!("{} file(s) could not be read; check your files", failed);
    }
    Ok(failed == 0)
}

fn main() -> ExitCode {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
