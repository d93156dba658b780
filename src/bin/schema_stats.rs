use anyhow::{bail, Result};
use std::collections::BTreeMap;
use std::path::Path;
use tracing_subscriber::{fmt, EnvFilter};

use sondagem::{process, ParserConfig, SchemaType};

#[derive(Debug, Default)]
struct SchemaDisplayStats {
    files: usize,
    records: usize,
    min_headers: Option<usize>,
    max_headers: usize,
}

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let Some(dir) = std::env::args().nth(1) else {
        bail!("usage: schema_stats DIR");
    };
    if !Path::new(&dir).is_dir() {
        tracing::error!(path = %dir, "not a directory");
        bail!("'{}' is not a directory", dir);
    }

    let paths = process::collect_inputs(&[dir.as_str()])?;
    tracing::info!("Classifying {} files under {}", paths.len(), dir);

    let mut stats: BTreeMap<SchemaType, SchemaDisplayStats> = SchemaType::ALL
        .iter()
        .map(|s| (*s, SchemaDisplayStats::default()))
        .collect();
    let mut failed = 0usize;

    for (path, res) in process::parse_batch(&paths, &ParserConfig::default()) {
        let report = match res {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(path = %path.display(), "skipped: {:#}", e);
                failed += 1;
                continue;
            }
        };
        let entry = stats.entry(report.schema_type()).or_default();
        let headers = report.headers.len();
        entry.files += 1;
        entry.records += report.records.len();
        entry.min_headers = Some(entry.min_headers.map_or(headers, |m| m.min(headers)));
        entry.max_headers = entry.max_headers.max(headers);
    }

    println!(
        "\n{: <16} {:>8} {:>10} {:>12} {:>12}",
        "Schema", "Files", "Records", "Min Headers", "Max Headers"
    );
    for (schema, s) in &stats {
        println!(
            "{: <16} {:>8} {:>10} {:>12} {:>12}",
            schema.as_str(),
            s.files,
            s.records,
            s.min_headers.map_or_else(|| "-".to_string(), |m| m.to_string()),
            s.max_headers
        );
    }
    if failed > 0 {
        println!("\n{} file(s) could not be read", failed);
    }

    tracing::info!("Schema statistics finished.");
    Ok(())
}
