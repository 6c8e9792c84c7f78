//! Capture a document snapshot to Markdown
//!
//! Replays a JSON document snapshot through a virtualizing viewport and runs
//! one full capture over it.
//!
//! Usage:
//!   cargo run --release --bin capture_snapshot -- doc.json
//!   cargo run --release --bin capture_snapshot -- doc.json --config capture.json --output doc.md
//!   RUST_LOG=vdom_capture=trace cargo run --bin capture_snapshot -- doc.json

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use vdom_capture::capture::CaptureEngine;
use vdom_capture::config::CaptureConfig;
use vdom_capture::snapshot::DocumentSnapshot;

struct CliConfig {
    snapshot: PathBuf,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    verbose: bool,
}

impl CliConfig {
    fn from_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();
        let mut snapshot = None;
        let mut config = None;
        let mut output = None;
        let mut verbose = false;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--config" | "-c" => {
                    i += 1;
                    let path = args.get(i).ok_or("--config needs a path")?;
                    config = Some(PathBuf::from(path));
                },
                "--output" | "-o" => {
                    i += 1;
                    let path = args.get(i).ok_or("--output needs a path")?;
                    output = Some(PathBuf::from(path));
                },
                "--verbose" | "-v" => {
                    verbose = true;
                },
                "--help" | "-h" => return Err(usage()),
                other if other.starts_with('-') => {
                    return Err(format!("unknown option {}\n{}", other, usage()));
                },
                other => {
                    snapshot = Some(PathBuf::from(other));
                },
            }
            i += 1;
        }

        Ok(Self {
            snapshot: snapshot.ok_or_else(usage)?,
            config,
            output,
            verbose,
        })
    }
}

fn usage() -> String {
    "usage: capture_snapshot <snapshot.json> [--config <cfg.json>] [--output <file>] [--verbose]"
        .to_string()
}

fn run(cli: &CliConfig) -> vdom_capture::Result<()> {
    let config = match &cli.config {
        Some(path) => CaptureConfig::from_json_file(path)?,
        None => CaptureConfig::default(),
    };

    let snapshot = DocumentSnapshot::from_path(&cli.snapshot)?;
    let identity = snapshot.document_identity();
    let mut document = snapshot.into_document();
    let engine = CaptureEngine::new(identity, config)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    let start = Instant::now();
    let report = runtime.block_on(engine.start_capture(&mut document))?;

    for warning in &report.warnings {
        eprintln!("warning: {}", warning);
    }
    if cli.verbose {
        eprintln!(
            "session {}: {} units, {} steps, {} passes, {} dropped in {:.2}s",
            report.session_id,
            report.stats.units,
            report.stats.steps,
            report.stats.passes,
            report.stats.dropped_units,
            start.elapsed().as_secs_f64()
        );
    }

    match &cli.output {
        Some(path) => fs::write(path, &report.text)?,
        None => println!("{}", report.text),
    }
    Ok(())
}

fn main() {
    let cli = match CliConfig::from_args() {
        Ok(cli) => cli,
        Err(message) => {
            eprintln!("{}", message);
            std::process::exit(2);
        },
    };

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
