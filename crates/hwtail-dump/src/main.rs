use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use serde::Serialize;
use tracing::{Level, debug, error};
use tracing_subscriber::EnvFilter;

use hwtail_core::collector::{FileTailer, LogLayout, LogLocator, Reading, RealFs};
use hwtail_core::config::{DEFAULT_EXTENSION, DEFAULT_LOG_DIR, DEFAULT_TAIL_WINDOW};
use hwtail_core::model::MetricSnapshot;
use hwtail_core::{LogSource, SnapshotStore};

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "hwtail-dump",
    about = "Inspect how hwtail reads a sensor log",
    version = hwtail_core::VERSION
)]
struct Cli {
    /// Log file, or directory searched for the newest log file.
    path: Option<PathBuf>,

    /// Extension of log files when PATH is a directory.
    #[arg(long, default_value = DEFAULT_EXTENSION)]
    extension: String,

    /// Bytes read from the end of the log.
    #[arg(long, default_value_t = DEFAULT_TAIL_WINDOW)]
    tail_window: u64,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn source(&self) -> LogSource {
        let path = self
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR));
        if path.is_file() {
            LogSource::File(path)
        } else {
            LogSource::Directory {
                dir: path,
                extension: self.extension.clone(),
            }
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("hwtail_dump={level},hwtail_core={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

// ── Report ───────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct DumpJson {
    file: String,
    delimiter: char,
    columns: usize,
    tail_window: u64,
    mapping: BTreeMap<&'static str, Option<usize>>,
    last_line: Option<String>,
    snapshot: Option<MetricSnapshot>,
}

fn dump(path: &Path, cli: &Cli) -> DumpJson {
    let layout = LogLayout::read(path).unwrap_or_else(|e| {
        error!(error = %e, "cannot map headers");
        process::exit(1);
    });
    debug!(header = %layout.header, "header line");

    let last_line = FileTailer::open_at_end(path, cli.tail_window)
        .and_then(|mut tailer| tailer.read_last_line())
        .unwrap_or_else(|e| {
            error!(error = %e, "cannot read log tail");
            process::exit(1);
        });

    let snapshot = last_line
        .as_deref()
        .and_then(|line| Reading::parse(line, &layout))
        .map(|reading| {
            let store = SnapshotStore::new();
            store.set_source(path);
            store.write(&reading);
            MetricSnapshot::clone(&store.read())
        });

    DumpJson {
        file: path.display().to_string(),
        delimiter: layout.delimiter,
        columns: layout.column_count,
        tail_window: cli.tail_window,
        mapping: layout.columns.iter().map(|(f, c)| (f.key(), c)).collect(),
        last_line,
        snapshot,
    }
}

fn print_text(report: &DumpJson) {
    println!("File: {}", report.file);
    println!("Delimiter: {:?}", report.delimiter);
    println!("Columns: {}", report.columns);
    println!();
    println!("{:<12} COLUMN", "FIELD");
    for (field, column) in &report.mapping {
        match column {
            Some(c) => println!("{field:<12} {c}"),
            None => println!("{field:<12} -"),
        }
    }
    println!();
    match (&report.last_line, &report.snapshot) {
        (Some(line), Some(snapshot)) => {
            println!("Last line: {line}");
            match serde_json::to_string_pretty(snapshot) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("Error serializing snapshot: {e}"),
            }
        }
        (Some(line), None) => println!("Last line is not a record: {line}"),
        (None, _) => println!("No complete line in the last {} bytes", report.tail_window),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let locator = LogLocator::new(RealFs::new(), cli.source());
    let path = locator.locate().unwrap_or_else(|e| {
        error!(error = %e, "no log file");
        process::exit(1);
    });

    let report = dump(&path, &cli);
    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing report: {e}");
                process::exit(1);
            }
        }
    } else {
        print_text(&report);
    }
}
