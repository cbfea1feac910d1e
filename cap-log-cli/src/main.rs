//! Capture Log Formatter CLI Application
//!
//! This is the command-line interface for the capture log formatter.
//! It uses the cap-log-decoder library and adds:
//! - Argument parsing and TOML configuration
//! - Output file selection (auto-renamed when the file already exists)
//! - Header emission and console/file output

use anyhow::{Context, Result};
use cap_log_decoder::{Converter, ConvertingIterator};
use clap::Parser;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

mod config;
mod output;

use config::AppConfig;
use output::{unused_path, RecordWriter};

/// Capture Log Formatter - Flatten multi-line packet dumps into one line per packet
#[derive(Parser, Debug)]
#[command(name = "cap-log")]
#[command(about = "Convert tcpdump-style text dumps into single-line formatted records", long_about = None)]
#[command(version)]
struct Args {
    /// Path to capture text file ("-" reads standard input)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file (default: console). An existing file is never overwritten;
    /// a numbered name is chosen instead.
    #[arg(short, long, value_name = "FILE")]
    out_file: Option<PathBuf>,

    /// Output template built from lower-case field names in curly brackets,
    /// e.g. "{date} {src} {dest} {id:D}"
    #[arg(short, long, value_name = "TEMPLATE")]
    format: Option<String>,

    /// Value printed for fields missing from a record
    #[arg(short, long, value_name = "VALUE")]
    default: Option<String>,

    /// Prepend a header line with the template's field names
    #[arg(short = 'H', long)]
    header: bool,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Capture Log Formatter CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", cap_log_decoder::VERSION);

    let config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    // Command line flags take precedence over the configuration file
    let mut formatter_config = config.formatter_config();
    if let Some(template) = &args.format {
        formatter_config = formatter_config.with_template(template.clone());
    }
    if let Some(default) = &args.default {
        formatter_config = formatter_config.with_default_value(default.clone());
    }
    let add_header = args.header || config.format.header;
    let out_file = args.out_file.clone().or_else(|| config.output.file.clone());

    let converter = Converter::new(formatter_config).context("Invalid output format")?;

    let (count, destination) = if args.input.as_os_str() == "-" {
        let stdin = io::stdin();
        let lines = converter.convert_reader(stdin.lock());
        let (writer, destination) = open_writer(out_file.as_deref())?;
        let writer = writer.with_header(add_header.then(|| converter.header()));
        (write_records(lines, writer, "<stdin>")?, destination)
    } else {
        let lines = converter
            .convert_file(&args.input)
            .with_context(|| format!("Cannot read input {:?}", args.input))?;
        let (writer, destination) = open_writer(out_file.as_deref())?;
        let writer = writer.with_header(add_header.then(|| converter.header()));
        let source = args.input.display().to_string();
        (write_records(lines, writer, &source)?, destination)
    };

    if !args.quiet {
        eprintln!("Done! {} events were written to {}.", count, destination);
    }

    Ok(())
}

/// Open the output destination, returning the writer and a printable name
fn open_writer(out_file: Option<&Path>) -> Result<(RecordWriter, String)> {
    match out_file {
        Some(requested) => {
            let path = unused_path(requested);
            if path != requested {
                log::warn!("{:?} already exists, writing to {:?} instead", requested, path);
            }
            let writer = RecordWriter::append_to(&path)?;
            Ok((writer, path.display().to_string()))
        }
        None => Ok((RecordWriter::stdout(), "console".to_string())),
    }
}

/// Drain converted lines into the writer
///
/// On the first conversion error the records already written are flushed
/// before the error is returned.
fn write_records<R: BufRead>(
    mut lines: ConvertingIterator<'_, R>,
    mut writer: RecordWriter,
    source: &str,
) -> Result<usize> {
    while let Some(line) = lines.next() {
        match line {
            Ok(line) => writer.write_record(&line)?,
            Err(e) => {
                let written = writer.finish()?;
                log::error!("Conversion stopped after {} records", written);
                return Err(e).with_context(|| {
                    format!(
                        "Record {} at {}:{}",
                        lines.record_number(),
                        source,
                        lines.line_number()
                    )
                });
            }
        }
    }

    log::debug!("All records converted ({} written)", writer.records_written());
    writer.finish()
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
