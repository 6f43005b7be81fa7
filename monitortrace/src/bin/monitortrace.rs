// Copyright (C) 2025 Category Labs, Inc.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use clap::Parser;
use eyre::{Context, Result};
use monitortrace::config::Config;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

static LONG_VERSION: OnceLock<String> = OnceLock::new();

fn get_long_version() -> &'static str {
    LONG_VERSION.get_or_init(|| {
        format!(
            "{} (commit: {})",
            env!("CARGO_PKG_VERSION"),
            env!("GIT_REVISION", "unknown"),
        )
    })
}

#[derive(Parser)]
#[command(name = "monitortrace")]
#[command(about = "convert cluster monitor event logs into chrome trace json")]
#[command(version = None, long_version = get_long_version())]
struct Args {
    #[arg(help = "monitor log to read (defaults to stdin)")]
    input: Option<PathBuf>,

    #[arg(short, long, help = "file to write the trace to (defaults to stdout)")]
    output: Option<PathBuf>,

    #[arg(short, long, help = "configuration file path (toml format)")]
    config: Option<PathBuf>,

    #[arg(
        long,
        value_parser = humantime::parse_duration,
        help = "shortest duration given to complete events, at least 1s (e.g. 1s, 2500ms)"
    )]
    min_duration: Option<Duration>,

    #[arg(long, help = "year assumed for the year-less log timestamps")]
    reference_year: Option<i32>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config path={}", path.display()))?,
        None => Config::default(),
    };
    if let Some(min_duration) = args.min_duration {
        config.min_duration = min_duration;
    }
    if let Some(reference_year) = args.reference_year {
        config.reference_year = reference_year;
    }
    config.validate()?;

    let input: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(File::open(path).with_context(|| {
            format!("failed to open input path={}", path.display())
        })?)),
        None => Box::new(io::stdin().lock()),
    };
    let output: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
            format!("failed to create output path={}", path.display())
        })?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let summary = monitortrace::convert(input, output, &config.translator_options())
        .context("conversion failed")?;

    tracing::info!(
        lines = summary.lines,
        blank_lines = summary.blank_lines,
        events = summary.events,
        processes = summary.processes,
        tracks = summary.tracks,
        open_intervals = summary.open_intervals.len(),
        "trace conversion complete"
    );
    Ok(())
}
