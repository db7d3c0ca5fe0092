use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

use crate::sink::{DateFormat, SinkKind};

/// Every option falls back to the settings file, and then to the built-in default.
#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    /// First day to fetch, for example: `2025-07-01`.
    ///
    /// Without the dates, the entire previous calendar month is fetched.
    #[clap(requires = "to")]
    pub from: Option<NaiveDate>,

    /// Last day to fetch, inclusive.
    #[clap(requires = "from")]
    pub to: Option<NaiveDate>,

    /// TOML settings file. `fronius.toml` is picked up when it exists.
    #[clap(long, env = "FRONIUS_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Inverter host name or IP address, optionally with a port.
    #[clap(long, env = "FRONIUS_INVERTER")]
    pub inverter: Option<String>,

    /// Maximum number of days a single request spans, not counting its first day.
    #[clap(long, env = "FRONIUS_MAX_DAYS")]
    pub max_days: Option<u32>,

    /// Request timeout.
    #[clap(long, env = "FRONIUS_TIMEOUT")]
    pub timeout: Option<humantime::Duration>,

    /// Where to deliver the table.
    #[clap(long, value_enum, env = "FRONIUS_SINK")]
    pub sink: Option<SinkKind>,

    /// Directory for the file sink.
    #[clap(long, env = "FRONIUS_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output date format, for example: `%-m/%-d/%Y`.
    #[clap(long, env = "FRONIUS_DATE_FORMAT")]
    pub date_format: Option<DateFormat>,
}
