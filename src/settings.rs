use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::NaiveDate;
use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};

use crate::{
    cli::Args,
    date_range::DateRange,
    prelude::*,
    sink::{DateFormat, Sink, SinkKind},
};

const DEFAULT_SETTINGS_PATH: &str = "fronius.toml";

/// The inverter refuses to return more than 16 days at once.
const DEFAULT_MAX_DAYS: u32 = 15;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Optional settings file, for example:
///
/// ```toml
/// inverter = "192.168.2.31"
/// max_days = 15
/// timeout = "30s"
/// sink = "file"
/// output_dir = "reports"
/// date_format = "%d.%m.%Y"
/// ```
#[serde_as]
#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub inverter: Option<String>,

    pub max_days: Option<u32>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub timeout: Option<humantime::Duration>,

    pub sink: Option<SinkKind>,

    pub output_dir: Option<PathBuf>,

    pub date_format: Option<DateFormat>,
}

impl Settings {
    /// Read the explicitly specified settings file, or the default one when it exists.
    #[instrument(skip_all)]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::read(path),
            None if Path::new(DEFAULT_SETTINGS_PATH).is_file() => {
                Self::read(Path::new(DEFAULT_SETTINGS_PATH))
            }
            None => Ok(Self::default()),
        }
    }

    fn read(path: &Path) -> Result<Self> {
        info!(path = %path.display(), "reading the settings…");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("failed to parse `{}`", path.display()))
    }
}

/// Fully resolved run configuration.
#[must_use]
pub struct Config {
    pub range: DateRange,
    pub inverter: String,
    pub max_days: u32,
    pub timeout: Duration,
    pub sink: SinkKind,
    pub output_dir: PathBuf,
    pub date_format: DateFormat,
}

impl Config {
    /// Merge the command-line arguments over the settings file.
    ///
    /// `today` determines the default range, which is the previous calendar month.
    pub fn resolve(args: Args, settings: Settings, today: NaiveDate) -> Result<Self> {
        let inverter = args.inverter.or(settings.inverter).context(
            "the inverter address is not configured: \
             pass `--inverter`, set `FRONIUS_INVERTER`, or add `inverter` to the settings file",
        )?;
        let range = match (args.from, args.to) {
            (Some(from), Some(to)) => DateRange::try_new(from, to)?,
            _ => DateRange::previous_month(today)?,
        };
        Ok(Self {
            range,
            inverter,
            max_days: args.max_days.or(settings.max_days).unwrap_or(DEFAULT_MAX_DAYS),
            timeout: args.timeout.or(settings.timeout).map_or(DEFAULT_TIMEOUT, Into::into),
            sink: args.sink.or(settings.sink).unwrap_or_default(),
            output_dir: args.output_dir.or(settings.output_dir).unwrap_or_else(|| ".".into()),
            date_format: args.date_format.or(settings.date_format).unwrap_or_default(),
        })
    }

    pub fn sink(&self) -> Sink {
        Sink::builder().kind(self.sink).output_dir(self.output_dir.clone()).build()
    }
}
