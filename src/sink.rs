use std::{
    fmt::{Debug, Formatter},
    fs,
    path::PathBuf,
    str::FromStr,
};

use bon::Builder;
use chrono::{
    NaiveDate,
    format::{Item, StrftimeItems},
};
use itertools::Itertools;
use serde::Deserialize;

use crate::{aggregate::AggregateTable, prelude::*};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, clap::ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SinkKind {
    /// Copy the table to the system clipboard.
    #[default]
    Clipboard,

    /// Write the table into `<start date>.tsv` in the output directory.
    File,
}

/// Validated `strftime`-like date format.
#[derive(Clone, PartialEq, Eq, serde_with::DeserializeFromStr)]
pub struct DateFormat(String);

impl DateFormat {
    pub const ISO: &str = "%Y-%m-%d";
}

impl Default for DateFormat {
    fn default() -> Self {
        Self(Self::ISO.to_owned())
    }
}

impl Debug for DateFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl FromStr for DateFormat {
    type Err = Error;

    fn from_str(format: &str) -> Result<Self> {
        ensure!(
            !StrftimeItems::new(format).any(|item| matches!(item, Item::Error)),
            "invalid date format `{format}`",
        );
        Ok(Self(format.to_owned()))
    }
}

/// Render the table as tab-separated `date` and whole watt-hours, one line per day.
#[must_use]
pub fn render(table: &AggregateTable, date_format: &DateFormat) -> String {
    table
        .iter()
        .map(|reading| {
            format!("{}\t{:.0}", reading.date.format(&date_format.0), reading.value.round())
        })
        .join("\n")
}

#[must_use]
#[derive(Builder)]
pub struct Sink {
    kind: SinkKind,
    output_dir: PathBuf,
}

impl Sink {
    /// Deliver the rendered table of a run which started on `start`.
    #[instrument(skip_all, fields(kind = ?self.kind))]
    pub fn deliver(&self, start: NaiveDate, text: &str) -> Result {
        match self.kind {
            SinkKind::Clipboard => {
                copy_to_clipboard(text)?;
                info!(n_bytes = text.len(), "copied to the clipboard");
            }
            SinkKind::File => {
                let path = self.file_path(start);
                fs::write(&path, text)
                    .with_context(|| format!("failed to write `{}`", path.display()))?;
                info!(path = %path.display(), "written");
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn file_path(&self, start: NaiveDate) -> PathBuf {
        self.output_dir.join(format!("{}.tsv", start.format(DateFormat::ISO)))
    }
}

/// On X11 the selection is served by this process, so the text disappears on exit
/// unless a clipboard manager takes it over.
#[cfg(feature = "clipboard")]
fn copy_to_clipboard(text: &str) -> Result {
    arboard::Clipboard::new()
        .context("failed to access the clipboard")?
        .set_text(text)
        .context("failed to copy the text to the clipboard")
}

#[cfg(not(feature = "clipboard"))]
fn copy_to_clipboard(_text: &str) -> Result {
    bail!("built without clipboard support, use the file sink instead")
}
