use std::{
    fmt::{Debug, Display, Formatter},
    iter,
};

use chrono::{Datelike, Days, NaiveDate};

use crate::prelude::*;

/// Calendar date range, both ends inclusive.
#[must_use]
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Debug for DateRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}

impl DateRange {
    pub fn try_new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        ensure!(start <= end, "the start date {start} is after the end date {end}");
        Ok(Self { start, end })
    }

    /// The entire calendar month preceding the one `today` is in.
    pub fn previous_month(today: NaiveDate) -> Result<Self> {
        let end = today
            .checked_sub_days(Days::new(today.day().into()))
            .with_context(|| format!("there is no month before {today}"))?;
        let start = end.with_day(1).context("the month has no first day")?;
        Self::try_new(start, end)
    }

    /// Number of calendar days covered.
    #[must_use]
    pub fn n_days(self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    #[must_use]
    pub fn contains(self, date: NaiveDate) -> bool {
        (self.start <= date) && (date <= self.end)
    }

    /// Iterate over every date in the range.
    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take_while(move |date| *date <= self.end)
    }

    /// Split into consecutive chunks of at most `max_days + 1` days each.
    ///
    /// Each chunk starts `max_days + 1` days after the previous one, and the last chunk
    /// is clamped to the end of the range.
    pub fn split(self, max_days: u32) -> impl Iterator<Item = Self> {
        let span = Days::new(u64::from(max_days));
        let step = Days::new(u64::from(max_days) + 1);
        iter::successors(Some(self.start), move |start| {
            start.checked_add_days(step).filter(|next| *next <= self.end)
        })
        .map(move |start| {
            let end = start.checked_add_days(span).map_or(self.end, |end| end.min(self.end));
            Self { start, end }
        })
    }
}
