use std::collections::{BTreeMap, btree_map::Entry};

use chrono::NaiveDate;

use crate::{date_range::DateRange, prelude::*, quantity::WattHours};

/// Daily energy production on a specific date.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EnergyReading {
    pub date: NaiveDate,
    pub value: WattHours,
}

/// Merged daily readings, ordered by date.
///
/// A date gets written at most once: the first reading wins and later ones are ignored.
#[must_use]
#[derive(Default)]
pub struct AggregateTable(BTreeMap<NaiveDate, WattHours>);

impl AggregateTable {
    /// Insert the reading unless its date is already present.
    ///
    /// Returns whether the reading got inserted.
    pub fn insert(&mut self, reading: EnergyReading) -> bool {
        match self.0.entry(reading.date) {
            Entry::Vacant(entry) => {
                entry.insert(reading.value);
                true
            }
            Entry::Occupied(entry) => {
                debug!(
                    date = %reading.date,
                    kept = ?entry.get(),
                    ignored = ?reading.value,
                    "duplicate reading",
                );
                false
            }
        }
    }

    /// Merge the readings and return the number of newly inserted ones.
    pub fn merge(&mut self, readings: impl IntoIterator<Item = EnergyReading>) -> usize {
        readings.into_iter().filter(|reading| self.insert(*reading)).count()
    }

    #[must_use]
    pub fn get(&self, date: NaiveDate) -> Option<WattHours> {
        self.0.get(&date).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the readings in ascending date order.
    pub fn iter(&self) -> impl Iterator<Item = EnergyReading> + '_ {
        self.0.iter().map(|(date, value)| EnergyReading { date: *date, value: *value })
    }

    #[must_use]
    pub fn total(&self) -> WattHours {
        self.0.values().copied().sum()
    }

    /// Dates of the range which have no reading.
    pub fn missing_days(&self, range: DateRange) -> impl Iterator<Item = NaiveDate> + '_ {
        range.days().filter(|date| !self.0.contains_key(date))
    }
}
