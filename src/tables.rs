use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{aggregate::AggregateTable, date_range::DateRange, quantity::WattHours};

/// Build the console table: a row per day of the range, including the days with no data.
pub fn build_production_table(aggregate: &AggregateTable, range: DateRange) -> Table {
    let mut values: Vec<_> = aggregate.iter().map(|reading| reading.value.0).collect();
    values.sort_by(f64::total_cmp);
    let median = values.get(values.len() / 2).copied().map(WattHours);

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table.set_header(vec!["Date", "Day", "Produced"]);
    for date in range.days() {
        let produced = match aggregate.get(date) {
            Some(value) => Cell::new(value).fg(if median.is_some_and(|median| value >= median) {
                Color::Green
            } else {
                Color::DarkYellow
            }),
            None => Cell::new("missing").fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(date),
            Cell::new(date.format("%a")).add_attribute(Attribute::Dim),
            produced.set_alignment(CellAlignment::Right),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(format!("{}/{} days", aggregate.len(), range.n_days()))
            .add_attribute(Attribute::Dim),
        Cell::new(aggregate.total())
            .add_attribute(Attribute::Bold)
            .set_alignment(CellAlignment::Right),
    ]);
    table
}
