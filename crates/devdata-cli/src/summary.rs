use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use devdata_cli::types::NormalizeResult;

/// Prints the batch summary to stderr so stdout stays valid JSON.
pub fn print_summary(result: &NormalizeResult) {
    let stats = &result.batch.stats;
    eprintln!("Input: {} ({})", result.input.display(), result.format);
    match &result.output {
        Some(path) => eprintln!("Output: {}", path.display()),
        None => eprintln!("Output: stdout"),
    }

    let mut table = Table::new();
    table.set_header(vec![header_cell("Type"), header_cell("Records")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for (kind, count) in &stats.by_type {
        table.add_row(vec![Cell::new(kind), Cell::new(count)]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(stats.output_records).add_attribute(Attribute::Bold),
    ]);
    eprintln!("{table}");

    let mut details = Table::new();
    details.set_header(vec![header_cell("Check"), header_cell("Count")]);
    apply_table_style(&mut details);
    align_column(&mut details, 1, CellAlignment::Right);
    let rows = [
        ("Input records", stats.input_records, None),
        ("Glucose converted to mg/dL", stats.glucose_converted, None),
        ("Glucose left unconverted (no time)", stats.glucose_unconverted, Some(Color::Yellow)),
        ("Basal segments truncated", stats.basal_truncated, None),
        ("Basal segments open-ended", stats.basal_open_ended, None),
        ("Boluses interrupted", stats.boluses_interrupted, Some(Color::Yellow)),
        ("Wizards joined", stats.wizards_joined, None),
        ("Wizards standalone", stats.wizards_standalone, None),
        ("Passed through", stats.passthrough_records, None),
        ("Records without time", stats.records_without_time, None),
    ];
    for (label, count, highlight) in rows {
        details.add_row(vec![Cell::new(label), count_cell(count, highlight)]);
    }
    eprintln!("{details}");
    eprintln!("Processing completed in {} ms", stats.elapsed_ms);
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, highlight: Option<Color>) -> Cell {
    match highlight {
        Some(color) if count > 0 => Cell::new(count).fg(color).add_attribute(Attribute::Bold),
        _ if count == 0 => dim_cell(count),
        _ => Cell::new(count),
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
