//! Human-readable validation summary tables.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use cdp_model::{CheckName, CheckResult, CheckStatus, ValidationReport};

pub fn print_report(report: &ValidationReport) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Check"),
        header_cell("Status"),
        header_cell("Message"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);

    for result in ordered_results(report) {
        table.add_row(vec![
            Cell::new(result.check.as_str())
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            status_cell(result.status),
            Cell::new(&result.message),
        ]);
    }
    println!("{table}");

    let summary = &report.summary;
    println!(
        "Checks: {} total, {} passed, {} failed, {} warnings ({}% success)",
        summary.total_checks, summary.passed, summary.failed, summary.warnings,
        summary.success_rate
    );
}

/// Results in battery order rather than bucket order.
fn ordered_results(report: &ValidationReport) -> Vec<&CheckResult> {
    let mut results: Vec<&CheckResult> = report
        .results
        .passed
        .iter()
        .chain(&report.results.failed)
        .chain(&report.results.warnings)
        .collect();
    results.sort_by_key(|result| battery_rank(result.check));
    results
}

fn battery_rank(check: CheckName) -> u8 {
    match check {
        CheckName::SchemaValidation => 0,
        CheckName::NullValidation => 1,
        CheckName::DuplicateDetection => 2,
        CheckName::RowCountValidation => 3,
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
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

fn status_cell(status: CheckStatus) -> Cell {
    match status {
        CheckStatus::Passed => Cell::new("PASSED")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
        CheckStatus::Failed => Cell::new("FAILED")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        CheckStatus::Warning => Cell::new("WARNING").fg(Color::Yellow),
    }
}
