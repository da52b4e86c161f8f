//! # Report Module
//!
//! Turns stored snapshots into the deduplicated daily series and renders it
//! for the terminal or as JSON. Read-only; may run concurrently with a
//! collection and sees either the pre- or post-insert table.

pub mod daily_series;

use comfy_table::{
    presets,
    Attribute,
    Cell,
    Color,
    ContentArrangement,
    Table,
};

// Re-export the main types for easy access
pub use daily_series::{
    latest_per_provider_date,
    parse_provider_date,
    CounterDelta,
    DailyEntry,
    DailySeries,
};

/// Render the series as a terminal table.
pub fn format(series: &DailySeries) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\nDaily statistics: {} provider dates",
        series.entries.len()
    ));
    if series.skipped_unparsable > 0 {
        output.push_str(&format!(
            " ({} snapshots skipped: unparsable provider label)",
            series.skipped_unparsable
        ));
    }
    output.push('\n');

    if series.entries.is_empty() {
        output.push_str("No data yet. Run the collect command to ingest a snapshot.\n");
        return output;
    }

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Provider Date").add_attribute(Attribute::Bold),
            Cell::new("e-Verified Returns").add_attribute(Attribute::Bold),
            Cell::new("Δ").add_attribute(Attribute::Bold),
            Cell::new("Processed Refunds").add_attribute(Attribute::Bold),
            Cell::new("Δ").add_attribute(Attribute::Bold),
            Cell::new("Registered Users").add_attribute(Attribute::Bold),
            Cell::new("Δ").add_attribute(Attribute::Bold),
            Cell::new("Aadhaar-linked PAN").add_attribute(Attribute::Bold),
            Cell::new("Δ").add_attribute(Attribute::Bold),
            Cell::new("Collected At").add_attribute(Attribute::Bold),
        ]);

    for entry in &series.entries {
        let snapshot = &entry.snapshot;
        table.add_row(vec![
            Cell::new(entry.provider_date.format("%Y-%m-%d")),
            Cell::new(fmt_count(snapshot.e_verified_returns)),
            delta_cell(entry.delta.map(|d| d.e_verified_returns)),
            Cell::new(fmt_count(snapshot.total_processed_refund)),
            delta_cell(entry.delta.map(|d| d.total_processed_refund)),
            Cell::new(fmt_count(snapshot.indv_reg_users)),
            delta_cell(entry.delta.map(|d| d.indv_reg_users)),
            Cell::new(fmt_count(snapshot.total_aadhar_linked_pan)),
            delta_cell(entry.delta.map(|d| d.total_aadhar_linked_pan)),
            Cell::new(snapshot.collected_at.format("%Y-%m-%d %H:%M UTC")),
        ]);
    }

    output.push_str(&format!("{table}\n"));
    output
}

/// Series summary as JSON, for the export file.
pub fn summary(series: &DailySeries) -> serde_json::Value {
    serde_json::json!({
        "provider_dates": series.entries.len(),
        "skipped_unparsable": series.skipped_unparsable,
        "series": &series.entries,
    })
}

fn delta_cell(delta: Option<i64>) -> Cell {
    match delta {
        None => Cell::new("—"),
        Some(0) => Cell::new("0"),
        Some(value) if value > 0 => Cell::new(fmt_delta(value)).fg(Color::Green),
        Some(value) => Cell::new(fmt_delta(value)).fg(Color::Red),
    }
}

/// Thousands-separated rendering, e.g. `1,234,567`.
fn fmt_count(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

fn fmt_delta(value: i64) -> String {
    if value >= 0 {
        format!("+{}", fmt_count(value as u64))
    } else {
        format!("-{}", fmt_count(value.unsigned_abs()))
    }
}
