//! `docfill extract` -- print a template's placeholder inventory.

use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use docfill_core::template::{ParsedTemplate, parse_template, to_display};
use docfill_types::placeholder::Confidence;

pub async fn extract(file: &Path, json: bool) -> Result<()> {
    let source = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let parsed = parse_template(&source);

    if json {
        println!("{}", serde_json::to_string_pretty(&parsed.placeholders)?);
        return Ok(());
    }

    if parsed.is_empty() {
        println!();
        println!("  {} No placeholders found in {}", style("○").dim(), file.display());
        println!();
        return Ok(());
    }

    println!("{}", inventory_table(&parsed));
    println!(
        "  {} placeholder(s) in {}",
        style(parsed.placeholders.len()).bold(),
        style(file.display()).cyan()
    );
    Ok(())
}

fn inventory_table(parsed: &ParsedTemplate) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Key").fg(Color::White),
        Cell::new("Display").fg(Color::White),
        Cell::new("Kind").fg(Color::White),
        Cell::new("Confidence").fg(Color::White),
        Cell::new("Label").fg(Color::White),
        Cell::new("Occurrences").fg(Color::White),
    ]);

    for placeholder in &parsed.placeholders {
        let confidence = match placeholder.kind.confidence() {
            Confidence::High => Cell::new("high").fg(Color::Green),
            Confidence::Low => Cell::new("low").fg(Color::Yellow),
        };
        table.add_row(vec![
            Cell::new(&placeholder.key).fg(Color::Cyan),
            Cell::new(to_display(&placeholder.key)),
            Cell::new(placeholder.kind.to_string()),
            confidence,
            Cell::new(placeholder.label.as_deref().unwrap_or("")).fg(Color::DarkGrey),
            Cell::new(placeholder.occurrences.len()),
        ]);
    }
    table
}
