//! Terminal output: banner, capacity tables, item listings.

use std::path::Path;

use anyhow::Result;
use bytesize::ByteSize;
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use console::{Term, style};
use figlet_rs::FIGfont;

use crate::config::{APP_NAME, LAYER_COUNT};
use crate::item::Item;

/// Clears the terminal screen.
pub fn clear_screen() -> Result<()> {
    Term::stdout().clear_screen()?;
    Ok(())
}

/// Prints the application banner.
pub fn print_banner() {
    let banner = match FIGfont::standard() {
        Ok(font) => font.convert(APP_NAME).map_or_else(|| APP_NAME.to_owned(), |figure| figure.to_string()),
        Err(_) => APP_NAME.to_owned(),
    };

    println!("{}", style(banner).green().bold());
}

/// Renders the per-layer capacity report of a carrier.
pub fn show_capacity(path: &Path, layers: &[u64; LAYER_COUNT]) {
    let total_bits: u64 = layers.iter().sum();

    println!();
    println!("{} {}", style("Carrier:").bold(), path.display());

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Bit layer", "Capacity (bits)", "Capacity"]);

    for (layer, bits) in layers.iter().enumerate() {
        table.add_row(vec![
            Cell::new(layer),
            Cell::new(bits),
            Cell::new(ByteSize::b(bits / 8)),
        ]);
    }
    table.add_row(vec![Cell::new("total"), Cell::new(total_bits), Cell::new(ByteSize::b(total_bits / 8))]);

    println!("{table}");
    println!(
        "  {}",
        style("Usable payload is lower: container framing, integrity digest and encryption padding take their share.").dim()
    );
}

/// Lists items recovered from a carrier.
pub fn show_items(items: &[Item]) {
    if items.is_empty() {
        println!("{}", style("No hidden items found").yellow());
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["No", "Name", "Type", "Size", "Status"]);

    for (i, item) in items.iter().enumerate() {
        let (size, status) = match &item.decoded_data {
            Some(data) => (ByteSize::b(data.len() as u64).to_string(), style("decoded").green()),
            None => (ByteSize::b(item.encoded_data.len() as u64).to_string(), style("locked").red()),
        };

        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&item.name),
            Cell::new(&item.content_type),
            Cell::new(size),
            Cell::new(status),
        ]);
    }

    println!("{table}");
}

/// Success message after an output file is produced.
pub fn show_success(action: &str, path: &Path) {
    println!();
    println!("{} {}", style("✓").green(), style(format!("{action}: {}", path.display())).bold());
}
