use std::io::{self, Write};

use colored::Colorize;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table};
use rust_decimal::Decimal;

use crate::analytics::StoneCount;
use crate::orders::OrderRecord;
use crate::restock::RestockReport;
use crate::stone::Stone;

/// Widest bar drawn in the analytics table.
const MAX_BAR_WIDTH: usize = 40;

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::DynamicFullWidth);
    table
}

fn right(text: impl ToString) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// Format a price as `$12,345.67`.
pub fn format_price(price: Decimal) -> String {
    let mut rounded = price.round_dp(2);
    rounded.rescale(2);
    let text = rounded.abs().to_string();
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::new();
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${grouped}.{cents}")
}

/// Write stones as a table, one row per stone, in the given order.
pub fn write_stones_table<W: Write>(stones: &[Stone], mut writer: W) -> io::Result<()> {
    let mut table = new_table();
    table.set_header(vec![
        "Stock ID",
        "Cut",
        "Carat",
        "Clarity",
        "Cut Quality",
        "Lab",
        "Price",
    ]);
    for stone in stones {
        table.add_row(vec![
            Cell::new(&stone.stock_id),
            Cell::new(&stone.cut),
            right(stone.carat),
            Cell::new(&stone.clarity),
            Cell::new(&stone.cut_quality),
            Cell::new(&stone.lab),
            right(format_price(stone.price)),
        ]);
    }
    writeln!(writer, "{table}")
}

impl OrderRecord {
    /// Human-readable confirmation of a placed order.
    pub fn write_summary<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writeln!(
            writer,
            "{}",
            format!("Order Details for {}:", self.customer_name).bold()
        )?;
        if let Some(id) = self.order_id {
            writeln!(writer, "Order ID: {id}")?;
        }
        writeln!(writer, "Total Stones: {}", self.quantity())?;
        writeln!(writer, "Total Carat: {:.2}", self.total_carat)?;
        writeln!(writer, "Total Price: {}", format_price(self.total_price))?;
        write_stones_table(&self.stones, writer)
    }
}

/// Write one row per order.
pub fn write_orders_table<W: Write>(records: &[OrderRecord], mut writer: W) -> io::Result<()> {
    let mut table = new_table();
    table.set_header(vec![
        "Placed",
        "Customer",
        "Stones",
        "Total Carat",
        "Total Price",
        "Stock IDs",
    ]);
    for record in records {
        let placed = record
            .placed_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let ids = record
            .stones
            .iter()
            .map(|s| s.stock_id.as_str())
            .collect::<Vec<_>>()
            .join(",");
        table.add_row(vec![
            Cell::new(placed),
            Cell::new(&record.customer_name),
            right(record.quantity()),
            right(format!("{:.2}", record.total_carat)),
            right(format_price(record.total_price)),
            Cell::new(ids),
        ]);
    }
    writeln!(writer, "{table}")
}

impl RestockReport {
    /// Write the report as a table, highlighting low-stock groups.
    pub fn write_table<W: Write>(&self, mut writer: W) -> io::Result<()> {
        let mut table = new_table();
        table.set_header(vec![
            "Cut",
            "Clarity",
            "Stock",
            "Sold",
            "Remaining",
            "Low Stock",
        ]);
        for row in self.rows() {
            let flag = if row.remaining_stock <= 0 {
                Cell::new("OUT").fg(Color::Red)
            } else if row.low_stock {
                Cell::new("LOW").fg(Color::Yellow)
            } else {
                Cell::new("")
            };
            table.add_row(vec![
                Cell::new(&row.cut),
                Cell::new(&row.clarity),
                right(row.stock_quantity),
                right(row.sold_quantity),
                right(row.remaining_stock),
                flag,
            ]);
        }
        writeln!(writer, "{table}")
    }
}

/// Write stone counts with a proportional bar per row.
pub fn write_stone_counts_table<W: Write>(counts: &[StoneCount], mut writer: W) -> io::Result<()> {
    let max = counts.iter().map(|c| c.stone_count).max().unwrap_or(0);
    let mut table = new_table();
    table.set_header(vec!["Cut", "Carat", "Stones", ""]);
    for count in counts {
        let width = if max == 0 {
            0
        } else {
            (count.stone_count * MAX_BAR_WIDTH).div_ceil(max)
        };
        table.add_row(vec![
            Cell::new(&count.cut),
            right(count.carat),
            right(count.stone_count),
            Cell::new("█".repeat(width)).fg(Color::Cyan),
        ]);
    }
    writeln!(writer, "{table}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(dec!(0)), "$0.00");
        assert_eq!(format_price(dec!(999.5)), "$999.50");
        assert_eq!(format_price(dec!(1234.567)), "$1,234.57");
        assert_eq!(format_price(dec!(1234567)), "$1,234,567.00");
        assert_eq!(format_price(dec!(-2500.1)), "-$2,500.10");
    }

    #[test]
    fn test_order_summary_lists_totals() {
        colored::control::set_override(false);
        let stone = Stone {
            stock_id: "R1".to_string(),
            cut: "Round".to_string(),
            carat: dec!(1.25),
            clarity: "VS1".to_string(),
            cut_quality: "Excellent".to_string(),
            lab: "GIA".to_string(),
            price: dec!(12500),
            attributes: Default::default(),
        };
        let record = OrderRecord::new("Alice", vec![stone]);

        let mut out = Vec::new();
        record.write_summary(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Order Details for Alice:"));
        assert!(text.contains("Total Stones: 1"));
        assert!(text.contains("Total Carat: 1.25"));
        assert!(text.contains("Total Price: $12,500.00"));
        assert!(text.contains("R1"));
    }
}
