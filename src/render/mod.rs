// src/render/mod.rs
use crate::extractors::table::{union_columns, Record};
use unicode_width::UnicodeWidthStr;

/// Renders records as an outlined text grid, e.g.
///
/// ```text
/// +-------+-----+
/// | Name  | Age |
/// +=======+=====+
/// | Alice | 30  |
/// | Bob   | 25  |
/// +-------+-----+
/// ```
///
/// Columns are the union of all record keys. Returns an empty string for no records.
pub fn render_outline(records: &[Record]) -> String {
    let columns = union_columns(records);
    if columns.is_empty() {
        return String::new();
    }

    let rows: Vec<Vec<&str>> = records
        .iter()
        .map(|record| columns.iter().map(|c| record.get(c).unwrap_or("")).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            rows.iter()
                .map(|row| display_width(row[i]))
                .chain(std::iter::once(display_width(column)))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    out.push_str(&border(&widths, '-'));
    out.push_str(&line(columns.iter().map(String::as_str), &widths));
    out.push_str(&border(&widths, '='));
    for row in &rows {
        out.push_str(&line(row.iter().copied(), &widths));
    }
    out.push_str(&border(&widths, '-'));
    out
}

// Cells may span several lines in the source markup; keep the grid one line per row
fn flatten(cell: &str) -> String {
    cell.split_whitespace().collect::<Vec<_>>().join(" ")
}

// Terminal columns, so wide CJK and emoji cells stay aligned
fn display_width(cell: &str) -> usize {
    flatten(cell).width()
}

fn border(widths: &[usize], fill: char) -> String {
    let mut out = String::from("+");
    for width in widths {
        out.extend(std::iter::repeat(fill).take(width + 2));
        out.push('+');
    }
    out.push('\n');
    out
}

fn line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let mut out = String::from("|");
    for (cell, width) in cells.zip(widths) {
        let text = flatten(cell);
        let pad = width - text.width();
        out.push(' ');
        out.push_str(&text);
        out.extend(std::iter::repeat(' ').take(pad + 1));
        out.push('|');
    }
    out.push('\n');
    out
}
