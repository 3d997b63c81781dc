use std::fmt::Write as _;

use agro_catalog::prelude::*;
use serde::Serialize;

pub trait TableRow {
    fn headers() -> &'static [&'static str];
    fn row(&self) -> Vec<String>;
}

pub fn render_table<T: TableRow>(items: &[T]) -> String {
    let headers: Vec<String> = T::headers().iter().map(ToString::to_string).collect();
    let rows: Vec<Vec<String>> = items.iter().map(TableRow::row).collect();
    let widths = column_widths(&headers, &rows);

    let mut out = format_row(&headers, &widths);
    out.push('\n');
    out.push_str(&format_separator(&widths));
    for row in rows {
        out.push('\n');
        out.push_str(&format_row(&row, &widths));
    }
    out
}

// widths in chars; listing titles are often accented
fn column_widths(headers: &[String], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            match widths.get_mut(idx) {
                Some(width) => *width = (*width).max(len),
                None => widths.push(len),
            }
        }
    }
    widths
}

fn format_row(row: &[String], widths: &[usize]) -> String {
    let mut out = String::new();
    for (idx, cell) in row.iter().enumerate() {
        if idx > 0 {
            out.push_str("  ");
        }
        let width = widths.get(idx).copied().unwrap_or(0);
        let _ = write!(out, "{cell:<width$}");
    }
    out.trim_end().to_string()
}

fn format_separator(widths: &[usize]) -> String {
    widths
        .iter()
        .map(|width| "-".repeat(*width))
        .collect::<Vec<_>>()
        .join("  ")
}

fn format_number(value: Option<f64>) -> String {
    value.map(|v| format!("{v}")).unwrap_or_default()
}

impl TableRow for PropertyListing {
    fn headers() -> &'static [&'static str] {
        &["id", "type", "title", "price", "area", "municipality"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.property_type.clone(),
            self.title.clone(),
            format_number(self.price),
            format_number(self.area),
            self.location.municipality.clone(),
        ]
    }
}

impl TableRow for UploadedMedia {
    fn headers() -> &'static [&'static str] {
        &["public_id", "url"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.public_id.clone(), self.url.clone()]
    }
}

/// One value of a facet vocabulary
#[derive(Debug, Clone, Serialize)]
pub struct OptionRow {
    pub category: String,
    pub value: String,
}

impl TableRow for OptionRow {
    fn headers() -> &'static [&'static str] {
        &["category", "value"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.category.clone(), self.value.clone()]
    }
}
