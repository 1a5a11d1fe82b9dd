//! Spreadsheet to HTML table conversion.

use std::io::Cursor;

use calamine::{Data, DataRef, Reader, Xlsx};

use crate::catalog::core::errors::ConversionError;
use crate::catalog::normalize::html::element;

/// Convert an `.xlsx` payload to HTML tables.
///
/// Returns `Ok(None)` when no sheet has a non-blank row.
///
/// # Errors
/// Returns an error if the workbook cannot be parsed or a sheet exceeds
/// `max_cells`.
pub fn convert_xlsx(payload: &[u8], max_cells: usize) -> Result<Option<String>, ConversionError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(payload))?;
    let mut tables = Vec::new();

    for name in workbook.sheet_names() {
        let rows = read_sheet(&mut workbook, &name, max_cells)?;
        if let Some(table) = render_sheet(rows) {
            tables.push((name, table));
        }
    }

    Ok(assemble_tables(tables))
}

/// Stream a sheet's non-empty cells into dense rows over their used range.
///
/// The range is checked against `max_cells` as cells arrive, so an oversized
/// sheet is refused before any grid is allocated.
fn read_sheet(
    workbook: &mut Xlsx<Cursor<&[u8]>>,
    name: &str,
    max_cells: usize,
) -> Result<Vec<Vec<String>>, ConversionError> {
    let mut reader = workbook.worksheet_cells_reader(name)?;
    let mut cells: Vec<((u32, u32), String)> = Vec::new();
    let mut bounds: Option<UsedRange> = None;

    while let Some(cell) = reader.next_cell()? {
        let value = cell.get_value();
        if matches!(value, DataRef::Empty) {
            continue;
        }
        let position = cell.get_position();
        let range = bounds.map_or_else(|| UsedRange::at(position), |r| r.including(position));
        if range.area() > max_cells {
            return Err(ConversionError::TooLarge(format!(
                "sheet '{name}' spans at least {}x{} cells",
                range.height(),
                range.width()
            )));
        }
        bounds = Some(range);
        cells.push((position, cell_text(&Data::from(value.clone()))));
    }

    let Some(range) = bounds else {
        return Ok(Vec::new());
    };
    let mut rows = vec![vec![String::new(); range.width()]; range.height()];
    for ((row, col), text) in cells {
        let (r, c) = range.offset(row, col);
        if let Some(slot) = rows.get_mut(r).and_then(|slots| slots.get_mut(c)) {
            *slot = text;
        }
    }
    Ok(rows)
}

/// Bounding box of the non-empty cells seen so far, inclusive.
#[derive(Clone, Copy, Debug)]
struct UsedRange {
    top: u32,
    left: u32,
    bottom: u32,
    right: u32,
}

impl UsedRange {
    const fn at((row, col): (u32, u32)) -> Self {
        Self {
            top: row,
            left: col,
            bottom: row,
            right: col,
        }
    }

    fn including(self, (row, col): (u32, u32)) -> Self {
        Self {
            top: self.top.min(row),
            left: self.left.min(col),
            bottom: self.bottom.max(row),
            right: self.right.max(col),
        }
    }

    fn height(self) -> usize {
        span(self.top, self.bottom)
    }

    fn width(self) -> usize {
        span(self.left, self.right)
    }

    fn area(self) -> usize {
        self.height().saturating_mul(self.width())
    }

    fn offset(self, row: u32, col: u32) -> (usize, usize) {
        (span(self.top, row) - 1, span(self.left, col) - 1)
    }
}

fn span(start: u32, end: u32) -> usize {
    usize::try_from(end.saturating_sub(start)).map_or(usize::MAX, |n| n.saturating_add(1))
}

/// Render one sheet's rows as a table.
///
/// Blank rows are dropped; the first surviving row becomes the header.
/// Returns `None` when every row is blank.
pub fn render_sheet<R>(rows: R) -> Option<String>
where
    R: IntoIterator<Item = Vec<String>>,
{
    let mut rows = rows.into_iter().filter(|row| !is_blank(row));
    let header = rows.next()?;

    let mut html = String::from("<table><thead><tr>");
    for cell in &header {
        html.push_str(&element("th", cell.trim()));
    }
    html.push_str("</tr></thead><tbody>");

    for row in rows {
        html.push_str("<tr>");
        for cell in &row {
            html.push_str(&element("td", cell.trim()));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");

    Some(html)
}

/// Join rendered sheet tables, naming each sheet only when several survive.
#[must_use]
pub fn assemble_tables(tables: Vec<(String, String)>) -> Option<String> {
    if tables.is_empty() {
        return None;
    }

    let with_headings = tables.len() > 1;
    let mut parts = Vec::with_capacity(tables.len() * 2);
    for (name, table) in tables {
        if with_headings {
            parts.push(element("h2", &name));
        }
        parts.push(table);
    }
    Some(parts.join("\n"))
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

/// String form of a cell, as a reader would expect to see it.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_number(*f),
        Data::Bool(b) => if *b { "True" } else { "False" }.to_string(),
        Data::DateTime(dt) => dt.as_datetime().map_or_else(
            || format_number(dt.as_f64()),
            |value| value.format("%Y-%m-%d %H:%M:%S").to_string(),
        ),
        Data::Error(err) => err.to_string(),
    }
}

/// Whole numbers are stored as floats in OOXML; show them without a fraction.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}
