// src/csv.rs
use std::io::{self, Write};
use std::mem::take;

use crate::data::{Nutrient, NutrientRecord, Nutrients};
use crate::error::StoreError;

/// Identity columns, item id, the 14 nutrients, then `fields_recovered`.
pub fn headers() -> Vec<String> {
    let mut h: Vec<String> = ["name", "restaurant", "meal_period", "section", "item_id"]
        .iter()
        .map(|c| s!(*c))
        .collect();
    h.extend(Nutrient::ALL.iter().map(|n| s!(n.column())));
    h.push(s!("fields_recovered"));
    h
}

const COLUMNS: usize = 5 + 14 + 1;

/* ---------------- Parsing ---------------- */

/// Minimal CSV/TSV parser (quotes + CRLF tolerant). std-only.
pub fn parse_rows(text: &str, sep: char) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut field = s!();
    let mut row = Vec::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    if matches!(chars.peek(), Some('"')) {
                        chars.next(); // double-quote escape
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            c if c == sep && !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) { chars.next(); }
                row.push(take(&mut field));
                if !(row.len() == 1 && row[0].is_empty()) {
                    rows.push(take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => field.push(ch),
        }
    }

    // Flush any trailing field/row even if quotes were unterminated.
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}

/// Row → record. `line` is 1-based and only used for error messages.
pub fn row_to_record(row: &[String], line: usize) -> Result<NutrientRecord, StoreError> {
    if row.len() < COLUMNS - 1 {
        return Err(StoreError::Malformed { line, reason: format!("expected {} columns, found {}", COLUMNS, row.len()) });
    }
    let num = |ix: usize| -> Result<f64, StoreError> {
        let cell = row[ix].trim();
        if cell.is_empty() { return Ok(0.0); }
        cell.parse::<f64>()
            .map_err(|_| StoreError::Malformed { line, reason: format!("column {} is not a number: `{}`", ix + 1, cell) })
    };

    let item_id = match row[4].trim() {
        "" => None,
        id => Some(id.parse::<u64>().map_err(|_| StoreError::Malformed { line, reason: format!("bad item id `{id}`") })?),
    };
    let mut nutrients = Nutrients::default();
    for (i, n) in Nutrient::ALL.iter().enumerate() {
        nutrients.set(*n, num(5 + i)?);
    }
    let fields_recovered = row.get(COLUMNS - 1).and_then(|c| c.trim().parse::<u8>().ok()).unwrap_or(0);

    Ok(NutrientRecord {
        name: row[0].clone(),
        restaurant: row[1].clone(),
        meal_period: row[2].clone(),
        section: row[3].clone(),
        item_id,
        nutrients,
        fields_recovered,
    })
}

pub fn record_to_row(rec: &NutrientRecord) -> Vec<String> {
    let mut row = Vec::with_capacity(COLUMNS);
    row.extend([rec.name.clone(), rec.restaurant.clone(), rec.meal_period.clone(), rec.section.clone()]);
    row.push(rec.item_id.map(|id| id.to_string()).unwrap_or_default());
    row.extend(Nutrient::ALL.iter().map(|n| rec.nutrients.get(*n).to_string()));
    row.push(rec.fields_recovered.to_string());
    row
}

/// Parse a whole CSV file. The header line is required and checked.
pub fn parse_records(text: &str) -> Result<Vec<NutrientRecord>, StoreError> {
    let mut rows = parse_rows(text, ',').into_iter();
    let Some(header) = rows.next() else { return Ok(Vec::new()) };
    if header.first().map(|h| h.trim_start_matches('\u{feff}')) != Some("name") {
        return Err(StoreError::Malformed { line: 1, reason: s!("missing header row") });
    }
    rows.enumerate().map(|(i, row)| row_to_record(&row, i + 2)).collect()
}

/* ---------------- Writing ---------------- */

fn needs_quotes(field: &str, sep: char) -> bool {
    field.contains(sep) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write a single CSV/TSV row to any writer.
pub fn write_row<W: Write>(mut w: W, row: &[String], sep: char) -> io::Result<()> {
    let mut first = true;
    for cell in row {
        if !first { write!(w, "{}", sep)?; } else { first = false; }
        if needs_quotes(cell, sep) {
            let escaped = cell.replace('"', "\"\"");
            write!(w, "\"{}\"", escaped)?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}

pub fn write_records<W: Write>(mut w: W, records: &[&NutrientRecord]) -> io::Result<()> {
    write_row(&mut w, &headers(), ',')?;
    for rec in records {
        write_row(&mut w, &record_to_row(rec), ',')?;
    }
    Ok(())
}
