// src/extractors/table.rs

// --- Imports ---
use crate::utils::error::ExtractError;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde::ser::{Serialize, SerializeMap, Serializer};

// --- CSS Selectors (Lazy Static) ---
static TABLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("table").expect("Failed to compile TABLE_SELECTOR")
});

static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("tr").expect("Failed to compile ROW_SELECTOR")
});

static HEADER_CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("th").expect("Failed to compile HEADER_CELL_SELECTOR")
});

static DATA_CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("td").expect("Failed to compile DATA_CELL_SELECTOR")
});

// Forced mode accepts both cell kinds, in document order
static ANY_CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("th, td").expect("Failed to compile ANY_CELL_SELECTOR")
});

// --- Data Structures ---

/// One table row keyed by column title. Keys keep column order; inserting an
/// existing key overwrites its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, value: String) {
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k.into(), v.into());
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Which cell-gathering strategy produced a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Titles from `<th>` cells, data from `<td>` cells.
    Headers,
    /// Forced by the caller: first row supplies the titles.
    Forced,
    /// Forced because the table had no `<th>` cells.
    AutoForced,
}

impl ExtractionMode {
    pub fn is_forced(self) -> bool {
        !matches!(self, ExtractionMode::Headers)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ExtractedTable {
    pub index: usize,              // Position among all tables on the page
    pub mode: ExtractionMode,      // Mode actually used
    pub titles: Vec<String>,       // Column titles the records are keyed by
    pub records: Vec<Record>,      // One record per non-empty row
}

impl ExtractedTable {
    /// Column names across every record, in first-seen order.
    pub fn columns(&self) -> Vec<String> {
        union_columns(&self.records)
    }
}

/// Unions the key sets of all records, keeping the order keys are first seen.
pub fn union_columns(records: &[Record]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.to_string());
            }
        }
    }
    columns
}

// --- Main Extractor Structure ---
pub struct TableExtractor {
    force: bool,
}

impl TableExtractor {
    pub fn new(force: bool) -> Self {
        Self { force }
    }

    /// Parses `html_content` and extracts the table at `index`.
    pub fn extract(&self, html_content: &str, index: usize) -> Result<ExtractedTable, ExtractError> {
        let document = Html::parse_document(html_content);
        self.extract_from(&document, index)
    }

    /// Extracts the table at `first`, or with `all` every table from `first` on.
    ///
    /// In `all` mode a missing table after at least one hit ends the run, and a
    /// table with no rows comes back empty instead of failing.
    pub fn extract_plan(&self, document: &Html, first: usize, all: bool) -> Result<Vec<ExtractedTable>, ExtractError> {
        if !all {
            return Ok(vec![self.extract_from(document, first)?]);
        }

        let mut tables = Vec::new();
        for index in first.. {
            match self.extract_from(document, index) {
                Ok(table) => tables.push(table),
                Err(ExtractError::TableNotFound { found, .. }) if !tables.is_empty() => {
                    tracing::info!("No more tables after #{} ({} on page)", index - 1, found);
                    break;
                }
                Err(ExtractError::MalformedTable { .. }) => {
                    tracing::warn!("Table #{} has no rows, treating it as empty", index);
                    tables.push(ExtractedTable {
                        index,
                        mode: if self.force { ExtractionMode::Forced } else { ExtractionMode::AutoForced },
                        titles: Vec::new(),
                        records: Vec::new(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(tables)
    }

    /// Extracts the table at `index` from an already parsed document.
    pub fn extract_from(&self, document: &Html, index: usize) -> Result<ExtractedTable, ExtractError> {
        let table = locate(document, index)?;
        assemble(table, index, self.force)
    }
}

/// Extracts the table at `index` from raw markup into a record set.
pub fn extract_table(html_content: &str, index: usize, force: bool) -> Result<ExtractedTable, ExtractError> {
    TableExtractor::new(force).extract(html_content, index)
}

/// Number of `<table>` elements in the document.
pub fn count_tables(document: &Html) -> usize {
    document.select(&TABLE_SELECTOR).count()
}

/// Finds the table at `index` (document order, zero based).
pub fn locate(document: &Html, index: usize) -> Result<ElementRef<'_>, ExtractError> {
    let mut found = 0;
    for table in document.select(&TABLE_SELECTOR) {
        if found == index {
            tracing::debug!("Located table #{}", index);
            return Ok(table);
        }
        found += 1;
    }

    tracing::debug!("Requested table #{} but the page has {} tables", index, found);
    Err(ExtractError::TableNotFound { index, found })
}

/// Turns one located table into uniform records.
pub fn assemble(table: ElementRef<'_>, index: usize, force: bool) -> Result<ExtractedTable, ExtractError> {
    // Step A: titles from header cells, unless forced
    let mut titles: Vec<String> = Vec::new();
    let mut mode = if force { ExtractionMode::Forced } else { ExtractionMode::Headers };

    if !force {
        titles = table.select(&HEADER_CELL_SELECTOR).map(cell_text).collect();
        if titles.is_empty() {
            tracing::info!("Table #{} has no header cells, switching to forced mode", index);
            mode = ExtractionMode::AutoForced;
        }
    }

    // Step B: raw rows, empty ones included
    let cell_selector: &Selector = if mode.is_forced() { &ANY_CELL_SELECTOR } else { &DATA_CELL_SELECTOR };
    let mut rows: Vec<Vec<String>> = table
        .select(&ROW_SELECTOR)
        .map(|row| row.select(cell_selector).map(cell_text).collect())
        .collect();

    // Step C: first row supplies the titles in forced mode
    if mode.is_forced() {
        if rows.is_empty() {
            tracing::warn!("Table #{} has no rows, cannot derive column titles", index);
            return Err(ExtractError::MalformedTable { index });
        }
        titles = rows.remove(0);
        if titles.is_empty() {
            tracing::warn!("Table #{} starts with an empty row, its records will have no columns", index);
        }
    }

    tracing::debug!("Table #{} titles ({:?}): {:?}", index, mode, titles);

    // Step D: pair cells with titles
    let mut records = Vec::new();
    for row in rows {
        if row.is_empty() {
            continue;
        }

        if row.len() > titles.len() {
            tracing::debug!(
                "Row has {} cells but only {} titles, dropping {} trailing cells",
                row.len(),
                titles.len(),
                row.len() - titles.len()
            );
        }

        let record: Record = titles.iter().cloned().zip(row).collect();
        records.push(record);
    }

    tracing::info!("Extracted {} records from table #{}", records.len(), index);

    Ok(ExtractedTable { index, mode, titles, records })
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}
