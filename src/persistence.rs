use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;

use crate::cache;
use crate::error::ApiError;
use crate::extract::{BELOW_DETECTION_SENTINEL, Table, write_csv_to_string};
use crate::models::{
    PREVIEW_ROW_COUNT, SavedTable, TABLE_CACHE_KEY_PREFIX, TABLE_CACHE_TTL_SECONDS,
};

static NON_NUMERIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\d.\-]").expect("hardcoded regex must compile"));

#[derive(Debug, Deserialize)]
struct TableData {
    headers: Option<Vec<String>>,
    rows: Option<Vec<Vec<String>>>,
}

/// Parses the `table_data` form field. Rows must match the header width;
/// rows left entirely empty by editing are dropped.
pub fn parse_table_data(raw: &str) -> Result<Table, ApiError> {
    let data = serde_json::from_str::<Option<TableData>>(raw)?;
    let Some(TableData {
        headers: Some(headers),
        rows: Some(rows),
    }) = data
    else {
        return Err(ApiError::Validation("Invalid data format".to_string()));
    };
    if headers.is_empty() {
        return Err(ApiError::Validation("Invalid data format".to_string()));
    }

    let width = headers.len();
    if let Some((index, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != width) {
        return Err(ApiError::Validation(format!(
            "row {index} has {} cells, expected {width}",
            row.len()
        )));
    }

    Ok(Table { headers, rows }.without_empty_rows())
}

fn numeric_text(cell: &str) -> String {
    NON_NUMERIC_RE.replace_all(cell, "").into_owned()
}

/// Blank cells and the below-detection sentinel are left as they are.
fn is_coercible(cell: &str) -> bool {
    let cell = cell.trim();
    !cell.is_empty() && cell != BELOW_DETECTION_SENTINEL
}

/// Strips every non-empty cell of a column down to digits, `.` and `-`, but
/// only when all of them then parse as numbers. Columns holding letters
/// (sample names, notes) are never coerced, and `<0.01` keeps its `<`.
#[must_use]
pub fn coerce_numeric_columns(mut table: Table) -> Table {
    for column in 0..table.width() {
        let cleaned = table
            .rows
            .iter()
            .map(|row| row.get(column).map_or("", String::as_str))
            .filter(|cell| is_coercible(cell))
            .map(numeric_text)
            .collect::<Vec<_>>();

        let has_letters = table
            .rows
            .iter()
            .filter_map(|row| row.get(column))
            .any(|cell| cell.chars().any(char::is_alphabetic));
        let numeric =
            !cleaned.is_empty() && cleaned.iter().all(|cell| cell.parse::<f64>().is_ok());
        if has_letters || !numeric {
            continue;
        }

        for row in &mut table.rows {
            if let Some(cell) = row.get_mut(column)
                && is_coercible(cell)
            {
                *cell = numeric_text(cell);
            }
        }
    }
    table
}

#[must_use]
pub fn preview_rows(table: &Table) -> Vec<Vec<String>> {
    table.rows.iter().take(PREVIEW_ROW_COUNT).cloned().collect()
}

#[must_use]
pub fn import_message(table: &Table) -> String {
    format!(
        "Imported {} rows with {} columns",
        table.rows.len(),
        table.width()
    )
}

/// Millisecond timestamp plus a content hash, both hex.
#[must_use]
pub fn table_id(saved_at_millis: u64, table: &Table) -> String {
    let mut hasher = DefaultHasher::new();
    table.hash(&mut hasher);
    format!("{saved_at_millis:x}-{:08x}", hasher.finish() & 0xffff_ffff)
}

#[must_use]
pub fn table_cache_key(id: &str) -> String {
    format!("{TABLE_CACHE_KEY_PREFIX}{id}")
}

#[must_use]
pub fn csv_cache_key(id: &str) -> String {
    format!("{TABLE_CACHE_KEY_PREFIX}{id}.csv")
}

pub async fn save_table(table: Table, saved_at: DateTime<Utc>) -> Result<SavedTable, ApiError> {
    let millis = u64::try_from(saved_at.timestamp_millis()).unwrap_or_default();
    let id = table_id(millis, &table);
    let csv = write_csv_to_string(&table, b',')?;

    let saved = SavedTable {
        id,
        saved_at,
        table,
    };
    cache::put_json(&table_cache_key(&saved.id), &saved, TABLE_CACHE_TTL_SECONDS).await?;
    cache::put_text(
        &csv_cache_key(&saved.id),
        &csv,
        TABLE_CACHE_TTL_SECONDS,
        "text/csv; charset=utf-8",
    )
    .await?;
    Ok(saved)
}

pub async fn load_table(id: &str) -> Result<SavedTable, ApiError> {
    cache::get_json::<SavedTable>(&table_cache_key(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no saved table with id '{id}'")))
}

pub async fn load_csv(id: &str) -> Result<String, ApiError> {
    cache::get_text(&csv_cache_key(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no saved table with id '{id}'")))
}
