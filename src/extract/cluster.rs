//! Geometric table reconstruction from word bounding boxes.
//!
//! OCR engines report words in reading order, which for a photographed table
//! is often not column order. When boxes are available, rows are rebuilt by
//! greedy 1-D clustering of the top edges and columns by greedy clustering of
//! the left edges. Each cluster keeps its first member as anchor.

use tracing::debug;

use crate::extract::model::{Table, Word};
use crate::extract::options::{ClusterParams, DEFAULT_FALLBACK_HEADER, Strategy};
use crate::extract::values::{ValueScope, normalize_table_values};
use crate::extract::warning::{ExtractWarning, WarningCode};

const MIN_ROWS: usize = 2;

/// Drops words at or below the confidence floor and words with blank text.
pub(crate) fn reliable_words<'a, I>(
    words: I,
    min_confidence: f32,
    warnings: &mut Vec<ExtractWarning>,
) -> Vec<&'a Word>
where
    I: IntoIterator<Item = &'a Word>,
{
    let mut dropped = 0_usize;
    let kept = words
        .into_iter()
        .filter(|word| {
            let keep = word.confidence > min_confidence && !word.text.trim().is_empty();
            if !keep {
                dropped += 1;
            }
            keep
        })
        .collect::<Vec<_>>();

    if dropped > 0 {
        warnings.push(
            ExtractWarning::new(
                WarningCode::LowConfidenceWords,
                format!("discarded {dropped} word(s) with confidence <= {min_confidence} or no text"),
            )
            .with_strategy(Strategy::Positional),
        );
    }

    kept
}

/// Groups words into rows by vertical proximity to each row's first word.
pub(crate) fn group_rows<'a>(mut words: Vec<&'a Word>, row_threshold: f32) -> Vec<Vec<&'a Word>> {
    words.sort_by(|left, right| left.y().total_cmp(&right.y()));

    let mut rows: Vec<Vec<&Word>> = Vec::new();
    let mut anchor_y = f32::NAN;
    for word in words {
        let starts_row = rows.is_empty() || (word.y() - anchor_y).abs() > row_threshold;
        if starts_row {
            anchor_y = word.y();
            rows.push(vec![word]);
        } else if let Some(row) = rows.last_mut() {
            row.push(word);
        }
    }

    for row in &mut rows {
        row.sort_by(|left, right| left.x().total_cmp(&right.x()));
    }
    rows
}

/// Returns one anchor x-position per detected column, left to right.
pub(crate) fn detect_columns(rows: &[Vec<&Word>], column_gap: f32) -> Vec<f32> {
    let mut positions = rows
        .iter()
        .flat_map(|row| row.iter().map(|word| word.x()))
        .collect::<Vec<_>>();
    positions.sort_by(f32::total_cmp);

    let mut anchors: Vec<f32> = Vec::new();
    for x in positions {
        if anchors.last().is_none_or(|&anchor| x - anchor > column_gap) {
            anchors.push(x);
        }
    }
    anchors
}

/// Nearest anchor and its distance; ties go to the left-most column.
fn nearest_column(x: f32, anchors: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (index, anchor) in anchors.iter().enumerate() {
        let distance = (x - anchor).abs();
        if best.is_none_or(|(_, best_distance)| distance < best_distance) {
            best = Some((index, distance));
        }
    }
    best
}

fn align_rows(
    rows: &[Vec<&Word>],
    anchors: &[f32],
    max_align_distance: f32,
    warnings: &mut Vec<ExtractWarning>,
) -> Vec<Vec<String>> {
    let mut aligned = Vec::with_capacity(rows.len());

    for (row_index, row) in rows.iter().enumerate() {
        let mut cells = vec![String::new(); anchors.len()];
        for word in row {
            let Some((column, distance)) = nearest_column(word.x(), anchors) else {
                continue;
            };
            if distance > max_align_distance {
                warnings.push(
                    ExtractWarning::new(
                        WarningCode::UnalignableToken,
                        format!(
                            "dropped '{}': {distance:.1}px from the nearest column",
                            word.text.trim()
                        ),
                    )
                    .with_strategy(Strategy::Positional)
                    .with_row(row_index),
                );
                continue;
            }

            let text = word.text.trim();
            if !cells[column].is_empty() {
                warnings.push(
                    ExtractWarning::new(
                        WarningCode::CellOverwritten,
                        format!("'{}' replaced '{}'", text, cells[column]),
                    )
                    .with_strategy(Strategy::Positional)
                    .with_row(row_index)
                    .with_column(column),
                );
            }
            cells[column] = text.to_string();
        }
        aligned.push(cells);
    }

    aligned
}

/// Rebuilds a table from word boxes. `None` when fewer than two non-empty
/// rows survive.
pub fn cluster_words<'a, I>(
    words: I,
    params: &ClusterParams,
    warnings: &mut Vec<ExtractWarning>,
) -> Option<Table>
where
    I: IntoIterator<Item = &'a Word>,
{
    let words = reliable_words(words, params.min_confidence, warnings);
    let rows = group_rows(words, params.row_threshold);
    let anchors = detect_columns(&rows, params.column_gap);
    debug!(
        rows = rows.len(),
        columns = anchors.len(),
        "clustered word boxes"
    );

    let aligned = align_rows(&rows, &anchors, params.max_align_distance, warnings)
        .into_iter()
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .collect::<Vec<_>>();
    if aligned.len() < MIN_ROWS {
        return None;
    }

    Table::from_rows(aligned).map(|table| normalize_table_values(table, ValueScope::AllButFirst))
}

/// Clusterer on its own: falls back to a single-column table holding the raw
/// OCR text when no two rows can be rebuilt.
#[must_use]
pub fn extract_positional(
    text: &str,
    words: &[Word],
    params: &ClusterParams,
) -> (Table, Vec<ExtractWarning>) {
    let mut warnings = Vec::new();
    if let Some(table) = cluster_words(words, params, &mut warnings) {
        return (table, warnings);
    }

    warnings.push(
        ExtractWarning::new(
            WarningCode::SingleColumnFallback,
            "fewer than two rows could be rebuilt from word boxes",
        )
        .with_strategy(Strategy::Positional),
    );
    (
        Table::single_column(DEFAULT_FALLBACK_HEADER, [text.trim()]),
        warnings,
    )
}
