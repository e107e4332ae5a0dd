use tracing::debug;

use crate::extract::cluster::cluster_words;
use crate::extract::error::ExtractError;
use crate::extract::model::{OcrOutput, Table};
use crate::extract::normalize::normalize_lines;
use crate::extract::options::{Cascade, ExtractOptions, Strategy};
use crate::extract::table_parse::{parse_delimited, parse_spacing, parse_whitespace_runs};
use crate::extract::values::normalize_table_values;
use crate::extract::warning::{ExtractWarning, WarningCode};

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReport {
    /// `None` when every strategy missed and the single-column fallback was used.
    pub strategy: Option<Strategy>,
    pub row_count: usize,
    pub column_count: usize,
    pub warnings: Vec<ExtractWarning>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub table: Table,
    pub report: ExtractionReport,
}

#[derive(Debug)]
enum BuildState {
    Normalizing,
    TryingStrategy { index: usize, lines: Vec<String> },
    Validating(Table, Option<Strategy>),
    Done(Table, Option<Strategy>),
    Failed(ExtractError),
}

/// Runs one strategy. Every strategy shares this signature so the cascade
/// can treat them uniformly.
fn run_strategy(
    strategy: Strategy,
    input: &OcrOutput,
    lines: &[String],
    options: &ExtractOptions,
    warnings: &mut Vec<ExtractWarning>,
) -> Option<Table> {
    match strategy {
        Strategy::Tab | Strategy::Pipe | Strategy::Comma => {
            strategy
                .delimiter()
                .and_then(|delimiter| parse_delimited(lines, delimiter))
        }
        Strategy::WhitespaceRuns => parse_whitespace_runs(lines),
        Strategy::Spacing => parse_spacing(lines),
        Strategy::Positional => cluster_words(input.words(), &options.cluster, warnings),
    }
}

fn default_cascade(input: &OcrOutput) -> Cascade {
    if input.has_geometry() {
        Cascade::geometry_first()
    } else {
        Cascade::tab_first()
    }
}

/// Tries each strategy of the cascade in order and returns the first table
/// with at least two columns and one data row.
///
/// Never fails for lack of table structure: when every strategy misses, the
/// result is a single-column table with one row per line. Only input with
/// fewer than two non-empty lines is an error.
pub fn extract_table(
    input: &OcrOutput,
    options: &ExtractOptions,
) -> Result<Extraction, ExtractError> {
    options
        .cluster
        .validate()
        .map_err(ExtractError::InvalidOption)?;

    let cascade = options
        .cascade
        .clone()
        .unwrap_or_else(|| default_cascade(input));
    if cascade.is_empty() {
        return Err(ExtractError::InvalidOption(
            "cascade cannot be empty".to_string(),
        ));
    }
    let strategies = cascade.strategies();

    let mut warnings = Vec::new();
    let mut state = BuildState::Normalizing;

    loop {
        state = match state {
            BuildState::Normalizing => match normalize_lines(input.text()) {
                Ok(lines) => BuildState::TryingStrategy { index: 0, lines },
                Err(error) => BuildState::Failed(error),
            },
            BuildState::TryingStrategy { index, lines } => match strategies.get(index) {
                None => {
                    warnings.push(ExtractWarning::new(
                        WarningCode::SingleColumnFallback,
                        "no strategy produced a table; returning one row per line",
                    ));
                    let table = Table::single_column(&options.fallback_header, lines);
                    BuildState::Done(table, None)
                }
                Some(&strategy) if strategy.needs_geometry() && !input.has_geometry() => {
                    warnings.push(
                        ExtractWarning::new(
                            WarningCode::StrategyIneligible,
                            "input has no word boxes",
                        )
                        .with_strategy(strategy),
                    );
                    BuildState::TryingStrategy {
                        index: index + 1,
                        lines,
                    }
                }
                Some(&strategy) => {
                    match run_strategy(strategy, input, &lines, options, &mut warnings) {
                        Some(table) if table.is_structurally_valid() => {
                            BuildState::Validating(table, Some(strategy))
                        }
                        _ => {
                            debug!(strategy = strategy.as_str(), "strategy missed");
                            warnings.push(
                                ExtractWarning::new(
                                    WarningCode::StrategyMiss,
                                    "no table with at least two columns and two rows",
                                )
                                .with_strategy(strategy),
                            );
                            BuildState::TryingStrategy {
                                index: index + 1,
                                lines,
                            }
                        }
                    }
                }
            },
            BuildState::Validating(table, strategy) => {
                let table = match strategy {
                    // the clusterer already validated its own cells
                    Some(Strategy::Positional) | None => table,
                    Some(_) => normalize_table_values(table, options.value_scope),
                };
                BuildState::Done(Table::new(table.headers, table.rows), strategy)
            }
            BuildState::Done(table, strategy) => {
                debug!(
                    strategy = strategy.map_or("fallback", Strategy::as_str),
                    rows = table.rows.len(),
                    columns = table.width(),
                    "table extracted"
                );
                return Ok(Extraction {
                    report: ExtractionReport {
                        strategy,
                        row_count: table.rows.len(),
                        column_count: table.width(),
                        warnings,
                    },
                    table,
                });
            }
            BuildState::Failed(error) => return Err(error),
        };
    }
}
