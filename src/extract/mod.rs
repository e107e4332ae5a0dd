//! Table reconstruction from OCR output.
//!
//! Everything in here is synchronous and free of I/O: OCR text (and, when
//! available, word boxes) goes in, a rectangular [`Table`] comes out.

mod cascade;
mod cluster;
mod csv_out;
mod error;
mod model;
mod normalize;
mod options;
mod table_parse;
pub mod tesseract;
mod values;
mod warning;

pub use cascade::{Extraction, ExtractionReport, extract_table};
pub use cluster::{cluster_words, extract_positional};
pub use csv_out::write_csv_to_string;
pub use error::ExtractError;
pub use model::{BBox, NEW_COLUMN_HEADER, OcrLine, OcrOutput, OcrPayload, Table, Word};
pub use normalize::normalize_lines;
pub use options::{
    Cascade, ClusterParams, DEFAULT_FALLBACK_HEADER, ExtractOptions, LEGACY_FALLBACK_HEADER,
    Strategy,
};
pub use table_parse::{parse_delimited, parse_spacing, parse_whitespace_runs};
pub use values::{
    BELOW_DETECTION_SENTINEL, ValueScope, clean_number_text, is_numeric_column,
    normalize_table_values, validate_geochemical_value,
};
pub use warning::{ExtractWarning, WarningCode};

/// Extracts a table and renders it as CSV with the configured delimiter.
pub fn extract_to_csv_string(
    input: &OcrOutput,
    options: &ExtractOptions,
) -> Result<(String, ExtractionReport), ExtractError> {
    let extraction = extract_table(input, options)?;
    let csv = write_csv_to_string(&extraction.table, options.delimiter)?;
    Ok((csv, extraction.report))
}
