//! Cleanup of OCR'd measurement values.
//!
//! Photographed assay tables mostly hold numbers, so common OCR look-alike
//! letters are mapped back to digits and the usual "below detection limit"
//! spellings are collapsed into a single sentinel.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::extract::model::Table;

/// Stands in for any "below detection limit" reading.
pub const BELOW_DETECTION_SENTINEL: &str = "<0.01";

static NUMERIC_VALUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[<>]?(?:\d+\.?\d*|\.\d+)$").expect("hardcoded numeric value regex is valid")
});

const NUMERIC_COLUMN_HEADERS: &[&str] = &[
    // major oxides
    "SiO2", "TiO2", "Al2O3", "Fe2O3", "FeO", "Fe2O3T", "MnO", "MgO", "CaO", "Na2O", "K2O",
    "P2O5", "Cr2O3", "SO3", "LOI",
    // trace and rare-earth elements
    "Li", "Be", "B", "Sc", "V", "Cr", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As", "Rb", "Sr", "Y",
    "Zr", "Nb", "Mo", "Ag", "Cd", "In", "Sn", "Sb", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Sm",
    "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Au", "Hg", "Tl",
    "Pb", "Bi", "Th", "U", "S", "Cl", "F",
];

/// Which data cells get passed through [`validate_geochemical_value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueScope {
    /// Every column except the first (sample identifier).
    AllButFirst,
    /// Columns after the first whose header is a known element or oxide.
    NumericColumns,
    Off,
}

impl ValueScope {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AllButFirst => "all",
            Self::NumericColumns => "numeric",
            Self::Off => "off",
        }
    }
}

impl FromStr for ValueScope {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" | "all-but-first" => Ok(Self::AllButFirst),
            "numeric" | "numeric-columns" => Ok(Self::NumericColumns),
            "off" | "none" => Ok(Self::Off),
            other => Err(format!(
                "unknown value scope '{other}', expected one of: all, numeric, off"
            )),
        }
    }
}

/// Maps letter look-alikes to digits, drops whitespace and uses `.` as the
/// decimal separator.
#[must_use]
pub fn clean_number_text(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .map(|ch| match ch {
            'o' | 'O' => '0',
            'l' | 'I' => '1',
            's' | 'S' => '5',
            'z' | 'Z' => '2',
            ',' => '.',
            other => other,
        })
        .collect()
}

fn has_bd_token(value: &str) -> bool {
    value
        .split(|ch: char| !ch.is_alphanumeric())
        .any(|token| token.eq_ignore_ascii_case("bd"))
}

/// Normalizes one measurement cell.
///
/// Numbers (optionally prefixed by `<` or `>`) come back cleaned, `bd` and
/// `-` become [`BELOW_DETECTION_SENTINEL`], everything else is only trimmed.
#[must_use]
pub fn validate_geochemical_value(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed == "-" || has_bd_token(trimmed) {
        return BELOW_DETECTION_SENTINEL.to_string();
    }

    let cleaned = clean_number_text(trimmed);
    if NUMERIC_VALUE_RE.is_match(&cleaned) {
        return cleaned;
    }

    trimmed.to_string()
}

#[must_use]
pub fn is_numeric_column(header: &str) -> bool {
    NUMERIC_COLUMN_HEADERS.contains(&header.trim())
}

/// Indices of the columns covered by `scope`. Column 0 is never included.
#[must_use]
pub fn validated_columns(headers: &[String], scope: ValueScope) -> Vec<usize> {
    match scope {
        ValueScope::Off => Vec::new(),
        ValueScope::AllButFirst => (1..headers.len()).collect(),
        ValueScope::NumericColumns => headers
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, header)| is_numeric_column(header))
            .map(|(index, _)| index)
            .collect(),
    }
}

/// Runs the data cells of `table` through the domain validator.
#[must_use]
pub fn normalize_table_values(mut table: Table, scope: ValueScope) -> Table {
    let columns = validated_columns(&table.headers, scope);
    if columns.is_empty() {
        return table;
    }

    for row in &mut table.rows {
        for &column in &columns {
            if let Some(cell) = row.get_mut(column)
                && !cell.is_empty()
            {
                *cell = validate_geochemical_value(cell);
            }
        }
    }

    table
}

#[cfg(test)]
mod tests {
    use super::{
        BELOW_DETECTION_SENTINEL, ValueScope, clean_number_text, is_numeric_column,
        normalize_table_values, validate_geochemical_value,
    };
    use crate::extract::model::Table;

    #[test]
    fn maps_ocr_confusions_to_digits() {
        assert_eq!(clean_number_text("O12.5S"), "012.55");
        assert_eq!(clean_number_text(" l2, 3z "), "12.32");
        assert_eq!(clean_number_text("I0"), "10");
    }

    #[test]
    fn below_detection_spellings_become_sentinel() {
        for raw in ["bd", "BD", "-", " bd ", "<bd"] {
            assert_eq!(validate_geochemical_value(raw), BELOW_DETECTION_SENTINEL, "{raw}");
        }
    }

    #[test]
    fn bd_inside_a_word_is_not_a_token() {
        assert_eq!(validate_geochemical_value("Abdomen"), "Abdomen");
    }

    #[test]
    fn numeric_values_are_cleaned() {
        assert_eq!(validate_geochemical_value("12,5"), "12.5");
        assert_eq!(validate_geochemical_value("< 0.01"), "<0.01");
        assert_eq!(validate_geochemical_value(">1O0"), ">100");
        assert_eq!(validate_geochemical_value(".5"), ".5");
    }

    #[test]
    fn non_numeric_text_passes_through() {
        assert_eq!(validate_geochemical_value(" Quartz vein "), "Quartz vein");
        assert_eq!(validate_geochemical_value("1.2.3"), "1.2.3");
    }

    #[test]
    fn validation_is_idempotent() {
        for raw in ["O12.5S", "12,5", "bd", "<0.01", "Quartz", "3"] {
            let once = validate_geochemical_value(raw);
            assert_eq!(validate_geochemical_value(&once), once, "{raw}");
        }
    }

    #[test]
    fn numeric_headers_are_exact_matches() {
        assert!(is_numeric_column("SiO2"));
        assert!(is_numeric_column(" Ba "));
        assert!(!is_numeric_column("sio2"));
        assert!(!is_numeric_column("Sample"));
    }

    #[test]
    fn numeric_scope_leaves_text_columns_alone() {
        let table = Table::new(
            vec!["Sample".to_string(), "Rock".to_string(), "SiO2".to_string()],
            vec![vec!["SO-1".to_string(), "bd".to_string(), "4S,2".to_string()]],
        );
        let table = normalize_table_values(table, ValueScope::NumericColumns);
        assert_eq!(table.rows[0], vec!["SO-1", "bd", "45.2"]);
    }

    #[test]
    fn parses_value_scope_names() {
        assert_eq!("ALL".parse::<ValueScope>(), Ok(ValueScope::AllButFirst));
        assert!("sometimes".parse::<ValueScope>().is_err());
    }
}
