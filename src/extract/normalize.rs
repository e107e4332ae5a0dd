use crate::extract::error::ExtractError;

pub const MIN_LINES: usize = 2;

/// Splits OCR text into trimmed, non-empty physical lines.
pub fn normalize_lines(text: &str) -> Result<Vec<String>, ExtractError> {
    let lines = text
        .lines()
        .flat_map(|line| line.split('\r'))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();

    if lines.len() < MIN_LINES {
        return Err(ExtractError::InsufficientInput { lines: lines.len() });
    }

    Ok(lines)
}
