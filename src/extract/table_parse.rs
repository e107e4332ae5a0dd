use crate::extract::model::Table;

const MIN_COLUMNS: usize = 2;
const MIN_ROWS: usize = 2;

/// Splits `line` on `delimiter`, trimming cells and dropping empty ones.
pub(crate) fn split_on_delimiter(line: &str, delimiter: char) -> Vec<String> {
    line.split(delimiter)
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
        .collect()
}

/// Splits `line` on runs of two or more whitespace characters.
pub(crate) fn split_on_whitespace_runs(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut run = String::new();

    for ch in line.trim().chars() {
        if ch.is_whitespace() {
            run.push(ch);
            continue;
        }

        if run.chars().count() >= 2 {
            push_trimmed(&mut cells, &mut current);
        } else {
            current.push_str(&run);
        }
        run.clear();
        current.push(ch);
    }

    push_trimmed(&mut cells, &mut current);
    cells
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Comparison,
    Digit,
    Letter,
    Other,
}

fn char_class(ch: char) -> CharClass {
    match ch {
        '<' | '>' => CharClass::Comparison,
        ch if ch.is_ascii_digit() => CharClass::Digit,
        ch if ch.is_alphabetic() => CharClass::Letter,
        _ => CharClass::Other,
    }
}

/// Whitespace seen since the last printable character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gap {
    None,
    Spaces(usize),
    Tab,
}

/// Character-level cell splitter used when no geometry is available.
///
/// A single space stays inside the cell (`< 0.01`), three or more spaces or a
/// tab end it. Exactly two spaces end the cell unless the cell so far ends in
/// a comparison sign, so `<  0.01` survives a doubled space.
pub(crate) fn split_spacing_cells(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut gap = Gap::None;

    for ch in line.trim().chars() {
        if ch == '\t' {
            gap = Gap::Tab;
            continue;
        }
        if ch.is_whitespace() {
            gap = match gap {
                Gap::None => Gap::Spaces(1),
                Gap::Spaces(run) => Gap::Spaces(run + 1),
                Gap::Tab => Gap::Tab,
            };
            continue;
        }

        let ends_cell = match gap {
            Gap::None => false,
            Gap::Tab => true,
            Gap::Spaces(run) if run > 2 => true,
            Gap::Spaces(2) => current
                .chars()
                .next_back()
                .is_none_or(|last| char_class(last) != CharClass::Comparison),
            Gap::Spaces(_) => false,
        };

        if ends_cell {
            push_trimmed(&mut cells, &mut current);
        } else if gap != Gap::None {
            current.push(' ');
        }
        gap = Gap::None;
        current.push(ch);
    }

    push_trimmed(&mut cells, &mut current);
    cells
}

fn push_trimmed(cells: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        cells.push(trimmed.to_string());
    }
    current.clear();
}

pub(crate) fn normalize_rows(rows: &[Vec<String>], width: usize) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            let mut out = row.clone();
            out.resize(width, String::new());
            out
        })
        .collect()
}

pub(crate) fn max_width(rows: &[Vec<String>]) -> usize {
    rows.iter().map(Vec::len).max().unwrap_or(0)
}

/// Builds a table from lines separated by a single delimiter character.
///
/// The first tabular line fixes the column count; later lines may miss one
/// trailing cell.
#[must_use]
pub fn parse_delimited(lines: &[String], delimiter: char) -> Option<Table> {
    let rows = lines
        .iter()
        .map(|line| split_on_delimiter(line, delimiter))
        .filter(|row| row.len() >= MIN_COLUMNS)
        .collect::<Vec<_>>();
    if rows.len() < MIN_ROWS {
        return None;
    }

    let expected = rows[0].len();
    let valid_rows = rows
        .into_iter()
        .filter(|row| row.len() + 1 >= expected)
        .collect::<Vec<_>>();
    if valid_rows.len() < MIN_ROWS {
        return None;
    }

    Table::from_rows(normalize_rows(&valid_rows, expected))
}

/// Builds a table from lines whose columns are separated by 2+ whitespace
/// characters. The widest line decides the column count.
#[must_use]
pub fn parse_whitespace_runs(lines: &[String]) -> Option<Table> {
    let rows = lines
        .iter()
        .map(|line| split_on_whitespace_runs(line))
        .filter(|row| row.len() >= MIN_COLUMNS)
        .collect::<Vec<_>>();
    if rows.len() < MIN_ROWS {
        return None;
    }

    let width = max_width(&rows);
    Table::from_rows(normalize_rows(&rows, width))
}

#[must_use]
pub fn parse_spacing(lines: &[String]) -> Option<Table> {
    let rows = lines
        .iter()
        .map(|line| split_spacing_cells(line))
        .filter(|row| !row.is_empty())
        .collect::<Vec<_>>();
    let width = max_width(&rows);
    if rows.len() < MIN_ROWS || width < MIN_COLUMNS {
        return None;
    }

    Table::from_rows(normalize_rows(&rows, width))
}
