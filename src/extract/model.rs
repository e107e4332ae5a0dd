use serde::{Deserialize, Serialize};

use crate::extract::error::ExtractError;

pub const NEW_COLUMN_HEADER: &str = "New Column";

/// Reconstructed table: one header row plus rectangular data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Builds a table and pads or truncates every row to the header width.
    #[must_use]
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows.into_iter().map(|row| fit_row(row, width)).collect();
        Self { headers, rows }
    }

    /// Splits the first row off as headers. Returns `None` for an empty input.
    #[must_use]
    pub fn from_rows(mut rows: Vec<Vec<String>>) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }
        let headers = rows.remove(0);
        Some(Self::new(headers, rows))
    }

    #[must_use]
    pub fn single_column<I, S>(header: &str, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: vec![header.to_string()],
            rows: lines.into_iter().map(|line| vec![line.into()]).collect(),
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.headers.len()
    }

    #[must_use]
    pub fn is_rectangular(&self) -> bool {
        let width = self.width();
        self.rows.iter().all(|row| row.len() == width)
    }

    /// At least two columns and a data row below the header.
    #[must_use]
    pub fn is_structurally_valid(&self) -> bool {
        self.width() >= 2 && !self.rows.is_empty()
    }

    /// Copy with every row padded or truncated to the header width. Edits
    /// start from here since deserialized tables may be ragged.
    fn fitted(&self) -> Self {
        Self::new(self.headers.clone(), self.rows.clone())
    }

    pub fn insert_row(&self, index: usize, cells: Vec<String>) -> Result<Self, ExtractError> {
        if index > self.rows.len() {
            return Err(ExtractError::OutOfRange {
                what: "row",
                index,
                len: self.rows.len(),
            });
        }

        let mut table = self.fitted();
        table.rows.insert(index, fit_row(cells, self.width()));
        Ok(table)
    }

    /// Appends an empty row.
    #[must_use]
    pub fn push_empty_row(&self) -> Self {
        let mut table = self.fitted();
        table.rows.push(vec![String::new(); self.width()]);
        table
    }

    pub fn insert_column(&self, index: usize, header: &str) -> Result<Self, ExtractError> {
        if index > self.width() {
            return Err(ExtractError::OutOfRange {
                what: "column",
                index,
                len: self.width(),
            });
        }

        let header = header.trim();
        let header = if header.is_empty() {
            NEW_COLUMN_HEADER
        } else {
            header
        };

        let mut table = self.fitted();
        table.headers.insert(index, header.to_string());
        for row in &mut table.rows {
            row.insert(index, String::new());
        }
        Ok(table)
    }

    pub fn replace_cell(
        &self,
        row: usize,
        column: usize,
        value: impl Into<String>,
    ) -> Result<Self, ExtractError> {
        if row >= self.rows.len() {
            return Err(ExtractError::OutOfRange {
                what: "row",
                index: row,
                len: self.rows.len(),
            });
        }
        if column >= self.width() {
            return Err(ExtractError::OutOfRange {
                what: "column",
                index: column,
                len: self.width(),
            });
        }

        let mut table = self.fitted();
        table.rows[row][column] = value.into();
        Ok(table)
    }

    pub fn replace_header(
        &self,
        column: usize,
        value: impl Into<String>,
    ) -> Result<Self, ExtractError> {
        if column >= self.width() {
            return Err(ExtractError::OutOfRange {
                what: "column",
                index: column,
                len: self.width(),
            });
        }

        let mut table = self.fitted();
        table.headers[column] = value.into();
        Ok(table)
    }

    pub fn remove_row(&self, index: usize) -> Result<Self, ExtractError> {
        if index >= self.rows.len() {
            return Err(ExtractError::OutOfRange {
                what: "row",
                index,
                len: self.rows.len(),
            });
        }

        let mut table = self.fitted();
        table.rows.remove(index);
        Ok(table)
    }

    pub fn remove_column(&self, index: usize) -> Result<Self, ExtractError> {
        if index >= self.width() {
            return Err(ExtractError::OutOfRange {
                what: "column",
                index,
                len: self.width(),
            });
        }
        if self.width() == 1 {
            return Err(ExtractError::InvalidOption(
                "cannot remove the only column of a table".to_string(),
            ));
        }

        let mut table = self.fitted();
        table.headers.remove(index);
        for row in &mut table.rows {
            row.remove(index);
        }
        Ok(table)
    }

    /// Drops rows whose cells are all blank.
    #[must_use]
    pub fn without_empty_rows(&self) -> Self {
        Self {
            headers: self.headers.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
                .cloned()
                .collect(),
        }
    }
}

pub(crate) fn fit_row(mut row: Vec<String>, width: usize) -> Vec<String> {
    row.resize(width, String::new());
    row
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub bbox: BBox,
    pub confidence: f32,
}

impl Word {
    #[must_use]
    pub fn new(text: impl Into<String>, bbox: BBox, confidence: f32) -> Self {
        Self {
            text: text.into(),
            bbox,
            confidence,
        }
    }

    /// A zero-sized box anchored at `(x, y)`.
    #[must_use]
    pub fn at(text: impl Into<String>, x: f32, y: f32, confidence: f32) -> Self {
        Self::new(
            text,
            BBox {
                x0: x,
                y0: y,
                x1: x,
                y1: y,
            },
            confidence,
        )
    }

    #[must_use]
    pub fn x(&self) -> f32 {
        self.bbox.x0
    }

    #[must_use]
    pub fn y(&self) -> f32 {
        self.bbox.y0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrLine {
    #[serde(default)]
    pub words: Vec<Word>,
}

/// OCR output as handed over by the recognizer.
#[derive(Debug, Clone, PartialEq)]
pub enum OcrOutput {
    TextOnly { text: String },
    WithGeometry { text: String, lines: Vec<OcrLine> },
}

impl OcrOutput {
    #[must_use]
    pub fn text_only(text: impl Into<String>) -> Self {
        Self::TextOnly { text: text.into() }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::TextOnly { text } | Self::WithGeometry { text, .. } => text,
        }
    }

    #[must_use]
    pub fn has_geometry(&self) -> bool {
        matches!(self, Self::WithGeometry { .. })
    }

    #[must_use]
    pub fn lines(&self) -> &[OcrLine] {
        match self {
            Self::TextOnly { .. } => &[],
            Self::WithGeometry { lines, .. } => lines,
        }
    }

    pub fn words(&self) -> impl Iterator<Item = &Word> {
        self.lines().iter().flat_map(|line| line.words.iter())
    }
}

/// Wire form of the OCR input: `{ text, lines? }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrPayload {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<OcrLine>>,
}

impl From<OcrPayload> for OcrOutput {
    fn from(payload: OcrPayload) -> Self {
        match payload.lines {
            Some(lines) if lines.iter().any(|line| !line.words.is_empty()) => {
                Self::WithGeometry {
                    text: payload.text,
                    lines,
                }
            }
            _ => Self::TextOnly { text: payload.text },
        }
    }
}
