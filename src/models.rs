use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::extract::{OcrLine, Table};

pub const VALIDATION_URL_VAR: &str = "VALIDATION_URL";
pub const TABLE_CACHE_KEY_PREFIX: &str = "table:v1:";
pub const TABLE_CACHE_TTL_SECONDS: u32 = 30 * 24 * 60 * 60;
pub const PREVIEW_ROW_COUNT: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractRequest {
    pub text: String,
    #[serde(default)]
    pub lines: Option<Vec<OcrLine>>,
    /// Comma-separated strategy names, e.g. `"tab,spaces,pipe"`.
    #[serde(default)]
    pub cascade: Option<String>,
    #[serde(default)]
    pub fallback_header: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractResponse {
    pub success: bool,
    pub data: Table,
    pub strategy: Option<String>,
    /// True only when the remote validator answered with a table.
    pub validated: bool,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationWord {
    pub text: String,
    pub x: f32,
    pub confidence: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationLine {
    pub y: f32,
    pub words: Vec<ValidationWord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationRequest {
    pub raw_text: String,
    #[serde(default)]
    pub lines: Vec<ValidationLine>,
    pub preliminary_data: Table,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Table>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaveResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<Vec<Vec<String>>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavedTable {
    pub id: String,
    pub saved_at: DateTime<Utc>,
    pub table: Table,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}
