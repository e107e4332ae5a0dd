//! Advisory server-side validation.
//!
//! The extract route can hand its locally built table to a remote validator
//! (`VALIDATION_URL`) together with the word positions it was built from. The
//! same worker also serves the validator side at `/api/v1/validate`. Any
//! failure on the client side keeps the local table.

use url::Url;
use worker::wasm_bindgen::JsValue;
use worker::{Fetch, Headers, Method, Request, RequestInit};

use crate::error::ApiError;
use crate::extract::{
    ClusterParams, OcrOutput, Table, ValueScope, Word, cluster_words, normalize_table_values,
};
use crate::models::{ValidationLine, ValidationRequest, ValidationResponse, ValidationWord};

/// Flattens word boxes into the wire shape: one `y` per line (its first
/// word's top edge) and one `x` per word.
#[must_use]
pub fn build_validation_request(output: &OcrOutput, preliminary: &Table) -> ValidationRequest {
    let lines = output
        .lines()
        .iter()
        .filter_map(|line| {
            let first = line.words.first()?;
            Some(ValidationLine {
                y: first.y(),
                words: line
                    .words
                    .iter()
                    .map(|word| ValidationWord {
                        text: word.text.clone(),
                        x: word.x(),
                        confidence: word.confidence,
                    })
                    .collect(),
            })
        })
        .collect();

    ValidationRequest {
        raw_text: output.text().to_string(),
        lines,
        preliminary_data: preliminary.clone(),
    }
}

fn request_words(request: &ValidationRequest) -> Vec<Word> {
    request
        .lines
        .iter()
        .flat_map(|line| {
            line.words
                .iter()
                .map(|word| Word::at(word.text.as_str(), word.x, line.y, word.confidence))
        })
        .collect()
}

/// Validator side: re-cluster the submitted positions, else clean up the
/// preliminary table.
#[must_use]
pub fn validate_table(request: &ValidationRequest, params: &ClusterParams) -> ValidationResponse {
    let words = request_words(request);
    if let Some(table) = cluster_words(&words, params, &mut Vec::new())
        && table.is_structurally_valid()
    {
        return ValidationResponse {
            success: true,
            data: Some(table),
            error: None,
        };
    }

    let preliminary = &request.preliminary_data;
    if preliminary.headers.is_empty() {
        return failure("preliminary table has no headers");
    }
    if !preliminary.is_rectangular() {
        return failure("preliminary table rows do not match the header width");
    }

    ValidationResponse {
        success: true,
        data: Some(normalize_table_values(
            preliminary.clone(),
            ValueScope::AllButFirst,
        )),
        error: None,
    }
}

fn failure(message: &str) -> ValidationResponse {
    ValidationResponse {
        success: false,
        data: None,
        error: Some(message.to_string()),
    }
}

/// Picks the validated table when the validator answered with one, otherwise
/// the preliminary table. The flag tells which one was returned.
#[must_use]
pub fn resolve_validation(
    preliminary: Table,
    outcome: Result<ValidationResponse, ApiError>,
) -> (Table, bool) {
    match outcome {
        Ok(ValidationResponse {
            success: true,
            data: Some(table),
            ..
        }) if !table.headers.is_empty() => (Table::new(table.headers, table.rows), true),
        Ok(_) | Err(_) => (preliminary, false),
    }
}

pub async fn request_server_validation(
    validation_url: &str,
    request: &ValidationRequest,
) -> Result<ValidationResponse, ApiError> {
    let url = Url::parse(validation_url)?;
    let body = serde_json::to_string(request)?;

    let headers = Headers::new();
    headers.set("Content-Type", "application/json")?;
    let mut init = RequestInit::new();
    init.with_method(Method::Post)
        .with_headers(headers)
        .with_body(Some(JsValue::from_str(&body)));

    let outbound = Request::new_with_init(url.as_str(), &init)?;
    let mut response = Fetch::Request(outbound).send().await?;
    let status = response.status_code();
    if status >= 400 {
        return Err(ApiError::Upstream(format!(
            "validation endpoint returned status {status}"
        )));
    }

    let text = response.text().await?;
    Ok(serde_json::from_str::<ValidationResponse>(&text)?)
}
