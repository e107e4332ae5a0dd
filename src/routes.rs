use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use worker::{Context, Date, Env, FormEntry, Request, Response, Result, RouteContext, Router};

use crate::error::ApiError;
use crate::extract::{
    Cascade, ClusterParams, ExtractOptions, OcrOutput, OcrPayload, Strategy, extract_table,
};
use crate::models::{
    ExtractRequest, ExtractResponse, SaveResponse, VALIDATION_URL_VAR, ValidationRequest,
};
use crate::persistence;
use crate::validation;

#[derive(Debug, Clone)]
pub struct AppState {
    pub validation_url: Option<String>,
}

pub async fn handle(req: Request, env: Env, _ctx: Context) -> Result<Response> {
    let validation_url = env
        .var(VALIDATION_URL_VAR)
        .map(|value| value.to_string())
        .ok()
        .filter(|value| !value.trim().is_empty());

    let state = AppState { validation_url };

    Router::with_data(state)
        .post_async("/api/v1/extract", extract_route)
        .post_async("/api/v1/validate", validate_route)
        .post_async("/api/save-photo-data", save_photo_data_route)
        .get_async("/api/v1/tables", table_route)
        .run(req, env)
        .await
}

async fn extract_route(mut req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    match extract_response(&mut req, ctx.data.validation_url.as_deref()).await {
        Ok(response) => json_response(&response),
        Err(error) => error.into_response(),
    }
}

async fn validate_route(mut req: Request, _ctx: RouteContext<AppState>) -> Result<Response> {
    let request = match read_json::<ValidationRequest>(&mut req).await {
        Ok(request) => request,
        Err(error) => return error.into_response(),
    };
    json_response(&validation::validate_table(
        &request,
        &ClusterParams::default(),
    ))
}

async fn save_photo_data_route(mut req: Request, _ctx: RouteContext<AppState>) -> Result<Response> {
    let response = match save_response(&mut req).await {
        Ok(response) => response,
        Err(error) => {
            worker::console_error!("save-photo-data failed: {error}");
            SaveResponse {
                success: false,
                error: Some(error.message().to_string()),
                ..SaveResponse::default()
            }
        }
    };
    json_response(&response)
}

async fn table_route(req: Request, _ctx: RouteContext<AppState>) -> Result<Response> {
    match table_response(&req).await {
        Ok(response) => Ok(response),
        Err(error) => error.into_response(),
    }
}

async fn extract_response(
    req: &mut Request,
    validation_url: Option<&str>,
) -> Result<ExtractResponse, ApiError> {
    let request = read_json::<ExtractRequest>(req).await?;
    let options = extract_options(&request)?;
    let output = OcrOutput::from(OcrPayload {
        text: request.text,
        lines: request.lines,
    });

    let extraction = extract_table(&output, &options)?;
    let strategy = extraction.report.strategy;
    worker::console_log!(
        "table extraction completed: strategy={}, rows={}, columns={}",
        strategy.map_or("fallback", Strategy::as_str),
        extraction.report.row_count,
        extraction.report.column_count
    );

    let (table, validated) = match validation_url {
        Some(url) => {
            let payload = validation::build_validation_request(&output, &extraction.table);
            let outcome = validation::request_server_validation(url, &payload).await;
            if let Err(error) = &outcome {
                worker::console_log!("server validation unavailable: {error}");
            }
            let (table, validated) = validation::resolve_validation(extraction.table, outcome);
            if !validated {
                worker::console_log!("keeping locally extracted table");
            }
            (table, validated)
        }
        None => (extraction.table, false),
    };

    Ok(ExtractResponse {
        success: true,
        data: table,
        strategy: strategy.map(|strategy| strategy.as_str().to_string()),
        validated,
        warnings: extraction
            .report
            .warnings
            .iter()
            .map(ToString::to_string)
            .collect(),
    })
}

/// Builds extraction options from the optional request fields.
pub fn extract_options(request: &ExtractRequest) -> Result<ExtractOptions, ApiError> {
    let mut options = ExtractOptions::default();

    if let Some(raw) = request.cascade.as_deref() {
        let cascade = Cascade::from_str(raw).map_err(ApiError::BadRequest)?;
        options.cascade = Some(cascade);
    }

    if let Some(header) = request.fallback_header.as_deref().map(str::trim)
        && !header.is_empty()
    {
        options.fallback_header = header.to_string();
    }

    Ok(options)
}

async fn save_response(req: &mut Request) -> Result<SaveResponse, ApiError> {
    let form = req.form_data().await?;
    let Some(FormEntry::Field(raw)) = form.get("table_data") else {
        return Err(ApiError::BadRequest(
            "form field 'table_data' is required".to_string(),
        ));
    };

    let table = persistence::coerce_numeric_columns(persistence::parse_table_data(&raw)?);
    let message = persistence::import_message(&table);
    let preview = persistence::preview_rows(&table);
    let saved = persistence::save_table(table, now_utc()?).await?;

    worker::console_log!("saved table {}: {message}", saved.id);
    Ok(SaveResponse {
        success: true,
        message: Some(message),
        error: None,
        id: Some(saved.id),
        preview: Some(preview),
    })
}

async fn table_response(req: &Request) -> Result<Response, ApiError> {
    let query = parse_query(req)?;
    let id = query
        .get("id")
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::BadRequest("query parameter 'id' is required".to_string()))?;
    let format = query
        .get("format")
        .map_or(Ok(TableFormat::Json), |value| value.parse::<TableFormat>())?;

    match format {
        TableFormat::Json => {
            let saved = persistence::load_table(id).await?;
            Ok(json_response(&saved)?)
        }
        TableFormat::Csv => {
            let csv = persistence::load_csv(id).await?;
            let mut response = Response::ok(csv)?;
            response
                .headers_mut()
                .set("Content-Type", "text/csv; charset=utf-8")?;
            response.headers_mut().set(
                "Content-Disposition",
                &format!("inline; filename=\"table-{id}.csv\""),
            )?;
            response.headers_mut().set("Cache-Control", "no-store")?;
            Ok(response)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Json,
    Csv,
}

impl FromStr for TableFormat {
    type Err = ApiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(ApiError::BadRequest(format!(
                "format must be 'json' or 'csv', got '{other}'"
            ))),
        }
    }
}

async fn read_json<T>(req: &mut Request) -> Result<T, ApiError>
where
    T: serde::de::DeserializeOwned,
{
    let body = req.text().await?;
    Ok(serde_json::from_str::<T>(&body)?)
}

fn now_utc() -> Result<DateTime<Utc>, ApiError> {
    let millis = i64::try_from(Date::now().as_millis())
        .map_err(|error| ApiError::Internal(error.to_string()))?;
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| ApiError::Internal(format!("clock out of range: {millis}")))
}

fn json_response<T>(payload: &T) -> Result<Response>
where
    T: Serialize,
{
    let mut response = Response::from_json(payload)?;
    response.headers_mut().set("Cache-Control", "no-store")?;
    Ok(response)
}

fn parse_query(req: &Request) -> Result<HashMap<String, String>, ApiError> {
    let url = req.url()?;
    let query = url
        .query_pairs()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect::<HashMap<_, _>>();
    Ok(query)
}
