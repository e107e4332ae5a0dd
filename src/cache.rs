//! Saved tables live in the Workers Cache API, keyed by synthetic URLs.

use serde::{Serialize, de::DeserializeOwned};
use worker::{Cache, Response};

use crate::error::ApiError;

const CACHE_ORIGIN: &str = "https://ocr-table.cache";

#[must_use]
pub fn cache_url(key: &str) -> String {
    format!("{CACHE_ORIGIN}/{}", urlencoding::encode(key))
}

fn with_cache_headers(
    mut response: Response,
    ttl_seconds: u32,
    content_type: &str,
) -> Result<Response, ApiError> {
    let headers = response.headers_mut();
    headers.set("Cache-Control", &format!("public, max-age={ttl_seconds}"))?;
    headers.set("Content-Type", content_type)?;
    Ok(response)
}

async fn lookup(key: &str) -> Result<Option<Response>, ApiError> {
    let cached = Cache::default().get(cache_url(key), true).await?;
    Ok(cached)
}

async fn store(key: &str, response: Response) -> Result<(), ApiError> {
    Cache::default().put(cache_url(key), response).await?;
    Ok(())
}

pub async fn get_json<T>(key: &str) -> Result<Option<T>, ApiError>
where
    T: DeserializeOwned,
{
    let Some(mut response) = lookup(key).await? else {
        return Ok(None);
    };
    let body = response.text().await?;
    Ok(Some(serde_json::from_str::<T>(&body)?))
}

pub async fn put_json<T>(key: &str, value: &T, ttl_seconds: u32) -> Result<(), ApiError>
where
    T: Serialize,
{
    let body = serde_json::to_string(value)?;
    let response = with_cache_headers(
        Response::ok(body)?,
        ttl_seconds,
        "application/json; charset=utf-8",
    )?;
    store(key, response).await
}

pub async fn get_text(key: &str) -> Result<Option<String>, ApiError> {
    let Some(mut response) = lookup(key).await? else {
        return Ok(None);
    };
    Ok(Some(response.text().await?))
}

pub async fn put_text(
    key: &str,
    body: &str,
    ttl_seconds: u32,
    content_type: &str,
) -> Result<(), ApiError> {
    let response = with_cache_headers(Response::ok(body)?, ttl_seconds, content_type)?;
    store(key, response).await
}

#[cfg(test)]
mod tests {
    use super::cache_url;

    #[test]
    fn keys_are_percent_encoded() {
        assert_eq!(
            cache_url("table:v1:19a-0c1f.csv"),
            "https://ocr-table.cache/table%3Av1%3A19a-0c1f.csv"
        );
    }
}
