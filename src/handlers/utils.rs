use axum::{extract::rejection::JsonRejection, Json};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::ApiConfig;
use crate::error::ApiError;

/// Unwraps a JSON body that must be an object.
pub fn json_object(payload: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, ApiError> {
    let Json(value) = payload.map_err(|rejection| ApiError::invalid_json(rejection.body_text()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::invalid_json("Request body must be a JSON object")),
    }
}

/// Raw `?page=&limit=` values; parsing is lenient so bad input falls back to defaults.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Pagination {
    pub const DEFAULT_PAGE: u64 = 1;

    pub fn from_query(query: &PageQuery, api: &ApiConfig) -> Self {
        let page = parse_positive(query.page.as_deref()).unwrap_or(Self::DEFAULT_PAGE);
        let mut limit = parse_positive(query.limit.as_deref()).unwrap_or(api.default_page_limit.max(1));
        if let Some(max) = api.max_page_limit {
            limit = limit.min(max.max(1));
        }
        Self { page, limit }
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, count: u64) -> u64 {
        count.div_ceil(self.limit)
    }
}

/// Positive whole number, also accepting integral floats such as "2.0".
/// Negative and zero values yield `None` so the caller's default applies
/// instead of a negative skip reaching the store.
fn parse_positive(raw: Option<&str>) -> Option<u64> {
    let raw = raw?.trim();
    let value = raw.parse::<u64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && f.fract() == 0.0 && *f >= 1.0 && *f <= u64::MAX as f64)
            .map(|f| f as u64)
    })?;
    (value > 0).then_some(value)
}
