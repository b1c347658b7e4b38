use std::collections::BTreeMap;

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::domain::report::{ReportKind, ReportRange, ReportView};
use crate::envelope;
use crate::errors::AppError;
use crate::serde_helpers::parse_date;
use crate::AppState;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ReportQuery {
    #[serde(default)]
    pub search: Option<String>,
    /// `YYYY-MM-DD`; blank means unbounded.
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

impl ReportQuery {
    fn range(&self) -> Result<ReportRange, AppError> {
        Ok(ReportRange {
            from: date_param("from", self.from.as_deref())?,
            to: date_param("to", self.to.as_deref())?,
        })
    }
}

fn date_param(name: &str, raw: Option<&str>) -> Result<Option<chrono::NaiveDate>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_date(raw)
            .map(Some)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid {name} date '{raw}'"))),
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportResponse {
    pub kind: String,
    /// Summary figures, coerced to numbers.
    pub summary: BTreeMap<String, f64>,
    /// Row count before the search filter.
    pub total_rows: usize,
    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<Value>,
}

impl From<ReportView> for ReportResponse {
    fn from(view: ReportView) -> Self {
        Self {
            kind: view.kind.as_str().to_string(),
            summary: view.summary,
            total_rows: view.total_rows,
            rows: view.rows,
        }
    }
}

/// GET /reports/{kind}
///
/// Fetches the backend's report for the date range and filters its rows by
/// the search text.
#[utoipa::path(
    get,
    path = "/reports/{kind}",
    params(
        ("kind" = String, Path, description = "inventory, orders, purchases or suppliers"),
        ("search" = Option<String>, Query, description = "Case-insensitive row filter"),
        ("from" = Option<String>, Query, description = "Range start, YYYY-MM-DD"),
        ("to" = Option<String>, Query, description = "Range end, YYYY-MM-DD"),
    ),
    responses(
        (status = 200, description = "Report", body = ReportResponse),
        (status = 400, description = "Invalid date range"),
        (status = 404, description = "Unknown report"),
        (status = 502, description = "Backend failure"),
    ),
    tag = "reports"
)]
pub async fn get_report(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<ReportQuery>,
) -> Result<HttpResponse, AppError> {
    let kind: ReportKind = path.parse()?;
    let range = query.range()?;
    let view = state
        .reports
        .report(kind, range, query.search.as_deref().unwrap_or(""))
        .await
        .map_err(AppError::fallback("Failed to load report"))?;
    Ok(envelope::ok(ReportResponse::from(view)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_dates_are_unbounded() {
        let query = ReportQuery {
            from: Some(String::new()),
            to: Some("2024-03-31".to_string()),
            ..Default::default()
        };
        let range = query.range().unwrap();
        assert_eq!(range.from, None);
        assert_eq!(range.to, chrono::NaiveDate::from_ymd_opt(2024, 3, 31));
    }

    #[test]
    fn malformed_dates_are_rejected() {
        let query = ReportQuery {
            from: Some("March".to_string()),
            ..Default::default()
        };
        assert!(matches!(query.range(), Err(AppError::BadRequest(_))));
    }
}
