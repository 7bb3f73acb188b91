use std::borrow::Cow;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Months, NaiveDate};
use serde::Deserialize;
use serde_json::{json, Value};

use leadpulse_core::{
    filter::{Granularity, ReportFilters},
    report::{Report, ReportKind},
};

use crate::{error::AppError, state::AppState};

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub period: Option<String>,
    pub company: Option<String>,
    pub lead: Option<String>,
    pub lead_owner: Option<String>,
    /// `json` (default) or `csv`.
    pub format: Option<String>,
}

impl ReportQuery {
    fn filters(&self) -> ReportFilters {
        ReportFilters {
            from_date: self.from_date.clone(),
            to_date: self.to_date.clone(),
            period: self.period.clone(),
            company: self.company.clone(),
            lead: self.lead.clone(),
            lead_owner: self.lead_owner.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Csv,
}

fn parse_format(raw: Option<&str>) -> Result<Format, AppError> {
    match raw.map(str::trim) {
        None | Some("") | Some("json") => Ok(Format::Json),
        Some("csv") => Ok(Format::Csv),
        Some(other) => Err(AppError::BadRequest {
            message: format!("unsupported format: {other}; expected 'json' or 'csv'"),
            field: Some("format"),
        }),
    }
}

fn today_in(timezone: &str) -> Result<NaiveDate, AppError> {
    let tz = timezone
        .parse::<chrono_tz::Tz>()
        .map_err(|_| AppError::Internal(anyhow::anyhow!("invalid timezone '{timezone}'")))?;
    Ok(chrono::Utc::now().with_timezone(&tz).date_naive())
}

fn filter_definitions(kind: ReportKind, today: NaiveDate) -> Vec<Value> {
    let from_default = today.checked_sub_months(Months::new(1)).unwrap_or(today);
    let subject = match kind.subject_filter() {
        "lead_owner" => json!({
            "fieldname": "lead_owner",
            "label": "Lead Owner",
            "fieldtype": "Link",
            "options": "User",
            "reqd": false
        }),
        _ => json!({
            "fieldname": "lead",
            "label": "Lead",
            "fieldtype": "Link",
            "options": "Lead",
            "reqd": false
        }),
    };
    let periods: Vec<&str> = Granularity::ALL.iter().map(|g| g.as_str()).collect();

    vec![
        json!({
            "fieldname": "company",
            "label": "Company",
            "fieldtype": "Link",
            "options": "Company",
            "reqd": false
        }),
        subject,
        json!({
            "fieldname": "from_date",
            "label": "From Date",
            "fieldtype": "Date",
            "default": from_default.format("%Y-%m-%d").to_string(),
            "reqd": true
        }),
        json!({
            "fieldname": "to_date",
            "label": "To Date",
            "fieldtype": "Date",
            "default": today.format("%Y-%m-%d").to_string(),
            "reqd": true
        }),
        json!({
            "fieldname": "period",
            "label": "Period",
            "fieldtype": "Select",
            "options": periods,
            "default": Granularity::default().as_str(),
            "reqd": false
        }),
    ]
}

/// `GET /api/reports`: the report catalog with filter definitions.
///
/// Date defaults are computed in `LEADPULSE_TIMEZONE`.
#[tracing::instrument(skip(state))]
pub async fn list_reports(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let today = today_in(&state.config.timezone)?;
    let reports: Vec<Value> = ReportKind::ALL
        .into_iter()
        .map(|kind| {
            json!({
                "name": kind.slug(),
                "title": kind.title(),
                "subject": kind.subject_filter(),
                "filters": filter_definitions(kind, today),
            })
        })
        .collect();
    Ok(Json(json!({ "data": reports })))
}

/// `GET /api/reports/{report}`: run one report.
///
/// Unknown report → 404. Filter errors → 400 with the offending `field`.
#[tracing::instrument(skip(state))]
pub async fn run_report(
    State(state): State<Arc<AppState>>,
    Path(report): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, AppError> {
    let kind = ReportKind::parse(&report)?;
    let format = parse_format(query.format.as_deref())?;
    let report = state.engine.execute_raw(kind, &query.filters()).await?;

    match format {
        Format::Json => Ok(Json(json!({
            "data": {
                "columns": report.columns,
                "rows": report.rows,
                "truncated": report.truncated,
            }
        }))
        .into_response()),
        Format::Csv => {
            let body = build_csv(&report).map_err(AppError::Internal)?;
            let filename = format!(
                "{}-{}-{}.csv",
                kind.slug(),
                query.from_date.as_deref().unwrap_or_default().trim(),
                query.to_date.as_deref().unwrap_or_default().trim()
            );
            build_csv_response(&filename, body)
        }
    }
}

/// Prefix values a spreadsheet would evaluate as a formula.
fn sanitize_csv_field(val: &str) -> Cow<'_, str> {
    if val.starts_with(['=', '+', '-', '@', '\t', '\r']) {
        Cow::Owned(format!("'{val}"))
    } else {
        Cow::Borrowed(val)
    }
}

fn csv_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => sanitize_csv_field(s).into_owned(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Some(other) => other.to_string(),
    }
}

/// Header row of column labels, then one record per report row in column
/// order.
fn build_csv(report: &Report) -> anyhow::Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::with_capacity(
        report.rows.len().saturating_mul(report.columns.len() * 8),
    ));

    wtr.write_record(report.columns.iter().map(|c| c.label.as_str()))
        .map_err(|e| anyhow::anyhow!("csv write_record failed: {e}"))?;

    for row in &report.rows {
        let record: Vec<String> = report
            .columns
            .iter()
            .map(|c| csv_cell(row.get(&c.fieldname)))
            .collect();
        wtr.write_record(&record)
            .map_err(|e| anyhow::anyhow!("csv write_record failed: {e}"))?;
    }

    wtr.into_inner()
        .map_err(|e| anyhow::anyhow!("csv flush failed: {e}"))
}

fn build_csv_response(filename: &str, body: Vec<u8>) -> Result<Response, AppError> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(axum::body::Body::from(body))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to build CSV response: {e}")))
}
