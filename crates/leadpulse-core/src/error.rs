use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while validating filters or executing a report.
///
/// Store failures are carried as [`ReportError::Store`]; everything else is a
/// problem with the caller's input or with the fiscal calendar data.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{0} is required")]
    MissingFilter(&'static str),

    #[error("invalid {field} '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { field: &'static str, value: String },

    #[error("to_date must be on or after from_date")]
    InvalidRange,

    #[error("period must be one of: Weekly, Monthly, Quarterly, Half-Yearly, Yearly (got '{0}')")]
    UnknownPeriod(String),

    #[error("unknown report: {0}")]
    UnknownReport(String),

    #[error("no fiscal year found for {date}{}", company_suffix(.company))]
    FiscalYearNotFound {
        date: NaiveDate,
        company: Option<String>,
    },

    #[error("record store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl ReportError {
    /// `true` when the error stems from the request rather than the store.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ReportError::Store(_))
    }

    /// Name of the offending filter field, when there is one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ReportError::MissingFilter(field) => Some(*field),
            ReportError::InvalidDate { field, .. } => Some(*field),
            ReportError::InvalidRange => Some("to_date"),
            ReportError::UnknownPeriod(_) => Some("period"),
            _ => None,
        }
    }
}

fn company_suffix(company: &Option<String>) -> String {
    match company {
        Some(name) => format!(" (company {name})"),
        None => String::new(),
    }
}
