//! Report filters: the raw record a caller sends and its validated form.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ReportError;

/// Bucketing unit for period pivots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Granularity {
    Weekly,
    #[default]
    Monthly,
    Quarterly,
    #[serde(rename = "Half-Yearly")]
    HalfYearly,
    Yearly,
}

impl Granularity {
    pub const ALL: [Granularity; 5] = [
        Granularity::Weekly,
        Granularity::Monthly,
        Granularity::Quarterly,
        Granularity::HalfYearly,
        Granularity::Yearly,
    ];

    pub fn parse(raw: Option<&str>) -> Result<Self, ReportError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some("Weekly") => Ok(Self::Weekly),
            Some("Monthly") => Ok(Self::Monthly),
            Some("Quarterly") => Ok(Self::Quarterly),
            Some("Half-Yearly") => Ok(Self::HalfYearly),
            Some("Yearly") => Ok(Self::Yearly),
            Some(other) => Err(ReportError::UnknownPeriod(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Weekly => "Weekly",
            Granularity::Monthly => "Monthly",
            Granularity::Quarterly => "Quarterly",
            Granularity::HalfYearly => "Half-Yearly",
            Granularity::Yearly => "Yearly",
        }
    }

    /// Month step for calendar granularities; `None` for weekly.
    pub fn increment_months(&self) -> Option<u32> {
        match self {
            Granularity::Weekly => None,
            Granularity::Monthly => Some(1),
            Granularity::Quarterly => Some(3),
            Granularity::HalfYearly => Some(6),
            Granularity::Yearly => Some(12),
        }
    }

    /// Half-yearly and yearly buckets are labelled by fiscal year.
    pub fn uses_fiscal_year(&self) -> bool {
        matches!(self, Granularity::HalfYearly | Granularity::Yearly)
    }
}

/// Filter record as received from a caller. Every field is optional; blank
/// strings are treated as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportFilters {
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub period: Option<String>,
    pub company: Option<String>,
    pub lead: Option<String>,
    pub lead_owner: Option<String>,
}

/// Validated filters driving one report execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub period: Granularity,
    pub company: Option<String>,
    pub lead: Option<String>,
    pub lead_owner: Option<String>,
}

impl Filter {
    pub fn new(from_date: NaiveDate, to_date: NaiveDate, period: Granularity) -> Self {
        Self {
            from_date,
            to_date,
            period,
            company: None,
            lead: None,
            lead_owner: None,
        }
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    pub fn with_lead(mut self, lead: impl Into<String>) -> Self {
        self.lead = Some(lead.into());
        self
    }

    pub fn with_lead_owner(mut self, lead_owner: impl Into<String>) -> Self {
        self.lead_owner = Some(lead_owner.into());
        self
    }
}

impl TryFrom<&ReportFilters> for Filter {
    type Error = ReportError;

    fn try_from(raw: &ReportFilters) -> Result<Self, Self::Error> {
        let from_date = parse_date("from_date", raw.from_date.as_deref())?;
        let to_date = parse_date("to_date", raw.to_date.as_deref())?;
        if to_date < from_date {
            return Err(ReportError::InvalidRange);
        }
        Ok(Self {
            from_date,
            to_date,
            period: Granularity::parse(raw.period.as_deref())?,
            company: non_blank(raw.company.as_deref()),
            lead: non_blank(raw.lead.as_deref()),
            lead_owner: non_blank(raw.lead_owner.as_deref()),
        })
    }
}

fn parse_date(field: &'static str, raw: Option<&str>) -> Result<NaiveDate, ReportError> {
    let Some(value) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Err(ReportError::MissingFilter(field));
    };
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| ReportError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

fn non_blank(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
