//! Fiscal-year resolution.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ReportError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalYear {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FiscalYear {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Resolves the fiscal year containing a date for a company.
#[async_trait]
pub trait FiscalCalendar: Send + Sync + 'static {
    async fn resolve_fiscal_year(
        &self,
        date: NaiveDate,
        company: Option<&str>,
    ) -> Result<Option<FiscalYear>>;
}

/// A calendar where every fiscal year starts on the same month and day.
///
/// Labels follow the usual naming: `"2024"` for calendar years, otherwise
/// `"2024-2025"` for a year starting in 2024.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedFiscalCalendar {
    start_month: u32,
    start_day: u32,
}

impl FixedFiscalCalendar {
    pub fn new(start_month: u32, start_day: u32) -> Result<Self> {
        // 2001 is not a leap year, so Feb 29 is rejected here as well.
        NaiveDate::from_ymd_opt(2001, start_month, start_day)
            .ok_or_else(|| anyhow!("invalid fiscal year start {start_month:02}-{start_day:02}"))?;
        Ok(Self {
            start_month,
            start_day,
        })
    }

    /// Parse an `MM-DD` string such as `"04-01"`.
    pub fn parse(raw: &str) -> Result<Self> {
        let (month, day) = raw
            .trim()
            .split_once('-')
            .ok_or_else(|| anyhow!("fiscal year start must be MM-DD, got '{raw}'"))?;
        Self::new(month.parse()?, day.parse()?)
    }

    pub fn calendar_year() -> Self {
        Self {
            start_month: 1,
            start_day: 1,
        }
    }

    pub fn year_containing(&self, date: NaiveDate) -> Option<FiscalYear> {
        let this_year = NaiveDate::from_ymd_opt(date.year(), self.start_month, self.start_day)?;
        let start_year = if date >= this_year {
            date.year()
        } else {
            date.year() - 1
        };
        let start = NaiveDate::from_ymd_opt(start_year, self.start_month, self.start_day)?;
        let next = NaiveDate::from_ymd_opt(start_year + 1, self.start_month, self.start_day)?;
        let label = if self.start_month == 1 && self.start_day == 1 {
            start_year.to_string()
        } else {
            format!("{}-{}", start_year, start_year + 1)
        };
        Some(FiscalYear {
            label,
            start,
            end: next.pred_opt()?,
        })
    }
}

impl Default for FixedFiscalCalendar {
    fn default() -> Self {
        Self::calendar_year()
    }
}

#[async_trait]
impl FiscalCalendar for FixedFiscalCalendar {
    async fn resolve_fiscal_year(
        &self,
        date: NaiveDate,
        _company: Option<&str>,
    ) -> Result<Option<FiscalYear>> {
        Ok(self.year_containing(date))
    }
}

/// Consecutive fiscal years resolved once for a report window.
#[derive(Debug, Clone, Default)]
pub struct FiscalYears {
    years: Vec<FiscalYear>,
    company: Option<String>,
}

impl FiscalYears {
    /// Resolve every fiscal year overlapping `[start, end]`.
    pub async fn load(
        calendar: &dyn FiscalCalendar,
        start: NaiveDate,
        end: NaiveDate,
        company: Option<&str>,
    ) -> Result<Self, ReportError> {
        let mut years = Vec::new();
        let mut cursor = start;
        loop {
            let year = calendar
                .resolve_fiscal_year(cursor, company)
                .await?
                .ok_or_else(|| ReportError::FiscalYearNotFound {
                    date: cursor,
                    company: company.map(str::to_string),
                })?;
            if !year.contains(cursor) {
                return Err(ReportError::Store(anyhow!(
                    "fiscal year {} does not contain {cursor}",
                    year.label
                )));
            }
            let year_end = year.end;
            years.push(year);
            if year_end >= end {
                break;
            }
            cursor = year_end
                .succ_opt()
                .ok_or_else(|| anyhow!("date overflow after {year_end}"))?;
        }
        Ok(Self {
            years,
            company: company.map(str::to_string),
        })
    }

    pub fn from_years(years: Vec<FiscalYear>, company: Option<&str>) -> Self {
        Self {
            years,
            company: company.map(str::to_string),
        }
    }

    pub fn find(&self, date: NaiveDate) -> Result<&FiscalYear, ReportError> {
        self.years
            .iter()
            .find(|y| y.contains(date))
            .ok_or_else(|| ReportError::FiscalYearNotFound {
                date,
                company: self.company.clone(),
            })
    }
}
