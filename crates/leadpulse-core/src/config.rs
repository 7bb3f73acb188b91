use crate::fiscal::FixedFiscalCalendar;
use crate::period::DEFAULT_MAX_PERIODS;
use crate::report::ReportSettings;
use crate::store::QuotationScope;

const MAX_PERIODS_CEILING: usize = 1000;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: String,
    pub duckdb_memory_limit: String,
    pub cors_origins: Vec<String>,
    /// IANA timezone used for "today" in report filter defaults.
    pub timezone: String,
    pub fiscal_source: FiscalSource,
    pub reports: ReportSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FiscalSource {
    /// Fiscal years come from the store's `fiscal_year` table.
    Table,
    /// Every fiscal year starts on the same day.
    Fixed(FixedFiscalCalendar),
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            port: std::env::var("LEADPULSE_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            data_dir: std::env::var("LEADPULSE_DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            duckdb_memory_limit: std::env::var("LEADPULSE_DUCKDB_MEMORY")
                .unwrap_or_else(|_| "1GB".to_string()),
            cors_origins: std::env::var("LEADPULSE_CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            timezone: std::env::var("LEADPULSE_TIMEZONE").unwrap_or_else(|_| "UTC".to_string()),
            fiscal_source: parse_fiscal_source(
                std::env::var("LEADPULSE_FISCAL_SOURCE").ok(),
                std::env::var("LEADPULSE_FISCAL_YEAR_START").ok(),
            )?,
            reports: ReportSettings {
                max_periods: parse_max_periods(std::env::var("LEADPULSE_MAX_PERIODS").ok())?,
                insight_quotations: scope_from_env(
                    "LEADPULSE_INSIGHT_QUOTATIONS",
                    QuotationScope::Submitted,
                )?,
                owner_quotations: scope_from_env("LEADPULSE_OWNER_QUOTATIONS", QuotationScope::Any)?,
                details_quotations: scope_from_env(
                    "LEADPULSE_DETAILS_QUOTATIONS",
                    QuotationScope::Any,
                )?,
                details_per_lead_totals: std::env::var("LEADPULSE_DETAILS_PER_LEAD_TOTALS")
                    .map(|v| v == "true")
                    .unwrap_or(false),
            },
        })
    }

    pub fn db_path(&self) -> String {
        format!("{}/leadpulse.db", self.data_dir)
    }
}

fn parse_max_periods(raw: Option<String>) -> Result<usize, String> {
    match raw {
        None => Ok(DEFAULT_MAX_PERIODS),
        Some(value) => {
            let parsed: usize = value
                .trim()
                .parse()
                .map_err(|e| format!("invalid LEADPULSE_MAX_PERIODS: {e}"))?;
            if !(1..=MAX_PERIODS_CEILING).contains(&parsed) {
                return Err(format!(
                    "LEADPULSE_MAX_PERIODS must be between 1 and {MAX_PERIODS_CEILING}"
                ));
            }
            Ok(parsed)
        }
    }
}

fn parse_fiscal_source(
    raw: Option<String>,
    year_start: Option<String>,
) -> Result<FiscalSource, String> {
    match raw.as_deref().map(str::trim) {
        None | Some("table") => Ok(FiscalSource::Table),
        Some("fixed") => {
            let start = year_start.as_deref().unwrap_or("01-01");
            FixedFiscalCalendar::parse(start)
                .map(FiscalSource::Fixed)
                .map_err(|e| e.to_string())
        }
        Some(other) => Err(format!(
            "LEADPULSE_FISCAL_SOURCE must be 'table' or 'fixed', got '{other}'"
        )),
    }
}

fn scope_from_env(key: &str, default: QuotationScope) -> Result<QuotationScope, String> {
    match std::env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => QuotationScope::parse(&raw)
            .ok_or_else(|| format!("{key} must be 'submitted' or 'any', got '{raw}'")),
    }
}
