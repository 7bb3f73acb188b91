//! Report assembly.
//!
//! Every report runs the same pipeline: resolve periods, build the pivot
//! schema, list subjects, tally each metric once, then fill one row per
//! subject from the schema.

mod details;
mod insight;
mod owner;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ReportError;
use crate::filter::{Filter, ReportFilters};
use crate::fiscal::FiscalCalendar;
use crate::period::{DateWindow, Period, ReportCalendar, DEFAULT_MAX_PERIODS};
use crate::pivot::{Column, Metric, PivotSchema, Row};
use crate::store::{EventCategory, LeadQuery, QuotationScope, RecordStore};
use crate::tally::{TallyAggregator, TallyMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    EventInsight,
    #[serde(rename = "period-wise-lead-owner-efficiency")]
    LeadOwnerEfficiency,
    EventDetails,
}

impl ReportKind {
    pub const ALL: [ReportKind; 3] = [
        ReportKind::EventInsight,
        ReportKind::LeadOwnerEfficiency,
        ReportKind::EventDetails,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            ReportKind::EventInsight => "event-insight",
            ReportKind::LeadOwnerEfficiency => "period-wise-lead-owner-efficiency",
            ReportKind::EventDetails => "event-details",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::EventInsight => "Event Insight",
            ReportKind::LeadOwnerEfficiency => "Period-Wise Lead Owner Efficiency",
            ReportKind::EventDetails => "Event Details",
        }
    }

    pub fn parse(slug: &str) -> Result<Self, ReportError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.slug() == slug)
            .ok_or_else(|| ReportError::UnknownReport(slug.to_string()))
    }

    /// The single-subject selector this report accepts.
    pub fn subject_filter(&self) -> &'static str {
        match self {
            ReportKind::LeadOwnerEfficiency => "lead_owner",
            ReportKind::EventInsight | ReportKind::EventDetails => "lead",
        }
    }
}

/// Business rules that differ between report variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSettings {
    pub max_periods: usize,
    pub insight_quotations: QuotationScope,
    pub owner_quotations: QuotationScope,
    pub details_quotations: QuotationScope,
    /// Event details: count opportunities and quotations per lead instead of
    /// over every listed lead.
    pub details_per_lead_totals: bool,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            max_periods: DEFAULT_MAX_PERIODS,
            insight_quotations: QuotationScope::Submitted,
            owner_quotations: QuotationScope::Any,
            details_quotations: QuotationScope::Any,
            details_per_lead_totals: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    pub periods: Vec<Period>,
    /// `true` when the period range stopped at `max_periods`.
    pub truncated: bool,
}

/// Executes reports against a record store and fiscal calendar.
#[derive(Clone)]
pub struct ReportEngine {
    store: Arc<dyn RecordStore>,
    fiscal: Arc<dyn FiscalCalendar>,
    settings: ReportSettings,
}

impl ReportEngine {
    pub fn new(
        store: Arc<dyn RecordStore>,
        fiscal: Arc<dyn FiscalCalendar>,
        settings: ReportSettings,
    ) -> Self {
        Self {
            store,
            fiscal,
            settings,
        }
    }

    pub async fn execute(&self, kind: ReportKind, filter: &Filter) -> Result<Report, ReportError> {
        let started = Instant::now();
        let report = match kind {
            ReportKind::EventInsight => insight::run(self, filter).await?,
            ReportKind::LeadOwnerEfficiency => owner::run(self, filter).await?,
            ReportKind::EventDetails => details::run(self, filter).await?,
        };
        info!(
            report = kind.slug(),
            period = filter.period.as_str(),
            subjects = report.rows.len(),
            periods = report.periods.len(),
            truncated = report.truncated,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Report executed"
        );
        Ok(report)
    }

    /// Validate a raw filter record, then [`execute`](Self::execute).
    pub async fn execute_raw(
        &self,
        kind: ReportKind,
        filters: &ReportFilters,
    ) -> Result<Report, ReportError> {
        let filter = Filter::try_from(filters)?;
        self.execute(kind, &filter).await
    }

    async fn calendar(&self, filter: &Filter) -> Result<ReportCalendar, ReportError> {
        ReportCalendar::resolve(filter, self.fiscal.as_ref(), self.settings.max_periods).await
    }
}

/// Leads created inside the filter window, narrowed by company and selector.
fn lead_query(filter: &Filter, require_owner: bool) -> LeadQuery {
    LeadQuery {
        created: Some(DateWindow {
            start: filter.from_date,
            end: filter.to_date,
        }),
        company: filter.company.clone(),
        lead: filter.lead.clone(),
        lead_owner: filter.lead_owner.clone(),
        require_owner,
    }
}

/// One tally per metric, keyed by lead.
#[derive(Debug, Default)]
struct MetricTallies {
    by_metric: HashMap<Metric, TallyMap>,
}

impl MetricTallies {
    async fn collect(
        aggregator: &TallyAggregator<'_>,
        leads: &[String],
        metrics: &[Metric],
        quotations: QuotationScope,
    ) -> Result<Self, ReportError> {
        let mut by_metric = HashMap::new();
        for &metric in metrics {
            let tally = match metric {
                Metric::IntroductionEmail => {
                    aggregator
                        .tally_events(Some(leads), EventCategory::IntroductionEmail)
                        .await?
                }
                Metric::FollowUpEmail => {
                    aggregator
                        .tally_events(Some(leads), EventCategory::FollowUpEmail)
                        .await?
                }
                Metric::Meetings => {
                    aggregator
                        .tally_events(Some(leads), EventCategory::Meeting)
                        .await?
                }
                Metric::Opportunity => aggregator.tally_opportunities(Some(leads)).await?,
                Metric::Quotations => aggregator.tally_quotations(Some(leads), quotations).await?,
                // Not time-bucketed; filled by the caller.
                Metric::Lead => continue,
            };
            by_metric.insert(metric, tally);
        }
        Ok(Self { by_metric })
    }

    fn get(&self, metric: Metric, subject: &str, period: &str) -> f64 {
        self.by_metric
            .get(&metric)
            .map_or(0.0, |tally| tally.get(subject, period))
    }

    /// Re-key every tally from leads to their groups.
    fn rollup(&self, groups: &[(String, Vec<String>)]) -> Self {
        Self {
            by_metric: self
                .by_metric
                .iter()
                .map(|(metric, tally)| {
                    let rolled = tally.rollup(groups.iter().map(|(group, members)| {
                        (group.as_str(), members.iter().map(String::as_str))
                    }));
                    (*metric, rolled)
                })
                .collect(),
        }
    }
}

fn empty_report(schema: &PivotSchema, calendar: ReportCalendar) -> Report {
    Report {
        columns: schema.columns(),
        rows: Vec::new(),
        periods: calendar.range.periods,
        truncated: calendar.range.truncated,
    }
}
