use crate::error::ReportError;
use crate::filter::Filter;
use crate::pivot::{Column, Metric, PivotSchema};
use crate::tally::TallyAggregator;

use super::{empty_report, lead_query, MetricTallies, Report, ReportEngine};

const METRICS: [Metric; 5] = [
    Metric::IntroductionEmail,
    Metric::FollowUpEmail,
    Metric::Meetings,
    Metric::Opportunity,
    Metric::Quotations,
];

/// Event Insight: one row per lead, every metric per period.
pub(super) async fn run(engine: &ReportEngine, filter: &Filter) -> Result<Report, ReportError> {
    let calendar = engine.calendar(filter).await?;
    let periods = &calendar.range.periods;
    let schema = PivotSchema::build(Column::link("Lead", "lead", "Lead"), &METRICS, periods);

    let leads = engine.store.list_leads(&lead_query(filter, false)).await?;
    if leads.is_empty() {
        return Ok(empty_report(&schema, calendar));
    }
    let keys: Vec<String> = leads.iter().map(|lead| lead.name.clone()).collect();

    let aggregator = TallyAggregator::new(engine.store.as_ref(), &calendar.range);
    let tallies = MetricTallies::collect(
        &aggregator,
        &keys,
        &METRICS,
        engine.settings.insight_quotations,
    )
    .await?;

    let rows = keys
        .iter()
        .map(|lead| {
            schema.row(lead, periods, |key, period| {
                tallies.get(key.metric, lead, &period.label)
            })
        })
        .collect();

    Ok(Report {
        columns: schema.columns(),
        rows,
        periods: calendar.range.periods.clone(),
        truncated: calendar.range.truncated,
    })
}
