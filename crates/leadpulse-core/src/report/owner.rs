use std::collections::BTreeMap;

use crate::error::ReportError;
use crate::filter::Filter;
use crate::pivot::{Column, Metric, PivotSchema};
use crate::tally::TallyAggregator;

use super::{empty_report, lead_query, MetricTallies, Report, ReportEngine};

const METRICS: [Metric; 6] = [
    Metric::Lead,
    Metric::Opportunity,
    Metric::Quotations,
    Metric::IntroductionEmail,
    Metric::FollowUpEmail,
    Metric::Meetings,
];

/// Period-Wise Lead Owner Efficiency: leads grouped by owner, tallies summed
/// over each owner's leads.
pub(super) async fn run(engine: &ReportEngine, filter: &Filter) -> Result<Report, ReportError> {
    let calendar = engine.calendar(filter).await?;
    let periods = &calendar.range.periods;
    let schema = PivotSchema::build(
        Column::link("Lead Owner", "lead_owner", "User"),
        &METRICS,
        periods,
    );

    let leads = engine.store.list_leads(&lead_query(filter, true)).await?;
    let mut by_owner: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for lead in leads {
        if let Some(owner) = lead.lead_owner {
            by_owner.entry(owner).or_default().push(lead.name);
        }
    }
    if by_owner.is_empty() {
        return Ok(empty_report(&schema, calendar));
    }

    let keys: Vec<String> = by_owner.values().flatten().cloned().collect();
    let groups: Vec<(String, Vec<String>)> = by_owner.into_iter().collect();

    let aggregator = TallyAggregator::new(engine.store.as_ref(), &calendar.range);
    let tallies = MetricTallies::collect(
        &aggregator,
        &keys,
        &METRICS,
        engine.settings.owner_quotations,
    )
    .await?
    .rollup(&groups);

    let rows = groups
        .iter()
        .map(|(owner, owned)| {
            let lead_count = owned.len() as f64;
            schema.row(owner, periods, |key, period| match key.metric {
                Metric::Lead => lead_count,
                metric => tallies.get(metric, owner, &period.label),
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
