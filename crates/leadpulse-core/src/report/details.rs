use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::error::ReportError;
use crate::filter::Filter;
use crate::pivot::{Column, Row};
use crate::store::EventCategory;
use crate::tally::TallyAggregator;

use super::{Report, ReportEngine};

#[derive(Clone, Copy)]
enum Source {
    Events(EventCategory),
    Opportunities,
    Quotations,
}

const FIELDS: [(&str, &str, u32, Source); 5] = [
    (
        "No of Introduction Email",
        "introduction_email",
        200,
        Source::Events(EventCategory::IntroductionEmail),
    ),
    (
        "No of Follow-Up Email",
        "followup_email",
        200,
        Source::Events(EventCategory::FollowUpEmail),
    ),
    (
        "No of Meetings",
        "meeting",
        120,
        Source::Events(EventCategory::Meeting),
    ),
    ("No of Opportunity", "opportunity", 120, Source::Opportunities),
    ("No of Quotations", "quotations", 120, Source::Quotations),
];

fn key_column() -> Column {
    Column::link("Lead", "lead", "Lead")
}

fn columns() -> Vec<Column> {
    std::iter::once(key_column())
        .chain(
            FIELDS
                .iter()
                .map(|(label, fieldname, width, _)| Column::data(label, fieldname, *width)),
        )
        .collect()
}

/// Event Details: lifetime open-event counts per lead, plus opportunity and
/// quotation totals.
///
/// Only the `lead` selector applies; dates and company are ignored. Totals
/// cover every listed lead unless `details_per_lead_totals` is set.
pub(super) async fn run(engine: &ReportEngine, filter: &Filter) -> Result<Report, ReportError> {
    let summary = engine
        .store
        .open_event_summary(filter.lead.as_deref())
        .await?;

    let mut by_lead: BTreeMap<String, HashMap<String, i64>> = BTreeMap::new();
    for row in summary {
        *by_lead
            .entry(row.lead)
            .or_default()
            .entry(row.category)
            .or_insert(0) += row.count;
    }

    let mut report = Report {
        columns: columns(),
        rows: Vec::new(),
        periods: Vec::new(),
        truncated: false,
    };
    if by_lead.is_empty() {
        return Ok(report);
    }

    let leads: Vec<String> = by_lead.keys().cloned().collect();
    let aggregator = TallyAggregator::lifetime(engine.store.as_ref());
    let opportunities = aggregator.tally_opportunities(Some(leads.as_slice())).await?;
    let quotations = aggregator
        .tally_quotations(Some(leads.as_slice()), engine.settings.details_quotations)
        .await?;
    let all_opportunities = opportunities.grand_total();
    let all_quotations = quotations.grand_total();
    let per_lead = engine.settings.details_per_lead_totals;

    for (lead, counts) in &by_lead {
        let mut row = Row::new();
        row.insert(key_column().fieldname, Value::from(lead.as_str()));
        for (_, fieldname, _, source) in FIELDS {
            let value = match source {
                Source::Events(category) => {
                    counts.get(category.as_str()).copied().unwrap_or(0) as f64
                }
                Source::Opportunities if per_lead => opportunities.total(lead),
                Source::Opportunities => all_opportunities,
                Source::Quotations if per_lead => quotations.total(lead),
                Source::Quotations => all_quotations,
            };
            row.insert(fieldname.to_string(), Value::from(value));
        }
        report.rows.push(row);
    }

    Ok(report)
}
