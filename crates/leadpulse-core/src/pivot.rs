//! Pivot column schema.
//!
//! Columns and row cells are both produced from [`PivotSchema::cells`], so a
//! row can never address a field the schema does not declare.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::period::Period;

/// One report row: fieldname → value.
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    IntroductionEmail,
    FollowUpEmail,
    Meetings,
    Opportunity,
    Quotations,
    Lead,
}

impl Metric {
    pub fn label(&self) -> &'static str {
        match self {
            Metric::IntroductionEmail => "No of Introduction Email",
            Metric::FollowUpEmail => "No of Follow-Up Email",
            Metric::Meetings => "No of Meetings",
            Metric::Opportunity => "No of Opportunity",
            Metric::Quotations => "No of Quotations",
            Metric::Lead => "No of Lead",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    Link,
    Float,
    Data,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub label: String,
    pub fieldname: String,
    pub fieldtype: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
    pub width: u32,
}

impl Column {
    pub fn link(label: &str, fieldname: &str, target: &str) -> Self {
        Self {
            label: label.to_string(),
            fieldname: fieldname.to_string(),
            fieldtype: FieldType::Link,
            options: Some(target.to_string()),
            width: 200,
        }
    }

    pub fn data(label: &str, fieldname: &str, width: u32) -> Self {
        Self {
            label: label.to_string(),
            fieldname: fieldname.to_string(),
            fieldtype: FieldType::Data,
            options: None,
            width,
        }
    }
}

/// Identifies one metric cell: a metric and the index of its period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PivotKey {
    pub metric: Metric,
    pub period: usize,
}

#[derive(Debug, Clone)]
pub struct PivotSchema {
    key: Column,
    cells: Vec<(PivotKey, Column)>,
}

impl PivotSchema {
    /// Key column first, then one column per (metric, period), metric-outer.
    pub fn build(key: Column, metrics: &[Metric], periods: &[Period]) -> Self {
        let mut cells = Vec::with_capacity(metrics.len() * periods.len());
        for &metric in metrics {
            for (index, period) in periods.iter().enumerate() {
                cells.push((
                    PivotKey {
                        metric,
                        period: index,
                    },
                    Column {
                        label: format!("{}({})", unscrub(metric.label()), unscrub(&period.label)),
                        fieldname: scrub(&format!("{} {}", metric.label(), period.label)),
                        fieldtype: FieldType::Float,
                        options: None,
                        width: 120,
                    },
                ));
            }
        }

        let mut seen = HashSet::new();
        for (_, column) in &cells {
            if !seen.insert(column.fieldname.as_str()) {
                warn!(fieldname = %column.fieldname, "Duplicate pivot fieldname");
            }
        }

        Self { key, cells }
    }

    pub fn key_column(&self) -> &Column {
        &self.key
    }

    pub fn cells(&self) -> &[(PivotKey, Column)] {
        &self.cells
    }

    /// Build a row for `subject`, asking `value` for every cell in schema
    /// order. `periods` must be the slice the schema was built from.
    pub fn row<F>(&self, subject: &str, periods: &[Period], mut value: F) -> Row
    where
        F: FnMut(PivotKey, &Period) -> f64,
    {
        let mut row = Row::new();
        row.insert(self.key.fieldname.clone(), Value::from(subject));
        for (key, column) in &self.cells {
            let cell = periods.get(key.period).map_or(0.0, |p| value(*key, p));
            row.insert(column.fieldname.clone(), Value::from(cell));
        }
        row
    }

    pub fn columns(&self) -> Vec<Column> {
        std::iter::once(self.key.clone())
            .chain(self.cells.iter().map(|(_, column)| column.clone()))
            .collect()
    }
}

/// Field identifier for a label: ASCII lowercase, spaces and hyphens become
/// underscores.
pub fn scrub(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

/// Display form of a label: `_` and `-` become spaces, words are title-cased.
pub fn unscrub(text: &str) -> String {
    text.split(['_', '-', ' '])
        .filter(|word| !word.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn period(label: &str, month: u32) -> Period {
        let start = NaiveDate::from_ymd_opt(2024, month, 1).expect("date");
        Period {
            start,
            end: start,
            label: label.to_string(),
        }
    }

    #[test]
    fn scrub_matches_field_naming() {
        assert_eq!(
            scrub("No of Follow-Up Email Week 5 2024"),
            "no_of_follow_up_email_week_5_2024"
        );
        assert_eq!(scrub("No of Meetings Feb 2024"), "no_of_meetings_feb_2024");
    }

    #[test]
    fn unscrub_title_cases() {
        assert_eq!(unscrub("No of Follow-Up Email"), "No Of Follow Up Email");
        assert_eq!(unscrub("Quarter 1 2024"), "Quarter 1 2024");
        assert_eq!(unscrub("lead_owner"), "Lead Owner");
    }

    #[test]
    fn schema_is_key_then_metric_major() {
        let periods = vec![period("Jan 2024", 1), period("Feb 2024", 2)];
        let schema = PivotSchema::build(
            Column::link("Lead", "lead", "Lead"),
            &[Metric::Meetings, Metric::Quotations],
            &periods,
        );
        let names: Vec<String> = schema.columns().into_iter().map(|c| c.fieldname).collect();
        assert_eq!(
            names,
            vec![
                "lead",
                "no_of_meetings_jan_2024",
                "no_of_meetings_feb_2024",
                "no_of_quotations_jan_2024",
                "no_of_quotations_feb_2024",
            ]
        );
        let (key, column) = &schema.cells()[1];
        assert_eq!(
            *key,
            PivotKey {
                metric: Metric::Meetings,
                period: 1
            }
        );
        assert_eq!(column.label, "No Of Meetings(Feb 2024)");
        assert_eq!(column.fieldtype, FieldType::Float);
        assert_eq!(column.width, 120);
    }

    #[test]
    fn rows_cover_every_schema_field() {
        let periods = vec![period("Jan 2024", 1), period("Feb 2024", 2)];
        let schema = PivotSchema::build(
            Column::link("Lead", "lead", "Lead"),
            &[Metric::Meetings, Metric::Opportunity],
            &periods,
        );
        let row = schema.row("LEAD-1", &periods, |key, p| {
            if key.metric == Metric::Meetings && p.label == "Feb 2024" {
                1.0
            } else {
                0.0
            }
        });
        assert_eq!(row.len(), schema.columns().len());
        assert_eq!(row["lead"], Value::from("LEAD-1"));
        assert_eq!(row["no_of_meetings_feb_2024"], Value::from(1.0));
        assert_eq!(row["no_of_meetings_jan_2024"], Value::from(0.0));
        assert_eq!(row["no_of_opportunity_feb_2024"], Value::from(0.0));
    }

    #[test]
    fn fieldnames_are_injective_for_all_metrics() {
        let periods = vec![
            period("Week 1 2024", 1),
            period("Week 2 2024", 1),
            period("Week 10 2024", 3),
        ];
        let metrics = [
            Metric::Lead,
            Metric::Opportunity,
            Metric::Quotations,
            Metric::IntroductionEmail,
            Metric::FollowUpEmail,
            Metric::Meetings,
        ];
        let schema = PivotSchema::build(
            Column::link("Lead Owner", "lead_owner", "User"),
            &metrics,
            &periods,
        );
        let names: HashSet<String> = schema.columns().into_iter().map(|c| c.fieldname).collect();
        assert_eq!(names.len(), 1 + metrics.len() * periods.len());
    }
}
