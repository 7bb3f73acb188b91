pub mod events;
pub mod fiscal;
pub mod leads;
pub mod opportunities;
pub mod quotations;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use duckdb::types::ToSql;
use duckdb::Connection;

use leadpulse_core::period::DateWindow;
use leadpulse_core::store::{ActivityQuery, DailyCount};

pub(crate) const DAY_FORMAT: &str = "%Y-%m-%d";

/// `AND ...` clauses with positional `?N` parameters, built up front and
/// spliced into a query after its fixed parameters.
pub(crate) struct FilterSql {
    pub sql: String,
    pub params: Vec<Box<dyn ToSql>>,
}

impl FilterSql {
    /// Start numbering after `fixed` parameters already bound by the query.
    pub fn after(fixed: Vec<Box<dyn ToSql>>) -> Self {
        Self {
            sql: String::new(),
            params: fixed,
        }
    }

    fn next_idx(&self) -> usize {
        self.params.len() + 1
    }

    pub fn equals(&mut self, column: &str, value: &str) {
        let idx = self.next_idx();
        self.sql.push_str(&format!(" AND {column} = ?{idx}"));
        self.params.push(Box::new(value.to_string()));
    }

    pub fn one_of(&mut self, column: &str, values: &[String]) {
        let start = self.next_idx();
        let placeholders: Vec<String> = (start..start + values.len())
            .map(|idx| format!("?{idx}"))
            .collect();
        self.sql
            .push_str(&format!(" AND {column} IN ({})", placeholders.join(", ")));
        for value in values {
            self.params.push(Box::new(value.clone()));
        }
    }

    /// Inclusive day bounds on a `DATE` expression.
    pub fn within(&mut self, day_expr: &str, window: DateWindow) {
        let from = self.next_idx();
        self.sql.push_str(&format!(
            " AND {day_expr} >= CAST(?{from} AS DATE) AND {day_expr} <= CAST(?{} AS DATE)",
            from + 1
        ));
        self.params
            .push(Box::new(window.start.format(DAY_FORMAT).to_string()));
        self.params
            .push(Box::new(window.end.format(DAY_FORMAT).to_string()));
    }

    /// Lead-set and window restriction shared by the tally queries.
    pub fn activity(&mut self, lead_column: &str, day_expr: &str, query: &ActivityQuery) {
        if let Some(leads) = &query.leads {
            self.one_of(lead_column, leads);
        }
        if let Some(window) = query.window {
            self.within(day_expr, window);
        }
    }

    pub fn refs(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}

pub(crate) fn parse_day(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DAY_FORMAT).with_context(|| format!("bad date '{raw}'"))
}

/// Run a `SELECT lead, day, count` query.
pub(crate) fn daily_counts(conn: &Connection, sql: &str, filter: &FilterSql) -> Result<Vec<DailyCount>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(filter.refs().as_slice(), |row| {
        let lead: String = row.get(0)?;
        let day: String = row.get(1)?;
        let count: i64 = row.get(2)?;
        Ok((lead, day, count))
    })?;

    let mut counts = Vec::new();
    for row in rows {
        let (lead, day, count) = row?;
        counts.push(DailyCount {
            lead,
            date: parse_day(&day)?,
            count,
        });
    }
    Ok(counts)
}
