use anyhow::Result;
use chrono::NaiveDate;

use leadpulse_core::fiscal::FiscalYear;

use super::{parse_day, DAY_FORMAT};
use crate::DuckDbBackend;

struct Candidate {
    year: FiscalYear,
    companies: Vec<String>,
}

/// The enabled fiscal year containing `date`.
///
/// With a company, years linked to that company win over years linked to no
/// company; years linked only to other companies are skipped. Among equals
/// the latest start wins.
pub async fn resolve_fiscal_year_inner(
    db: &DuckDbBackend,
    date: NaiveDate,
    company: Option<&str>,
) -> Result<Option<FiscalYear>> {
    let day = date.format(DAY_FORMAT).to_string();
    let conn = db.conn.lock().await;
    let mut stmt = conn.prepare(
        r#"
        SELECT
            fy.name,
            strftime(fy.year_start_date, '%Y-%m-%d') AS start_day,
            strftime(fy.year_end_date, '%Y-%m-%d') AS end_day,
            c.company
        FROM fiscal_year fy
        LEFT JOIN fiscal_year_company c ON c.parent = fy.name
        WHERE NOT fy.disabled
          AND fy.year_start_date <= CAST(?1 AS DATE)
          AND fy.year_end_date >= CAST(?1 AS DATE)
        ORDER BY fy.year_start_date DESC, fy.name
        "#,
    )?;
    let rows = stmt.query_map(duckdb::params![day], |row| {
        let name: String = row.get(0)?;
        let start: String = row.get(1)?;
        let end: String = row.get(2)?;
        let company: Option<String> = row.get(3)?;
        Ok((name, start, end, company))
    })?;

    // Rows for one year are adjacent: one per linked company, or one with NULL.
    let mut candidates: Vec<Candidate> = Vec::new();
    for row in rows {
        let (name, start, end, linked) = row?;
        if candidates.last().map_or(true, |last| last.year.label != name) {
            candidates.push(Candidate {
                year: FiscalYear {
                    label: name,
                    start: parse_day(&start)?,
                    end: parse_day(&end)?,
                },
                companies: Vec::new(),
            });
        }
        if let (Some(linked), Some(last)) = (linked, candidates.last_mut()) {
            last.companies.push(linked);
        }
    }

    let Some(company) = company else {
        return Ok(candidates.into_iter().next().map(|c| c.year));
    };
    let linked = candidates
        .iter()
        .position(|c| c.companies.iter().any(|linked| linked == company));
    let shared = candidates.iter().position(|c| c.companies.is_empty());
    Ok(linked
        .or(shared)
        .map(|idx| candidates.swap_remove(idx).year))
}
