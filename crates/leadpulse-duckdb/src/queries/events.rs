use anyhow::Result;
use duckdb::types::ToSql;

use leadpulse_core::store::{CategoryCount, DailyCount, EventQuery};

use super::{daily_counts, FilterSql};
use crate::DuckDbBackend;

/// Open events with a Lead participant, counted per (lead, start day).
///
/// An event naming the same lead twice counts once.
pub async fn count_events_inner(db: &DuckDbBackend, query: &EventQuery) -> Result<Vec<DailyCount>> {
    let conn = db.conn.lock().await;
    let category: Vec<Box<dyn ToSql>> = vec![Box::new(query.category.as_str().to_string())];
    let mut filter = FilterSql::after(category);
    filter.activity("p.reference_docname", "CAST(e.starts_on AS DATE)", &query.activity);

    let sql = format!(
        r#"
        SELECT
            p.reference_docname AS lead_key,
            strftime(CAST(e.starts_on AS DATE), '%Y-%m-%d') AS bucket_day,
            COUNT(DISTINCT e.name) AS n
        FROM event e
        JOIN event_participants p ON p.parent = e.name
        WHERE e.status = 'Open'
          AND p.reference_doctype = 'Lead'
          AND e.event_category = ?1
          {}
        GROUP BY lead_key, bucket_day
        ORDER BY lead_key, bucket_day
        "#,
        filter.sql
    );

    daily_counts(&conn, &sql, &filter)
}

/// Lifetime open-event counts per (lead, category).
///
/// Events without a category still make the lead appear, under an empty
/// category name.
pub async fn open_event_summary_inner(
    db: &DuckDbBackend,
    lead: Option<&str>,
) -> Result<Vec<CategoryCount>> {
    let conn = db.conn.lock().await;
    let mut filter = FilterSql::after(Vec::new());
    if let Some(lead) = lead {
        filter.equals("p.reference_docname", lead);
    }

    let sql = format!(
        r#"
        SELECT
            p.reference_docname AS lead_key,
            COALESCE(e.event_category, '') AS category,
            COUNT(DISTINCT e.name) AS n
        FROM event e
        JOIN event_participants p ON p.parent = e.name
        WHERE e.status = 'Open'
          AND p.reference_doctype = 'Lead'
          {}
        GROUP BY lead_key, category
        ORDER BY lead_key, category
        "#,
        filter.sql
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(filter.refs().as_slice(), |row| {
        Ok(CategoryCount {
            lead: row.get(0)?,
            category: row.get(1)?,
            count: row.get(2)?,
        })
    })?;

    let mut summary = Vec::new();
    for row in rows {
        summary.push(row?);
    }
    Ok(summary)
}
