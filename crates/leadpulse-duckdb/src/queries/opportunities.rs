use anyhow::Result;

use leadpulse_core::store::{ActivityQuery, DailyCount};

use super::{daily_counts, FilterSql};
use crate::DuckDbBackend;

pub async fn count_opportunities_inner(
    db: &DuckDbBackend,
    query: &ActivityQuery,
) -> Result<Vec<DailyCount>> {
    let conn = db.conn.lock().await;
    let mut filter = FilterSql::after(Vec::new());
    filter.activity("party_name", "CAST(creation AS DATE)", query);

    let sql = format!(
        r#"
        SELECT
            party_name AS lead_key,
            strftime(CAST(creation AS DATE), '%Y-%m-%d') AS bucket_day,
            COUNT(*) AS n
        FROM opportunity
        WHERE opportunity_from = 'Lead'
          {}
        GROUP BY lead_key, bucket_day
        ORDER BY lead_key, bucket_day
        "#,
        filter.sql
    );

    daily_counts(&conn, &sql, &filter)
}
