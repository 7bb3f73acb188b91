use anyhow::Result;

use leadpulse_core::store::{DailyCount, QuotationQuery, QuotationScope};

use super::{daily_counts, FilterSql};
use crate::DuckDbBackend;

pub async fn count_quotations_inner(
    db: &DuckDbBackend,
    query: &QuotationQuery,
) -> Result<Vec<DailyCount>> {
    let conn = db.conn.lock().await;
    let mut filter = FilterSql::after(Vec::new());
    if query.scope == QuotationScope::Submitted {
        filter.sql.push_str(" AND docstatus = 1");
    }
    filter.activity("party_name", "transaction_date", &query.activity);

    let sql = format!(
        r#"
        SELECT
            party_name AS lead_key,
            strftime(transaction_date, '%Y-%m-%d') AS bucket_day,
            COUNT(*) AS n
        FROM quotation
        WHERE quotation_to = 'Lead'
          {}
        GROUP BY lead_key, bucket_day
        ORDER BY lead_key, bucket_day
        "#,
        filter.sql
    );

    daily_counts(&conn, &sql, &filter)
}
