use anyhow::Result;

use leadpulse_core::store::{LeadQuery, LeadRecord};

use super::{parse_day, FilterSql};
use crate::DuckDbBackend;

pub async fn list_leads_inner(db: &DuckDbBackend, query: &LeadQuery) -> Result<Vec<LeadRecord>> {
    let conn = db.conn.lock().await;
    let mut filter = FilterSql::after(Vec::new());
    if let Some(window) = query.created {
        filter.within("CAST(creation AS DATE)", window);
    }
    if let Some(company) = &query.company {
        filter.equals("company", company);
    }
    if let Some(lead) = &query.lead {
        filter.equals("name", lead);
    }
    if let Some(owner) = &query.lead_owner {
        filter.equals("lead_owner", owner);
    }
    if query.require_owner {
        filter.sql.push_str(" AND lead_owner IS NOT NULL AND lead_owner <> ''");
    }

    let sql = format!(
        r#"
        SELECT
            name,
            lead_owner,
            company,
            strftime(CAST(creation AS DATE), '%Y-%m-%d') AS created_on
        FROM lead
        WHERE 1 = 1
          {}
        ORDER BY name
        "#,
        filter.sql
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(filter.refs().as_slice(), |row| {
        let name: String = row.get(0)?;
        let lead_owner: Option<String> = row.get(1)?;
        let company: Option<String> = row.get(2)?;
        let created_on: String = row.get(3)?;
        Ok((name, lead_owner, company, created_on))
    })?;

    let mut leads = Vec::new();
    for row in rows {
        let (name, lead_owner, company, created_on) = row?;
        leads.push(LeadRecord {
            name,
            lead_owner: lead_owner.filter(|o| !o.is_empty()),
            company,
            creation: parse_day(&created_on)?,
        });
    }
    Ok(leads)
}
