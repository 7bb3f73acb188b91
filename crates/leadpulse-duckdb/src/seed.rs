//! Insert helpers for fixtures and local demo data.
//!
//! All helpers use `INSERT OR REPLACE` keyed on the document name, so
//! re-seeding the same fixture is safe.

use anyhow::Result;
use chrono::NaiveDate;

use leadpulse_core::fiscal::FiscalYear;
use leadpulse_core::store::EventCategory;

use crate::queries::DAY_FORMAT;
use crate::DuckDbBackend;

impl DuckDbBackend {
    pub async fn seed_lead(
        &self,
        name: &str,
        lead_owner: Option<&str>,
        company: Option<&str>,
        creation: NaiveDate,
    ) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT OR REPLACE INTO lead (name, lead_name, lead_owner, company, creation)
             VALUES (?1, ?1, ?2, ?3, CAST(?4 AS TIMESTAMP))",
            duckdb::params![
                name,
                lead_owner,
                company,
                creation.format(DAY_FORMAT).to_string()
            ],
        )?;
        Ok(())
    }

    /// Insert an event with `status` and one Lead participant per entry in
    /// `leads`.
    pub async fn seed_event(
        &self,
        name: &str,
        category: Option<EventCategory>,
        status: &str,
        starts_on: NaiveDate,
        leads: &[&str],
    ) -> Result<()> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO event (name, subject, event_category, status, starts_on)
             VALUES (?1, ?1, ?2, ?3, CAST(?4 AS TIMESTAMP))",
            duckdb::params![
                name,
                category.map(|c| c.as_str()),
                status,
                starts_on.format("%Y-%m-%d 10:00:00").to_string()
            ],
        )?;
        tx.execute(
            "DELETE FROM event_participants WHERE parent = ?1",
            duckdb::params![name],
        )?;
        for lead in leads {
            tx.execute(
                "INSERT INTO event_participants (parent, reference_doctype, reference_docname)
                 VALUES (?1, 'Lead', ?2)",
                duckdb::params![name, lead],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Attach a non-lead participant (e.g. a Contact) to an existing event.
    pub async fn seed_event_participant(
        &self,
        event: &str,
        reference_doctype: &str,
        reference_docname: &str,
    ) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO event_participants (parent, reference_doctype, reference_docname)
             VALUES (?1, ?2, ?3)",
            duckdb::params![event, reference_doctype, reference_docname],
        )?;
        Ok(())
    }

    pub async fn seed_opportunity(
        &self,
        name: &str,
        opportunity_from: &str,
        party_name: &str,
        creation: NaiveDate,
    ) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT OR REPLACE INTO opportunity (name, opportunity_from, party_name, creation)
             VALUES (?1, ?2, ?3, CAST(?4 AS TIMESTAMP))",
            duckdb::params![
                name,
                opportunity_from,
                party_name,
                creation.format(DAY_FORMAT).to_string()
            ],
        )?;
        Ok(())
    }

    pub async fn seed_quotation(
        &self,
        name: &str,
        quotation_to: &str,
        party_name: &str,
        transaction_date: NaiveDate,
        docstatus: i32,
    ) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT OR REPLACE INTO quotation (name, quotation_to, party_name, transaction_date, docstatus)
             VALUES (?1, ?2, ?3, CAST(?4 AS DATE), ?5)",
            duckdb::params![
                name,
                quotation_to,
                party_name,
                transaction_date.format(DAY_FORMAT).to_string(),
                docstatus
            ],
        )?;
        Ok(())
    }

    /// Insert a fiscal year, optionally restricted to `companies`.
    pub async fn seed_fiscal_year(&self, year: &FiscalYear, companies: &[&str]) -> Result<()> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO fiscal_year (name, year_start_date, year_end_date, disabled)
             VALUES (?1, CAST(?2 AS DATE), CAST(?3 AS DATE), FALSE)",
            duckdb::params![
                year.label,
                year.start.format(DAY_FORMAT).to_string(),
                year.end.format(DAY_FORMAT).to_string()
            ],
        )?;
        tx.execute(
            "DELETE FROM fiscal_year_company WHERE parent = ?1",
            duckdb::params![year.label],
        )?;
        for company in companies {
            tx.execute(
                "INSERT INTO fiscal_year_company (parent, company) VALUES (?1, ?2)",
                duckdb::params![year.label, company],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}
