use async_trait::async_trait;
use chrono::NaiveDate;

use leadpulse_core::fiscal::{FiscalCalendar, FiscalYear};
use leadpulse_core::store::{
    ActivityQuery, CategoryCount, DailyCount, EventQuery, LeadQuery, LeadRecord, QuotationQuery,
    RecordStore,
};

use crate::queries;
use crate::DuckDbBackend;

#[async_trait]
impl RecordStore for DuckDbBackend {
    async fn list_leads(&self, query: &LeadQuery) -> anyhow::Result<Vec<LeadRecord>> {
        queries::leads::list_leads_inner(self, query).await
    }

    async fn count_events(&self, query: &EventQuery) -> anyhow::Result<Vec<DailyCount>> {
        if query.activity.matches_nothing() {
            return Ok(Vec::new());
        }
        queries::events::count_events_inner(self, query).await
    }

    async fn count_opportunities(&self, query: &ActivityQuery) -> anyhow::Result<Vec<DailyCount>> {
        if query.matches_nothing() {
            return Ok(Vec::new());
        }
        queries::opportunities::count_opportunities_inner(self, query).await
    }

    async fn count_quotations(&self, query: &QuotationQuery) -> anyhow::Result<Vec<DailyCount>> {
        if query.activity.matches_nothing() {
            return Ok(Vec::new());
        }
        queries::quotations::count_quotations_inner(self, query).await
    }

    async fn open_event_summary(&self, lead: Option<&str>) -> anyhow::Result<Vec<CategoryCount>> {
        queries::events::open_event_summary_inner(self, lead).await
    }
}

#[async_trait]
impl FiscalCalendar for DuckDbBackend {
    async fn resolve_fiscal_year(
        &self,
        date: NaiveDate,
        company: Option<&str>,
    ) -> anyhow::Result<Option<FiscalYear>> {
        queries::fiscal::resolve_fiscal_year_inner(self, date, company).await
    }
}
