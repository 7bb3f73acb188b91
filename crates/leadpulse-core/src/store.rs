//! Record store abstraction.
//!
//! Reports read four collections: leads, events with their participant
//! links, opportunities and quotations. Implementations return plain rows;
//! all period bucketing happens in the core.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::period::DateWindow;

/// Outreach event kinds tracked by the reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    #[serde(rename = "Introduction Email")]
    IntroductionEmail,
    #[serde(rename = "Follow-Up Email")]
    FollowUpEmail,
    Meeting,
}

impl EventCategory {
    pub const ALL: [EventCategory; 3] = [
        EventCategory::IntroductionEmail,
        EventCategory::FollowUpEmail,
        EventCategory::Meeting,
    ];

    /// Value stored in `event.event_category`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::IntroductionEmail => "Introduction Email",
            EventCategory::FollowUpEmail => "Follow-Up Email",
            EventCategory::Meeting => "Meeting",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == raw)
    }
}

/// Which quotations count towards a tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuotationScope {
    /// Only submitted quotations (`docstatus = 1`).
    Submitted,
    /// Drafts, submitted and cancelled alike.
    #[default]
    Any,
}

impl QuotationScope {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "submitted" => Some(Self::Submitted),
            "any" => Some(Self::Any),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub name: String,
    pub lead_owner: Option<String>,
    pub company: Option<String>,
    pub creation: NaiveDate,
}

/// Base subject query. Results are ordered by lead name.
#[derive(Debug, Clone, Default)]
pub struct LeadQuery {
    /// Inclusive bounds on the lead's creation date.
    pub created: Option<DateWindow>,
    pub company: Option<String>,
    pub lead: Option<String>,
    pub lead_owner: Option<String>,
    /// Skip leads without an owner.
    pub require_owner: bool,
}

/// Lead set and date window shared by the tally queries.
///
/// `leads: None` means every lead; `Some(vec![])` matches nothing.
#[derive(Debug, Clone, Default)]
pub struct ActivityQuery {
    pub leads: Option<Vec<String>>,
    pub window: Option<DateWindow>,
}

impl ActivityQuery {
    pub fn matches_nothing(&self) -> bool {
        self.leads.as_ref().is_some_and(Vec::is_empty)
    }
}

#[derive(Debug, Clone)]
pub struct EventQuery {
    pub category: EventCategory,
    pub activity: ActivityQuery,
}

#[derive(Debug, Clone)]
pub struct QuotationQuery {
    pub scope: QuotationScope,
    pub activity: ActivityQuery,
}

/// Number of records for one lead on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub lead: String,
    pub date: NaiveDate,
    pub count: i64,
}

/// Lifetime count of open events for one lead and category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub lead: String,
    pub category: String,
    pub count: i64,
}

#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    async fn list_leads(&self, query: &LeadQuery) -> Result<Vec<LeadRecord>>;

    /// Open events whose participant is a lead, grouped by (lead, start day).
    async fn count_events(&self, query: &EventQuery) -> Result<Vec<DailyCount>>;

    /// Opportunities raised from a lead, grouped by (lead, creation day).
    async fn count_opportunities(&self, query: &ActivityQuery) -> Result<Vec<DailyCount>>;

    /// Quotations addressed to a lead, grouped by (lead, transaction date).
    async fn count_quotations(&self, query: &QuotationQuery) -> Result<Vec<DailyCount>>;

    /// Open lead events grouped by (lead, category), ordered by lead.
    async fn open_event_summary(&self, lead: Option<&str>) -> Result<Vec<CategoryCount>>;
}
