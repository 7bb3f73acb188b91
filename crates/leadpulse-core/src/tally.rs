//! Per-subject, per-period counts.

use std::collections::HashMap;

use crate::error::ReportError;
use crate::period::PeriodRange;
use crate::store::{
    ActivityQuery, DailyCount, EventCategory, EventQuery, QuotationQuery, QuotationScope,
    RecordStore,
};

/// Subject key → period label → count.
///
/// [`TallyMap::get`] is the only read path and returns `0.0` for pairs that
/// were never observed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TallyMap {
    counts: HashMap<String, HashMap<String, f64>>,
}

impl TallyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, subject: &str, period: &str, by: f64) {
        *self
            .counts
            .entry(subject.to_string())
            .or_default()
            .entry(period.to_string())
            .or_insert(0.0) += by;
    }

    pub fn get(&self, subject: &str, period: &str) -> f64 {
        self.counts
            .get(subject)
            .and_then(|periods| periods.get(period))
            .copied()
            .unwrap_or(0.0)
    }

    /// Sum of a subject's counts over every period.
    pub fn total(&self, subject: &str) -> f64 {
        self.counts
            .get(subject)
            .map(|periods| periods.values().sum())
            .unwrap_or(0.0)
    }

    pub fn grand_total(&self) -> f64 {
        self.counts.values().flat_map(HashMap::values).sum()
    }

    /// Re-key lead tallies by group: each group's counts are the sum of its
    /// members' counts.
    pub fn rollup<'a, I, M>(&self, groups: I) -> TallyMap
    where
        I: IntoIterator<Item = (&'a str, M)>,
        M: IntoIterator<Item = &'a str>,
    {
        let mut out = TallyMap::new();
        for (group, members) in groups {
            for member in members {
                if let Some(periods) = self.counts.get(member) {
                    for (period, count) in periods {
                        out.add(group, period, *count);
                    }
                }
            }
        }
        out
    }
}

/// Label under which [`TallyAggregator::lifetime`] files every count.
pub const LIFETIME: &str = "";

/// Runs tally queries for one report execution.
pub struct TallyAggregator<'a> {
    store: &'a dyn RecordStore,
    range: Option<&'a PeriodRange>,
}

impl<'a> TallyAggregator<'a> {
    /// Counts restricted to `range`, each filed under the label of the
    /// period containing its date.
    pub fn new(store: &'a dyn RecordStore, range: &'a PeriodRange) -> Self {
        Self {
            store,
            range: Some(range),
        }
    }

    /// Unwindowed counts, all filed under [`LIFETIME`].
    pub fn lifetime(store: &'a dyn RecordStore) -> Self {
        Self { store, range: None }
    }

    fn activity(&self, lead_keys: Option<&[String]>) -> ActivityQuery {
        ActivityQuery {
            leads: lead_keys.map(<[String]>::to_vec),
            window: self.range.and_then(PeriodRange::window),
        }
    }

    pub async fn tally_events(
        &self,
        lead_keys: Option<&[String]>,
        category: EventCategory,
    ) -> Result<TallyMap, ReportError> {
        let query = EventQuery {
            category,
            activity: self.activity(lead_keys),
        };
        if query.activity.matches_nothing() {
            return Ok(TallyMap::new());
        }
        let rows = self.store.count_events(&query).await?;
        Ok(self.fold(rows))
    }

    pub async fn tally_opportunities(
        &self,
        lead_keys: Option<&[String]>,
    ) -> Result<TallyMap, ReportError> {
        let query = self.activity(lead_keys);
        if query.matches_nothing() {
            return Ok(TallyMap::new());
        }
        let rows = self.store.count_opportunities(&query).await?;
        Ok(self.fold(rows))
    }

    pub async fn tally_quotations(
        &self,
        lead_keys: Option<&[String]>,
        scope: QuotationScope,
    ) -> Result<TallyMap, ReportError> {
        let query = QuotationQuery {
            scope,
            activity: self.activity(lead_keys),
        };
        if query.activity.matches_nothing() {
            return Ok(TallyMap::new());
        }
        let rows = self.store.count_quotations(&query).await?;
        Ok(self.fold(rows))
    }

    fn fold(&self, rows: Vec<DailyCount>) -> TallyMap {
        let mut tally = TallyMap::new();
        for row in rows {
            let label = match self.range {
                None => LIFETIME,
                Some(range) => match range.locate(row.date) {
                    Some(period) => period.label.as_str(),
                    None => continue,
                },
            };
            tally.add(&row.lead, label, row.count as f64);
        }
        tally
    }
}
