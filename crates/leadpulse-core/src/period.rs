//! Period range building and labelling, shared by every report.

use std::cmp::Ordering;

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::Serialize;
use tracing::warn;

use crate::error::ReportError;
use crate::filter::{Filter, Granularity};
use crate::fiscal::{FiscalCalendar, FiscalYears};

pub const DEFAULT_MAX_PERIODS: usize = 104;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Inclusive date interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub label: String,
}

/// Output of [`period_end_dates`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodEnds {
    pub ends: Vec<NaiveDate>,
    /// Set when `max_periods` was reached before `to_date`.
    pub truncated: bool,
}

/// First day of the first period for `from_date`.
///
/// `fiscal_start` is the start of the fiscal year containing `from_date`; it
/// is only consulted for [`Granularity::Yearly`].
pub fn period_anchor(
    from_date: NaiveDate,
    granularity: Granularity,
    fiscal_start: Option<NaiveDate>,
) -> NaiveDate {
    let month_start = from_date.with_day(1).unwrap_or(from_date);
    match granularity {
        Granularity::Weekly => {
            from_date - Duration::days(i64::from(from_date.weekday().num_days_from_monday()))
        }
        Granularity::Monthly | Granularity::Quarterly | Granularity::HalfYearly => month_start,
        Granularity::Yearly => fiscal_start.unwrap_or(month_start),
    }
}

/// Ordered period end-dates from `anchor` up to and including `to_date`.
///
/// The last end is clamped to `to_date`. At most `max_periods` ends are
/// produced; hitting that bound sets [`PeriodEnds::truncated`].
pub fn period_end_dates(
    anchor: NaiveDate,
    to_date: NaiveDate,
    granularity: Granularity,
    max_periods: usize,
) -> PeriodEnds {
    let mut ends = Vec::new();
    let mut start = anchor;
    let limit = max_periods.max(1);

    while ends.len() < limit {
        let tentative = match granularity.increment_months() {
            None => start.checked_add_signed(Duration::days(6)),
            Some(months) => start
                .checked_add_months(Months::new(months))
                .and_then(|d| d.pred_opt()),
        };
        let end = match tentative {
            Some(end) if end < to_date => end,
            _ => to_date,
        };
        ends.push(end);
        if end >= to_date {
            return PeriodEnds {
                ends,
                truncated: false,
            };
        }
        match end.succ_opt() {
            Some(next) => start = next,
            None => break,
        }
    }

    PeriodEnds {
        truncated: ends.last().map_or(true, |last| *last < to_date),
        ends,
    }
}

/// Maps dates to period labels for one granularity.
#[derive(Debug, Clone)]
pub struct PeriodLabeler {
    granularity: Granularity,
    fiscal_years: FiscalYears,
}

impl PeriodLabeler {
    /// Labeler for weekly, monthly and quarterly reports.
    pub fn calendar(granularity: Granularity) -> Self {
        Self {
            granularity,
            fiscal_years: FiscalYears::default(),
        }
    }

    pub fn with_fiscal_years(granularity: Granularity, fiscal_years: FiscalYears) -> Self {
        Self {
            granularity,
            fiscal_years,
        }
    }

    pub fn label(&self, date: NaiveDate) -> Result<String, ReportError> {
        Ok(match self.granularity {
            Granularity::Weekly => {
                let week = date.iso_week();
                format!("Week {} {}", week.week(), week.year())
            }
            Granularity::Monthly => {
                format!("{} {}", MONTHS[date.month0() as usize], date.year())
            }
            Granularity::Quarterly => {
                format!("Quarter {} {}", (date.month() - 1) / 3 + 1, date.year())
            }
            Granularity::HalfYearly | Granularity::Yearly => {
                self.fiscal_years.find(date)?.label.clone()
            }
        })
    }
}

/// Labelled, disjoint periods covering a report window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodRange {
    pub periods: Vec<Period>,
    pub truncated: bool,
}

impl PeriodRange {
    /// Label each period by its end-date. Neighbours that share a label are
    /// merged so labels stay unique.
    pub fn from_end_dates(
        anchor: NaiveDate,
        ends: &PeriodEnds,
        labeler: &PeriodLabeler,
    ) -> Result<Self, ReportError> {
        let mut periods: Vec<Period> = Vec::with_capacity(ends.ends.len());
        let mut start = anchor;
        for &end in &ends.ends {
            let label = labeler.label(end)?;
            match periods.last_mut() {
                Some(last) if last.label == label => last.end = end,
                _ => periods.push(Period { start, end, label }),
            }
            start = end.succ_opt().unwrap_or(end);
        }
        Ok(Self {
            periods,
            truncated: ends.truncated,
        })
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// The period whose `[start, end]` contains `date`.
    pub fn locate(&self, date: NaiveDate) -> Option<&Period> {
        let idx = self
            .periods
            .binary_search_by(|period| {
                if period.end < date {
                    Ordering::Less
                } else if period.start > date {
                    Ordering::Greater
                } else {
                    Ordering::Equal
                }
            })
            .ok()?;
        self.periods.get(idx)
    }

    /// From the first period's start to the last period's end.
    pub fn window(&self) -> Option<DateWindow> {
        Some(DateWindow {
            start: self.periods.first()?.start,
            end: self.periods.last()?.end,
        })
    }
}

/// Resolved periods for one execution.
#[derive(Debug, Clone)]
pub struct ReportCalendar {
    pub range: PeriodRange,
}

impl ReportCalendar {
    pub async fn resolve(
        filter: &Filter,
        fiscal: &dyn FiscalCalendar,
        max_periods: usize,
    ) -> Result<Self, ReportError> {
        let company = filter.company.as_deref();
        let fiscal_start = if filter.period == Granularity::Yearly {
            let year = fiscal
                .resolve_fiscal_year(filter.from_date, company)
                .await?
                .ok_or_else(|| ReportError::FiscalYearNotFound {
                    date: filter.from_date,
                    company: filter.company.clone(),
                })?;
            Some(year.start)
        } else {
            None
        };

        let anchor = period_anchor(filter.from_date, filter.period, fiscal_start);
        let ends = period_end_dates(anchor, filter.to_date, filter.period, max_periods);
        if ends.truncated {
            warn!(
                period = filter.period.as_str(),
                max_periods,
                from_date = %filter.from_date,
                to_date = %filter.to_date,
                "Period range truncated at max_periods"
            );
        }

        let labeler = if filter.period.uses_fiscal_year() {
            let last = ends.ends.last().copied().unwrap_or(filter.to_date);
            let years = FiscalYears::load(fiscal, anchor, last, company).await?;
            PeriodLabeler::with_fiscal_years(filter.period, years)
        } else {
            PeriodLabeler::calendar(filter.period)
        };

        let range = PeriodRange::from_end_dates(anchor, &ends, &labeler)?;
        Ok(Self { range })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiscal::{FiscalYear, FixedFiscalCalendar};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).expect("valid date")
    }

    fn ends(from: NaiveDate, to: NaiveDate, g: Granularity) -> PeriodEnds {
        period_end_dates(period_anchor(from, g, None), to, g, DEFAULT_MAX_PERIODS)
    }

    #[test]
    fn monthly_range_handles_leap_february() {
        let result = ends(d(2024, 1, 1), d(2024, 3, 31), Granularity::Monthly);
        assert_eq!(result.ends, vec![d(2024, 1, 31), d(2024, 2, 29), d(2024, 3, 31)]);
        assert!(!result.truncated);
    }

    #[test]
    fn monthly_anchor_is_first_of_month_and_last_end_is_clamped() {
        let result = ends(d(2024, 1, 20), d(2024, 3, 10), Granularity::Monthly);
        assert_eq!(result.ends, vec![d(2024, 1, 31), d(2024, 2, 29), d(2024, 3, 10)]);
    }

    #[test]
    fn weekly_over_eight_days_yields_two_periods() {
        let result = ends(d(2024, 1, 1), d(2024, 1, 8), Granularity::Weekly);
        assert_eq!(result.ends, vec![d(2024, 1, 7), d(2024, 1, 8)]);
    }

    #[test]
    fn weekly_anchor_is_monday_on_or_before() {
        // 2024-01-03 is a Wednesday.
        assert_eq!(
            period_anchor(d(2024, 1, 3), Granularity::Weekly, None),
            d(2024, 1, 1)
        );
        assert_eq!(
            period_anchor(d(2024, 1, 1), Granularity::Weekly, None),
            d(2024, 1, 1)
        );
    }

    #[test]
    fn yearly_anchor_uses_fiscal_start() {
        assert_eq!(
            period_anchor(d(2024, 6, 15), Granularity::Yearly, Some(d(2024, 4, 1))),
            d(2024, 4, 1)
        );
        let result = period_end_dates(d(2023, 4, 1), d(2025, 1, 15), Granularity::Yearly, 10);
        assert_eq!(result.ends, vec![d(2024, 3, 31), d(2025, 1, 15)]);
    }

    #[test]
    fn single_day_range_has_one_period() {
        let result = ends(d(2024, 5, 5), d(2024, 5, 5), Granularity::Quarterly);
        assert_eq!(result.ends, vec![d(2024, 5, 5)]);
    }

    #[test]
    fn max_periods_reports_truncation() {
        let result = period_end_dates(d(2024, 1, 1), d(2024, 12, 31), Granularity::Weekly, 52);
        assert_eq!(result.ends.len(), 52);
        assert!(result.truncated);
        assert!(result.ends.last().is_some_and(|end| *end < d(2024, 12, 31)));
    }

    #[test]
    fn ends_are_ordered_and_bounded_for_every_granularity() {
        let from = d(2023, 11, 17);
        let to = d(2025, 2, 3);
        for g in Granularity::ALL {
            let result = ends(from, to, g);
            assert!(!result.truncated, "{g:?} should fit");
            assert!(result.ends.windows(2).all(|w| w[0] < w[1]), "{g:?} ordered");
            assert!(result.ends.iter().all(|e| *e <= to), "{g:?} bounded");
            assert_eq!(result.ends.last(), Some(&to), "{g:?} ends at to_date");
        }
    }

    #[test]
    fn calendar_labels() {
        let monthly = PeriodLabeler::calendar(Granularity::Monthly);
        assert_eq!(monthly.label(d(2024, 3, 31)).expect("label"), "Mar 2024");

        let quarterly = PeriodLabeler::calendar(Granularity::Quarterly);
        assert_eq!(quarterly.label(d(2024, 3, 31)).expect("label"), "Quarter 1 2024");
        assert_eq!(quarterly.label(d(2024, 10, 1)).expect("label"), "Quarter 4 2024");

        let weekly = PeriodLabeler::calendar(Granularity::Weekly);
        assert_eq!(weekly.label(d(2024, 1, 7)).expect("label"), "Week 1 2024");
        // ISO week-year keeps late-December weeks distinct from January.
        assert_eq!(weekly.label(d(2024, 12, 30)).expect("label"), "Week 1 2025");
    }

    #[test]
    fn fiscal_label_outside_resolved_years_is_an_error() {
        let years = FiscalYears::from_years(
            vec![FiscalYear {
                label: "2024".to_string(),
                start: d(2024, 1, 1),
                end: d(2024, 12, 31),
            }],
            Some("Acme"),
        );
        let labeler = PeriodLabeler::with_fiscal_years(Granularity::Yearly, years);
        assert_eq!(labeler.label(d(2024, 7, 1)).expect("label"), "2024");
        assert!(matches!(
            labeler.label(d(2025, 1, 1)),
            Err(ReportError::FiscalYearNotFound { company: Some(c), .. }) if c == "Acme"
        ));
    }

    #[test]
    fn shared_labels_are_coalesced() {
        // Quarterly anchored mid-quarter: the clamped last end falls in the
        // same quarter as the one before it.
        let anchor = d(2024, 2, 1);
        let result = period_end_dates(anchor, d(2024, 5, 15), Granularity::Quarterly, 10);
        assert_eq!(result.ends, vec![d(2024, 4, 30), d(2024, 5, 15)]);

        let labeler = PeriodLabeler::calendar(Granularity::Quarterly);
        let range = PeriodRange::from_end_dates(anchor, &result, &labeler).expect("range");
        assert_eq!(range.len(), 1);
        assert_eq!(range.periods[0].label, "Quarter 2 2024");
        assert_eq!(range.periods[0].start, anchor);
        assert_eq!(range.periods[0].end, d(2024, 5, 15));
    }

    #[test]
    fn locate_finds_the_containing_period() {
        let anchor = d(2024, 2, 1);
        let result = period_end_dates(anchor, d(2024, 7, 31), Granularity::Quarterly, 10);
        let labeler = PeriodLabeler::calendar(Granularity::Quarterly);
        let range = PeriodRange::from_end_dates(anchor, &result, &labeler).expect("range");
        let labels: Vec<&str> = range.periods.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["Quarter 2 2024", "Quarter 3 2024"]);

        // Feb sits in the first period despite being a Q1 date.
        let feb = range.locate(d(2024, 2, 10)).expect("feb");
        assert_eq!(feb.label, "Quarter 2 2024");
        let may = range.locate(d(2024, 5, 10)).expect("may");
        assert_eq!(may.label, "Quarter 3 2024");
        assert_eq!(range.locate(d(2024, 4, 30)).map(|p| p.start), Some(anchor));
        assert!(range.locate(d(2024, 1, 31)).is_none());
        assert!(range.locate(d(2024, 8, 1)).is_none());
    }

    #[tokio::test]
    async fn half_yearly_periods_within_one_fiscal_year_merge() {
        let filter = Filter::new(d(2024, 1, 1), d(2024, 12, 31), Granularity::HalfYearly);
        let cal = ReportCalendar::resolve(&filter, &FixedFiscalCalendar::calendar_year(), 104)
            .await
            .expect("calendar");
        assert_eq!(cal.range.len(), 1);
        assert_eq!(cal.range.periods[0].label, "2024");
        assert_eq!(
            cal.range.window(),
            Some(DateWindow {
                start: d(2024, 1, 1),
                end: d(2024, 12, 31)
            })
        );
    }

    #[tokio::test]
    async fn yearly_calendar_spans_fiscal_years() {
        let filter = Filter::new(d(2023, 6, 1), d(2024, 6, 30), Granularity::Yearly);
        let fiscal = FixedFiscalCalendar::parse("04-01").expect("parse");
        let cal = ReportCalendar::resolve(&filter, &fiscal, 104)
            .await
            .expect("calendar");
        let labels: Vec<&str> = cal.range.periods.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["2023-2024", "2024-2025"]);
        assert_eq!(cal.range.periods[0].start, d(2023, 4, 1));
        assert_eq!(cal.range.periods[1].end, d(2024, 6, 30));
    }

    #[tokio::test]
    async fn monthly_calendar_labels_scenario() {
        let filter = Filter::new(d(2024, 1, 1), d(2024, 3, 31), Granularity::Monthly);
        let cal = ReportCalendar::resolve(&filter, &FixedFiscalCalendar::default(), 104)
            .await
            .expect("calendar");
        let labels: Vec<&str> = cal.range.periods.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["Jan 2024", "Feb 2024", "Mar 2024"]);
        assert_eq!(cal.range.periods[1].start, d(2024, 2, 1));
        assert_eq!(cal.range.periods[1].end, d(2024, 2, 29));
    }
}
