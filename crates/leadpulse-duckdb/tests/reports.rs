use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value;

use leadpulse_core::{
    error::ReportError,
    filter::{Filter, Granularity},
    fiscal::{FiscalCalendar, FiscalYear},
    report::{ReportEngine, ReportKind, ReportSettings},
    store::{ActivityQuery, EventCategory, LeadQuery, RecordStore},
};
use leadpulse_duckdb::DuckDbBackend;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).expect("valid date")
}

fn fiscal_year(label: &str, start: NaiveDate, end: NaiveDate) -> FiscalYear {
    FiscalYear {
        label: label.to_string(),
        start,
        end,
    }
}

async fn backend() -> Arc<DuckDbBackend> {
    let db = DuckDbBackend::open_in_memory().expect("open db");
    db.seed_fiscal_year(&fiscal_year("2023", d(2023, 1, 1), d(2023, 12, 31)), &[])
        .await
        .expect("fy 2023");
    db.seed_fiscal_year(&fiscal_year("2024", d(2024, 1, 1), d(2024, 12, 31)), &[])
        .await
        .expect("fy 2024");
    Arc::new(db)
}

fn engine(db: &Arc<DuckDbBackend>) -> ReportEngine {
    ReportEngine::new(db.clone(), db.clone(), ReportSettings::default())
}

fn q1_monthly() -> Filter {
    Filter::new(d(2024, 1, 1), d(2024, 3, 31), Granularity::Monthly)
}

#[tokio::test]
async fn ping_and_schema_are_idempotent() {
    let db = DuckDbBackend::open_in_memory().expect("open");
    db.ping().await.expect("ping");
    let conn = db.conn_for_test().await;
    conn.execute_batch(&leadpulse_duckdb::schema::init_sql("1GB"))
        .expect("re-run schema");
}

#[tokio::test]
async fn open_meeting_counts_in_its_month() {
    let db = backend().await;
    db.seed_lead("CRM-LEAD-0001", Some("alice@example.com"), Some("Acme"), d(2024, 1, 5))
        .await
        .expect("lead");
    db.seed_event(
        "EV-1",
        Some(EventCategory::Meeting),
        "Open",
        d(2024, 2, 10),
        &["CRM-LEAD-0001"],
    )
    .await
    .expect("event");
    db.seed_event(
        "EV-2",
        Some(EventCategory::Meeting),
        "Closed",
        d(2024, 2, 11),
        &["CRM-LEAD-0001"],
    )
    .await
    .expect("closed event");

    let report = engine(&db)
        .execute(ReportKind::EventInsight, &q1_monthly())
        .await
        .expect("report");

    assert_eq!(report.rows.len(), 1);
    let row = &report.rows[0];
    for column in &report.columns[1..] {
        let expected = if column.fieldname == "no_of_meetings_feb_2024" {
            1.0
        } else {
            0.0
        };
        assert_eq!(row[&column.fieldname], Value::from(expected), "{}", column.fieldname);
    }
    assert_eq!(report.columns[0].fieldname, "lead");
}

#[tokio::test]
async fn lead_owner_efficiency_rolls_up_owned_leads() {
    let db = backend().await;
    for (name, created) in [("L1", d(2024, 1, 2)), ("L2", d(2024, 2, 3)), ("L3", d(2024, 3, 4))] {
        db.seed_lead(name, Some("owner@example.com"), Some("Acme"), created)
            .await
            .expect("lead");
    }
    db.seed_lead("L4", None, Some("Acme"), d(2024, 1, 9))
        .await
        .expect("ownerless lead");
    db.seed_quotation("QTN-1", "Lead", "L2", d(2024, 2, 20), 1)
        .await
        .expect("quotation");
    db.seed_quotation("QTN-2", "Customer", "L2", d(2024, 2, 21), 1)
        .await
        .expect("customer quotation");
    db.seed_opportunity("OPP-1", "Lead", "L3", d(2024, 3, 15))
        .await
        .expect("opportunity");

    let report = engine(&db)
        .execute(ReportKind::LeadOwnerEfficiency, &q1_monthly())
        .await
        .expect("report");

    assert_eq!(report.rows.len(), 1);
    let row = &report.rows[0];
    assert_eq!(row["lead_owner"], Value::from("owner@example.com"));
    for month in ["jan", "feb", "mar"] {
        assert_eq!(row[&format!("no_of_lead_{month}_2024")], Value::from(3.0));
    }
    assert_eq!(row["no_of_quotations_feb_2024"], Value::from(1.0));
    assert_eq!(row["no_of_opportunity_mar_2024"], Value::from(1.0));
    assert_eq!(row["no_of_meetings_jan_2024"], Value::from(0.0));
}

#[tokio::test]
async fn company_filter_narrows_leads() {
    let db = backend().await;
    db.seed_lead("L1", None, Some("Acme"), d(2024, 1, 2))
        .await
        .expect("lead");
    db.seed_lead("L2", None, Some("Globex"), d(2024, 1, 2))
        .await
        .expect("lead");

    let leads = db
        .list_leads(&LeadQuery {
            company: Some("Globex".to_string()),
            ..Default::default()
        })
        .await
        .expect("leads");
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].name, "L2");
    assert_eq!(leads[0].creation, d(2024, 1, 2));

    let report = engine(&db)
        .execute(ReportKind::EventInsight, &q1_monthly().with_company("Acme"))
        .await
        .expect("report");
    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0]["lead"], Value::from("L1"));
}

#[tokio::test]
async fn empty_lead_set_matches_nothing() {
    let db = backend().await;
    db.seed_opportunity("OPP-1", "Lead", "L1", d(2024, 1, 2))
        .await
        .expect("opportunity");
    let counts = db
        .count_opportunities(&ActivityQuery {
            leads: Some(Vec::new()),
            window: None,
        })
        .await
        .expect("counts");
    assert!(counts.is_empty());

    let all = db
        .count_opportunities(&ActivityQuery::default())
        .await
        .expect("counts");
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].count, 1);
}

#[tokio::test]
async fn weekly_eight_days_gives_two_periods() {
    let db = backend().await;
    db.seed_lead("L1", None, None, d(2024, 1, 1))
        .await
        .expect("lead");
    db.seed_event(
        "EV-1",
        Some(EventCategory::IntroductionEmail),
        "Open",
        d(2024, 1, 8),
        &["L1"],
    )
    .await
    .expect("event");

    let filter = Filter::new(d(2024, 1, 1), d(2024, 1, 8), Granularity::Weekly);
    let report = engine(&db)
        .execute(ReportKind::EventInsight, &filter)
        .await
        .expect("report");
    assert_eq!(report.periods.len(), 2);
    assert_eq!(report.periods[1].start, d(2024, 1, 8));
    assert_eq!(report.periods[1].end, d(2024, 1, 8));
    let intro: f64 = report.columns[1..]
        .iter()
        .filter(|c| c.fieldname.starts_with("no_of_introduction_email"))
        .map(|c| report.rows[0][&c.fieldname].as_f64().unwrap_or(0.0))
        .sum();
    assert_eq!(intro, 1.0);
}

#[tokio::test]
async fn yearly_periods_follow_fiscal_years() {
    let db = DuckDbBackend::open_in_memory().expect("open");
    db.seed_fiscal_year(
        &fiscal_year("2023-2024", d(2023, 4, 1), d(2024, 3, 31)),
        &[],
    )
    .await
    .expect("fy");
    db.seed_fiscal_year(
        &fiscal_year("2024-2025", d(2024, 4, 1), d(2025, 3, 31)),
        &[],
    )
    .await
    .expect("fy");
    let db = Arc::new(db);

    let filter = Filter::new(d(2024, 1, 1), d(2024, 6, 30), Granularity::Yearly);
    let report = engine(&db)
        .execute(ReportKind::EventInsight, &filter)
        .await
        .expect("report");
    let labels: Vec<&str> = report.periods.iter().map(|p| p.label.as_str()).collect();
    assert_eq!(labels, vec!["2023-2024", "2024-2025"]);
    assert_eq!(report.periods[0].start, d(2023, 4, 1));
    assert_eq!(report.periods[1].end, d(2024, 6, 30));
    assert_eq!(report.columns[1].fieldname, "no_of_introduction_email_2023_2024");
}

#[tokio::test]
async fn company_specific_fiscal_year_wins() {
    let db = DuckDbBackend::open_in_memory().expect("open");
    db.seed_fiscal_year(&fiscal_year("2024", d(2024, 1, 1), d(2024, 12, 31)), &[])
        .await
        .expect("shared");
    db.seed_fiscal_year(
        &fiscal_year("2023-2024 Globex", d(2023, 7, 1), d(2024, 6, 30)),
        &["Globex"],
    )
    .await
    .expect("globex");

    let globex = db
        .resolve_fiscal_year(d(2024, 2, 1), Some("Globex"))
        .await
        .expect("resolve")
        .expect("year");
    assert_eq!(globex.label, "2023-2024 Globex");

    let acme = db
        .resolve_fiscal_year(d(2024, 2, 1), Some("Acme"))
        .await
        .expect("resolve")
        .expect("year");
    assert_eq!(acme.label, "2024");

    let missing = db
        .resolve_fiscal_year(d(2030, 1, 1), None)
        .await
        .expect("resolve");
    assert!(missing.is_none());
}

#[tokio::test]
async fn yearly_without_fiscal_year_is_an_error() {
    let db = Arc::new(DuckDbBackend::open_in_memory().expect("open"));
    let filter = Filter::new(d(2024, 1, 1), d(2024, 3, 31), Granularity::Yearly);
    let err = engine(&db)
        .execute(ReportKind::EventInsight, &filter)
        .await
        .unwrap_err();
    assert!(matches!(err, ReportError::FiscalYearNotFound { .. }));
}

#[tokio::test]
async fn event_details_lists_leads_with_open_events() {
    let db = backend().await;
    db.seed_event(
        "EV-1",
        Some(EventCategory::Meeting),
        "Open",
        d(2022, 5, 1),
        &["L1"],
    )
    .await
    .expect("event");
    db.seed_event(
        "EV-2",
        Some(EventCategory::FollowUpEmail),
        "Open",
        d(2024, 5, 1),
        &["L1", "L2"],
    )
    .await
    .expect("event");
    db.seed_event(
        "EV-3",
        Some(EventCategory::Meeting),
        "Completed",
        d(2024, 5, 1),
        &["L3"],
    )
    .await
    .expect("event");
    db.seed_event_participant("EV-1", "Contact", "CONT-1")
        .await
        .expect("participant");
    db.seed_opportunity("OPP-1", "Lead", "L2", d(2021, 1, 1))
        .await
        .expect("opportunity");
    db.seed_quotation("QTN-1", "Lead", "L1", d(2020, 1, 1), 0)
        .await
        .expect("quotation");

    let report = engine(&db)
        .execute(ReportKind::EventDetails, &q1_monthly())
        .await
        .expect("report");

    assert_eq!(report.rows.len(), 2);
    let l1 = &report.rows[0];
    assert_eq!(l1["lead"], Value::from("L1"));
    assert_eq!(l1["meeting"], Value::from(1.0));
    assert_eq!(l1["followup_email"], Value::from(1.0));
    assert_eq!(l1["introduction_email"], Value::from(0.0));
    assert_eq!(l1["opportunity"], Value::from(1.0));
    assert_eq!(l1["quotations"], Value::from(1.0));
    let l2 = &report.rows[1];
    assert_eq!(l2["lead"], Value::from("L2"));
    assert_eq!(l2["meeting"], Value::from(0.0));
}
