/// DuckDB initialization SQL.
///
/// Executed once at open time via `Connection::execute_batch`. Every
/// statement uses `IF NOT EXISTS`, so it is safe to re-run on each startup.
///
/// `memory_limit` comes from `Config.duckdb_memory_limit`
/// (env `LEADPULSE_DUCKDB_MEMORY`, default `"1GB"`).
///
/// The tables mirror the CRM documents the reports read. Dates that the
/// reports bucket by are stored as `TIMESTAMP` or `DATE` and read back via
/// `strftime`.
pub fn init_sql(memory_limit: &str) -> String {
    format!(
        r#"SET memory_limit = '{memory_limit}';
SET threads = 2;

CREATE TABLE IF NOT EXISTS lead (
    name            VARCHAR PRIMARY KEY,
    lead_name       VARCHAR,
    lead_owner      VARCHAR,
    company         VARCHAR,
    creation        TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_lead_creation ON lead(creation);
CREATE INDEX IF NOT EXISTS idx_lead_owner ON lead(lead_owner);

-- event_category: 'Introduction Email' | 'Follow-Up Email' | 'Meeting' | other
-- status:         'Open' | 'Completed' | 'Closed' | 'Cancelled'
CREATE TABLE IF NOT EXISTS event (
    name            VARCHAR PRIMARY KEY,
    subject         VARCHAR NOT NULL DEFAULT '',
    event_category  VARCHAR,
    event_type      VARCHAR NOT NULL DEFAULT 'Private',
    status          VARCHAR NOT NULL DEFAULT 'Open',
    starts_on       TIMESTAMP NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_event_starts_on ON event(starts_on);

CREATE TABLE IF NOT EXISTS event_participants (
    parent              VARCHAR NOT NULL,
    reference_doctype   VARCHAR NOT NULL,
    reference_docname   VARCHAR NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_event_participants_parent ON event_participants(parent);
CREATE INDEX IF NOT EXISTS idx_event_participants_ref
    ON event_participants(reference_doctype, reference_docname);

CREATE TABLE IF NOT EXISTS opportunity (
    name                VARCHAR PRIMARY KEY,
    opportunity_from    VARCHAR NOT NULL,
    party_name          VARCHAR NOT NULL,
    creation            TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_opportunity_party ON opportunity(opportunity_from, party_name);

-- docstatus: 0 draft, 1 submitted, 2 cancelled
CREATE TABLE IF NOT EXISTS quotation (
    name                VARCHAR PRIMARY KEY,
    quotation_to        VARCHAR NOT NULL,
    party_name          VARCHAR NOT NULL,
    transaction_date    DATE NOT NULL,
    docstatus           INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_quotation_party ON quotation(quotation_to, party_name);

CREATE TABLE IF NOT EXISTS fiscal_year (
    name                VARCHAR PRIMARY KEY,
    year_start_date     DATE NOT NULL,
    year_end_date       DATE NOT NULL,
    disabled            BOOLEAN NOT NULL DEFAULT FALSE
);

-- A fiscal year without rows here applies to every company.
CREATE TABLE IF NOT EXISTS fiscal_year_company (
    parent              VARCHAR NOT NULL,
    company             VARCHAR NOT NULL,
    PRIMARY KEY (parent, company)
);
"#
    )
}
