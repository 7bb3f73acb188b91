/// Re-export `Config` from `leadpulse-core`.
///
/// Environment parsing lives in core so the report settings it carries can be
/// shared with tests that never start a server.
pub use leadpulse_core::config::{Config, FiscalSource};
