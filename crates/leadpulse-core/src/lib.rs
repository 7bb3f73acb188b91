pub mod config;
pub mod error;
pub mod filter;
pub mod fiscal;
pub mod period;
pub mod pivot;
pub mod report;
pub mod store;
pub mod tally;
