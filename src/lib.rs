//! Bulk archive of Jira issues selected by project and label.
//!
//! - `locator`: drains the paginated search into the candidate set.
//! - `executor`: worker-pool or sequential-batch archiving.
//! - `report`: outcome tally, printed summary and exit status.

pub mod archive;
pub mod config;
pub mod executor;
pub mod jira;
pub mod locator;
pub mod model;
pub mod report;
