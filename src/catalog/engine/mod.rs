//! Orchestration of import jobs and their reports.

pub mod driver;
pub mod report;

pub use driver::{ImportEngine, JobReport};
pub use report::{CategoryTree, CategoryTreeNode, RunSummary};
