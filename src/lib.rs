//! NECTA secondary-school results: grading, cohort ranking, report rendering
//! and parent notification.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod fetch;
pub mod grading;
pub mod notify;
pub mod output;
pub mod publish;
pub mod records;
pub mod render;
pub mod scope;
