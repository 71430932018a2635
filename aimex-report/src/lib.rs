pub mod naming;
pub mod report;
pub mod sample;

pub use naming::sanitize_report_name;
pub use report::{generate, ReportError, ReportSummary};
pub use sample::sample_by_interval;
