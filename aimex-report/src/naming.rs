use chrono::Local;

/// Reduces a requested report name to the characters that are safe in a
/// file name: alphanumerics, `.`, `_`, `-` and space. Falls back to a
/// timestamp-based name when nothing safe remains.
pub fn sanitize_report_name(requested: &str) -> String {
    let safe: String = requested
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-' | ' '))
        .collect();

    if safe.trim().is_empty() {
        timestamp_name()
    } else {
        safe
    }
}

fn timestamp_name() -> String {
    format!("trajectories_{}", Local::now().format("%Y%m%d_%H%M%S"))
}
