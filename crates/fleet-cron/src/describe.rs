//! Human-readable cron descriptions. Presentation only; never used for scheduling.

/// Describe a 5-field cron expression.
///
/// A handful of common expressions get a fixed phrase; anything else is
/// spelled out field by field. Input without five fields is returned as-is.
pub fn describe_cron(expression: &str) -> String {
    let known = match expression.trim() {
        "0 0 * * *" => Some("Daily at midnight UTC"),
        "0 */6 * * *" => Some("Every 6 hours"),
        "0 0 * * 0" => Some("Weekly on Sunday at midnight UTC"),
        "0 0 1 * *" => Some("Monthly on the 1st at midnight UTC"),
        "*/15 * * * *" => Some("Every 15 minutes"),
        "0 9 * * 1-5" => Some("Weekdays at 9:00 AM UTC"),
        _ => None,
    };
    if let Some(description) = known {
        return description.to_string();
    }

    let fields: Vec<&str> = expression.split_whitespace().collect();
    match fields.as_slice() {
        [minute, hour, day_of_month, month, day_of_week] => format!(
            "At {}:{} on {}/{} (day {})",
            hour, minute, day_of_month, month, day_of_week
        ),
        _ => expression.to_string(),
    }
}
