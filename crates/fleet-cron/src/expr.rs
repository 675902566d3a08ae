//! Cron expression parsing
//!
//! Workflows use standard 5-field Unix expressions (minute, hour,
//! day-of-month, month, day-of-week). The `cron` crate wants a leading
//! seconds field and numbers weekdays 1-7 from Sunday, so 5-field input is
//! rewritten before parsing. 6- and 7-field input is passed through in the
//! crate's own syntax.

use chrono::{DateTime, Utc};
use cron::Schedule;
use fleet_core::{FleetError, FleetResult};
use std::str::FromStr;

/// Parse a cron expression into a schedule
pub fn parse(cron_expr: &str) -> FleetResult<Schedule> {
    let normalized = normalize(cron_expr)
        .ok_or_else(|| FleetError::Cron(format!("Invalid cron expression: {}", cron_expr)))?;
    Schedule::from_str(&normalized)
        .map_err(|e| FleetError::Cron(format!("Invalid cron expression '{}': {}", cron_expr, e)))
}

/// Check a cron expression without keeping the schedule
pub fn validate(cron_expr: &str) -> FleetResult<()> {
    parse(cron_expr).map(|_| ())
}

/// Next occurrence strictly after `after`
pub fn next_after(schedule: &Schedule, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    schedule.after(&after).next()
}

/// Next occurrence after now
pub fn next_run(schedule: &Schedule) -> Option<DateTime<Utc>> {
    schedule.upcoming(Utc).next()
}

fn normalize(cron_expr: &str) -> Option<String> {
    let fields: Vec<&str> = cron_expr.split_whitespace().collect();
    match fields.len() {
        5 => Some(format!(
            "0 {} {} {} {} {}",
            fields[0],
            fields[1],
            fields[2],
            fields[3],
            shift_day_of_week(fields[4])
        )),
        6 | 7 => Some(fields.join(" ")),
        _ => None,
    }
}

/// Rewrite a Unix day-of-week field (0-7, Sunday = 0 or 7) to 1-7 from Sunday.
/// Names and wildcards are left alone.
fn shift_day_of_week(field: &str) -> String {
    field
        .split(',')
        .map(shift_day_of_week_part)
        .collect::<Vec<_>>()
        .join(",")
}

fn shift_day_of_week_part(part: &str) -> String {
    let (range, step) = match part.split_once('/') {
        Some((range, step)) => (range, Some(step)),
        None => (part, None),
    };
    let with_step = |range: String| match step {
        Some(step) => format!("{}/{}", range, step),
        None => range,
    };

    let shift = |day: u8| day % 7 + 1;

    if let Some((start, end)) = range.split_once('-') {
        return match (start.parse::<u8>(), end.parse::<u8>()) {
            (Ok(0), Ok(7)) => with_step("1-7".to_string()),
            // Ranges ending on the second Sunday wrap to the first.
            (Ok(start), Ok(7)) => format!("{},1", with_step(format!("{}-7", shift(start)))),
            (Ok(start), Ok(end)) => with_step(format!("{}-{}", shift(start), shift(end))),
            _ => part.to_string(),
        };
    }

    match range.parse::<u8>() {
        Ok(day) => with_step(shift(day).to_string()),
        Err(_) => part.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike, Weekday};

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("* * * * *").unwrap(), "0 * * * * *");
        assert_eq!(normalize("0 0 * * 0").unwrap(), "0 0 0 * * 1");
        assert_eq!(normalize("0 9 * * 1-5").unwrap(), "0 0 9 * * 2-6");
        assert_eq!(normalize("0 0 * * MON,FRI").unwrap(), "0 0 0 * * MON,FRI");
        assert_eq!(normalize("*/5 * * * * *").unwrap(), "*/5 * * * * *");
        assert!(normalize("* * *").is_none());
    }

    #[test]
    fn test_shift_day_of_week_edges() {
        assert_eq!(shift_day_of_week("7"), "1");
        assert_eq!(shift_day_of_week("0-7"), "1-7");
        assert_eq!(shift_day_of_week("5-7"), "6-7,1");
        assert_eq!(shift_day_of_week("1-5/2"), "2-6/2");
        assert_eq!(shift_day_of_week("*/2"), "*/2");
    }

    #[test]
    fn test_valid_expressions() {
        assert!(validate("0 0 * * *").is_ok());
        assert!(validate("*/15 * * * *").is_ok());
        assert!(validate("0 0 * * 0").is_ok());
        assert!(validate("0 9 * * 1-5").is_ok());
        assert!(validate("* * * * * *").is_ok());
    }

    #[test]
    fn test_invalid_expressions() {
        assert!(validate("").is_err());
        assert!(validate("not a cron").is_err());
        assert!(validate("61 * * * *").is_err());
        assert!(validate("* 25 * * *").is_err());
        assert!(matches!(validate("0 0 0 0 0 0 0 0"), Err(FleetError::Cron(_))));
    }

    #[test]
    fn test_weekly_sunday_lands_on_sunday() {
        let schedule = parse("0 0 * * 0").unwrap();
        let start = Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap();
        let next = next_after(&schedule, start).unwrap();
        assert_eq!(next.weekday(), Weekday::Sun);
        assert_eq!(next.hour(), 0);
    }

    #[test]
    fn test_weekdays_skip_weekend() {
        let schedule = parse("0 9 * * 1-5").unwrap();
        // Friday 2026-10-16 10:00 -> Monday 09:00
        let start = Utc.with_ymd_and_hms(2026, 10, 16, 10, 0, 0).unwrap();
        let next = next_after(&schedule, start).unwrap();
        assert_eq!(next.weekday(), Weekday::Mon);
        assert_eq!(next.hour(), 9);
    }

    #[test]
    fn test_next_run_in_future() {
        let schedule = parse("* * * * *").unwrap();
        assert!(next_run(&schedule).unwrap() > Utc::now());
    }
}
