//! Structural and semantic validation of policy documents.
//!
//! Validation is pure: no I/O, no side effects. Every violation found is
//! reported, each prefixed with the path of the offending field.

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

use crate::types::*;

const TIME_FORMAT: &str = "%H:%M";
const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

const OPERATORS: [&str; 4] = ["<", ">", "<=", ">="];

/// A policy document failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid policy: {}", .errors.join("; "))]
pub struct ValidationError {
    pub errors: Vec<String>,
}

/// Validate a policy document, collecting every violation.
pub fn validate(policy: &PolicyDocument) -> Result<(), ValidationError> {
    let mut errors = Vec::new();

    check_bounds(
        &mut errors,
        "policy",
        policy.instance_min_count,
        policy.instance_max_count,
        None,
    );

    if policy.scaling_rules.is_empty() && policy.schedules.is_none() {
        errors.push("policy: at least one scaling rule or a schedules block is required".into());
    }

    for (i, rule) in policy.scaling_rules.iter().enumerate() {
        check_rule(&mut errors, &format!("scaling_rules[{i}]"), rule);
    }

    if let Some(schedules) = &policy.schedules {
        check_schedules(&mut errors, schedules);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { errors })
    }
}

fn check_bounds(errors: &mut Vec<String>, at: &str, min: i32, max: i32, initial: Option<i32>) {
    if min < 0 {
        errors.push(format!("{at}: instance_min_count must be non-negative, got {min}"));
    }
    if max < 0 {
        errors.push(format!("{at}: instance_max_count must be non-negative, got {max}"));
    }
    if min > max {
        errors.push(format!(
            "{at}: instance_min_count {min} is greater than instance_max_count {max}"
        ));
    }
    if let Some(initial) = initial {
        if initial < min || initial > max {
            errors.push(format!(
                "{at}: initial_min_instance_count {initial} is outside [{min}, {max}]"
            ));
        }
    }
}

fn check_rule(errors: &mut Vec<String>, at: &str, rule: &ScalingRule) {
    if rule.metric_type.trim().is_empty() {
        errors.push(format!("{at}: metric_type is required"));
    }
    if !OPERATORS.contains(&rule.operator.as_str()) {
        errors.push(format!("{at}: unsupported operator {:?}", rule.operator));
    }
    if !is_valid_adjustment(&rule.adjustment) {
        errors.push(format!(
            "{at}: adjustment {:?} must look like +N, -N, +N% or -N%",
            rule.adjustment
        ));
    }
    let windows = [
        ("stat_window_secs", rule.stat_window_secs),
        ("breach_duration_secs", rule.breach_duration_secs),
        ("cool_down_secs", rule.cool_down_secs),
    ];
    for (name, value) in windows {
        if let Some(secs) = value.filter(|s| *s < 0) {
            errors.push(format!("{at}: {name} must be non-negative, got {secs}"));
        }
    }
}

/// `+N`, `-N`, `+N%`, `-N%` with N >= 1.
fn is_valid_adjustment(adjustment: &str) -> bool {
    let Some(unsigned) = adjustment
        .strip_prefix('+')
        .or_else(|| adjustment.strip_prefix('-'))
    else {
        return false;
    };
    let digits = unsigned.strip_suffix('%').unwrap_or(unsigned);
    !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && digits.parse::<u32>().is_ok_and(|n| n >= 1)
}

fn check_schedules(errors: &mut Vec<String>, schedules: &Schedules) {
    if schedules.timezone.trim().is_empty() {
        errors.push("schedules: timezone is required".into());
    }
    if schedules.recurring_schedule.is_empty() && schedules.specific_date.is_empty() {
        errors.push("schedules: at least one recurring_schedule or specific_date entry is required".into());
    }
    for (i, entry) in schedules.recurring_schedule.iter().enumerate() {
        check_recurring(errors, &format!("schedules.recurring_schedule[{i}]"), entry);
    }
    for (i, entry) in schedules.specific_date.iter().enumerate() {
        check_specific_date(errors, &format!("schedules.specific_date[{i}]"), entry);
    }
}

fn check_recurring(errors: &mut Vec<String>, at: &str, entry: &RecurringSchedule) {
    check_bounds(
        errors,
        at,
        entry.instance_min_count,
        entry.instance_max_count,
        entry.initial_min_instance_count,
    );

    match (&entry.days_of_week, &entry.days_of_month) {
        (Some(days), None) => check_days(errors, at, "days_of_week", days, 7),
        (None, Some(days)) => check_days(errors, at, "days_of_month", days, 31),
        (Some(_), Some(_)) => errors.push(format!(
            "{at}: days_of_week and days_of_month are mutually exclusive"
        )),
        (None, None) => errors.push(format!("{at}: days_of_week or days_of_month is required")),
    }

    let start = required(errors, at, "start_time", entry.start_time.as_deref())
        .and_then(|s| parse_field(errors, at, "start_time", s, parse_time));
    let end = required(errors, at, "end_time", entry.end_time.as_deref())
        .and_then(|s| parse_field(errors, at, "end_time", s, parse_time));
    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            errors.push(format!("{at}: start_time must be before end_time"));
        }
    }

    let start_date = entry
        .start_date
        .as_deref()
        .and_then(|s| parse_field(errors, at, "start_date", s, parse_date));
    let end_date = entry
        .end_date
        .as_deref()
        .and_then(|s| parse_field(errors, at, "end_date", s, parse_date));
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            errors.push(format!("{at}: start_date must not be after end_date"));
        }
    }
}

fn check_specific_date(errors: &mut Vec<String>, at: &str, entry: &SpecificDateSchedule) {
    check_bounds(
        errors,
        at,
        entry.instance_min_count,
        entry.instance_max_count,
        entry.initial_min_instance_count,
    );

    let start = required(errors, at, "start_date_time", entry.start_date_time.as_deref())
        .and_then(|s| parse_field(errors, at, "start_date_time", s, parse_date_time));
    let end = required(errors, at, "end_date_time", entry.end_date_time.as_deref())
        .and_then(|s| parse_field(errors, at, "end_date_time", s, parse_date_time));
    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            errors.push(format!("{at}: start_date_time must be before end_date_time"));
        }
    }
}

fn check_days(errors: &mut Vec<String>, at: &str, field: &str, days: &[i32], max: i32) {
    if days.is_empty() {
        errors.push(format!("{at}: {field} must not be empty"));
        return;
    }
    let mut seen = HashSet::new();
    for &day in days {
        if !(1..=max).contains(&day) {
            errors.push(format!("{at}: {field} value {day} is outside 1..={max}"));
        }
        if !seen.insert(day) {
            errors.push(format!("{at}: {field} value {day} is duplicated"));
        }
    }
}

fn required<'a>(
    errors: &mut Vec<String>,
    at: &str,
    field: &str,
    value: Option<&'a str>,
) -> Option<&'a str> {
    if value.is_none() {
        errors.push(format!("{at}: {field} is required"));
    }
    value
}

fn parse_field<T>(
    errors: &mut Vec<String>,
    at: &str,
    field: &str,
    value: &str,
    parse: fn(&str) -> Option<T>,
) -> Option<T> {
    let parsed = parse(value);
    if parsed.is_none() {
        errors.push(format!("{at}: {field} {value:?} is malformed"));
    }
    parsed
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, TIME_FORMAT).ok()
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

fn parse_date_time(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATE_TIME_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(adjustment: &str) -> ScalingRule {
        ScalingRule {
            metric_type: "memoryused".to_string(),
            stat_window_secs: Some(300),
            breach_duration_secs: Some(600),
            threshold: 30,
            operator: "<".to_string(),
            cool_down_secs: Some(300),
            adjustment: adjustment.to_string(),
        }
    }

    fn policy(min: i32, max: i32) -> PolicyDocument {
        PolicyDocument {
            instance_min_count: min,
            instance_max_count: max,
            scaling_rules: vec![rule("-1")],
            schedules: None,
        }
    }

    fn recurring() -> RecurringSchedule {
        RecurringSchedule {
            start_date: None,
            end_date: None,
            start_time: Some("10:00".to_string()),
            end_time: Some("18:00".to_string()),
            days_of_week: Some(vec![1, 2, 3]),
            days_of_month: None,
            instance_min_count: 1,
            instance_max_count: 10,
            initial_min_instance_count: Some(5),
        }
    }

    fn specific() -> SpecificDateSchedule {
        SpecificDateSchedule {
            start_date_time: Some("2099-06-02T10:00".to_string()),
            end_date_time: Some("2099-06-15T13:59".to_string()),
            instance_min_count: 1,
            instance_max_count: 4,
            initial_min_instance_count: Some(2),
        }
    }

    fn with_schedules(
        recurring: Vec<RecurringSchedule>,
        specific: Vec<SpecificDateSchedule>,
    ) -> PolicyDocument {
        PolicyDocument {
            schedules: Some(Schedules {
                timezone: "Asia/Shanghai".to_string(),
                recurring_schedule: recurring,
                specific_date: specific,
            }),
            ..policy(1, 4)
        }
    }

    fn errors(policy: &PolicyDocument) -> Vec<String> {
        validate(policy).unwrap_err().errors
    }

    #[test]
    fn accepts_well_formed_policy() {
        assert!(validate(&policy(1, 4)).is_ok());
        assert!(validate(&with_schedules(vec![recurring()], vec![specific()])).is_ok());
    }

    #[test]
    fn rejects_min_above_max() {
        let errs = errors(&policy(10, 4));
        assert_eq!(errs.len(), 1);
        assert!(errs[0].contains("greater than instance_max_count"));
    }

    #[test]
    fn rejects_negative_bounds() {
        let errs = errors(&policy(-1, 4));
        assert!(errs.iter().any(|e| e.contains("must be non-negative")));
    }

    #[test]
    fn rejects_policy_without_rules_or_schedules() {
        let mut p = policy(1, 4);
        p.scaling_rules.clear();
        assert!(errors(&p)[0].contains("at least one scaling rule"));
    }

    #[test]
    fn rejects_bad_rule_fields() {
        let mut p = policy(1, 4);
        p.scaling_rules[0].operator = "==".to_string();
        p.scaling_rules[0].cool_down_secs = Some(-5);
        let errs = errors(&p);
        assert_eq!(errs.len(), 2);
        assert!(errs[0].starts_with("scaling_rules[0]: unsupported operator"));
        assert!(errs[1].contains("cool_down_secs"));
    }

    #[test]
    fn adjustment_forms() {
        assert!(is_valid_adjustment("+1"));
        assert!(is_valid_adjustment("-12"));
        assert!(is_valid_adjustment("+10%"));
        assert!(!is_valid_adjustment("1"));
        assert!(!is_valid_adjustment("+0"));
        assert!(!is_valid_adjustment("+"));
        assert!(!is_valid_adjustment("+%"));
        assert!(!is_valid_adjustment("-1.5"));
    }

    #[test]
    fn rejects_schedule_entry_bounds() {
        let mut entry = recurring();
        entry.instance_min_count = 11;
        entry.initial_min_instance_count = None;
        let errs = errors(&with_schedules(vec![entry], vec![]));
        assert_eq!(errs.len(), 1);
        assert!(errs[0].starts_with("schedules.recurring_schedule[0]"));
    }

    #[test]
    fn rejects_initial_count_outside_bounds() {
        let mut entry = specific();
        entry.initial_min_instance_count = Some(9);
        let errs = errors(&with_schedules(vec![], vec![entry]));
        assert!(errs[0].contains("initial_min_instance_count 9"));
    }

    #[test]
    fn recurring_requires_exactly_one_day_selector() {
        let mut neither = recurring();
        neither.days_of_week = None;
        assert!(errors(&with_schedules(vec![neither], vec![]))[0].contains("is required"));

        let mut both = recurring();
        both.days_of_month = Some(vec![5]);
        assert!(errors(&with_schedules(vec![both], vec![]))[0].contains("mutually exclusive"));
    }

    #[test]
    fn recurring_days_are_range_checked_and_unique() {
        let mut entry = recurring();
        entry.days_of_week = Some(vec![0, 3, 3]);
        let errs = errors(&with_schedules(vec![entry], vec![]));
        assert_eq!(errs.len(), 2);

        let mut monthly = recurring();
        monthly.days_of_week = None;
        monthly.days_of_month = Some(vec![5, 15, 31]);
        assert!(validate(&with_schedules(vec![monthly], vec![])).is_ok());
    }

    #[test]
    fn recurring_requires_ordered_times() {
        let mut missing = recurring();
        missing.end_time = None;
        assert!(errors(&with_schedules(vec![missing], vec![]))[0].contains("end_time is required"));

        let mut reversed = recurring();
        reversed.start_time = Some("19:00".to_string());
        assert!(errors(&with_schedules(vec![reversed], vec![]))[0]
            .contains("start_time must be before end_time"));

        let mut malformed = recurring();
        malformed.start_time = Some("25:00".to_string());
        assert!(errors(&with_schedules(vec![malformed], vec![]))[0].contains("malformed"));
    }

    #[test]
    fn recurring_date_range_is_checked() {
        let mut entry = recurring();
        entry.start_date = Some("2099-07-23".to_string());
        entry.end_date = Some("2099-06-27".to_string());
        assert!(errors(&with_schedules(vec![entry], vec![]))[0].contains("start_date"));
    }

    #[test]
    fn specific_date_requires_ordered_date_times() {
        let mut missing = specific();
        missing.start_date_time = None;
        assert!(errors(&with_schedules(vec![], vec![missing]))[0]
            .contains("start_date_time is required"));

        let mut reversed = specific();
        reversed.end_date_time = Some("2099-01-01T00:00".to_string());
        assert!(errors(&with_schedules(vec![], vec![reversed]))[0]
            .contains("must be before end_date_time"));
    }

    #[test]
    fn empty_schedules_block_is_rejected() {
        let mut p = with_schedules(vec![], vec![]);
        p.schedules.as_mut().unwrap().timezone = String::new();
        let errs = errors(&p);
        assert_eq!(errs.len(), 2);
    }

    #[test]
    fn error_display_joins_all_violations() {
        let err = validate(&policy(10, -4)).unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.starts_with("invalid policy: "));
        assert!(rendered.contains("; "));
    }
}
