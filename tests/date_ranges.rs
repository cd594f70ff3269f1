//! Integration tests for date ranges
//!
//! Tests that request date expressions bound the events a breakdown sees.

mod common;

use breakdown_planner::{BreakdownError, BreakdownQuery, BreakdownQueryRunner, DateError, Event};
use chrono::{TimeDelta, TimeZone, Utc};
use common::{hours_ago, load_fixture, now, run_pipeline, ISSUE, TEAM};

fn exception_at(hours: i64, browser: &str) -> Event {
    Event::new(TEAM, "$exception", hours_ago(hours))
        .with_property("$exception_issue_id", ISSUE)
        .with_property("$browser", browser)
}

fn events() -> Vec<Event> {
    vec![
        exception_at(1, "Recent"),
        exception_at(3 * 24, "ThreeDays"),
        exception_at(10 * 24, "TenDays"),
        exception_at(40 * 24, "FortyDays"),
    ]
}

fn browsers(date_from: Option<&str>, date_to: Option<&str>) -> Vec<String> {
    let config = load_fixture("default.yaml");
    let query = BreakdownQuery::new(ISSUE, ["$browser"])
        .with_date_range(date_from, date_to)
        .with_limit(10);
    let response = run_pipeline(&config, query, events()).expect("Pipeline should succeed");
    let mut values: Vec<String> = response
        .results
        .get("$browser")
        .map(|b| b.values.iter().map(|v| v.value.clone()).collect())
        .unwrap_or_default();
    values.sort();
    values
}

#[test]
fn test_default_window_is_seven_days() {
    assert_eq!(browsers(None, None), vec!["Recent", "ThreeDays"]);
}

#[test]
fn test_all_time_start_uses_default_window() {
    assert_eq!(browsers(Some("all"), None), vec!["Recent", "ThreeDays"]);
}

#[test]
fn test_relative_start() {
    assert_eq!(browsers(Some("-14d"), None), vec!["Recent", "TenDays", "ThreeDays"]);
    assert_eq!(browsers(Some("-2d"), None), vec!["Recent"]);
    assert_eq!(browsers(Some("-3m"), None), vec!["FortyDays", "Recent", "TenDays", "ThreeDays"]);
}

#[test]
fn test_relative_end() {
    assert_eq!(browsers(Some("-14d"), Some("-2d")), vec!["TenDays", "ThreeDays"]);
}

#[test]
fn test_absolute_dates() {
    // now() is 2025-03-10 12:00; a bare end date covers the whole day
    assert_eq!(browsers(Some("2025-03-07"), Some("2025-03-07")), vec!["ThreeDays"]);
}

#[test]
fn test_all_time_end_is_rejected() {
    let config = load_fixture("default.yaml");
    let query = BreakdownQuery::new(ISSUE, ["$browser"]).with_date_range(Some("-7d"), Some("all"));

    let err = BreakdownQueryRunner::new(query, TEAM, &config, now()).unwrap_err();

    assert!(matches!(err, BreakdownError::InvalidRange(DateError::AllTimeEnd)));
}

#[test]
fn test_unparseable_and_inverted_ranges() {
    let config = load_fixture("default.yaml");

    let garbage = BreakdownQuery::new(ISSUE, ["$browser"]).with_date_range(Some("yesterday-ish"), None);
    let err = BreakdownQueryRunner::new(garbage, TEAM, &config, now()).unwrap_err();
    assert!(matches!(err, BreakdownError::InvalidRange(DateError::Unparseable(_))));

    let inverted = BreakdownQuery::new(ISSUE, ["$browser"]).with_date_range(Some("-1d"), Some("-3d"));
    let err = BreakdownQueryRunner::new(inverted, TEAM, &config, now()).unwrap_err();
    assert!(matches!(err, BreakdownError::InvalidRange(DateError::InvertedRange { .. })));
}

#[test]
fn test_resolved_window_bounds() {
    let config = load_fixture("default.yaml");
    let query = BreakdownQuery::new(ISSUE, ["$browser"]).with_date_range(Some("-1w"), Some("2025-03-09"));

    let runner = BreakdownQueryRunner::new(query, TEAM, &config, now()).unwrap();

    assert_eq!(runner.window().date_from(), now() - TimeDelta::weeks(1));
    let end_of_day = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap() - TimeDelta::microseconds(1);
    assert_eq!(runner.window().date_to(), end_of_day);
}
