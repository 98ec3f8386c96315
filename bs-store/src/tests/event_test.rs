use assertables::*;
use rstest::rstest;
use tracing_test::traced_test;

use super::load_str;
use crate::{
    ChangeType,
    Event,
};

const LOG: &str = "\
2024-03-01 12:00:00,https://a.com/,access
2024-03-01 12:00:04,https://A.com/page,access
2024-03-01 12:00:10,https://b.com/,access
2024-03-01 12:01:10,https://a.com/,access
2024-03-01 12:01:11.5,https://a.com/other,access
2024-03-01 12:01:20,https://c.com/,access
";

#[rstest]
fn test_derive_change_types_and_deltas() {
    let events = load_str(LOG).access_events();

    let changes: Vec<_> = events.iter().map(|e| e.change_type).collect();
    assert_eq!(
        changes,
        [
            ChangeType::DomainChange,
            ChangeType::RouteChange,
            ChangeType::DomainChange,
            ChangeType::DomainChange,
            ChangeType::RouteChange,
            ChangeType::DomainChange,
        ]
    );

    let deltas: Vec<_> = events.iter().map(|e| e.time_delta).collect();
    for (got, want) in deltas.iter().zip([0.0, 4.0, 6.0, 60.0, 1.5, 8.5]) {
        assert_in_delta!(*got, want, 1e-9);
    }
}

#[rstest]
fn test_domain_changes_subsequence() {
    let events = load_str(LOG).access_events();
    let domains: Vec<_> = Event::domain_changes(&events).map(|e| e.domain.as_str()).collect();

    assert_eq!(domains, ["https://a.com", "https://b.com", "https://a.com", "https://c.com"]);
}

#[test]
#[traced_test]
fn test_derive_drops_unparsable_urls() {
    let log = "\
2024-03-01 12:00:00,https://a.com/,access
2024-03-01 12:00:05,about:blank,access
2024-03-01 12:00:07,https://a.com/x,access
";
    let events = load_str(log).access_events();

    assert_eq!(events.len(), 2);
    assert_eq!(events[1].change_type, ChangeType::RouteChange);
    assert_in_delta!(events[1].time_delta, 7.0, 1e-9);
    assert!(logs_contain("skipping access with unparsable url"));
}

#[rstest]
fn test_derive_empty() {
    assert!(Event::derive(std::iter::empty()).is_empty());
}
