use rstest::rstest;

use crate::domain::Domain;
use crate::errors::ParseError;

#[rstest]
#[case("HTTPS://Example.com/path?q=1")]
#[case("https://example.com/other")]
#[case("https://example.com")]
#[case("https://EXAMPLE.com?q=2")]
#[case("  https://example.com/#frag")]
fn test_from_url_normalizes_to_base(#[case] url: &str) {
    assert_eq!(Domain::from_url(url).unwrap().as_str(), "https://example.com");
}

#[rstest]
fn test_from_url_idempotent() {
    let d = Domain::from_url("HTTPS://Example.com/path?q=1").unwrap();
    assert_eq!(Domain::from_url(d.as_str()), Some(d));
}

#[rstest]
fn test_from_url_keeps_port_and_scheme() {
    assert_eq!(Domain::from_url("http://localhost:8080/a/b").unwrap().as_str(), "http://localhost:8080");
    assert_ne!(Domain::from_url("http://example.com"), Domain::from_url("https://example.com"));
}

#[rstest]
#[case("ftp://example.com/file")]
#[case("example.com/path")]
#[case("https://")]
#[case("clicked button #3")]
#[case("")]
fn test_from_url_rejects(#[case] url: &str) {
    assert_eq!(Domain::from_url(url), None);
}

#[rstest]
fn test_from_str_error() {
    let err = "not a url".parse::<Domain>().unwrap_err();
    assert_eq!(err, ParseError::InvalidUrl("not a url".into()));
}

#[rstest]
fn test_serializes_as_plain_string() {
    let d: Domain = "https://www.google.com/search".parse().unwrap();
    assert_eq!(serde_json::to_string(&d).unwrap(), r#""https://www.google.com""#);
}
