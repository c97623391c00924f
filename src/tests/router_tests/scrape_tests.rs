// src/tests/router_tests/scrape_tests.rs

use super::test_state;
use crate::errors::ServerError;
use crate::router::handle;
use crate::tests::utils::{body_json, get, post, post_form};
use std::collections::HashSet;

#[test]
fn scrape_persists_and_is_idempotent() {
    let state = test_state();

    let body = r#"{"location": "Austin, TX"}"#;
    let first = body_json(handle(post("/api/scrape", body), &state).unwrap());
    let found = first["found"].as_u64().unwrap();
    assert!((5..=8).contains(&found));
    assert_eq!(first["inserted"], found);
    assert_eq!(first["skipped"], 0);
    assert_eq!(first["outcomes"][0]["adapter"], "demo");
    assert_eq!(first["outcomes"][0]["status"], "listings");

    let listings = first["listings"].as_array().unwrap();
    let urls: HashSet<&str> = listings.iter().filter_map(|l| l["url"].as_str()).collect();
    assert_eq!(urls.len(), listings.len());
    for l in listings {
        assert!(l["price"].as_i64().unwrap() > 0);
        assert!(!l["images"].as_array().unwrap().is_empty());
        assert_eq!(l["city"], "Austin");
        assert_eq!(l["state"], "TX");
    }

    let second = body_json(handle(post("/api/scrape?location=Austin,%20TX", ""), &state).unwrap());
    assert_eq!(second["inserted"], 0);
    assert_eq!(second["skipped"], found);

    let stored = body_json(handle(get("/api/properties?city=Austin"), &state).unwrap());
    assert_eq!(stored["total"], found);
}

#[test]
fn empty_location_is_not_found() {
    let state = test_state();
    let err = handle(post("/api/scrape", r#"{"location": ""}"#), &state).unwrap_err();
    assert!(matches!(err, ServerError::NotFound(ref msg) if msg == "No listings found"));
}

#[test]
fn missing_location_is_bad_request() {
    let state = test_state();
    let err = handle(post("/api/scrape", ""), &state).unwrap_err();
    assert_eq!(err.status(), 400);
}

#[test]
fn scrape_form_redirects_to_city() {
    let state = test_state();
    let resp = handle(post_form("/scrape", "location=Denver%2C+CO"), &state).unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(resp.headers()["Location"], "/properties?city=Denver");
}
