// src/tests/router_tests/page_tests.rs

use super::test_state;
use crate::router::handle;
use crate::tests::utils::{body_string, get, post};

fn seed(state: &crate::app::AppState) {
    let resp = handle(post("/api/scrape", r#"{"location": "Portland, OR"}"#), state).unwrap();
    assert_eq!(resp.status(), 200);
}

#[test]
fn dashboard_renders_counts_and_runs() {
    let state = test_state();
    seed(&state);

    let resp = handle(get("/"), &state).unwrap();
    assert_eq!(resp.status(), 200);
    let html = body_string(resp);
    assert!(html.contains("Market dashboard"));
    assert!(html.contains("Portland, OR"));
}

#[test]
fn properties_page_lists_and_filters() {
    let state = test_state();
    seed(&state);

    let html = body_string(handle(get("/properties?city=Portland"), &state).unwrap());
    assert!(html.contains("Portland, OR"));
    assert!(html.contains("/property/1"));

    let empty = body_string(handle(get("/properties?city=Nowhere"), &state).unwrap());
    assert!(empty.contains("No properties stored yet."));
}

#[test]
fn property_page_shows_history() {
    let state = test_state();
    seed(&state);

    let html = body_string(handle(get("/property/1"), &state).unwrap());
    assert!(html.contains("Price history"));
    assert!(html.contains("demo-listings.com"));

    let err = handle(get("/property/424242"), &state).unwrap_err();
    assert_eq!(err.status(), 404);
}

#[test]
fn analytics_page_draws_charts() {
    let state = test_state();
    seed(&state);

    let html = body_string(handle(get("/analytics"), &state).unwrap());
    assert!(html.contains("<svg"));
    assert!(html.contains("By property type"));

    let empty = test_state();
    let html = body_string(handle(get("/analytics"), &empty).unwrap());
    assert!(html.contains("No listings stored"));
}

#[test]
fn scrape_page_has_form() {
    let state = test_state();
    let html = body_string(handle(get("/scrape"), &state).unwrap());
    assert!(html.contains(r#"action="/scrape""#));
}

#[test]
fn export_returns_workbook() {
    let state = test_state();
    seed(&state);

    let resp = handle(get("/properties/export?city=Portland"), &state).unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()["Content-Disposition"],
        "attachment; filename=\"properties_portland.xlsx\""
    );
}
