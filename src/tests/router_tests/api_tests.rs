// src/tests/router_tests/api_tests.rs

use super::test_state;
use crate::errors::ServerError;
use crate::router::handle;
use crate::tests::utils::{body_json, get, post};
use serde_json::json;

fn create(state: &crate::app::AppState, body: serde_json::Value) -> serde_json::Value {
    let resp = handle(post("/api/properties", &body.to_string()), state).unwrap();
    assert_eq!(resp.status(), 201);
    body_json(resp)
}

fn sample(url: &str, city: &str, price: i64) -> serde_json::Value {
    json!({
        "url": url,
        "address": "5 Pine Avenue",
        "city": city,
        "state": "TX",
        "price": price,
        "bedrooms": 3,
        "property_type": "House",
    })
}

#[test]
fn health_is_reported_on_both_paths() {
    let state = test_state();
    for path in ["/health", "/api/health"] {
        let resp = handle(get(path), &state).unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(body_json(resp), json!({ "status": "healthy" }));
    }
}

#[test]
fn create_then_fetch_property() {
    let state = test_state();
    let created = create(&state, sample("https://x.example/1", "Austin", 350_000));

    assert_eq!(created["property_type"], "house");
    assert_eq!(created["source"], "manual");
    let id = created["id"].as_i64().unwrap();

    let resp = handle(get(&format!("/api/properties/{id}")), &state).unwrap();
    assert_eq!(resp.status(), 200);
    let fetched = body_json(resp);
    assert_eq!(fetched["url"], "https://x.example/1");
    assert_eq!(fetched["price"], 350_000);
}

#[test]
fn duplicate_url_is_bad_request() {
    let state = test_state();
    create(&state, sample("https://x.example/dup", "Austin", 1));

    let body = sample("https://x.example/dup", "Austin", 2).to_string();
    let err = handle(post("/api/properties", &body), &state).unwrap_err();
    assert!(matches!(err, ServerError::BadRequest(_)));
}

#[test]
fn price_that_rounds_to_zero_is_rejected() {
    let state = test_state();
    for price in [json!(0.4), json!(0), json!(-5), json!(0.49)] {
        let mut body = sample("https://x.example/frac", "Austin", 1);
        body["price"] = price;
        let err = handle(post("/api/properties", &body.to_string()), &state).unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(_)), "{err:?}");
    }

    let listed = body_json(handle(get("/api/properties"), &state).unwrap());
    assert_eq!(listed["total"], 0);

    let mut body = sample("https://x.example/frac", "Austin", 1);
    body["price"] = json!(0.6);
    let created = create(&state, body);
    assert_eq!(created["price"], 1);
}

#[test]
fn malformed_body_is_bad_request() {
    let state = test_state();
    for body in ["not json", r#"{"url": "https://x.example/1"}"#] {
        let err = handle(post("/api/properties", body), &state).unwrap_err();
        assert_eq!(err.status(), 400);
    }
}

#[test]
fn missing_property_is_not_found() {
    let state = test_state();
    let err = handle(get("/api/properties/999"), &state).unwrap_err();
    assert!(matches!(err, ServerError::NotFound(_)));
}

#[test]
fn list_filters_and_paginates() {
    let state = test_state();
    for i in 0..5 {
        create(&state, sample(&format!("https://a.example/{i}"), "Austin", 100_000 * (i + 1)));
    }
    create(&state, sample("https://b.example/1", "Boise", 900_000));

    let all = body_json(handle(get("/api/properties?per_page=4"), &state).unwrap());
    assert_eq!(all["total"], 6);
    assert_eq!(all["pages"], 2);
    assert_eq!(all["current_page"], 1);
    assert_eq!(all["properties"].as_array().unwrap().len(), 4);

    let uri = "/api/properties?city=Austin&min_price=200000&max_price=400000";
    let austin = body_json(handle(get(uri), &state).unwrap());
    assert_eq!(austin["total"], 3);
}

#[test]
fn market_summary_for_city() {
    let state = test_state();
    create(&state, sample("https://a.example/1", "Austin", 400_000));
    create(&state, sample("https://a.example/2", "Austin", 600_000));
    create(&state, sample("https://b.example/1", "Boise", 100_000));

    let summary = body_json(handle(get("/api/market/summary?city=Austin"), &state).unwrap());
    assert_eq!(summary["total_listings"], 2);
    assert_eq!(summary["average_price"], 500_000.0);
    assert_eq!(summary["market_heat"], "warm");
    assert_eq!(summary["location"], "Austin");
}

#[test]
fn market_summary_of_empty_store() {
    let state = test_state();
    let summary = body_json(handle(get("/api/market/summary"), &state).unwrap());
    assert_eq!(summary["total_listings"], 0);
    assert!(summary["average_price"].is_null());
}

#[test]
fn market_analysis_groups_listings() {
    let state = test_state();
    create(&state, sample("https://a.example/1", "Austin", 400_000));
    create(&state, sample("https://b.example/1", "Boise", 200_000));

    let analysis = body_json(handle(get("/api/market/analysis"), &state).unwrap());
    assert_eq!(analysis["statistics"]["count"], 2);
    assert_eq!(analysis["by_city"]["Austin"]["count"], 1);
    assert_eq!(analysis["by_property_type"]["house"]["count"], 2);
}

#[test]
fn reports_are_generated_and_listed() {
    let state = test_state();
    create(&state, sample("https://a.example/1", "Austin", 400_000));

    let resp = handle(post("/api/reports?city=Austin", ""), &state).unwrap();
    assert_eq!(resp.status(), 201);
    let report = body_json(resp);
    assert_eq!(report["location"], "Austin");
    assert_eq!(report["total_listings"], 1);

    let listed = body_json(handle(get("/api/reports"), &state).unwrap());
    assert_eq!(listed["total"], 1);
    assert_eq!(listed["reports"][0]["market_heat"], "warm");
}

#[test]
fn unknown_route_is_not_found() {
    let state = test_state();
    let err = handle(get("/api/nope"), &state).unwrap_err();
    assert_eq!(err.status(), 404);
}
