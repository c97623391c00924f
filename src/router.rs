use crate::app::{run_scrape, AppState};
use crate::db::properties::{
    self, get_property, list_properties, price_history, prices_for, property_rows_for,
    DEFAULT_PER_PAGE,
};
use crate::db::reports::{insert_report, list_reports, DEFAULT_REPORTS_PER_PAGE};
use crate::db::scrapes::recent_scrape_runs;
use crate::db::{PageRequest, PropertyFilter};
use crate::domain::analysis::{analyze, market_heat, price_statistics};
use crate::domain::listing::{Listing, PropertyType};
use crate::errors::ServerError;
use crate::responses::{html_response, json_response, json_with_status, redirect, ResultResp};
use crate::spreadsheets::export_properties_xlsx;
use crate::templates;
use astra::Request;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::io::Read;
use url::form_urlencoded;

const RECENT_RUNS: u32 = 10;

pub fn handle(mut req: Request, state: &AppState) -> ResultResp {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().trim_end_matches('/').to_string();
    let query = parse_query(&req);
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match (method.as_str(), segments.as_slice()) {
        // JSON API
        ("GET", ["health"]) | ("GET", ["api", "health"]) => {
            json_response(&json!({ "status": "healthy" }))
        }
        ("GET", ["api", "properties"]) => api_list_properties(state, &query),
        ("POST", ["api", "properties"]) => api_create_property(state, &read_body(&mut req)?),
        ("GET", ["api", "properties", id]) => api_get_property(state, parse_id(id)?),
        ("GET", ["api", "market", "summary"]) => api_market_summary(state, &query),
        ("GET", ["api", "market", "analysis"]) => api_market_analysis(state, &query),
        ("POST", ["api", "scrape"]) => {
            let body = read_body(&mut req)?;
            let location = scrape_location(&body, &query)?;
            json_response(&run_scrape(state, &location)?)
        }
        ("GET", ["api", "reports"]) => {
            let page = page_request(&query, DEFAULT_REPORTS_PER_PAGE);
            json_response(&state.db.with_conn(|conn| list_reports(conn, page))?)
        }
        ("POST", ["api", "reports"]) => api_create_report(state, &query),

        // HTML pages
        ("GET", []) => dashboard(state),
        ("GET", ["properties"]) => properties_page(state, &query),
        ("GET", ["properties", "export"]) => export_properties(state, &query),
        ("GET", ["property", id]) => property_page(state, parse_id(id)?),
        ("GET", ["analytics"]) => analytics_page(state, &query),
        ("GET", ["scrape"]) => {
            let runs = state.db.with_conn(|conn| recent_scrape_runs(conn, RECENT_RUNS))?;
            html_response(templates::pages::scrape_page(&runs))
        }
        ("POST", ["scrape"]) => {
            let form = parse_form(&read_body(&mut req)?);
            let location = non_empty(&form, "location")
                .ok_or_else(|| ServerError::BadRequest("location is required".into()))?;
            let outcome = run_scrape(state, location)?;
            let city = outcome
                .listings
                .first()
                .map(|l| l.city.clone())
                .unwrap_or_default();
            let target: String = form_urlencoded::Serializer::new(String::new())
                .append_pair("city", &city)
                .finish();
            redirect(&format!("/properties?{target}"))
        }

        _ => Err(ServerError::NotFound(format!("No route for {method} {path}"))),
    }
}

pub fn is_api_path(path: &str) -> bool {
    path == "/health" || path.starts_with("/api/") || path == "/api"
}

fn api_list_properties(state: &AppState, query: &HashMap<String, String>) -> ResultResp {
    let filter = property_filter(query);
    let page = page_request(query, DEFAULT_PER_PAGE);
    json_response(&state.db.with_conn(|conn| list_properties(conn, &filter, page))?)
}

fn api_get_property(state: &AppState, id: i64) -> ResultResp {
    let property = state
        .db
        .with_conn(|conn| get_property(conn, id))?
        .ok_or_else(|| ServerError::NotFound(format!("Property {id} not found")))?;
    json_response(&property)
}

#[derive(Debug, Deserialize)]
struct NewProperty {
    url: String,
    address: String,
    city: String,
    state: String,
    price: f64,
    zip_code: Option<String>,
    bedrooms: Option<u32>,
    bathrooms: Option<f64>,
    square_feet: Option<u32>,
    property_type: Option<String>,
    description: Option<String>,
    #[serde(default)]
    images: Vec<String>,
    source: Option<String>,
}

fn api_create_property(state: &AppState, body: &str) -> ResultResp {
    let new: NewProperty =
        serde_json::from_str(body).map_err(|e| ServerError::BadRequest(e.to_string()))?;

    if new.url.trim().is_empty() {
        return Err(ServerError::BadRequest("url must not be empty".into()));
    }
    let price = new.price.round();
    if !price.is_finite() || price < 1.0 {
        return Err(ServerError::BadRequest("price must be a positive whole amount".into()));
    }

    let listing = Listing {
        url: new.url.trim().to_string(),
        address: new.address,
        city: new.city,
        state: new.state,
        price: price as i64,
        bedrooms: new.bedrooms,
        bathrooms: new.bathrooms,
        square_feet: new.square_feet,
        property_type: new
            .property_type
            .as_deref()
            .map(PropertyType::parse_lenient)
            .unwrap_or_default(),
        description: new.description,
        images: new.images,
        source: new.source.unwrap_or_else(|| "manual".into()),
    };

    let stored = state.db.with_conn(|conn| {
        properties::insert_property(conn, &listing, new.zip_code.as_deref())
    })?;
    json_with_status(201, &stored)
}

fn api_market_summary(state: &AppState, query: &HashMap<String, String>) -> ResultResp {
    let city = non_empty(query, "city");
    let prices = state.db.with_conn(|conn| prices_for(conn, city))?;
    let stats = price_statistics(&prices);

    json_response(&json!({
        "total_listings": prices.len(),
        "average_price": stats.as_ref().map(|s| s.mean),
        "market_heat": market_heat(&prices),
        "location": city,
    }))
}

fn api_market_analysis(state: &AppState, query: &HashMap<String, String>) -> ResultResp {
    let city = non_empty(query, "city");
    let rows = state.db.with_conn(|conn| property_rows_for(conn, city))?;
    json_response(&analyze(&rows))
}

fn api_create_report(state: &AppState, query: &HashMap<String, String>) -> ResultResp {
    let city = non_empty(query, "city");
    let report = state.db.with_conn(|conn| {
        let rows = property_rows_for(conn, city)?;
        insert_report(conn, city, &analyze(&rows))
    })?;
    json_with_status(201, &report)
}

fn dashboard(state: &AppState) -> ResultResp {
    let vm = state.db.with_conn(|conn| {
        let prices = prices_for(conn, None)?;
        Ok(templates::pages::DashboardVm {
            total_properties: properties::count_properties(conn)?,
            city_count: properties::cities(conn)?.len(),
            statistics: price_statistics(&prices),
            market_heat: market_heat(&prices),
            recent_runs: recent_scrape_runs(conn, RECENT_RUNS)?,
        })
    })?;
    html_response(templates::pages::home_page(&vm))
}

fn properties_page(state: &AppState, query: &HashMap<String, String>) -> ResultResp {
    let filter = property_filter(query);
    let page = page_request(query, DEFAULT_PER_PAGE);
    let (listing_page, cities) = state.db.with_conn(|conn| {
        Ok((list_properties(conn, &filter, page)?, properties::cities(conn)?))
    })?;
    html_response(templates::pages::properties_page(&listing_page, &filter, &cities))
}

fn property_page(state: &AppState, id: i64) -> ResultResp {
    let (property, history) = state.db.with_conn(|conn| {
        let property = get_property(conn, id)?
            .ok_or_else(|| ServerError::NotFound(format!("Property {id} not found")))?;
        Ok((property, price_history(conn, id)?))
    })?;
    html_response(templates::pages::property_page(&property, &history))
}

fn analytics_page(state: &AppState, query: &HashMap<String, String>) -> ResultResp {
    let city = non_empty(query, "city");
    let (rows, cities) = state.db.with_conn(|conn| {
        Ok((property_rows_for(conn, city)?, properties::cities(conn)?))
    })?;
    html_response(templates::pages::analytics_page(&analyze(&rows), city, &cities))
}

fn export_properties(state: &AppState, query: &HashMap<String, String>) -> ResultResp {
    let city = non_empty(query, "city");
    let rows = state.db.with_conn(|conn| property_rows_for(conn, city))?;
    export_properties_xlsx(&rows, city)
}

/// `{"location": ...}` body, falling back to `?location=`.
fn scrape_location(body: &str, query: &HashMap<String, String>) -> Result<String, ServerError> {
    if !body.trim().is_empty() {
        let value: serde_json::Value =
            serde_json::from_str(body).map_err(|e| ServerError::BadRequest(e.to_string()))?;
        if let Some(location) = value.get("location").and_then(|l| l.as_str()) {
            return Ok(location.to_string());
        }
    }
    query
        .get("location")
        .cloned()
        .ok_or_else(|| ServerError::BadRequest("location is required".into()))
}

fn property_filter(query: &HashMap<String, String>) -> PropertyFilter {
    PropertyFilter {
        city: non_empty(query, "city").map(str::to_string),
        min_price: non_empty(query, "min_price").and_then(|v| v.parse().ok()),
        max_price: non_empty(query, "max_price").and_then(|v| v.parse().ok()),
        property_type: non_empty(query, "property_type").map(PropertyType::parse_lenient),
    }
}

fn page_request(query: &HashMap<String, String>, default_per_page: u32) -> PageRequest {
    PageRequest::new(
        non_empty(query, "page").and_then(|v| v.parse().ok()),
        non_empty(query, "per_page").and_then(|v| v.parse().ok()),
        default_per_page,
    )
}

fn non_empty<'a>(map: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    map.get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn parse_id(raw: &str) -> Result<i64, ServerError> {
    raw.parse()
        .map_err(|_| ServerError::NotFound(format!("No property with id {raw}")))
}

fn read_body(req: &mut Request) -> Result<String, ServerError> {
    let mut body = String::new();
    req.body_mut()
        .reader()
        .read_to_string(&mut body)
        .map_err(|e| ServerError::BadRequest(format!("Unreadable request body: {e}")))?;
    Ok(body)
}

fn parse_form(body: &str) -> HashMap<String, String> {
    form_urlencoded::parse(body.as_bytes()).into_owned().collect()
}

fn parse_query(req: &Request) -> HashMap<String, String> {
    req.uri()
        .query()
        .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}
