use crate::errors::ServerError;
use crate::templates::components::error_page;
use astra::{Body, Response, ResponseBuilder};
use serde_json::json;
use tracing::error;

pub use crate::errors::ResultResp;

/// Convert a ServerError into an HTML error page
pub fn html_error_response(err: ServerError) -> Response {
    log_server_side(&err);
    let page = error_page(err.status(), &err.public_message()).into_string();
    build(err.status(), mime::TEXT_HTML_UTF_8.as_ref(), page.into_bytes())
}

/// Convert a ServerError into a `{"error": ...}` envelope for API clients
pub fn json_error_response(err: ServerError) -> Response {
    log_server_side(&err);
    let body = json!({ "error": err.public_message() }).to_string();
    build(err.status(), mime::APPLICATION_JSON.as_ref(), body.into_bytes())
}

fn log_server_side(err: &ServerError) {
    if err.status() >= 500 {
        error!(error = %err, "request failed");
    }
}

fn build(status: u16, content_type: &str, body: Vec<u8>) -> Response {
    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", content_type)
        .body(Body::from(body))
        .unwrap_or_else(|_| Response::new(Body::from("Internal Server Error")))
}
