use crate::app::AppState;
use crate::db::connection::init_db;
use crate::db::connection::Database;
use crate::scraper::{AcquisitionConfig, SourceAdapter};
use astra::{Body, Request, Response};
use std::io::Read;
use std::ops::Deref;
use std::time::Duration;
use tempfile::TempDir;

/// A freshly migrated database living in its own temp directory. The
/// directory, and the SQLite file in it, are removed on drop.
pub struct TestDb {
    db: Database,
    dir: TempDir,
}

impl TestDb {
    pub fn database(&self) -> Database {
        self.db.clone()
    }

    pub fn dir(&self) -> &std::path::Path {
        self.dir.path()
    }
}

impl Deref for TestDb {
    type Target = Database;

    fn deref(&self) -> &Database {
        &self.db
    }
}

/// Initialize a fresh test DB in a temp directory using the production schema
pub fn init_test_db() -> TestDb {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("temp dir unavailable: {e}"));
    let path = dir.path().join("listing_scout.sqlite");

    let db = Database::new(path.to_string_lossy());
    init_db(&db, "sql/schema.sql")
        .unwrap_or_else(|e| panic!("Database initialization failed: {e}"));

    TestDb { db, dir }
}

/// App state over a [`TestDb`] that lives as long as the state does.
pub struct TestApp {
    state: AppState,
    _db: TestDb,
}

impl Deref for TestApp {
    type Target = AppState;

    fn deref(&self) -> &AppState {
        &self.state
    }
}

pub fn test_app(
    adapters: Vec<Box<dyn SourceAdapter>>,
    acquisition: AcquisitionConfig,
    scrape_timeout: Duration,
) -> TestApp {
    let db = init_test_db();
    let state = AppState::new(db.database(), adapters, acquisition, scrape_timeout)
        .unwrap_or_else(|e| panic!("app state: {e}"));
    TestApp { state, _db: db }
}

pub fn get(uri: &str) -> Request {
    http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post(uri: &str, body: &str) -> Request {
    http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_form(uri: &str, body: &str) -> Request {
    http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn body_string(resp: Response) -> String {
    let mut body = String::new();
    resp.into_body()
        .reader()
        .read_to_string(&mut body)
        .unwrap();
    body
}

pub fn body_json(resp: Response) -> serde_json::Value {
    serde_json::from_str(&body_string(resp)).unwrap()
}

#[test]
fn test_db_is_removed_on_drop() {
    let db = init_test_db();
    let dir = db.dir().to_path_buf();
    assert!(dir.join("listing_scout.sqlite").exists());

    drop(db);
    assert!(!dir.exists());
}
