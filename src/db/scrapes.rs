use crate::db::properties::SaveSummary;
use crate::errors::ServerError;
use rusqlite::{params, Connection};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ScrapeRun {
    pub id: i64,
    pub location: String,
    pub started_at: i64,
    pub finished_at: Option<i64>,
    pub listings_found: Option<i64>,
    pub inserted: Option<i64>,
    pub skipped: Option<i64>,
    pub failed: Option<i64>,
    pub success: bool,
    pub error_message: Option<String>,
}

pub fn start_scrape_run(conn: &Connection, location: &str, now: i64) -> Result<i64, ServerError> {
    conn.execute(
        "INSERT INTO scrape_runs (location, started_at, success) VALUES (?, ?, 0)",
        params![location, now],
    )
    .map_err(|e| ServerError::DbError(e.to_string()))?;
    Ok(conn.last_insert_rowid())
}

pub fn end_scrape_run(
    conn: &Connection,
    run_id: i64,
    now: i64,
    found: usize,
    summary: SaveSummary,
    error: Option<String>,
) -> Result<(), ServerError> {
    conn.execute(
        "UPDATE scrape_runs SET finished_at = ?, listings_found = ?, inserted = ?, skipped = ?, failed = ?, success = ?, error_message = ? WHERE id = ?",
        params![
            now,
            found as i64,
            summary.inserted as i64,
            summary.skipped as i64,
            summary.failed as i64,
            error.is_none(),
            error,
            run_id
        ],
    )
    .map_err(|e| ServerError::DbError(e.to_string()))?;
    Ok(())
}

pub fn recent_scrape_runs(conn: &Connection, limit: u32) -> Result<Vec<ScrapeRun>, ServerError> {
    let mut stmt = conn
        .prepare("SELECT id, location, started_at, finished_at, listings_found, inserted, skipped, failed, success, error_message FROM scrape_runs ORDER BY started_at DESC, id DESC LIMIT ?")
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map(params![limit], |row| {
            Ok(ScrapeRun {
                id: row.get(0)?,
                location: row.get(1)?,
                started_at: row.get(2)?,
                finished_at: row.get(3)?,
                listings_found: row.get(4)?,
                inserted: row.get(5)?,
                skipped: row.get(6)?,
                failed: row.get(7)?,
                success: row.get(8)?,
                error_message: row.get(9)?,
            })
        })
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut runs = Vec::new();
    for r in rows {
        runs.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::utils::init_test_db;

    #[test]
    fn run_lifecycle_is_recorded() {
        let db = init_test_db();
        let runs = db
            .with_conn(|conn| {
                let ok = start_scrape_run(conn, "Austin, TX", 100)?;
                let summary = SaveSummary { inserted: 4, skipped: 1, failed: 0 };
                end_scrape_run(conn, ok, 110, 5, summary, None)?;

                let bad = start_scrape_run(conn, "Nowhere", 200)?;
                let error = Some("No listings found".to_string());
                end_scrape_run(conn, bad, 201, 0, SaveSummary::default(), error)?;

                recent_scrape_runs(conn, 10)
            })
            .unwrap();

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].location, "Nowhere");
        assert!(!runs[0].success);
        assert_eq!(runs[0].error_message.as_deref(), Some("No listings found"));
        assert!(runs[1].success);
        assert_eq!(runs[1].inserted, Some(4));
        assert_eq!(runs[1].listings_found, Some(5));
    }
}
