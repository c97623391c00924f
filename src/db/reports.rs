use crate::db::properties::PageRequest;
use crate::domain::analysis::MarketAnalysis;
use crate::errors::ServerError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_REPORTS_PER_PAGE: u32 = 10;

#[derive(Debug, Clone, Serialize)]
pub struct MarketReport {
    pub id: i64,
    pub title: String,
    pub location: String,
    pub report_type: String,
    pub average_price: Option<f64>,
    pub median_price: Option<f64>,
    pub price_trend: Option<String>,
    pub market_heat: Option<String>,
    pub total_listings: i64,
    pub report_data: Value,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ReportPage {
    pub total: i64,
    pub pages: i64,
    pub current_page: u32,
    pub reports: Vec<MarketReport>,
}

/// Stores a market report built from `analysis`. `location` of `None` means
/// every stored city.
pub fn insert_report(
    conn: &Connection,
    location: Option<&str>,
    analysis: &MarketAnalysis,
) -> Result<MarketReport, ServerError> {
    let now = Utc::now();
    let location = location.unwrap_or("All locations").to_string();
    let title = format!("Market report: {location} ({})", now.format("%Y-%m-%d"));
    let stats = analysis.statistics.as_ref();

    let report_data = serde_json::to_value(analysis)
        .map_err(|e| ServerError::DbError(format!("Serialize report failed: {e}")))?;

    let report = MarketReport {
        id: 0,
        title,
        location,
        report_type: "market_summary".into(),
        average_price: stats.map(|s| s.mean),
        median_price: stats.map(|s| s.median),
        price_trend: analysis.trend.as_ref().map(|t| t.trend.as_str().to_string()),
        market_heat: analysis.market_heat.map(|h| h.as_str().to_string()),
        total_listings: stats.map_or(0, |s| s.count as i64),
        report_data,
        generated_at: now,
    };

    conn.execute(
        r#"
        INSERT INTO market_reports (
            title, location, report_type, average_price, median_price,
            price_trend, market_heat, total_listings, report_data, generated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
        params![
            &report.title,
            &report.location,
            &report.report_type,
            report.average_price,
            report.median_price,
            &report.price_trend,
            &report.market_heat,
            report.total_listings,
            report.report_data.to_string(),
            report.generated_at,
        ],
    )
    .map_err(|e| ServerError::DbError(e.to_string()))?;

    Ok(MarketReport {
        id: conn.last_insert_rowid(),
        ..report
    })
}

pub fn list_reports(conn: &Connection, page: PageRequest) -> Result<ReportPage, ServerError> {
    let total: i64 = conn
        .query_row("SELECT COUNT(*) FROM market_reports", [], |row| row.get(0))
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut stmt = conn
        .prepare(
            "SELECT id, title, location, report_type, average_price, median_price, price_trend, \
             market_heat, total_listings, report_data, generated_at \
             FROM market_reports ORDER BY generated_at DESC, id DESC LIMIT ?1 OFFSET ?2",
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map(params![page.per_page, page.offset()], report_from_row)
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut reports = Vec::new();
    for r in rows {
        reports.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }

    Ok(ReportPage {
        total,
        pages: page.page_count(total),
        current_page: page.page,
        reports,
    })
}

fn report_from_row(row: &Row) -> rusqlite::Result<MarketReport> {
    let data: Option<String> = row.get(9)?;
    let report_data = data
        .and_then(|d| serde_json::from_str(&d).ok())
        .unwrap_or(Value::Null);

    Ok(MarketReport {
        id: row.get(0)?,
        title: row.get(1)?,
        location: row.get(2)?,
        report_type: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        average_price: row.get(4)?,
        median_price: row.get(5)?,
        price_trend: row.get(6)?,
        market_heat: row.get(7)?,
        total_listings: row.get::<_, Option<i64>>(8)?.unwrap_or(0),
        report_data,
        generated_at: row.get(10)?,
    })
}
