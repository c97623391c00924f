use crate::db::connection::Database;
use crate::domain::listing::{Listing, PropertyType, StoredProperty};
use crate::errors::ServerError;
use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{ffi, params, params_from_iter, Connection, OptionalExtension, Row};
use serde::Serialize;
use tracing::{debug, info, warn};

const PROPERTY_COLUMNS: &str = "id, url, address, city, state, zip_code, price, bedrooms, bathrooms, \
     square_feet, property_type, description, image_urls, source, scraped_at, updated_at";

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

/// Counts produced by the persistence gate for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SaveSummary {
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyFilter {
    pub city: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub property_type: Option<PropertyType>,
}

/// 1-based page request, clamped to sane bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(page: Option<u32>, per_page: Option<u32>, default_per_page: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(default_per_page).clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.per_page as i64
    }

    pub fn page_count(&self, total: i64) -> i64 {
        (total + self.per_page as i64 - 1) / self.per_page as i64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None, DEFAULT_PER_PAGE)
    }
}

#[derive(Debug, Serialize)]
pub struct PropertyPage {
    pub total: i64,
    pub pages: i64,
    pub current_page: u32,
    pub properties: Vec<StoredProperty>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PricePoint {
    pub price: i64,
    pub recorded_at: DateTime<Utc>,
}

/// Saves a batch of listings, one record at a time.
///
/// Listings whose URL is already stored are skipped. Each insert runs in its
/// own transaction, so one failing record never takes the others down. A
/// UNIQUE violation from a concurrent writer counts as a skip, anything else
/// as a failure.
pub fn save_listings(db: &Database, listings: &[Listing]) -> Result<SaveSummary, ServerError> {
    db.with_conn(|conn| {
        let mut summary = SaveSummary::default();

        for listing in listings {
            match exists_by_url(conn, &listing.url) {
                Ok(true) => {
                    debug!(url = %listing.url, "already stored, skipping");
                    summary.skipped += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(url = %listing.url, error = %e, "existence check failed");
                    summary.failed += 1;
                    continue;
                }
            }

            match insert_in_transaction(conn, listing, None) {
                Ok(_) => summary.inserted += 1,
                Err(e) if is_unique_violation(&e) => {
                    debug!(url = %listing.url, "inserted concurrently, skipping");
                    summary.skipped += 1;
                }
                Err(e) => {
                    warn!(url = %listing.url, error = %e, "insert failed");
                    summary.failed += 1;
                }
            }
        }

        info!(
            inserted = summary.inserted,
            skipped = summary.skipped,
            failed = summary.failed,
            "listings saved"
        );
        Ok(summary)
    })
}

pub fn exists_by_url(conn: &Connection, url: &str) -> Result<bool, ServerError> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM properties WHERE url = ?1)",
        params![url],
        |row| row.get(0),
    )
    .map_err(|e| ServerError::DbError(e.to_string()))
}

/// Inserts one listing with its initial price-history row.
pub fn insert_property(
    conn: &mut Connection,
    listing: &Listing,
    zip_code: Option<&str>,
) -> Result<StoredProperty, ServerError> {
    insert_in_transaction(conn, listing, zip_code).map_err(|e| {
        if is_unique_violation(&e) {
            ServerError::BadRequest(format!("A property with url {} already exists", listing.url))
        } else {
            ServerError::DbError(e.to_string())
        }
    })
}

fn insert_in_transaction(
    conn: &mut Connection,
    listing: &Listing,
    zip_code: Option<&str>,
) -> rusqlite::Result<StoredProperty> {
    let now = Utc::now();
    let images = serde_json::to_string(&listing.images)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

    let tx = conn.transaction()?;
    tx.execute(
        r#"
        INSERT INTO properties (
            url, address, city, state, zip_code, price, bedrooms, bathrooms,
            square_feet, property_type, description, image_urls, source,
            scraped_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        "#,
        params![
            &listing.url,
            &listing.address,
            &listing.city,
            &listing.state,
            zip_code,
            listing.price,
            listing.bedrooms,
            listing.bathrooms,
            listing.square_feet,
            listing.property_type.as_str(),
            &listing.description,
            images,
            &listing.source,
            now,
            now,
        ],
    )?;
    let id = tx.last_insert_rowid();

    tx.execute(
        "INSERT INTO price_history (property_id, price, recorded_at) VALUES (?1, ?2, ?3)",
        params![id, listing.price, now],
    )?;
    tx.commit()?;

    Ok(StoredProperty {
        id,
        url: listing.url.clone(),
        address: listing.address.clone(),
        city: listing.city.clone(),
        state: listing.state.clone(),
        zip_code: zip_code.map(str::to_string),
        price: listing.price,
        bedrooms: listing.bedrooms,
        bathrooms: listing.bathrooms,
        square_feet: listing.square_feet,
        property_type: listing.property_type,
        description: listing.description.clone(),
        images: listing.images.clone(),
        source: listing.source.clone(),
        scraped_at: now,
        updated_at: now,
    })
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

pub fn get_property(conn: &Connection, id: i64) -> Result<Option<StoredProperty>, ServerError> {
    conn.query_row(
        &format!("SELECT {PROPERTY_COLUMNS} FROM properties WHERE id = ?1"),
        params![id],
        property_from_row,
    )
    .optional()
    .map_err(|e| ServerError::DbError(e.to_string()))
}

/// Filtered, paginated listing ordered newest first.
pub fn list_properties(
    conn: &Connection,
    filter: &PropertyFilter,
    page: PageRequest,
) -> Result<PropertyPage, ServerError> {
    let (clause, mut args) = where_clause(filter);

    let total: i64 = conn
        .query_row(
            &format!("SELECT COUNT(*) FROM properties{clause}"),
            params_from_iter(args.iter()),
            |row| row.get(0),
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    args.push(Value::Integer(page.per_page as i64));
    args.push(Value::Integer(page.offset()));

    let properties = query_properties(
        conn,
        &format!("SELECT {PROPERTY_COLUMNS} FROM properties{clause} ORDER BY scraped_at DESC, id DESC LIMIT ? OFFSET ?"),
        args,
    )?;

    Ok(PropertyPage {
        total,
        pages: page.page_count(total),
        current_page: page.page,
        properties,
    })
}

/// Every stored property, optionally restricted to one city.
pub fn property_rows_for(
    conn: &Connection,
    city: Option<&str>,
) -> Result<Vec<StoredProperty>, ServerError> {
    let filter = PropertyFilter {
        city: city.map(str::to_string),
        ..PropertyFilter::default()
    };
    let (clause, args) = where_clause(&filter);
    query_properties(
        conn,
        &format!("SELECT {PROPERTY_COLUMNS} FROM properties{clause} ORDER BY scraped_at ASC, id ASC"),
        args,
    )
}

pub fn prices_for(conn: &Connection, city: Option<&str>) -> Result<Vec<i64>, ServerError> {
    let mut stmt = conn
        .prepare("SELECT price FROM properties WHERE ?1 IS NULL OR city = ?1")
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map(params![city], |row| row.get(0))
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    rows.collect::<Result<Vec<i64>, _>>()
        .map_err(|e| ServerError::DbError(e.to_string()))
}

pub fn price_history(conn: &Connection, property_id: i64) -> Result<Vec<PricePoint>, ServerError> {
    let mut stmt = conn
        .prepare("SELECT price, recorded_at FROM price_history WHERE property_id = ?1 ORDER BY recorded_at ASC, id ASC")
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map(params![property_id], |row| {
            Ok(PricePoint {
                price: row.get(0)?,
                recorded_at: row.get(1)?,
            })
        })
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| ServerError::DbError(e.to_string()))
}

pub fn count_properties(conn: &Connection) -> Result<i64, ServerError> {
    conn.query_row("SELECT COUNT(*) FROM properties", [], |row| row.get(0))
        .map_err(|e| ServerError::DbError(e.to_string()))
}

/// Distinct cities with stored listings, for filter dropdowns.
pub fn cities(conn: &Connection) -> Result<Vec<String>, ServerError> {
    let mut stmt = conn
        .prepare("SELECT DISTINCT city FROM properties ORDER BY city")
        .map_err(|e| ServerError::DbError(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| row.get(0))
        .map_err(|e| ServerError::DbError(e.to_string()))?;
    rows.collect::<Result<Vec<String>, _>>()
        .map_err(|e| ServerError::DbError(e.to_string()))
}

fn where_clause(filter: &PropertyFilter) -> (String, Vec<Value>) {
    let mut conditions = Vec::new();
    let mut args = Vec::new();

    if let Some(city) = &filter.city {
        conditions.push("city = ?");
        args.push(Value::Text(city.clone()));
    }
    if let Some(min) = filter.min_price {
        conditions.push("price >= ?");
        args.push(Value::Real(min));
    }
    if let Some(max) = filter.max_price {
        conditions.push("price <= ?");
        args.push(Value::Real(max));
    }
    if let Some(kind) = filter.property_type {
        conditions.push("property_type = ?");
        args.push(Value::Text(kind.as_str().to_string()));
    }

    if conditions.is_empty() {
        (String::new(), args)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), args)
    }
}

fn query_properties(
    conn: &Connection,
    sql: &str,
    args: Vec<Value>,
) -> Result<Vec<StoredProperty>, ServerError> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map(params_from_iter(args.iter()), property_from_row)
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut properties = Vec::new();
    for r in rows {
        properties.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok(properties)
}

fn property_from_row(row: &Row) -> rusqlite::Result<StoredProperty> {
    let kind: String = row.get(10)?;
    let images_json: String = row.get(12)?;
    let images: Vec<String> = serde_json::from_str(&images_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(12, Type::Text, Box::new(e)))?;

    Ok(StoredProperty {
        id: row.get(0)?,
        url: row.get(1)?,
        address: row.get(2)?,
        city: row.get(3)?,
        state: row.get(4)?,
        zip_code: row.get(5)?,
        price: row.get(6)?,
        bedrooms: row.get(7)?,
        bathrooms: row.get(8)?,
        square_feet: row.get(9)?,
        property_type: PropertyType::parse_lenient(&kind),
        description: row.get(11)?,
        images,
        source: row.get(13)?,
        scraped_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}
