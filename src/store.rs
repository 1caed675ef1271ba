//! Persistence for scored business records.
//!
//! Rows are keyed by `place_id`. An upsert looks the key up first and then
//! either updates every mutable column or inserts a new row. The lookup and
//! the write are not atomic; callers serialize writes per key.

use crate::error::StoreError;
use crate::models::{BusinessRecord, PersistedRecord};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::debug;

const SCHEMA_SQL: &str = include_str!("../sql/schema.sql");

const SELECT_COLUMNS: &str = r#"
    SELECT id, place_id, name, phone, email, website, has_website, address,
           neighborhood, city, category, rating, review_count, maps_url,
           prospect_priority, raw_data, created_at, last_updated
    FROM businesses
"#;

/// A keyed store of business records, passed explicitly to whatever writes.
pub trait BusinessStore {
    fn upsert(&mut self, record: &BusinessRecord) -> Result<PersistedRecord, StoreError>;
    fn find(&self, place_id: &str) -> Result<Option<PersistedRecord>, StoreError>;
    fn count(&self) -> Result<usize, StoreError>;
    /// Every record, highest priority first.
    fn all(&self) -> Result<Vec<PersistedRecord>, StoreError>;
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    fn existing_row(&self, place_id: &str) -> Result<Option<(i64, DateTime<Utc>)>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, last_updated FROM businesses WHERE place_id = ?1",
                params![place_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(row)
    }

    fn update(&self, id: i64, record: &BusinessRecord, now: DateTime<Utc>) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            UPDATE businesses SET
                name = ?2,
                phone = ?3,
                email = ?4,
                website = ?5,
                has_website = ?6,
                address = ?7,
                neighborhood = ?8,
                city = ?9,
                category = ?10,
                rating = ?11,
                review_count = ?12,
                maps_url = ?13,
                prospect_priority = ?14,
                raw_data = ?15,
                last_updated = ?16
            WHERE id = ?1
            "#,
            params![
                id,
                record.name,
                record.phone,
                record.email,
                record.website,
                record.has_website,
                record.address,
                record.neighborhood,
                record.city,
                record.category,
                record.rating,
                record.review_count,
                record.maps_url,
                record.prospect_priority,
                record.raw_data,
                now,
            ],
        )?;
        Ok(())
    }

    fn insert(&self, record: &BusinessRecord, now: DateTime<Utc>) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO businesses (
                place_id, name, phone, email, website, has_website,
                address, neighborhood, city, category, rating, review_count,
                maps_url, prospect_priority, raw_data, created_at, last_updated
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10, ?11, ?12,
                ?13, ?14, ?15, ?16, ?16
            )
            "#,
            params![
                record.place_id,
                record.name,
                record.phone,
                record.email,
                record.website,
                record.has_website,
                record.address,
                record.neighborhood,
                record.city,
                record.category,
                record.rating,
                record.review_count,
                record.maps_url,
                record.prospect_priority,
                record.raw_data,
                now,
            ],
        )?;
        Ok(())
    }
}

impl BusinessStore for SqliteStore {
    fn upsert(&mut self, record: &BusinessRecord) -> Result<PersistedRecord, StoreError> {
        if record.place_id.trim().is_empty() {
            return Err(StoreError::MissingKey);
        }

        let now = Utc::now();
        match self.existing_row(&record.place_id)? {
            Some((id, previous)) => {
                let stamp = next_timestamp(previous, now);
                self.update(id, record, stamp)?;
                debug!(id, place_id = %record.place_id, "Updated business");
            }
            None => {
                self.insert(record, now)?;
                debug!(place_id = %record.place_id, "Inserted business");
            }
        }

        self.find(&record.place_id)?
            .ok_or(StoreError::Database(rusqlite::Error::QueryReturnedNoRows))
    }

    fn find(&self, place_id: &str) -> Result<Option<PersistedRecord>, StoreError> {
        let sql = format!("{SELECT_COLUMNS} WHERE place_id = ?1");
        let found = self
            .conn
            .query_row(&sql, params![place_id], persisted_from_row)
            .optional()?;
        Ok(found)
    }

    fn count(&self) -> Result<usize, StoreError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM businesses", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    fn all(&self) -> Result<Vec<PersistedRecord>, StoreError> {
        // Unnamed businesses go last within their priority
        let sql = format!("{SELECT_COLUMNS} ORDER BY prospect_priority DESC, name IS NULL, name ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], persisted_from_row)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

/// The stamp for a rewrite of a row last written at `previous`. Always
/// strictly later than `previous`, even if the clock has not moved.
fn next_timestamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

fn persisted_from_row(row: &Row<'_>) -> rusqlite::Result<PersistedRecord> {
    Ok(PersistedRecord {
        id: row.get(0)?,
        record: BusinessRecord {
            place_id: row.get(1)?,
            name: row.get(2)?,
            phone: row.get(3)?,
            email: row.get(4)?,
            website: row.get(5)?,
            has_website: row.get(6)?,
            address: row.get(7)?,
            neighborhood: row.get(8)?,
            city: row.get(9)?,
            category: row.get(10)?,
            rating: row.get(11)?,
            review_count: row.get(12)?,
            maps_url: row.get(13)?,
            prospect_priority: row.get(14)?,
            raw_data: row.get(15)?,
        },
        created_at: row.get(16)?,
        last_updated: row.get(17)?,
    })
}
