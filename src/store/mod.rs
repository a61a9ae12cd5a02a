/// Persistent keyed-record store for fetched Printful entities.
///
/// One row per natural key, upsert-only. Records are idempotent re-fetches
/// of upstream truth, so concurrent same-key writers need no ordering beyond
/// sqlite's own (last writer wins).
use crate::errors::ProxyResult;
use crate::models::{ProductInfo, VariantInfo};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Bound on how long a single store operation may block on a busy database.
/// Hitting it surfaces as an error, which the cache layer treats as a miss.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const PRODUCTS_TABLE: &str = "products";
const VARIANTS_TABLE: &str = "variants";

#[derive(Debug, Clone)]
pub struct StoredRecord<T> {
    /// Unix seconds of the upstream fetch that produced this payload.
    pub last_updated: i64,
    pub payload: T,
}

#[derive(Clone)]
pub struct EntityStore {
    conn: Arc<Mutex<Connection>>,
}

impl EntityStore {
    pub fn open<P: AsRef<Path>>(path: P) -> ProxyResult<Self> {
        Self::initialize(Connection::open(path)?)
    }

    pub fn open_in_memory() -> ProxyResult<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> ProxyResult<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        for table in [PRODUCTS_TABLE, VARIANTS_TABLE] {
            conn.execute(
                &format!(
                    "CREATE TABLE IF NOT EXISTS {} (
                        id INTEGER PRIMARY KEY,
                        last_updated INTEGER NOT NULL,
                        payload TEXT NOT NULL
                    )",
                    table
                ),
                [],
            )?;
        }
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn find_product(&self, product_id: i64) -> ProxyResult<Option<StoredRecord<ProductInfo>>> {
        self.find(PRODUCTS_TABLE, product_id)
    }

    pub fn upsert_product(&self, product_id: i64, info: &ProductInfo) -> ProxyResult<()> {
        self.upsert_at(PRODUCTS_TABLE, product_id, info, Utc::now().timestamp())
    }

    pub fn find_variant(&self, variant_id: i64) -> ProxyResult<Option<StoredRecord<VariantInfo>>> {
        self.find(VARIANTS_TABLE, variant_id)
    }

    pub fn upsert_variant(&self, variant_id: i64, info: &VariantInfo) -> ProxyResult<()> {
        self.upsert_at(VARIANTS_TABLE, variant_id, info, Utc::now().timestamp())
    }

    pub(crate) fn upsert_product_at(
        &self,
        product_id: i64,
        info: &ProductInfo,
        last_updated: i64,
    ) -> ProxyResult<()> {
        self.upsert_at(PRODUCTS_TABLE, product_id, info, last_updated)
    }

    pub(crate) fn upsert_variant_at(
        &self,
        variant_id: i64,
        info: &VariantInfo,
        last_updated: i64,
    ) -> ProxyResult<()> {
        self.upsert_at(VARIANTS_TABLE, variant_id, info, last_updated)
    }

    #[cfg(test)]
    pub(crate) fn drop_tables(&self) {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch("DROP TABLE products; DROP TABLE variants;")
            .unwrap();
    }

    fn find<T: DeserializeOwned>(
        &self,
        table: &str,
        key: i64,
    ) -> ProxyResult<Option<StoredRecord<T>>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                &format!("SELECT last_updated, payload FROM {} WHERE id = ?1", table),
                params![key],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((last_updated, payload)) => Ok(Some(StoredRecord {
                last_updated,
                payload: serde_json::from_str(&payload)?,
            })),
        }
    }

    fn upsert_at<T: Serialize>(
        &self,
        table: &str,
        key: i64,
        payload: &T,
        last_updated: i64,
    ) -> ProxyResult<()> {
        let payload = serde_json::to_string(payload)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO {} (id, last_updated, payload) VALUES (?1, ?2, ?3)",
                table
            ),
            params![key, last_updated, payload],
        )?;
        Ok(())
    }
}
