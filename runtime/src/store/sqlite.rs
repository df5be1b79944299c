//! SQLite-backed page and review store.
//!
//! Records are kept as JSON documents next to the indexed columns they are
//! queried by.

use super::{PageStore, ReviewStore, StoredPage};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use pagesure::{CategoryKey, PageRecord, Review};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS pages (
    id TEXT PRIMARY KEY,
    category_key TEXT NOT NULL,
    doc TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS pages_category ON pages (category_key);

CREATE TABLE IF NOT EXISTS reviews (
    id TEXT PRIMARY KEY,
    page_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    doc TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS reviews_page ON reviews (page_id, created_at);
CREATE UNIQUE INDEX IF NOT EXISTS reviews_author ON reviews (page_id, user_id);
CREATE INDEX IF NOT EXISTS reviews_user ON reviews (user_id, created_at);
";

/// Fixed-width UTC timestamp, so text order is time order.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Page and review store in one SQLite database.
pub struct SqliteStore {
    db: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let db = Connection::open(path)
            .with_context(|| format!("failed to open database: {}", path.display()))?;
        Self::init(db)
    }

    /// A private in-memory store.
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(db: Connection) -> Result<Self> {
        db.execute_batch(SCHEMA)
            .context("failed to create tables")?;
        Ok(Self { db: Mutex::new(db) })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.db.lock().map_err(|_| anyhow!("database lock poisoned"))
    }

    fn query_pages(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<StoredPage>> {
        let db = self.conn()?;
        let mut stmt = db.prepare(sql)?;
        let rows = stmt
            .query_map(params, |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(id, doc)| {
                let record: PageRecord = serde_json::from_str(&doc)
                    .with_context(|| format!("corrupt page record {id}"))?;
                Ok(StoredPage { id, record })
            })
            .collect()
    }

    fn query_reviews(&self, sql: &str, key: &str) -> Result<Vec<Review>> {
        let db = self.conn()?;
        let mut stmt = db.prepare(sql)?;
        let docs = stmt
            .query_map(params![key], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        docs.iter()
            .map(|doc| serde_json::from_str(doc).context("corrupt review record"))
            .collect()
    }
}

fn read_review(db: &Connection, id: &str) -> Result<Option<Review>> {
    let doc: Option<String> = db
        .query_row("SELECT doc FROM reviews WHERE id = ?1", params![id], |row| {
            row.get(0)
        })
        .optional()?;
    doc.map(|d| serde_json::from_str(&d).with_context(|| format!("corrupt review {id}")))
        .transpose()
}

impl PageStore for SqliteStore {
    fn insert_page_if_absent(&self, id: &str, record: &PageRecord) -> Result<StoredPage> {
        let doc = serde_json::to_string(record)?;
        let db = self.conn()?;
        let inserted = db.execute(
            "INSERT OR IGNORE INTO pages (id, category_key, doc, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![id, record.category_key.as_str(), doc, timestamp(Utc::now())],
        )?;
        debug!(page_id = id, inserted = inserted > 0, "page upsert");

        let stored: String =
            db.query_row("SELECT doc FROM pages WHERE id = ?1", params![id], |row| {
                row.get(0)
            })?;
        Ok(StoredPage {
            id: id.to_string(),
            record: serde_json::from_str(&stored)?,
        })
    }

    fn get_page(&self, id: &str) -> Result<Option<StoredPage>> {
        Ok(self
            .query_pages("SELECT id, doc FROM pages WHERE id = ?1", &[&id])?
            .into_iter()
            .next())
    }

    fn list_pages(&self) -> Result<Vec<StoredPage>> {
        self.query_pages("SELECT id, doc FROM pages ORDER BY created_at, id", &[])
    }

    fn pages_by_category(&self, key: CategoryKey) -> Result<Vec<StoredPage>> {
        self.query_pages(
            "SELECT id, doc FROM pages WHERE category_key = ?1 ORDER BY created_at, id",
            &[&key.as_str()],
        )
    }

    fn count_by_category(&self) -> Result<HashMap<CategoryKey, usize>> {
        let db = self.conn()?;
        let mut stmt =
            db.prepare("SELECT category_key, COUNT(*) FROM pages GROUP BY category_key")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut counts = HashMap::new();
        for (key, n) in rows {
            let key: CategoryKey = key.parse().unwrap_or_default();
            *counts.entry(key).or_insert(0) += n as usize;
        }
        Ok(counts)
    }
}

impl ReviewStore for SqliteStore {
    fn insert_review(&self, review: &Review) -> Result<bool> {
        let doc = serde_json::to_string(review)?;
        let inserted = self.conn()?.execute(
            "INSERT INTO reviews (id, page_id, user_id, created_at, doc)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (page_id, user_id) DO NOTHING",
            params![
                review.id,
                review.page_id,
                review.user_id,
                timestamp(review.created_at),
                doc
            ],
        )?;
        Ok(inserted > 0)
    }

    fn get_review(&self, id: &str) -> Result<Option<Review>> {
        let db = self.conn()?;
        read_review(&db, id)
    }

    fn reviews_for_page(&self, page_id: &str) -> Result<Vec<Review>> {
        self.query_reviews(
            "SELECT doc FROM reviews WHERE page_id = ?1 ORDER BY created_at DESC, id",
            page_id,
        )
    }

    fn reviews_by_user(&self, user_id: &str) -> Result<Vec<Review>> {
        self.query_reviews(
            "SELECT doc FROM reviews WHERE user_id = ?1 ORDER BY created_at DESC, id",
            user_id,
        )
    }

    fn modify_review(
        &self,
        id: &str,
        change: &mut dyn FnMut(&mut Review) -> Result<()>,
    ) -> Result<Option<Review>> {
        let mut db = self.conn()?;
        let tx = db.transaction()?;
        let Some(mut review) = read_review(&tx, id)? else {
            return Ok(None);
        };
        change(&mut review)?;
        tx.execute(
            "UPDATE reviews SET doc = ?2 WHERE id = ?1",
            params![id, serde_json::to_string(&review)?],
        )?;
        tx.commit()?;
        Ok(Some(review))
    }

    fn delete_review(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()?
            .execute("DELETE FROM reviews WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }
}
