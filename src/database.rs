use crate::error::{Error, Result};
use crate::record::{NewRecord, QrRecord, RecordId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const ID_LEN: usize = 20;

/// Document store for QR records: create once, read by id.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn create(&self, record: &NewRecord) -> Result<RecordId>;

    /// `Ok(None)` when no record has this id.
    async fn read(&self, id: &RecordId) -> Result<Option<QrRecord>>;
}

/// 20 alphanumeric characters drawn from a random UUID.
pub fn generate_id() -> RecordId {
    let mut n = Uuid::new_v4().as_u128();
    let mut id = String::with_capacity(ID_LEN);
    for _ in 0..ID_LEN {
        id.push(ID_ALPHABET[(n % ID_ALPHABET.len() as u128) as usize] as char);
        n /= ID_ALPHABET.len() as u128;
    }
    RecordId::new(id)
}

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let db = Database {
            conn: Mutex::new(conn),
        };
        db.init()?;
        Ok(db)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Upstream("database connection poisoned".to_string()))
    }

    fn init(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS qrcodes (
                id TEXT PRIMARY KEY,
                text TEXT NOT NULL,
                image_url TEXT NOT NULL,
                fg_color TEXT NOT NULL,
                bg_color TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                views INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_qrcodes_timestamp ON qrcodes(timestamp DESC);
            "#,
        )?;

        Ok(())
    }

    pub fn insert_record(&self, record: &NewRecord) -> Result<RecordId> {
        let conn = self.conn()?;
        let id = generate_id();

        conn.execute(
            r#"
            INSERT INTO qrcodes (id, text, image_url, fg_color, bg_color, timestamp, views)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                id.as_str(),
                record.text,
                record.image_url,
                record.fg_color,
                record.bg_color,
                record.timestamp.to_rfc3339(),
                record.views as i64,
            ],
        )?;

        Ok(id)
    }

    pub fn get_record(&self, id: &RecordId) -> Result<Option<QrRecord>> {
        let conn = self.conn()?;

        let result = conn.query_row(
            r#"
            SELECT id, text, image_url, fg_color, bg_color, timestamp, views
            FROM qrcodes
            WHERE id = ?1
            "#,
            params![id.as_str()],
            record_from_row,
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn count(&self) -> Result<u64> {
        let conn = self.conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM qrcodes", [], |row| row.get(0))?;
        Ok(n as u64)
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<QrRecord> {
    let timestamp_str: String = row.get(5)?;
    let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?
        .with_timezone(&Utc);

    Ok(QrRecord {
        id: RecordId::new(row.get::<_, String>(0)?),
        text: row.get(1)?,
        image_url: row.get(2)?,
        fg_color: row.get(3)?,
        bg_color: row.get(4)?,
        timestamp,
        views: row.get::<_, i64>(6)? as u64,
    })
}

#[async_trait]
impl MetadataStore for Database {
    async fn create(&self, record: &NewRecord) -> Result<RecordId> {
        self.insert_record(record).map_err(|e| {
            log::error!("Error saving QR record: {}", e);
            e
        })
    }

    async fn read(&self, id: &RecordId) -> Result<Option<QrRecord>> {
        self.get_record(id).map_err(|e| {
            log::error!("Error getting QR record {}: {}", id, e);
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NewRecord {
        NewRecord {
            text: "https://example.com".to_string(),
            image_url: "https://res.cloudinary.com/demo/image/upload/qr.png".to_string(),
            fg_color: "#000000".to_string(),
            bg_color: "#ffffff".to_string(),
            timestamp: "2024-05-01T12:00:00Z".parse().unwrap(),
            views: 0,
        }
    }

    #[test]
    fn ids_are_twenty_alphanumerics() {
        let id = generate_id();
        assert_eq!(id.as_str().len(), ID_LEN);
        assert!(id.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(generate_id(), id);
    }

    #[test]
    fn insert_then_get_returns_the_same_fields() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert_record(&sample()).unwrap();

        let record = db.get_record(&id).unwrap().expect("record stored");
        assert_eq!(record, sample().into_record(id));
    }

    #[test]
    fn unknown_id_is_none() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_record(&"abc123".into()).unwrap().is_none());
        assert_eq!(db.count().unwrap(), 0);
    }

    #[test]
    fn reopening_a_file_keeps_records() {
        let dir = std::env::temp_dir().join(format!("qrshare-db-{}", Uuid::new_v4()));
        let path = dir.join("qrshare.db");

        let id = Database::new(&path).unwrap().insert_record(&sample()).unwrap();
        let reopened = Database::new(&path).unwrap();
        assert_eq!(reopened.get_record(&id).unwrap().unwrap().text, "https://example.com");

        std::fs::remove_dir_all(dir).ok();
    }
}
