//! Durable local invoice store on SQLite.
//!
//! One table keyed by `id` with a non-unique index on `year`; each row keeps
//! the full invoice as JSON. The connection pool and schema are created on
//! first use. Multi-key mutations run in a single transaction.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::SqliteConnection;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::models::invoice::{Invoice, InvoiceYear};
use crate::store::LocalStoreFailure;

/// Bumped whenever the table layout changes.
pub const SCHEMA_VERSION: i64 = 1;

/// Transactional keyed invoice collection.
#[async_trait]
pub trait LocalInvoices: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Invoice>, LocalStoreFailure>;
    async fn get(&self, id: &str) -> Result<Option<Invoice>, LocalStoreFailure>;
    async fn get_by_year(&self, year: &str) -> Result<Vec<Invoice>, LocalStoreFailure>;
    /// Insert or replace by `id`.
    async fn put(&self, invoice: &Invoice) -> Result<(), LocalStoreFailure>;
    async fn delete(&self, id: &str) -> Result<(), LocalStoreFailure>;
    /// Removes every id or none of them.
    async fn delete_many(&self, ids: &[String]) -> Result<(), LocalStoreFailure>;
    /// Clears the collection and inserts `invoices`, all or nothing.
    async fn replace_all(&self, invoices: &[Invoice]) -> Result<(), LocalStoreFailure>;
}

pub struct SqliteLocalStore {
    options: SqliteConnectOptions,
    pool: OnceCell<SqlitePool>,
}

impl SqliteLocalStore {
    /// Describes a store backed by the file at `path`. Nothing is opened yet.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));
        Self {
            options,
            pool: OnceCell::new(),
        }
    }

    /// Returns the pool, connecting and upgrading the schema on first call.
    /// Concurrent first callers wait on the same initialization.
    pub(crate) async fn pool(&self) -> Result<&SqlitePool, LocalStoreFailure> {
        self.pool
            .get_or_try_init(|| async {
                let pool = SqlitePoolOptions::new()
                    .max_connections(4)
                    .connect_with(self.options.clone())
                    .await?;
                upgrade_schema(&pool).await?;
                Ok::<_, LocalStoreFailure>(pool)
            })
            .await
    }
}

/// Runs under `BEGIN IMMEDIATE` so a second process opening the same file
/// waits for the first upgrade instead of racing it.
async fn upgrade_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let mut conn = pool.acquire().await?;
    sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

    match create_schema(&mut conn).await {
        Ok(upgraded_from) => {
            sqlx::query("COMMIT").execute(&mut *conn).await?;
            if let Some(from) = upgraded_from {
                info!("Local invoice store upgraded from schema v{from} to v{SCHEMA_VERSION}");
            }
            Ok(())
        }
        Err(e) => {
            if let Err(rollback) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                warn!("Rollback after failed schema upgrade also failed: {rollback}");
            }
            Err(e)
        }
    }
}

/// Returns the previous version when an upgrade happened.
async fn create_schema(conn: &mut SqliteConnection) -> Result<Option<i64>, sqlx::Error> {
    let version: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(&mut *conn)
        .await?;
    if version >= SCHEMA_VERSION {
        return Ok(None);
    }

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS invoices (
            id   TEXT PRIMARY KEY NOT NULL,
            year TEXT,
            data TEXT NOT NULL
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS invoices_year ON invoices (year)")
        .execute(&mut *conn)
        .await?;
    sqlx::query(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))
        .execute(&mut *conn)
        .await?;

    Ok(Some(version))
}

fn decode_rows(rows: Vec<(String, String)>) -> Result<Vec<Invoice>, LocalStoreFailure> {
    rows.into_iter()
        .map(|(id, data)| {
            serde_json::from_str(&data).map_err(|source| LocalStoreFailure::Corrupt { id, source })
        })
        .collect()
}

const UPSERT: &str = r#"
    INSERT INTO invoices (id, year, data) VALUES (?, ?, ?)
    ON CONFLICT (id) DO UPDATE SET year = excluded.year, data = excluded.data
"#;

fn year_key(invoice: &Invoice) -> Option<String> {
    invoice.year.as_ref().map(InvoiceYear::index_key)
}

#[async_trait]
impl LocalInvoices for SqliteLocalStore {
    async fn get_all(&self) -> Result<Vec<Invoice>, LocalStoreFailure> {
        let rows =
            sqlx::query_as::<_, (String, String)>("SELECT id, data FROM invoices ORDER BY id")
                .fetch_all(self.pool().await?)
                .await?;
        decode_rows(rows)
    }

    async fn get(&self, id: &str) -> Result<Option<Invoice>, LocalStoreFailure> {
        let row =
            sqlx::query_as::<_, (String, String)>("SELECT id, data FROM invoices WHERE id = ?")
                .bind(id)
                .fetch_optional(self.pool().await?)
                .await?;
        Ok(decode_rows(row.into_iter().collect())?.pop())
    }

    async fn get_by_year(&self, year: &str) -> Result<Vec<Invoice>, LocalStoreFailure> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT id, data FROM invoices WHERE year = ? ORDER BY id",
        )
        .bind(year.trim())
        .fetch_all(self.pool().await?)
        .await?;
        decode_rows(rows)
    }

    async fn put(&self, invoice: &Invoice) -> Result<(), LocalStoreFailure> {
        let data = serde_json::to_string(invoice)?;
        sqlx::query(UPSERT)
            .bind(&invoice.id)
            .bind(year_key(invoice))
            .bind(data)
            .execute(self.pool().await?)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), LocalStoreFailure> {
        sqlx::query("DELETE FROM invoices WHERE id = ?")
            .bind(id)
            .execute(self.pool().await?)
            .await?;
        Ok(())
    }

    async fn delete_many(&self, ids: &[String]) -> Result<(), LocalStoreFailure> {
        let mut tx = self.pool().await?.begin().await?;
        for id in ids {
            sqlx::query("DELETE FROM invoices WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn replace_all(&self, invoices: &[Invoice]) -> Result<(), LocalStoreFailure> {
        // Encode everything before touching the table.
        let rows = invoices
            .iter()
            .map(|inv| Ok((inv.id.as_str(), year_key(inv), serde_json::to_string(inv)?)))
            .collect::<Result<Vec<_>, LocalStoreFailure>>()?;

        let mut tx = self.pool().await?.begin().await?;
        sqlx::query("DELETE FROM invoices").execute(&mut *tx).await?;
        for (id, year, data) in rows {
            sqlx::query(UPSERT)
                .bind(id)
                .bind(year)
                .bind(data)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::models::invoice::ClientInfo;

    pub(crate) fn invoice(id: &str, year: Option<InvoiceYear>) -> Invoice {
        Invoice {
            id: id.to_string(),
            year,
            invoice_number: format!("N-{id}"),
            client: ClientInfo {
                name: "Acme Co".to_string(),
                address: Some("1 Main St\nSpringfield".to_string()),
                ..ClientInfo::default()
            },
            summary: "Consulting".to_string(),
            description: "Line one\n\nLine two".to_string(),
            date: Some("2024-01-05".to_string()),
            extra: Default::default(),
        }
    }

    pub(crate) fn temp_store() -> (tempfile::TempDir, SqliteLocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteLocalStore::open(dir.path().join("local.db"));
        (dir, store)
    }

    /// Makes any statement touching `id` abort, as a full disk would.
    pub(crate) async fn poison(store: &SqliteLocalStore, id: &str) {
        let pool = store.pool().await.unwrap();
        for (event, row) in [("DELETE", "OLD"), ("INSERT", "NEW")] {
            sqlx::query(&format!(
                "CREATE TRIGGER poison_{event}_{id} BEFORE {event} ON invoices \
                 WHEN {row}.id = '{id}' BEGIN SELECT RAISE(ABORT, 'simulated failure'); END"
            ))
            .execute(pool)
            .await
            .unwrap();
        }
    }

    fn ids(invoices: &[Invoice]) -> Vec<&str> {
        invoices.iter().map(|i| i.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_schema_is_versioned_on_first_open() {
        let (_dir, store) = temp_store();
        let pool = store.pool().await.unwrap();
        let version: i64 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(pool)
            .await
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);

        let index: Option<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'index' AND name = 'invoices_year'",
        )
        .fetch_optional(pool)
        .await
        .unwrap();
        assert!(index.is_some());
    }

    #[tokio::test]
    async fn test_concurrent_first_open_is_safe() {
        let (_dir, store) = temp_store();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.get_all().await.map(|all| all.len()) })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 0);
        }
    }

    #[tokio::test]
    async fn test_reopen_keeps_data_and_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.db");
        SqliteLocalStore::open(&path)
            .put(&invoice("a", None))
            .await
            .unwrap();

        let reopened = SqliteLocalStore::open(&path);
        assert_eq!(reopened.get("a").await.unwrap(), Some(invoice("a", None)));
    }

    #[tokio::test]
    async fn test_put_is_upsert() {
        let (_dir, store) = temp_store();
        store.put(&invoice("a", None)).await.unwrap();
        let mut changed = invoice("a", Some(InvoiceYear::Number(2024)));
        changed.summary = "Retainer".to_string();
        store.put(&changed).await.unwrap();

        let all = store.get_all().await.unwrap();
        assert_eq!(all, vec![changed]);
    }

    #[tokio::test]
    async fn test_unknown_fields_are_stored() {
        let (_dir, store) = temp_store();
        let mut inv = invoice("a", None);
        inv.extra.insert("total".to_string(), serde_json::json!(1250.5));
        inv.client.extra.insert("vatId".to_string(), serde_json::json!("GB123"));
        store.put(&inv).await.unwrap();

        assert_eq!(store.get("a").await.unwrap(), Some(inv));
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let (_dir, store) = temp_store();
        assert_eq!(store.get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_year_index_lookup() {
        let (_dir, store) = temp_store();
        store.put(&invoice("a", Some(InvoiceYear::Number(2023)))).await.unwrap();
        store
            .put(&invoice("b", Some(InvoiceYear::Text("2024".to_string()))))
            .await
            .unwrap();
        store.put(&invoice("c", Some(InvoiceYear::Number(2024)))).await.unwrap();
        store.put(&invoice("d", None)).await.unwrap();

        assert_eq!(ids(&store.get_by_year("2024").await.unwrap()), vec!["b", "c"]);
        assert_eq!(ids(&store.get_by_year("2023").await.unwrap()), vec!["a"]);
    }

    #[tokio::test]
    async fn test_delete_many_leaves_others() {
        let (_dir, store) = temp_store();
        for id in ["a", "b", "c", "d"] {
            store.put(&invoice(id, None)).await.unwrap();
        }
        store
            .delete_many(&["b".to_string(), "d".to_string(), "zz".to_string()])
            .await
            .unwrap();
        assert_eq!(ids(&store.get_all().await.unwrap()), vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_delete_many_failure_deletes_nothing() {
        let (_dir, store) = temp_store();
        for id in ["a", "b", "c"] {
            store.put(&invoice(id, None)).await.unwrap();
        }
        poison(&store, "b").await;

        let err = store
            .delete_many(&["a".to_string(), "b".to_string(), "c".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, LocalStoreFailure::Database(_)), "got {err:?}");
        assert_eq!(ids(&store.get_all().await.unwrap()), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_replace_all_failure_keeps_previous_contents() {
        let (_dir, store) = temp_store();
        store.put(&invoice("old", None)).await.unwrap();
        poison(&store, "bad").await;

        let result = store
            .replace_all(&[invoice("new", None), invoice("bad", None)])
            .await;
        assert!(result.is_err());
        assert_eq!(ids(&store.get_all().await.unwrap()), vec!["old"]);
    }

    #[tokio::test]
    async fn test_corrupt_row_is_reported() {
        let (_dir, store) = temp_store();
        sqlx::query("INSERT INTO invoices (id, year, data) VALUES ('x', NULL, '{oops')")
            .execute(store.pool().await.unwrap())
            .await
            .unwrap();

        let err = store.get_all().await.unwrap_err();
        assert!(
            matches!(&err, LocalStoreFailure::Corrupt { id, .. } if id == "x"),
            "got {err:?}"
        );
    }
}
