//! Dual-path invoice store: one API over a remote service and a local
//! durable store.
//!
//! Remote failures never leave this module: they are logged and turned into
//! fallback per `policy`. Local failures propagate because there is no
//! further fallback. Each path is tried at most once per call.
//!
//! Known limitation: writes are not reconciled. If the remote write succeeds
//! and the local one fails (or the reverse) the two copies diverge until the
//! next successful write or import.

pub mod local;
pub mod policy;
pub mod remote;

use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::models::invoice::Invoice;
use local::{LocalInvoices, SqliteLocalStore};
use policy::{resolve_optional, resolve_read, resolve_write, PathOutcome, Resolution};
use remote::{HttpRemote, RemoteInvoices};

/// The remote path could not be used. Only ever a fallback trigger.
#[derive(Debug, Error)]
pub enum RemoteUnavailable {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Remote answered with status {status}")]
    Status { status: u16 },

    #[error("Unexpected response body: {0}")]
    Decode(String),
}

/// The local durable store is unusable; surfaced to callers.
#[derive(Debug, Error)]
pub enum LocalStoreFailure {
    #[error("Local store error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored invoice '{id}' is corrupt: {source}")]
    Corrupt {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invoice could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct DualPathStore {
    remote: Arc<dyn RemoteInvoices>,
    local: Arc<dyn LocalInvoices>,
}

impl DualPathStore {
    pub fn new(remote: Arc<dyn RemoteInvoices>, local: Arc<dyn LocalInvoices>) -> Self {
        Self { remote, local }
    }

    /// HTTP remote plus SQLite local store, as configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let remote = HttpRemote::new(&config.remote_base_url, config.remote_timeout)?;
        let local = SqliteLocalStore::open(&config.local_store_path);
        info!(
            "Invoice store: remote {} with local fallback at {}",
            config.remote_base_url,
            config.local_store_path.display()
        );
        Ok(Self::new(Arc::new(remote), Arc::new(local)))
    }

    /// Remote collection, or the whole local collection if the remote fails.
    pub async fn get_all(&self) -> Result<Vec<Invoice>, LocalStoreFailure> {
        let outcome = PathOutcome::from_remote("get_all", self.remote.fetch_all().await);
        match resolve_read(outcome) {
            Resolution::Done(invoices) => Ok(invoices),
            Resolution::UseLocal => self.local.get_all().await,
        }
    }

    /// `None` when the record does not exist on whichever path answered.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Invoice>, LocalStoreFailure> {
        let outcome = PathOutcome::from_remote("get_by_id", self.remote.fetch_all().await);
        match resolve_read(outcome) {
            Resolution::Done(invoices) => Ok(invoices.into_iter().find(|inv| inv.id == id)),
            Resolution::UseLocal => self.local.get(id).await,
        }
    }

    /// Best-effort remote save, then an unconditional local save.
    pub async fn save(&self, invoice: &Invoice) -> Result<(), LocalStoreFailure> {
        let outcome = PathOutcome::from_remote("save", self.remote.save(invoice).await);
        self.mirror(outcome, self.local.put(invoice)).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), LocalStoreFailure> {
        let outcome = PathOutcome::from_remote("delete", self.remote.delete(id).await);
        self.mirror(outcome, self.local.delete(id)).await
    }

    /// Locally, all ids go in one transaction.
    pub async fn bulk_delete(&self, ids: &[String]) -> Result<(), LocalStoreFailure> {
        let outcome = PathOutcome::from_remote("bulk_delete", self.remote.bulk_delete(ids).await);
        self.mirror(outcome, self.local.delete_many(ids)).await
    }

    /// Destructive: the local collection becomes exactly `invoices`.
    pub async fn import_all(&self, invoices: &[Invoice]) -> Result<(), LocalStoreFailure> {
        let outcome = PathOutcome::from_remote("import_all", self.remote.import(invoices).await);
        self.mirror(outcome, self.local.replace_all(invoices)).await
    }

    /// `None` means "use the current date".
    pub async fn get_default_date(&self) -> Option<String> {
        resolve_optional(PathOutcome::from_remote(
            "get_default_date",
            self.remote.default_date().await,
        ))
    }

    /// Reads the local store only.
    pub async fn get_all_local(&self) -> Result<Vec<Invoice>, LocalStoreFailure> {
        self.local.get_all().await
    }

    /// Writes the local store only.
    pub async fn save_local(&self, invoice: &Invoice) -> Result<(), LocalStoreFailure> {
        self.local.put(invoice).await
    }

    async fn mirror(
        &self,
        outcome: PathOutcome<()>,
        local_step: impl std::future::Future<Output = Result<(), LocalStoreFailure>>,
    ) -> Result<(), LocalStoreFailure> {
        match resolve_write(outcome) {
            Resolution::Done(()) => Ok(()),
            Resolution::UseLocal => local_step.await,
        }
    }
}
