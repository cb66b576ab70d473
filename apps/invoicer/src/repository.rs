//! JSON file persistence behind the remote invoice API.
//!
//! `invoices.json` holds the whole collection as an array and is rewritten
//! on every change; `date.json` holds the default invoice date.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::models::invoice::Invoice;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed data file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct DateFile {
    #[serde(default)]
    date: Option<String>,
}

pub struct FileRepository {
    dir: PathBuf,
    invoices_file: PathBuf,
    date_file: PathBuf,
}

/// Today as `mm-dd-yyyy`, the format the date file uses.
pub fn today_mdy() -> String {
    Local::now().format("%m-%d-%Y").to_string()
}

impl FileRepository {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        Self {
            invoices_file: dir.join("invoices.json"),
            date_file: dir.join("date.json"),
            dir,
        }
    }

    /// Creates the data directory and seeds missing files.
    pub async fn ensure_data_files(&self) -> Result<(), RepositoryError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        if !tokio::fs::try_exists(&self.invoices_file).await? {
            tokio::fs::write(&self.invoices_file, "[]").await?;
            info!("Created {}", self.invoices_file.display());
        }
        if !tokio::fs::try_exists(&self.date_file).await? {
            let seed = DateFile {
                date: Some(today_mdy()),
            };
            tokio::fs::write(&self.date_file, serde_json::to_vec(&seed)?).await?;
            info!("Created {}", self.date_file.display());
        }
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<Invoice>, RepositoryError> {
        self.ensure_data_files().await?;
        let raw = tokio::fs::read_to_string(&self.invoices_file).await?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    /// Replaces the record with the same id in place, or appends.
    pub async fn upsert(&self, invoice: Invoice) -> Result<(), RepositoryError> {
        let mut invoices = self.list().await?;
        match invoices.iter_mut().find(|existing| existing.id == invoice.id) {
            Some(existing) => *existing = invoice,
            None => invoices.push(invoice),
        }
        self.write_all(&invoices).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let mut invoices = self.list().await?;
        invoices.retain(|inv| inv.id != id);
        self.write_all(&invoices).await
    }

    pub async fn delete_many(&self, ids: &[String]) -> Result<(), RepositoryError> {
        let ids: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let mut invoices = self.list().await?;
        invoices.retain(|inv| !ids.contains(inv.id.as_str()));
        self.write_all(&invoices).await
    }

    pub async fn replace_all(&self, invoices: &[Invoice]) -> Result<(), RepositoryError> {
        self.ensure_data_files().await?;
        self.write_all(invoices).await
    }

    /// Stored default date, or today when none is stored.
    pub async fn default_date(&self) -> Result<String, RepositoryError> {
        self.ensure_data_files().await?;
        let raw = tokio::fs::read_to_string(&self.date_file).await?;
        let stored: DateFile = if raw.trim().is_empty() {
            DateFile::default()
        } else {
            serde_json::from_str(&raw)?
        };
        Ok(stored
            .date
            .filter(|d| !d.is_empty())
            .unwrap_or_else(today_mdy))
    }

    async fn write_all(&self, invoices: &[Invoice]) -> Result<(), RepositoryError> {
        let json = serde_json::to_vec_pretty(invoices)?;
        tokio::fs::write(&self.invoices_file, json).await?;
        Ok(())
    }
}
