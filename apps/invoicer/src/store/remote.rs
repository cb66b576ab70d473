//! HTTP client for the remote invoice API.
//!
//! Every failure (transport, non-2xx status, unexpected body) maps to
//! `RemoteUnavailable`. There are no retries here: the facade tries the
//! remote path exactly once per call.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::invoice::Invoice;
use crate::store::RemoteUnavailable;

/// The remote invoice collection as seen by the facade.
#[async_trait]
pub trait RemoteInvoices: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<Invoice>, RemoteUnavailable>;
    async fn save(&self, invoice: &Invoice) -> Result<(), RemoteUnavailable>;
    async fn delete(&self, id: &str) -> Result<(), RemoteUnavailable>;
    async fn bulk_delete(&self, ids: &[String]) -> Result<(), RemoteUnavailable>;
    async fn import(&self, invoices: &[Invoice]) -> Result<(), RemoteUnavailable>;
    async fn default_date(&self) -> Result<Option<String>, RemoteUnavailable>;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvoicesBody {
    pub invoices: Vec<Invoice>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IdsBody {
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DateBody {
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
struct ImportBody<'a> {
    invoices: &'a [Invoice],
}

#[derive(Debug, Serialize)]
struct IdsRef<'a> {
    ids: &'a [String],
}

/// reqwest-backed remote. `base_url` points at the API root, e.g.
/// `http://localhost:3000/api`.
#[derive(Clone)]
pub struct HttpRemote {
    client: Client,
    base_url: Url,
}

impl HttpRemote {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid remote base URL '{base_url}'"))?;
        if base_url.cannot_be_a_base() {
            bail!("Remote base URL '{base_url}' cannot carry a path");
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, base_url })
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

async fn ensure_success(response: Response) -> Result<Response, RemoteUnavailable> {
    let status = response.status();
    if !status.is_success() {
        return Err(RemoteUnavailable::Status {
            status: status.as_u16(),
        });
    }
    Ok(response)
}

#[async_trait]
impl RemoteInvoices for HttpRemote {
    async fn fetch_all(&self) -> Result<Vec<Invoice>, RemoteUnavailable> {
        let response = self.client.get(self.endpoint(&["invoices"])).send().await?;
        let body: InvoicesBody = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| RemoteUnavailable::Decode(e.to_string()))?;
        debug!("Fetched {} invoices from remote", body.invoices.len());
        Ok(body.invoices)
    }

    async fn save(&self, invoice: &Invoice) -> Result<(), RemoteUnavailable> {
        let response = self
            .client
            .post(self.endpoint(&["invoices"]))
            .json(invoice)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteUnavailable> {
        let response = self
            .client
            .delete(self.endpoint(&["invoices", id]))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn bulk_delete(&self, ids: &[String]) -> Result<(), RemoteUnavailable> {
        let response = self
            .client
            .post(self.endpoint(&["invoices", "bulk-delete"]))
            .json(&IdsRef { ids })
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn import(&self, invoices: &[Invoice]) -> Result<(), RemoteUnavailable> {
        let response = self
            .client
            .post(self.endpoint(&["invoices", "import"]))
            .json(&ImportBody { invoices })
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn default_date(&self) -> Result<Option<String>, RemoteUnavailable> {
        let response = self.client.get(self.endpoint(&["date"])).send().await?;
        let body: DateBody = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| RemoteUnavailable::Decode(e.to_string()))?;
        Ok(body.date)
    }
}
