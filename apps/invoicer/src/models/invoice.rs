use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// The year an invoice is filed under. Older records carry it as a number,
/// newer ones as a string; both are accepted and written back as read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InvoiceYear {
    Number(i64),
    Text(String),
}

impl InvoiceYear {
    /// Key used by the local store's secondary `year` index.
    pub fn index_key(&self) -> String {
        match self {
            InvoiceYear::Number(n) => n.to_string(),
            InvoiceYear::Text(s) => s.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    /// May span several lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Client fields this service does not interpret, kept as stored.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A persisted invoice record. `id` is assigned by the caller before save.
/// Fields other than the ones named here (totals, paid flags, ...) are carried
/// through `extra` untouched, so a save and read back returns the same JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<InvoiceYear>,
    #[serde(default)]
    pub invoice_number: String,
    #[serde(default)]
    pub client: ClientInfo,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The field values the layout engine places on the template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceData {
    pub invoice_number: String,
    pub client: ClientInfo,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

impl InvoiceData {
    /// Rejects data the template cannot be filled from. Optional fields are
    /// never checked here; the engine simply omits their lines.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.invoice_number.trim().is_empty() {
            return Err(ValidationError::MissingField("invoiceNumber"));
        }
        if self.client.name.trim().is_empty() {
            return Err(ValidationError::MissingField("client.name"));
        }
        Ok(())
    }

    pub fn file_name(&self) -> String {
        format!("invoice-{}.pdf", self.invoice_number)
    }

    /// Placeholder values for the calibration render.
    pub fn placeholder(date: String) -> Self {
        InvoiceData {
            invoice_number: "DEBUG".to_string(),
            client: ClientInfo {
                name: "Client Name".to_string(),
                ..ClientInfo::default()
            },
            summary: "Summary".to_string(),
            description: "Description".to_string(),
            date: Some(date),
        }
    }
}

impl From<&Invoice> for InvoiceData {
    fn from(invoice: &Invoice) -> Self {
        InvoiceData {
            invoice_number: invoice.invoice_number.clone(),
            client: invoice.client.clone(),
            summary: invoice.summary.clone(),
            description: invoice.description.clone(),
            date: invoice.date.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_roundtrips_camel_case_json() {
        let raw = r#"{
            "id": "A1",
            "year": 2024,
            "invoiceNumber": "1001",
            "client": { "name": "Acme Co", "address": "1 Main St\nSpringfield" },
            "summary": "Consulting",
            "description": "Line one\n\nLine two",
            "date": "2024-01-05"
        }"#;
        let invoice: Invoice = serde_json::from_str(raw).unwrap();
        assert_eq!(invoice.year, Some(InvoiceYear::Number(2024)));
        assert_eq!(invoice.client.contact, None);

        let back: Invoice = serde_json::from_value(serde_json::to_value(&invoice).unwrap()).unwrap();
        assert_eq!(back, invoice);
    }

    #[test]
    fn test_unknown_fields_survive_roundtrip() {
        let raw = serde_json::json!({
            "id": "A1",
            "invoiceNumber": "1001",
            "client": { "name": "Acme Co", "vatId": "GB123" },
            "total": 1250.5,
            "paid": true
        });
        let invoice: Invoice = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(invoice.extra["total"], 1250.5);
        assert_eq!(invoice.client.extra["vatId"], "GB123");

        let back = serde_json::to_value(&invoice).unwrap();
        assert_eq!(back["total"], 1250.5);
        assert_eq!(back["paid"], true);
        assert_eq!(back["client"]["vatId"], "GB123");
    }

    #[test]
    fn test_client_without_name_still_decodes() {
        let invoice: Invoice = serde_json::from_str(r#"{"id":"A2","client":{}}"#).unwrap();
        assert_eq!(invoice.client.name, "");
        assert_eq!(
            InvoiceData::from(&invoice).validate(),
            Err(ValidationError::MissingField("invoiceNumber"))
        );
    }

    #[test]
    fn test_year_accepts_string_form() {
        let invoice: Invoice =
            serde_json::from_str(r#"{"id":"x","year":" 2023 ","invoiceNumber":"7"}"#).unwrap();
        assert_eq!(invoice.year.as_ref().map(InvoiceYear::index_key), Some("2023".to_string()));
    }

    #[test]
    fn test_validate_requires_number_and_client_name() {
        let mut data = InvoiceData::placeholder("2024-01-05".to_string());
        assert!(data.validate().is_ok());

        data.client.name = "  ".to_string();
        assert_eq!(data.validate(), Err(ValidationError::MissingField("client.name")));

        data.invoice_number.clear();
        assert_eq!(data.validate(), Err(ValidationError::MissingField("invoiceNumber")));
    }

    #[test]
    fn test_file_name_uses_invoice_number() {
        let data = InvoiceData::placeholder("2024-01-05".to_string());
        assert_eq!(data.file_name(), "invoice-DEBUG.pdf");
    }
}
