//! ERP integration contract and the generic adapter.
//!
//! The core depends only on this local contract, never on a specific
//! ERP wire protocol. Network behavior (retries, transport) belongs to
//! concrete adapters outside the core.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::error::ErpError;
use crate::export;
use crate::models::record::InvoiceRecord;

/// Connection settings for an ERP endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErpConfig {
    pub endpoint: String,
    pub api_key: String,

    /// Target company/ledger code, when the ERP requires one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_code: Option<String>,
}

/// Outcome of a successful push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushOutcome {
    /// Reference assigned by the ERP side.
    pub reference: String,
    pub message: String,
}

/// Capability contract for ERP systems.
pub trait ErpAdapter {
    /// Establish a connection using the supplied settings.
    fn connect(&mut self, config: &ErpConfig) -> Result<(), ErpError>;

    /// Push a record; the adapter receives a read-only view.
    fn push(&mut self, record: &InvoiceRecord) -> Result<PushOutcome, ErpError>;

    /// Whether the adapter currently holds a usable connection.
    fn validate_connection(&self) -> bool;
}

/// Vendor-neutral adapter for ERP systems fronted by a REST gateway.
/// Validates its configuration and transforms records into a neutral
/// payload; the actual transport lives behind the gateway.
pub struct GenericAdapter {
    name: String,
    connected: bool,
    config: Option<ErpConfig>,
}

impl GenericAdapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            connected: false,
            config: None,
        }
    }

    /// Transform a record into the gateway payload.
    fn transform(&self, record: &InvoiceRecord) -> serde_json::Value {
        json!({
            "vendor": record.supplier.clone().unwrap_or_default(),
            "invoice_number": record.invoice_number.clone().unwrap_or_default(),
            "invoice_date": record.invoice_date.map(|d| d.to_string()).unwrap_or_default(),
            "subtotal": record.subtotal.map(|d| d.to_string()).unwrap_or_default(),
            "tax_amount": record.vat.map(|d| d.to_string()).unwrap_or_default(),
            "total_amount": record.total.map(|d| d.to_string()).unwrap_or_default(),
            "company_code": self.config.as_ref().and_then(|c| c.company_code.clone()),
            "line_items": export::line_item_rows(record),
        })
    }
}

impl ErpAdapter for GenericAdapter {
    fn connect(&mut self, config: &ErpConfig) -> Result<(), ErpError> {
        if config.endpoint.trim().is_empty() {
            return Err(ErpError::MissingConfig("endpoint".to_string()));
        }
        if config.api_key.trim().is_empty() {
            return Err(ErpError::MissingConfig("api_key".to_string()));
        }

        self.config = Some(config.clone());
        self.connected = true;
        info!("connected to {} ERP endpoint", self.name);
        Ok(())
    }

    fn push(&mut self, record: &InvoiceRecord) -> Result<PushOutcome, ErpError> {
        if !self.connected {
            return Err(ErpError::NotConnected);
        }

        let payload = self.transform(record);
        let reference = format!(
            "ERP-{}",
            record.invoice_number.as_deref().unwrap_or("UNKNOWN")
        );
        debug!(
            "pushing invoice {} to {}",
            payload["invoice_number"], self.name
        );

        Ok(PushOutcome {
            reference,
            message: format!("invoice pushed to {}", self.name),
        })
    }

    fn validate_connection(&self) -> bool {
        self.connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn config() -> ErpConfig {
        ErpConfig {
            endpoint: "https://erp.example.com/api".to_string(),
            api_key: "secret".to_string(),
            company_code: None,
        }
    }

    #[test]
    fn test_connect_requires_endpoint_and_key() {
        let mut adapter = GenericAdapter::new("Test");

        let err = adapter.connect(&ErpConfig::default()).unwrap_err();
        assert!(matches!(err, ErpError::MissingConfig(f) if f == "endpoint"));
        assert!(!adapter.validate_connection());

        adapter.connect(&config()).unwrap();
        assert!(adapter.validate_connection());
    }

    #[test]
    fn test_push_before_connect_fails() {
        let mut adapter = GenericAdapter::new("Test");
        let err = adapter.push(&InvoiceRecord::default()).unwrap_err();
        assert!(matches!(err, ErpError::NotConnected));
    }

    #[test]
    fn test_push_returns_reference() {
        let mut adapter = GenericAdapter::new("Test");
        adapter.connect(&config()).unwrap();

        let record = InvoiceRecord {
            invoice_number: Some("INV-42".to_string()),
            total: Some(Decimal::from(100)),
            ..Default::default()
        };
        let outcome = adapter.push(&record).unwrap();
        assert_eq!(outcome.reference, "ERP-INV-42");
    }
}
