use async_trait::async_trait;

use crate::domain::OrderDetail;

#[derive(thiserror::Error, Debug)]
pub enum NotifyError {
    #[error("notify error: {0}")]
    Send(String),
}

/// Delivers the invoice for a freshly placed order. Callers treat failure
/// as non-fatal: the order stands either way.
#[async_trait]
pub trait InvoiceNotifier: Send + Sync + 'static {
    async fn send_invoice(&self, detail: &OrderDetail) -> Result<(), NotifyError>;
}
