use async_trait::async_trait;

use checkout_types::domain::OrderDetail;
use checkout_types::ports::{InvoiceNotifier, NotifyError};

use crate::application::invoice::render_invoice;

/// Notifier that renders the invoice and logs it instead of mailing it.
/// Stands in wherever a real delivery channel is not configured.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl InvoiceNotifier for LogNotifier {
    async fn send_invoice(&self, detail: &OrderDetail) -> Result<(), NotifyError> {
        let html = render_invoice(detail);
        tracing::info!(
            order_number = %detail.order.order_number,
            bytes = html.len(),
            "invoice rendered for delivery"
        );
        Ok(())
    }
}
