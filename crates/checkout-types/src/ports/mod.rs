mod notifier;
mod stores;

pub use notifier::{InvoiceNotifier, NotifyError};
pub use stores::{
    CartStore, CatalogStore, CheckoutStore, CouponStore, DirectoryStore, OrderStore, PaymentStore,
    StoreError, TaxStore,
};
