use uuid::Uuid;

use crate::application::invoice::render_invoice;
use crate::errors::AppError;
use checkout_types::domain::{Order, OrderDetail, OrderItem, OrderLine, OrderStatus};
use checkout_types::ports::{CheckoutStore, InvoiceNotifier};

/// Checkout finalization and order reads. Placing an order freezes the
/// session's cart into an immutable snapshot; the cart row survives with a
/// back-link so historical lookups by order keep working.
pub struct OrderService<S: CheckoutStore, N: InvoiceNotifier> {
    store: S,
    notifier: N,
}

impl<S: CheckoutStore, N: InvoiceNotifier> OrderService<S, N> {
    pub fn new(store: S, notifier: N) -> Self {
        Self { store, notifier }
    }

    pub async fn place_order(&self, session_id: &str) -> Result<Order, AppError> {
        let mut cart = self
            .store
            .open_cart_for_session(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Cart not found".into()))?;
        let items = self.store.items_for_cart(cart.id).await?;
        if items.is_empty() {
            return Err(AppError::InvalidInput("Cart is empty".into()));
        }

        // The number is allocated before the insert so a failed insert
        // burns a value instead of ever reusing one.
        let sequence = self.store.next_order_number().await?;
        let order = self
            .store
            .insert_order(Order::from_cart(&cart, sequence))
            .await?;

        cart.link_order(order.id);
        self.store.update_cart(cart).await?;

        let order_items = items
            .iter()
            .map(|item| OrderItem::from_cart_item(order.id, item))
            .collect();
        self.store.insert_order_items(order_items).await?;

        // Invoice delivery is best effort. The order stands even when the
        // detail cannot be assembled or the notifier fails.
        match self.find_order(order.id).await {
            Ok(detail) => {
                if let Err(e) = self.notifier.send_invoice(&detail).await {
                    tracing::warn!(order_number = %order.order_number, error = %e, "invoice delivery failed");
                }
            }
            Err(e) => {
                tracing::warn!(order_number = %order.order_number, error = %e, "could not assemble order detail for invoice");
            }
        }

        Ok(order)
    }

    /// One collapsed document per order: the snapshot plus its owning user,
    /// shipping address, lines (with product data when still present) and
    /// payment attempts.
    pub async fn find_order(&self, order_id: Uuid) -> Result<OrderDetail, AppError> {
        let order = self
            .store
            .order_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".into()))?;

        // Dangling user/address references make the order unrenderable, so
        // they read as missing; guest orders simply carry no user.
        let user = match order.user_id {
            Some(id) => Some(
                self.store
                    .user_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Order not found".into()))?,
            ),
            None => None,
        };
        let address = match order.shipping_address_id {
            Some(id) => Some(
                self.store
                    .address_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Order not found".into()))?,
            ),
            None => None,
        };

        let mut items = Vec::new();
        for item in self.store.items_for_order(order.id).await? {
            let product = self.store.product_by_id(item.product_id).await?;
            items.push(OrderLine { item, product });
        }
        let payments = self.store.payments_for_order(order.id).await?;

        Ok(OrderDetail {
            order,
            user,
            address,
            items,
            payments,
        })
    }

    pub async fn download_invoice(&self, order_id: Uuid) -> Result<String, AppError> {
        let detail = self.find_order(order_id).await?;
        Ok(render_invoice(&detail))
    }

    /// Batch status/soft-delete maintenance. Returns how many orders the
    /// action touched.
    pub async fn bulk_action(&self, action: &str, order_ids: &[Uuid]) -> Result<u64, AppError> {
        match action.to_ascii_lowercase().as_str() {
            "delete" => Ok(self.store.set_orders_deleted(order_ids, true).await?),
            "restore" => Ok(self.store.set_orders_deleted(order_ids, false).await?),
            verb => {
                let status = match verb {
                    "ordered" => OrderStatus::Ordered,
                    "canceled" | "cancelled" => OrderStatus::Canceled,
                    "delivered" => OrderStatus::Delivered,
                    _ => return Err(AppError::InvalidInput("Invalid action".into())),
                };
                let mut affected = 0;
                for id in order_ids {
                    if self.store.set_order_status(*id, status).await?.is_some() {
                        affected += 1;
                    }
                }
                Ok(affected)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::cart_service::CartService;
    use crate::outbound::notify::LogNotifier;
    use checkout_repo::memory::InMemoryStore;
    use checkout_types::domain::{Product, Tax};
    use checkout_types::ports::{CartStore, CatalogStore, TaxStore};
    use rust_decimal_macros::dec;

    async fn cart_with_items(store: &InMemoryStore, session_id: &str) {
        let product = Product::new("Notebook", dec!(120)).unwrap();
        store.insert_product(product.clone()).await.unwrap();
        let carts = CartService::new(store.clone());
        carts
            .add_item(session_id, None, product.id, 2)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn place_order_snapshots_and_freezes_the_cart() {
        let store = InMemoryStore::new();
        store
            .insert_tax(Tax::new("GST", dec!(5)).unwrap())
            .await
            .unwrap();
        cart_with_items(&store, "sess-1").await;

        let svc = OrderService::new(store.clone(), LogNotifier::default());
        let order = svc.place_order("sess-1").await.unwrap();
        assert_eq!(order.order_number, "000001");
        assert_eq!(order.subtotal, dec!(240));
        assert_eq!(order.tax, dec!(12));
        assert_eq!(order.total, dec!(252));
        assert_eq!(order.status, OrderStatus::Ordered);

        // Session no longer resolves to an open cart.
        assert!(store
            .open_cart_for_session("sess-1")
            .await
            .unwrap()
            .is_none());

        let detail = svc.find_order(order.id).await.unwrap();
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].item.quantity, 2);
        assert_eq!(detail.order.total, order.total);
    }

    #[tokio::test]
    async fn order_numbers_increment_per_checkout() {
        let store = InMemoryStore::new();
        cart_with_items(&store, "sess-1").await;
        cart_with_items(&store, "sess-2").await;

        let svc = OrderService::new(store.clone(), LogNotifier::default());
        let first = svc.place_order("sess-1").await.unwrap();
        let second = svc.place_order("sess-2").await.unwrap();
        assert_eq!(first.order_number, "000001");
        assert_eq!(second.order_number, "000002");
    }

    #[tokio::test]
    async fn place_order_rejects_missing_or_empty_carts() {
        let store = InMemoryStore::new();
        let svc = OrderService::new(store.clone(), LogNotifier::default());

        let missing = svc.place_order("sess-none").await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        let cart = checkout_types::domain::Cart::open("sess-empty", None, dec!(0)).unwrap();
        store.create_cart(cart).await.unwrap();
        let empty = svc.place_order("sess-empty").await;
        assert!(matches!(empty, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn bulk_action_updates_status_and_soft_deletes() {
        let store = InMemoryStore::new();
        cart_with_items(&store, "sess-1").await;
        cart_with_items(&store, "sess-2").await;

        let svc = OrderService::new(store.clone(), LogNotifier::default());
        let first = svc.place_order("sess-1").await.unwrap();
        let second = svc.place_order("sess-2").await.unwrap();

        let delivered = svc
            .bulk_action("delivered", &[first.id, second.id])
            .await
            .unwrap();
        assert_eq!(delivered, 2);
        let detail = svc.find_order(first.id).await.unwrap();
        assert_eq!(detail.order.status, OrderStatus::Delivered);

        let deleted = svc.bulk_action("delete", &[first.id]).await.unwrap();
        assert_eq!(deleted, 1);
        assert!(svc
            .find_order(first.id)
            .await
            .unwrap()
            .order
            .deleted_at
            .is_some());

        let restored = svc.bulk_action("restore", &[first.id]).await.unwrap();
        assert_eq!(restored, 1);

        let bogus = svc.bulk_action("archive", &[second.id]).await;
        assert!(matches!(bogus, Err(AppError::InvalidInput(_))));
    }
}
