use rust_decimal::Decimal;
use uuid::Uuid;

use crate::errors::AppError;
use checkout_types::domain::{Payment, PaymentMethod, PaymentStatus};
use checkout_types::ports::CheckoutStore;

/// Records payment attempts against placed orders. An order may accumulate
/// failed and pending attempts, but only ever one completed payment.
pub struct PaymentService<S: CheckoutStore> {
    store: S,
}

impl<S: CheckoutStore> PaymentService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn record_payment(
        &self,
        order_id: Uuid,
        method: PaymentMethod,
        amount: Decimal,
        status: PaymentStatus,
        external_id: Option<String>,
        created_by: Option<Uuid>,
    ) -> Result<Payment, AppError> {
        self.store
            .order_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".into()))?;

        if status == PaymentStatus::Completed {
            let existing = self.store.payments_for_order(order_id).await?;
            if existing
                .iter()
                .any(|p| p.status == PaymentStatus::Completed)
            {
                return Err(AppError::InvalidInput(
                    "Order already has a completed payment".into(),
                ));
            }
        }

        let payment = Payment::new(order_id, created_by, amount, method, status, external_id)
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;
        Ok(self.store.insert_payment(payment).await?)
    }

    pub async fn payments_for_order(&self, order_id: Uuid) -> Result<Vec<Payment>, AppError> {
        self.store
            .order_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".into()))?;
        Ok(self.store.payments_for_order(order_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkout_repo::memory::InMemoryStore;
    use checkout_types::domain::{Cart, Order};
    use checkout_types::ports::OrderStore;
    use rust_decimal_macros::dec;

    async fn seeded_order(store: &InMemoryStore) -> Order {
        let mut cart = Cart::open("sess-1", None, dec!(100)).unwrap();
        cart.apply_totals(dec!(100), dec!(0), dec!(0));
        store
            .insert_order(Order::from_cart(&cart, 1))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn records_attempts_and_enforces_completed_uniqueness() {
        let store = InMemoryStore::new();
        let order = seeded_order(&store).await;
        let svc = PaymentService::new(store.clone());

        let failed = svc
            .record_payment(
                order.id,
                PaymentMethod::Card,
                dec!(100),
                PaymentStatus::Failed,
                Some("txn_1".into()),
                None,
            )
            .await
            .unwrap();
        assert_eq!(failed.status, PaymentStatus::Failed);

        svc.record_payment(
            order.id,
            PaymentMethod::Card,
            dec!(100),
            PaymentStatus::Completed,
            Some("txn_2".into()),
            None,
        )
        .await
        .unwrap();

        let duplicate = svc
            .record_payment(
                order.id,
                PaymentMethod::Wallet,
                dec!(100),
                PaymentStatus::Completed,
                Some("txn_3".into()),
                None,
            )
            .await;
        assert!(matches!(duplicate, Err(AppError::InvalidInput(_))));

        let attempts = svc.payments_for_order(order.id).await.unwrap();
        assert_eq!(attempts.len(), 2);
    }

    #[tokio::test]
    async fn rejects_payments_for_unknown_orders() {
        let store = InMemoryStore::new();
        let svc = PaymentService::new(store.clone());

        let missing = svc
            .record_payment(
                Uuid::new_v4(),
                PaymentMethod::Card,
                dec!(10),
                PaymentStatus::Pending,
                None,
                None,
            )
            .await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        let listing = svc.payments_for_order(Uuid::new_v4()).await;
        assert!(matches!(listing, Err(AppError::NotFound(_))));
    }
}
