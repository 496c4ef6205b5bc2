use chrono::Utc;

use crate::application::cart_service::CartService;
use crate::errors::AppError;
use checkout_types::domain::{CartKey, CartLine};
use checkout_types::ports::CheckoutStore;

/// Applies and removes coupons on the session's open cart. Both operations
/// re-run the pricing pipeline instead of patching the stored total, so the
/// discount can never be counted twice.
pub struct CouponService<S: CheckoutStore> {
    store: S,
    carts: CartService<S>,
}

impl<S: CheckoutStore> CouponService<S> {
    pub fn new(store: S) -> Self {
        Self {
            carts: CartService::new(store.clone()),
            store,
        }
    }

    pub async fn apply_coupon(
        &self,
        session_id: &str,
        code: &str,
    ) -> Result<Vec<CartLine>, AppError> {
        let coupon = self
            .store
            .coupon_by_code(code)
            .await?
            .filter(|c| c.is_applicable(Utc::now()))
            .ok_or_else(|| AppError::InvalidInput("Invalid coupon code".into()))?;

        let mut cart = self
            .store
            .open_cart_for_session(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Cart not found".into()))?;

        // Re-applying replaces whatever coupon was there before.
        cart.coupon_id = Some(coupon.id);
        let cart = self
            .store
            .update_cart(cart)
            .await?
            .ok_or_else(|| AppError::NotFound("Cart not found".into()))?;

        self.carts.recompute_totals(cart.id).await?;
        self.carts.find_cart(&CartKey::Cart(cart.id)).await
    }

    pub async fn remove_coupon(&self, session_id: &str) -> Result<Vec<CartLine>, AppError> {
        let mut cart = self
            .store
            .open_cart_for_session(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Cart not found".into()))?;

        cart.coupon_id = None;
        let cart = self
            .store
            .update_cart(cart)
            .await?
            .ok_or_else(|| AppError::NotFound("Cart not found".into()))?;

        self.carts.recompute_totals(cart.id).await?;
        self.carts.find_cart(&CartKey::Cart(cart.id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkout_repo::memory::InMemoryStore;
    use checkout_types::domain::{Coupon, DiscountType, Product, Tax};
    use checkout_types::ports::{CatalogStore, CouponStore, TaxStore};
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    async fn seeded_cart(store: &InMemoryStore) -> Uuid {
        let product = Product::new("Desk Lamp", dec!(250)).unwrap();
        store.insert_product(product.clone()).await.unwrap();
        let carts = CartService::new(store.clone());
        carts
            .add_item("sess-1", None, product.id, 1)
            .await
            .unwrap();
        product.id
    }

    #[tokio::test]
    async fn percentage_coupon_discounts_the_subtotal() {
        let store = InMemoryStore::new();
        store
            .insert_tax(Tax::new("VAT", dec!(18)).unwrap())
            .await
            .unwrap();
        store
            .insert_coupon(Coupon::new("OFF10", DiscountType::Percentage, dec!(10)).unwrap())
            .await
            .unwrap();
        seeded_cart(&store).await;

        let svc = CouponService::new(store.clone());
        let lines = svc.apply_coupon("sess-1", "OFF10").await.unwrap();
        let cart = &lines[0].cart;
        // 250 + 45 tax - 25 (10% of subtotal, not of the taxed total)
        assert_eq!(cart.subtotal, dec!(250));
        assert_eq!(cart.tax, dec!(45));
        assert_eq!(cart.discount, dec!(25));
        assert_eq!(cart.total, dec!(270));
    }

    #[tokio::test]
    async fn reapplying_a_coupon_never_double_counts() {
        let store = InMemoryStore::new();
        store
            .insert_coupon(Coupon::new("FLAT40", DiscountType::Flat, dec!(40)).unwrap())
            .await
            .unwrap();
        seeded_cart(&store).await;

        let svc = CouponService::new(store.clone());
        let first = svc.apply_coupon("sess-1", "FLAT40").await.unwrap();
        assert_eq!(first[0].cart.total, dec!(210));

        let second = svc.apply_coupon("sess-1", "FLAT40").await.unwrap();
        assert_eq!(second[0].cart.discount, dec!(40));
        assert_eq!(second[0].cart.total, dec!(210));
    }

    #[tokio::test]
    async fn oversized_flat_coupon_clamps_at_zero_total() {
        let store = InMemoryStore::new();
        store
            .insert_coupon(Coupon::new("HUGE", DiscountType::Flat, dec!(10000)).unwrap())
            .await
            .unwrap();
        seeded_cart(&store).await;

        let svc = CouponService::new(store.clone());
        let lines = svc.apply_coupon("sess-1", "HUGE").await.unwrap();
        assert_eq!(lines[0].cart.discount, dec!(250));
        assert_eq!(lines[0].cart.total, dec!(0));
    }

    #[tokio::test]
    async fn remove_coupon_restores_the_undiscounted_total() {
        let store = InMemoryStore::new();
        store
            .insert_coupon(Coupon::new("OFF10", DiscountType::Percentage, dec!(10)).unwrap())
            .await
            .unwrap();
        seeded_cart(&store).await;

        let svc = CouponService::new(store.clone());
        svc.apply_coupon("sess-1", "OFF10").await.unwrap();
        let lines = svc.remove_coupon("sess-1").await.unwrap();
        assert_eq!(lines[0].cart.discount, dec!(0));
        assert_eq!(lines[0].cart.total, dec!(250));
        assert!(lines[0].coupon.is_none());
    }

    #[tokio::test]
    async fn rejects_unknown_expired_and_cartless_applications() {
        let store = InMemoryStore::new();
        let expired = Coupon::new("GONE", DiscountType::Flat, dec!(5))
            .unwrap()
            .with_window(None, Some(Utc::now() - Duration::days(1)));
        store.insert_coupon(expired).await.unwrap();
        store
            .insert_coupon(Coupon::new("LIVE", DiscountType::Flat, dec!(5)).unwrap())
            .await
            .unwrap();
        seeded_cart(&store).await;

        let svc = CouponService::new(store.clone());
        let unknown = svc.apply_coupon("sess-1", "NOPE").await;
        assert!(matches!(unknown, Err(AppError::InvalidInput(_))));

        let stale = svc.apply_coupon("sess-1", "GONE").await;
        assert!(matches!(stale, Err(AppError::InvalidInput(_))));

        let no_cart = svc.apply_coupon("sess-2", "LIVE").await;
        assert!(matches!(no_cart, Err(AppError::NotFound(_))));

        let remove_no_cart = svc.remove_coupon("sess-2").await;
        assert!(matches!(remove_no_cart, Err(AppError::NotFound(_))));
    }
}
