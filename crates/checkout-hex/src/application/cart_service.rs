use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::errors::AppError;
use checkout_types::domain::{combined_rate, Cart, CartItem, CartKey, CartLine};
use checkout_types::ports::CheckoutStore;

/// Cart mutations and the pricing pipeline. Every mutation settles the cart
/// by recomputing subtotal, tax, discount and total from scratch and writing
/// them back in a single store call.
pub struct CartService<S: CheckoutStore> {
    store: S,
}

impl<S: CheckoutStore> CartService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Adds `quantity` units of a product to the session's open cart,
    /// opening one when none exists. Quantities accumulate on the existing
    /// line for the same product.
    pub async fn add_item(
        &self,
        session_id: &str,
        user_id: Option<Uuid>,
        product_id: Uuid,
        quantity: u32,
    ) -> Result<Vec<CartLine>, AppError> {
        if quantity == 0 {
            return Err(AppError::InvalidInput(
                "Quantity must be at least 1".into(),
            ));
        }
        let product = self
            .store
            .product_by_id(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".into()))?;
        if product.price < Decimal::ZERO {
            return Err(AppError::InvalidInput("Product price is negative".into()));
        }

        let cart = match self.store.open_cart_for_session(session_id).await? {
            Some(cart) => cart,
            None => {
                let cart = Cart::open(session_id, user_id, product.price)
                    .map_err(|e| AppError::InvalidInput(e.to_string()))?;
                self.store.create_cart(cart).await?
            }
        };

        match self.store.find_item(cart.id, product_id).await? {
            Some(mut item) => {
                item.set_quantity(item.quantity + quantity);
                self.store.update_item(item).await?;
            }
            None => {
                let item = CartItem::new(cart.id, product_id, product.price, quantity)
                    .map_err(|e| AppError::InvalidInput(e.to_string()))?;
                self.store.insert_item(item).await?;
            }
        }

        self.recompute_totals(cart.id).await?;
        self.find_cart(&CartKey::Cart(cart.id)).await
    }

    /// Tombstones every live line for the product. Removing something that
    /// is not in the cart is a successful no-op; removing the last line
    /// deletes the cart itself.
    pub async fn remove_item(
        &self,
        session_id: &str,
        product_id: Uuid,
    ) -> Result<Vec<CartLine>, AppError> {
        let Some(cart) = self.store.open_cart_for_session(session_id).await? else {
            return Ok(Vec::new());
        };

        let now = Utc::now();
        for mut item in self.store.items_for_cart(cart.id).await? {
            if item.product_id == product_id {
                item.tombstone(now);
                self.store.update_item(item).await?;
            }
        }

        if self.store.items_for_cart(cart.id).await?.is_empty() {
            self.store.delete_cart(cart.id).await?;
            return Ok(Vec::new());
        }

        self.recompute_totals(cart.id).await?;
        self.find_cart(&CartKey::Cart(cart.id)).await
    }

    /// Drops one unit from the product's line. At quantity 1 the line is
    /// tombstoned instead, and a cart left with no live lines is deleted.
    /// Missing cart is a no-op; a missing line changes no quantities but the
    /// cart is still settled before it is returned.
    pub async fn decrement_quantity(
        &self,
        session_id: &str,
        product_id: Uuid,
    ) -> Result<Vec<CartLine>, AppError> {
        let Some(cart) = self.store.open_cart_for_session(session_id).await? else {
            return Ok(Vec::new());
        };
        let Some(mut item) = self.store.find_item(cart.id, product_id).await? else {
            self.recompute_totals(cart.id).await?;
            return self.find_cart(&CartKey::Cart(cart.id)).await;
        };

        if item.quantity <= 1 {
            item.tombstone(Utc::now());
            self.store.update_item(item).await?;
            if self.store.items_for_cart(cart.id).await?.is_empty() {
                self.store.delete_cart(cart.id).await?;
                return Ok(Vec::new());
            }
        } else {
            item.set_quantity(item.quantity - 1);
            self.store.update_item(item).await?;
        }

        self.recompute_totals(cart.id).await?;
        self.find_cart(&CartKey::Cart(cart.id)).await
    }

    /// Settles the cart. Strict order: subtotal from live lines, then tax
    /// over the combined active rate, then the coupon discount (clamped so
    /// the total cannot go negative), then total. One write.
    pub async fn recompute_totals(&self, cart_id: Uuid) -> Result<Cart, AppError> {
        let mut cart = self
            .store
            .find_cart(&CartKey::Cart(cart_id))
            .await?
            .ok_or_else(|| AppError::NotFound("Cart not found".into()))?;

        let items = self.store.items_for_cart(cart.id).await?;
        let subtotal: Decimal = items.iter().map(|i| i.line_total()).sum();

        let rate = combined_rate(&self.store.list_taxes().await?);
        let tax = (subtotal * rate / Decimal::from(100)).round_dp(2);

        let mut discount = match cart.coupon_id {
            Some(coupon_id) => self
                .store
                .coupon_by_id(coupon_id)
                .await?
                .map(|c| c.discount_on(subtotal))
                .unwrap_or(Decimal::ZERO),
            None => Decimal::ZERO,
        };
        if discount > subtotal + tax {
            discount = subtotal + tax;
        }

        cart.apply_totals(subtotal, tax, discount);
        self.store
            .update_cart(cart)
            .await?
            .ok_or_else(|| AppError::NotFound("Cart not found".into()))
    }

    /// Joined view of a cart: one row per live line, each carrying the
    /// owning user and applied coupon. Empty when nothing matches.
    pub async fn find_cart(&self, key: &CartKey) -> Result<Vec<CartLine>, AppError> {
        let Some(cart) = self.store.find_cart(key).await? else {
            return Ok(Vec::new());
        };

        let user = match cart.user_id {
            Some(id) => self.store.user_by_id(id).await?,
            None => None,
        };
        let coupon = match cart.coupon_id {
            Some(id) => self.store.coupon_by_id(id).await?,
            None => None,
        };

        let items = self.store.items_for_cart(cart.id).await?;
        Ok(items
            .into_iter()
            .map(|item| CartLine {
                cart: cart.clone(),
                item,
                user: user.clone(),
                coupon: coupon.clone(),
            })
            .collect())
    }

    /// Persists who the cart belongs to and where it ships. Only the fields
    /// present in the call are written; omitted ones keep their stored
    /// values.
    pub async fn save_checkout_data(
        &self,
        session_id: &str,
        user_id: Option<Uuid>,
        shipping_address_id: Option<Uuid>,
        delivery_instruction: Option<String>,
    ) -> Result<Vec<CartLine>, AppError> {
        let mut cart = self
            .store
            .open_cart_for_session(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Cart not found".into()))?;

        if user_id.is_some() {
            cart.user_id = user_id;
        }
        if shipping_address_id.is_some() {
            cart.shipping_address_id = shipping_address_id;
        }
        if delivery_instruction.is_some() {
            cart.delivery_instruction = delivery_instruction;
        }
        cart.updated_at = Utc::now();
        let cart = self
            .store
            .update_cart(cart)
            .await?
            .ok_or_else(|| AppError::NotFound("Cart not found".into()))?;

        self.find_cart(&CartKey::Cart(cart.id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkout_repo::memory::InMemoryStore;
    use checkout_types::domain::{ActiveStatus, Product, Tax};
    use checkout_types::ports::{CartStore, CatalogStore, TaxStore};
    use rust_decimal_macros::dec;

    async fn seed_product(store: &InMemoryStore, price: Decimal) -> Uuid {
        let product = Product::new("Ceramic Mug", price).unwrap();
        store.insert_product(product.clone()).await.unwrap();
        product.id
    }

    #[tokio::test]
    async fn add_item_opens_a_cart_and_settles_totals() {
        let store = InMemoryStore::new();
        let product_id = seed_product(&store, dec!(100)).await;
        let svc = CartService::new(store.clone());

        let lines = svc.add_item("sess-1", None, product_id, 2).await.unwrap();
        assert_eq!(lines.len(), 1);
        let cart = &lines[0].cart;
        assert_eq!(cart.subtotal, dec!(200));
        assert_eq!(cart.tax, Decimal::ZERO);
        assert_eq!(cart.discount, Decimal::ZERO);
        assert_eq!(cart.total, dec!(200));
        assert_eq!(lines[0].item.quantity, 2);
    }

    #[tokio::test]
    async fn add_item_accumulates_quantity_on_the_same_line() {
        let store = InMemoryStore::new();
        let product_id = seed_product(&store, dec!(10)).await;
        let svc = CartService::new(store.clone());

        svc.add_item("sess-1", None, product_id, 1).await.unwrap();
        let lines = svc.add_item("sess-1", None, product_id, 3).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].item.quantity, 4);
        assert_eq!(lines[0].item.total_price, dec!(40));
        assert_eq!(lines[0].cart.total, dec!(40));
    }

    #[tokio::test]
    async fn tax_applies_over_the_combined_active_rate() {
        let store = InMemoryStore::new();
        let product_id = seed_product(&store, dec!(200)).await;
        store
            .insert_tax(Tax::new("VAT", dec!(18)).unwrap())
            .await
            .unwrap();
        let mut dormant = Tax::new("Levy", dec!(5)).unwrap();
        dormant.status = ActiveStatus::Inactive;
        store.insert_tax(dormant).await.unwrap();

        let svc = CartService::new(store.clone());
        let lines = svc.add_item("sess-1", None, product_id, 1).await.unwrap();
        let cart = &lines[0].cart;
        assert_eq!(cart.subtotal, dec!(200));
        assert_eq!(cart.tax, dec!(36));
        assert_eq!(cart.total, dec!(236));
        assert_eq!(cart.total, cart.subtotal + cart.tax - cart.discount);
    }

    #[tokio::test]
    async fn add_item_rejects_zero_quantity_and_unknown_product() {
        let store = InMemoryStore::new();
        let product_id = seed_product(&store, dec!(10)).await;
        let svc = CartService::new(store.clone());

        let zero = svc.add_item("sess-1", None, product_id, 0).await;
        assert!(matches!(zero, Err(AppError::InvalidInput(_))));

        let unknown = svc.add_item("sess-1", None, Uuid::new_v4(), 1).await;
        assert!(matches!(unknown, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn remove_item_is_idempotent_and_deletes_an_emptied_cart() {
        let store = InMemoryStore::new();
        let product_id = seed_product(&store, dec!(15)).await;
        let svc = CartService::new(store.clone());

        svc.add_item("sess-1", None, product_id, 2).await.unwrap();

        let first = svc.remove_item("sess-1", product_id).await.unwrap();
        assert!(first.is_empty());
        assert!(store
            .open_cart_for_session("sess-1")
            .await
            .unwrap()
            .is_none());

        // Second removal has nothing to do and still succeeds.
        let second = svc.remove_item("sess-1", product_id).await.unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn remove_item_resettles_the_surviving_lines() {
        let store = InMemoryStore::new();
        let keep = seed_product(&store, dec!(30)).await;
        let drop = seed_product(&store, dec!(70)).await;
        let svc = CartService::new(store.clone());

        svc.add_item("sess-1", None, keep, 1).await.unwrap();
        svc.add_item("sess-1", None, drop, 1).await.unwrap();

        let lines = svc.remove_item("sess-1", drop).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].item.product_id, keep);
        assert_eq!(lines[0].cart.subtotal, dec!(30));
        assert_eq!(lines[0].cart.total, dec!(30));
    }

    #[tokio::test]
    async fn decrement_at_quantity_one_removes_the_line() {
        let store = InMemoryStore::new();
        let product_id = seed_product(&store, dec!(45)).await;
        let svc = CartService::new(store.clone());

        svc.add_item("sess-1", None, product_id, 2).await.unwrap();

        let once = svc
            .decrement_quantity("sess-1", product_id)
            .await
            .unwrap();
        assert_eq!(once[0].item.quantity, 1);
        assert_eq!(once[0].cart.total, dec!(45));

        let twice = svc
            .decrement_quantity("sess-1", product_id)
            .await
            .unwrap();
        assert!(twice.is_empty());
        assert!(store
            .open_cart_for_session("sess-1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn decrement_of_a_missing_line_is_a_no_op() {
        let store = InMemoryStore::new();
        let product_id = seed_product(&store, dec!(5)).await;
        let other = Uuid::new_v4();
        let svc = CartService::new(store.clone());

        svc.add_item("sess-1", None, product_id, 1).await.unwrap();
        let lines = svc.decrement_quantity("sess-1", other).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].item.quantity, 1);

        // No cart at all: still fine.
        let none = svc.decrement_quantity("sess-9", other).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn decrement_of_a_missing_line_still_settles_the_cart() {
        let store = InMemoryStore::new();
        let product_id = seed_product(&store, dec!(100)).await;
        let svc = CartService::new(store.clone());

        svc.add_item("sess-1", None, product_id, 1).await.unwrap();
        // A rate introduced after the last mutation must land on the next
        // one, even when that mutation touches no line.
        store
            .insert_tax(Tax::new("GST", dec!(18)).unwrap())
            .await
            .unwrap();

        let lines = svc
            .decrement_quantity("sess-1", Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(lines[0].item.quantity, 1);
        assert_eq!(lines[0].cart.tax, dec!(18));
        assert_eq!(lines[0].cart.total, dec!(118));
    }

    #[tokio::test]
    async fn save_checkout_data_requires_an_open_cart() {
        let store = InMemoryStore::new();
        let svc = CartService::new(store.clone());

        let missing = svc
            .save_checkout_data("sess-1", None, None, Some("ring twice".into()))
            .await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        let product_id = seed_product(&store, dec!(20)).await;
        let user_id = Uuid::new_v4();
        svc.add_item("sess-1", None, product_id, 1).await.unwrap();
        let lines = svc
            .save_checkout_data("sess-1", Some(user_id), None, Some("ring twice".into()))
            .await
            .unwrap();
        assert_eq!(lines[0].cart.user_id, Some(user_id));
        assert_eq!(
            lines[0].cart.delivery_instruction.as_deref(),
            Some("ring twice")
        );
    }

    #[tokio::test]
    async fn save_checkout_data_keeps_fields_left_out_of_the_call() {
        let store = InMemoryStore::new();
        let product_id = seed_product(&store, dec!(20)).await;
        let svc = CartService::new(store.clone());
        let user_id = Uuid::new_v4();
        let address_id = Uuid::new_v4();

        svc.add_item("sess-1", None, product_id, 1).await.unwrap();
        svc.save_checkout_data("sess-1", Some(user_id), Some(address_id), None)
            .await
            .unwrap();

        let lines = svc
            .save_checkout_data("sess-1", None, None, Some("leave at the gate".into()))
            .await
            .unwrap();
        assert_eq!(lines[0].cart.user_id, Some(user_id));
        assert_eq!(lines[0].cart.shipping_address_id, Some(address_id));
        assert_eq!(
            lines[0].cart.delivery_instruction.as_deref(),
            Some("leave at the gate")
        );
    }
}
