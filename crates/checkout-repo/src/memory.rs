use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use checkout_types::domain::{
    Cart, CartItem, CartKey, Coupon, Order, OrderItem, OrderStatus, Payment, Product,
    ShippingAddress, Tax, User,
};
use checkout_types::ports::{
    CartStore, CatalogStore, CouponStore, DirectoryStore, OrderStore, PaymentStore, StoreError,
    TaxStore,
};

/// Process-local store. Item and payment rows are kept as vectors under
/// their parent id so listing preserves insertion order.
#[derive(Clone)]
pub struct InMemoryStore {
    carts: Arc<DashMap<Uuid, Cart>>,
    cart_items: Arc<DashMap<Uuid, Vec<CartItem>>>,
    coupons: Arc<DashMap<Uuid, Coupon>>,
    taxes: Arc<DashMap<Uuid, Tax>>,
    orders: Arc<DashMap<Uuid, Order>>,
    order_items: Arc<DashMap<Uuid, Vec<OrderItem>>>,
    payments: Arc<DashMap<Uuid, Vec<Payment>>>,
    products: Arc<DashMap<Uuid, Product>>,
    users: Arc<DashMap<Uuid, User>>,
    addresses: Arc<DashMap<Uuid, ShippingAddress>>,
    order_seq: Arc<AtomicU64>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            carts: Arc::new(DashMap::new()),
            cart_items: Arc::new(DashMap::new()),
            coupons: Arc::new(DashMap::new()),
            taxes: Arc::new(DashMap::new()),
            orders: Arc::new(DashMap::new()),
            order_items: Arc::new(DashMap::new()),
            payments: Arc::new(DashMap::new()),
            products: Arc::new(DashMap::new()),
            users: Arc::new(DashMap::new()),
            addresses: Arc::new(DashMap::new()),
            order_seq: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CartStore for InMemoryStore {
    async fn create_cart(&self, cart: Cart) -> Result<Cart, StoreError> {
        self.carts.insert(cart.id, cart.clone());
        Ok(cart)
    }

    async fn find_cart(&self, key: &CartKey) -> Result<Option<Cart>, StoreError> {
        let found = match key {
            CartKey::Cart(id) => self.carts.get(id).map(|r| r.clone()),
            CartKey::Order(order_id) => self
                .carts
                .iter()
                .find(|kv| kv.value().order_id == Some(*order_id))
                .map(|kv| kv.value().clone()),
            CartKey::Session(session_id) => self.open_cart_for_session(session_id).await?,
        };
        Ok(found)
    }

    async fn open_cart_for_session(&self, session_id: &str) -> Result<Option<Cart>, StoreError> {
        Ok(self
            .carts
            .iter()
            .find(|kv| kv.value().session_id == session_id && kv.value().is_open())
            .map(|kv| kv.value().clone()))
    }

    async fn update_cart(&self, cart: Cart) -> Result<Option<Cart>, StoreError> {
        if let Some(mut v) = self.carts.get_mut(&cart.id) {
            *v = cart.clone();
            return Ok(Some(cart));
        }
        Ok(None)
    }

    async fn delete_cart(&self, id: Uuid) -> Result<bool, StoreError> {
        self.cart_items.remove(&id);
        Ok(self.carts.remove(&id).is_some())
    }

    async fn insert_item(&self, item: CartItem) -> Result<CartItem, StoreError> {
        self.cart_items
            .entry(item.cart_id)
            .or_default()
            .push(item.clone());
        Ok(item)
    }

    async fn update_item(&self, item: CartItem) -> Result<Option<CartItem>, StoreError> {
        if let Some(mut rows) = self.cart_items.get_mut(&item.cart_id) {
            if let Some(slot) = rows.iter_mut().find(|r| r.id == item.id) {
                *slot = item.clone();
                return Ok(Some(item));
            }
        }
        Ok(None)
    }

    async fn find_item(
        &self,
        cart_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<CartItem>, StoreError> {
        Ok(self.cart_items.get(&cart_id).and_then(|rows| {
            rows.iter()
                .find(|r| r.product_id == product_id && !r.is_deleted())
                .cloned()
        }))
    }

    async fn items_for_cart(&self, cart_id: Uuid) -> Result<Vec<CartItem>, StoreError> {
        Ok(self
            .cart_items
            .get(&cart_id)
            .map(|rows| rows.iter().filter(|r| !r.is_deleted()).cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl CouponStore for InMemoryStore {
    async fn insert_coupon(&self, coupon: Coupon) -> Result<Coupon, StoreError> {
        self.coupons.insert(coupon.id, coupon.clone());
        Ok(coupon)
    }

    async fn coupon_by_id(&self, id: Uuid) -> Result<Option<Coupon>, StoreError> {
        Ok(self.coupons.get(&id).map(|r| r.clone()))
    }

    async fn coupon_by_code(&self, code: &str) -> Result<Option<Coupon>, StoreError> {
        Ok(self
            .coupons
            .iter()
            .find(|kv| kv.value().code == code && kv.value().deleted_at.is_none())
            .map(|kv| kv.value().clone()))
    }
}

#[async_trait]
impl TaxStore for InMemoryStore {
    async fn insert_tax(&self, tax: Tax) -> Result<Tax, StoreError> {
        self.taxes.insert(tax.id, tax.clone());
        Ok(tax)
    }

    async fn list_taxes(&self) -> Result<Vec<Tax>, StoreError> {
        Ok(self.taxes.iter().map(|kv| kv.value().clone()).collect())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn next_order_number(&self) -> Result<u64, StoreError> {
        Ok(self.order_seq.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn insert_order(&self, order: Order) -> Result<Order, StoreError> {
        self.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn order_by_id(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.get(&id).map(|r| r.clone()))
    }

    async fn insert_order_items(&self, items: Vec<OrderItem>) -> Result<(), StoreError> {
        for item in items {
            self.order_items
                .entry(item.order_id)
                .or_default()
                .push(item);
        }
        Ok(())
    }

    async fn items_for_order(&self, order_id: Uuid) -> Result<Vec<OrderItem>, StoreError> {
        Ok(self
            .order_items
            .get(&order_id)
            .map(|rows| rows.clone())
            .unwrap_or_default())
    }

    async fn set_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Order>, StoreError> {
        if let Some(mut v) = self.orders.get_mut(&id) {
            v.status = status;
            return Ok(Some(v.clone()));
        }
        Ok(None)
    }

    async fn set_orders_deleted(&self, ids: &[Uuid], deleted: bool) -> Result<u64, StoreError> {
        let mut affected = 0;
        let stamp = if deleted { Some(Utc::now()) } else { None };
        for id in ids {
            if let Some(mut v) = self.orders.get_mut(id) {
                v.deleted_at = stamp;
                affected += 1;
            }
        }
        Ok(affected)
    }
}

#[async_trait]
impl PaymentStore for InMemoryStore {
    async fn insert_payment(&self, payment: Payment) -> Result<Payment, StoreError> {
        self.payments
            .entry(payment.order_id)
            .or_default()
            .push(payment.clone());
        Ok(payment)
    }

    async fn payments_for_order(&self, order_id: Uuid) -> Result<Vec<Payment>, StoreError> {
        Ok(self
            .payments
            .get(&order_id)
            .map(|rows| rows.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn insert_product(&self, product: Product) -> Result<Product, StoreError> {
        self.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn product_by_id(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        Ok(self.products.get(&id).map(|r| r.clone()))
    }
}

#[async_trait]
impl DirectoryStore for InMemoryStore {
    async fn insert_user(&self, user: User) -> Result<User, StoreError> {
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(&id).map(|r| r.clone()))
    }

    async fn insert_address(
        &self,
        address: ShippingAddress,
    ) -> Result<ShippingAddress, StoreError> {
        self.addresses.insert(address.id, address.clone());
        Ok(address)
    }

    async fn address_by_id(&self, id: Uuid) -> Result<Option<ShippingAddress>, StoreError> {
        Ok(self.addresses.get(&id).map(|r| r.clone()))
    }
}
