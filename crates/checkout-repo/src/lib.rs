#[cfg(not(any(feature = "memory", feature = "sqlite")))]
compile_error!("Enable a store feature: `memory` or `sqlite`.");

use async_trait::async_trait;
use uuid::Uuid;

use checkout_types::domain::{
    Cart, CartItem, CartKey, Coupon, Order, OrderItem, OrderStatus, Payment, Product,
    ShippingAddress, Tax, User,
};
use checkout_types::ports::{
    CartStore, CatalogStore, CouponStore, DirectoryStore, OrderStore, PaymentStore, StoreError,
    TaxStore,
};

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

/// Storage backend selected at build time by cargo features. Every port
/// call delegates to the active variant.
#[derive(Clone)]
pub enum Store {
    #[cfg(feature = "memory")]
    Memory(memory::InMemoryStore),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite::SqliteStore),
}

pub async fn build_store(url: Option<&str>) -> anyhow::Result<Store> {
    Store::build_store(url).await
}

impl Store {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    pub async fn build_store(_: Option<&str>) -> anyhow::Result<Self> {
        Ok(Store::Memory(memory::InMemoryStore::new()))
    }

    #[cfg(all(feature = "sqlite", not(feature = "memory")))]
    pub async fn build_store(database_url: Option<&str>) -> anyhow::Result<Self> {
        let url = database_url.unwrap_or("sqlite://checkout.db");
        Ok(Store::Sqlite(sqlite::SqliteStore::new(url).await?))
    }

    // With both features compiled in, a configured url picks sqlite.
    #[cfg(all(feature = "sqlite", feature = "memory"))]
    pub async fn build_store(database_url: Option<&str>) -> anyhow::Result<Self> {
        match database_url {
            Some(url) => Ok(Store::Sqlite(sqlite::SqliteStore::new(url).await?)),
            None => Ok(Store::Memory(memory::InMemoryStore::new())),
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $store:ident => $call:expr) => {
        match $self {
            #[cfg(feature = "memory")]
            Store::Memory($store) => $call,
            #[cfg(feature = "sqlite")]
            Store::Sqlite($store) => $call,
        }
    };
}

#[async_trait]
impl CartStore for Store {
    async fn create_cart(&self, cart: Cart) -> Result<Cart, StoreError> {
        dispatch!(self, s => s.create_cart(cart).await)
    }

    async fn find_cart(&self, key: &CartKey) -> Result<Option<Cart>, StoreError> {
        dispatch!(self, s => s.find_cart(key).await)
    }

    async fn open_cart_for_session(&self, session_id: &str) -> Result<Option<Cart>, StoreError> {
        dispatch!(self, s => s.open_cart_for_session(session_id).await)
    }

    async fn update_cart(&self, cart: Cart) -> Result<Option<Cart>, StoreError> {
        dispatch!(self, s => s.update_cart(cart).await)
    }

    async fn delete_cart(&self, id: Uuid) -> Result<bool, StoreError> {
        dispatch!(self, s => s.delete_cart(id).await)
    }

    async fn insert_item(&self, item: CartItem) -> Result<CartItem, StoreError> {
        dispatch!(self, s => s.insert_item(item).await)
    }

    async fn update_item(&self, item: CartItem) -> Result<Option<CartItem>, StoreError> {
        dispatch!(self, s => s.update_item(item).await)
    }

    async fn find_item(
        &self,
        cart_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<CartItem>, StoreError> {
        dispatch!(self, s => s.find_item(cart_id, product_id).await)
    }

    async fn items_for_cart(&self, cart_id: Uuid) -> Result<Vec<CartItem>, StoreError> {
        dispatch!(self, s => s.items_for_cart(cart_id).await)
    }
}

#[async_trait]
impl CouponStore for Store {
    async fn insert_coupon(&self, coupon: Coupon) -> Result<Coupon, StoreError> {
        dispatch!(self, s => s.insert_coupon(coupon).await)
    }

    async fn coupon_by_id(&self, id: Uuid) -> Result<Option<Coupon>, StoreError> {
        dispatch!(self, s => s.coupon_by_id(id).await)
    }

    async fn coupon_by_code(&self, code: &str) -> Result<Option<Coupon>, StoreError> {
        dispatch!(self, s => s.coupon_by_code(code).await)
    }
}

#[async_trait]
impl TaxStore for Store {
    async fn insert_tax(&self, tax: Tax) -> Result<Tax, StoreError> {
        dispatch!(self, s => s.insert_tax(tax).await)
    }

    async fn list_taxes(&self) -> Result<Vec<Tax>, StoreError> {
        dispatch!(self, s => s.list_taxes().await)
    }
}

#[async_trait]
impl OrderStore for Store {
    async fn next_order_number(&self) -> Result<u64, StoreError> {
        dispatch!(self, s => s.next_order_number().await)
    }

    async fn insert_order(&self, order: Order) -> Result<Order, StoreError> {
        dispatch!(self, s => s.insert_order(order).await)
    }

    async fn order_by_id(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        dispatch!(self, s => s.order_by_id(id).await)
    }

    async fn insert_order_items(&self, items: Vec<OrderItem>) -> Result<(), StoreError> {
        dispatch!(self, s => s.insert_order_items(items).await)
    }

    async fn items_for_order(&self, order_id: Uuid) -> Result<Vec<OrderItem>, StoreError> {
        dispatch!(self, s => s.items_for_order(order_id).await)
    }

    async fn set_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Order>, StoreError> {
        dispatch!(self, s => s.set_order_status(id, status).await)
    }

    async fn set_orders_deleted(&self, ids: &[Uuid], deleted: bool) -> Result<u64, StoreError> {
        dispatch!(self, s => s.set_orders_deleted(ids, deleted).await)
    }
}

#[async_trait]
impl PaymentStore for Store {
    async fn insert_payment(&self, payment: Payment) -> Result<Payment, StoreError> {
        dispatch!(self, s => s.insert_payment(payment).await)
    }

    async fn payments_for_order(&self, order_id: Uuid) -> Result<Vec<Payment>, StoreError> {
        dispatch!(self, s => s.payments_for_order(order_id).await)
    }
}

#[async_trait]
impl CatalogStore for Store {
    async fn insert_product(&self, product: Product) -> Result<Product, StoreError> {
        dispatch!(self, s => s.insert_product(product).await)
    }

    async fn product_by_id(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        dispatch!(self, s => s.product_by_id(id).await)
    }
}

#[async_trait]
impl DirectoryStore for Store {
    async fn insert_user(&self, user: User) -> Result<User, StoreError> {
        dispatch!(self, s => s.insert_user(user).await)
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        dispatch!(self, s => s.user_by_id(id).await)
    }

    async fn insert_address(
        &self,
        address: ShippingAddress,
    ) -> Result<ShippingAddress, StoreError> {
        dispatch!(self, s => s.insert_address(address).await)
    }

    async fn address_by_id(&self, id: Uuid) -> Result<Option<ShippingAddress>, StoreError> {
        dispatch!(self, s => s.address_by_id(id).await)
    }
}
