use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Cart, CartItem, CartKey, Coupon, Order, OrderItem, OrderStatus, Payment, Product,
    ShippingAddress, Tax, User,
};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("db error: {0}")]
    DbError(String),
}

/// Carts and their item lines. Lookup is keyed three ways because the API
/// exposes session, order and cart handles interchangeably.
#[async_trait]
pub trait CartStore: Send + Sync + 'static {
    async fn create_cart(&self, cart: Cart) -> Result<Cart, StoreError>;
    async fn find_cart(&self, key: &CartKey) -> Result<Option<Cart>, StoreError>;
    /// Open cart (no order attached yet) for a session, if any.
    async fn open_cart_for_session(&self, session_id: &str) -> Result<Option<Cart>, StoreError>;
    async fn update_cart(&self, cart: Cart) -> Result<Option<Cart>, StoreError>;
    async fn delete_cart(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn insert_item(&self, item: CartItem) -> Result<CartItem, StoreError>;
    async fn update_item(&self, item: CartItem) -> Result<Option<CartItem>, StoreError>;
    /// Live (non-tombstoned) line for a product in a cart.
    async fn find_item(
        &self,
        cart_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<CartItem>, StoreError>;
    /// Live lines for a cart, insertion order.
    async fn items_for_cart(&self, cart_id: Uuid) -> Result<Vec<CartItem>, StoreError>;
}

#[async_trait]
pub trait CouponStore: Send + Sync + 'static {
    async fn insert_coupon(&self, coupon: Coupon) -> Result<Coupon, StoreError>;
    async fn coupon_by_id(&self, id: Uuid) -> Result<Option<Coupon>, StoreError>;
    /// Case-sensitive code lookup over non-deleted rows.
    async fn coupon_by_code(&self, code: &str) -> Result<Option<Coupon>, StoreError>;
}

#[async_trait]
pub trait TaxStore: Send + Sync + 'static {
    async fn insert_tax(&self, tax: Tax) -> Result<Tax, StoreError>;
    async fn list_taxes(&self) -> Result<Vec<Tax>, StoreError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync + 'static {
    /// Allocates the next value of the monotonic order sequence. Two
    /// concurrent callers never see the same value.
    async fn next_order_number(&self) -> Result<u64, StoreError>;
    async fn insert_order(&self, order: Order) -> Result<Order, StoreError>;
    async fn order_by_id(&self, id: Uuid) -> Result<Option<Order>, StoreError>;
    async fn insert_order_items(&self, items: Vec<OrderItem>) -> Result<(), StoreError>;
    async fn items_for_order(&self, order_id: Uuid) -> Result<Vec<OrderItem>, StoreError>;
    async fn set_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Order>, StoreError>;
    /// Soft-deletes or restores a batch. Returns how many rows changed.
    async fn set_orders_deleted(&self, ids: &[Uuid], deleted: bool) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync + 'static {
    async fn insert_payment(&self, payment: Payment) -> Result<Payment, StoreError>;
    async fn payments_for_order(&self, order_id: Uuid) -> Result<Vec<Payment>, StoreError>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync + 'static {
    async fn insert_product(&self, product: Product) -> Result<Product, StoreError>;
    async fn product_by_id(&self, id: Uuid) -> Result<Option<Product>, StoreError>;
}

#[async_trait]
pub trait DirectoryStore: Send + Sync + 'static {
    async fn insert_user(&self, user: User) -> Result<User, StoreError>;
    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn insert_address(&self, address: ShippingAddress)
        -> Result<ShippingAddress, StoreError>;
    async fn address_by_id(&self, id: Uuid) -> Result<Option<ShippingAddress>, StoreError>;
}

/// Everything the checkout services need from persistence, behind one bound.
pub trait CheckoutStore:
    CartStore
    + CouponStore
    + TaxStore
    + OrderStore
    + PaymentStore
    + CatalogStore
    + DirectoryStore
    + Clone
{
}

impl<T> CheckoutStore for T where
    T: CartStore
        + CouponStore
        + TaxStore
        + OrderStore
        + PaymentStore
        + CatalogStore
        + DirectoryStore
        + Clone
{
}
