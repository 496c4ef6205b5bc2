use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

use checkout_types::domain::{
    ActiveStatus, Cart, CartItem, CartKey, CartStatus, Coupon, DiscountType, Order, OrderItem,
    OrderStatus, Payment, PaymentMethod, PaymentStatus, Product, ShippingAddress, Tax, User,
};
use checkout_types::ports::{
    CartStore, CatalogStore, CouponStore, DirectoryStore, OrderStore, PaymentStore, StoreError,
    TaxStore,
};

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let pool = SqlitePool::connect_with(options).await?;

        // Run migration from migration file, one statement at a time.
        let ddl = include_str!("../migrations/0001_create_checkout.sql");
        for stmt in ddl.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(stmt).execute(&pool).await?;
        }

        Ok(Self { pool })
    }
}

fn parse_uuid(s: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(s).map_err(|e| StoreError::DbError(e.to_string()))
}

fn parse_uuid_opt(s: Option<&str>) -> Result<Option<Uuid>, StoreError> {
    s.map(parse_uuid).transpose()
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>, StoreError> {
    Ok(DateTime::parse_from_rfc3339(s)
        .map_err(|e| StoreError::DbError(e.to_string()))?
        .with_timezone(&Utc))
}

fn parse_ts_opt(s: Option<&str>) -> Result<Option<DateTime<Utc>>, StoreError> {
    s.map(parse_ts).transpose()
}

fn parse_money(s: &str) -> Result<Decimal, StoreError> {
    Decimal::from_str(s).map_err(|e| StoreError::DbError(e.to_string()))
}

fn bad(kind: &str, value: &str) -> StoreError {
    StoreError::DbError(format!("unrecognized {kind}: {value}"))
}

const CART_COLS: &str = "id, session_id, user_id, coupon_id, order_id, shipping_address_id, \
     subtotal, discount, tax, delivery_fee, total, delivery_instruction, payment_method, \
     status, created_at, updated_at";

#[derive(FromRow)]
struct DbCart {
    id: String,
    session_id: String,
    user_id: Option<String>,
    coupon_id: Option<String>,
    order_id: Option<String>,
    shipping_address_id: Option<String>,
    subtotal: String,
    discount: String,
    tax: String,
    delivery_fee: String,
    total: String,
    delivery_instruction: Option<String>,
    payment_method: String,
    status: String,
    created_at: String,
    updated_at: String,
}

impl DbCart {
    fn into_cart(self) -> Result<Cart, StoreError> {
        Ok(Cart {
            id: parse_uuid(&self.id)?,
            session_id: self.session_id,
            user_id: parse_uuid_opt(self.user_id.as_deref())?,
            coupon_id: parse_uuid_opt(self.coupon_id.as_deref())?,
            order_id: parse_uuid_opt(self.order_id.as_deref())?,
            shipping_address_id: parse_uuid_opt(self.shipping_address_id.as_deref())?,
            subtotal: parse_money(&self.subtotal)?,
            discount: parse_money(&self.discount)?,
            tax: parse_money(&self.tax)?,
            delivery_fee: parse_money(&self.delivery_fee)?,
            total: parse_money(&self.total)?,
            delivery_instruction: self.delivery_instruction,
            payment_method: PaymentMethod::parse(&self.payment_method)
                .ok_or_else(|| bad("payment method", &self.payment_method))?,
            status: CartStatus::parse(&self.status).ok_or_else(|| bad("cart status", &self.status))?,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

#[derive(FromRow)]
struct DbCartItem {
    id: String,
    cart_id: String,
    product_id: String,
    unit_price: String,
    quantity: i64,
    total_price: String,
    deleted_at: Option<String>,
}

impl DbCartItem {
    fn into_item(self) -> Result<CartItem, StoreError> {
        Ok(CartItem {
            id: parse_uuid(&self.id)?,
            cart_id: parse_uuid(&self.cart_id)?,
            product_id: parse_uuid(&self.product_id)?,
            unit_price: parse_money(&self.unit_price)?,
            quantity: u32::try_from(self.quantity)
                .map_err(|e| StoreError::DbError(e.to_string()))?,
            total_price: parse_money(&self.total_price)?,
            deleted_at: parse_ts_opt(self.deleted_at.as_deref())?,
        })
    }
}

#[derive(FromRow)]
struct DbCoupon {
    id: String,
    code: String,
    discount_type: String,
    discount: String,
    from_date: Option<String>,
    to_date: Option<String>,
    status: String,
    created_at: String,
    deleted_at: Option<String>,
}

impl DbCoupon {
    fn into_coupon(self) -> Result<Coupon, StoreError> {
        Ok(Coupon {
            id: parse_uuid(&self.id)?,
            code: self.code,
            discount_type: DiscountType::parse(&self.discount_type)
                .ok_or_else(|| bad("discount type", &self.discount_type))?,
            discount: parse_money(&self.discount)?,
            from_date: parse_ts_opt(self.from_date.as_deref())?,
            to_date: parse_ts_opt(self.to_date.as_deref())?,
            status: ActiveStatus::parse(&self.status)
                .ok_or_else(|| bad("coupon status", &self.status))?,
            created_at: parse_ts(&self.created_at)?,
            deleted_at: parse_ts_opt(self.deleted_at.as_deref())?,
        })
    }
}

#[derive(FromRow)]
struct DbTax {
    id: String,
    name: String,
    rate: String,
    status: String,
    created_at: String,
    deleted_at: Option<String>,
}

impl DbTax {
    fn into_tax(self) -> Result<Tax, StoreError> {
        Ok(Tax {
            id: parse_uuid(&self.id)?,
            name: self.name,
            rate: parse_money(&self.rate)?,
            status: ActiveStatus::parse(&self.status).ok_or_else(|| bad("tax status", &self.status))?,
            created_at: parse_ts(&self.created_at)?,
            deleted_at: parse_ts_opt(self.deleted_at.as_deref())?,
        })
    }
}

const ORDER_COLS: &str = "id, user_id, coupon_id, shipping_address_id, order_number, subtotal, \
     discount, tax, delivery_fee, total, delivery_instruction, payment_method, status, \
     created_at, deleted_at";

#[derive(FromRow)]
struct DbOrder {
    id: String,
    user_id: Option<String>,
    coupon_id: Option<String>,
    shipping_address_id: Option<String>,
    order_number: String,
    subtotal: String,
    discount: String,
    tax: String,
    delivery_fee: String,
    total: String,
    delivery_instruction: Option<String>,
    payment_method: String,
    status: String,
    created_at: String,
    deleted_at: Option<String>,
}

impl DbOrder {
    fn into_order(self) -> Result<Order, StoreError> {
        Ok(Order {
            id: parse_uuid(&self.id)?,
            user_id: parse_uuid_opt(self.user_id.as_deref())?,
            coupon_id: parse_uuid_opt(self.coupon_id.as_deref())?,
            shipping_address_id: parse_uuid_opt(self.shipping_address_id.as_deref())?,
            order_number: self.order_number,
            subtotal: parse_money(&self.subtotal)?,
            discount: parse_money(&self.discount)?,
            tax: parse_money(&self.tax)?,
            delivery_fee: parse_money(&self.delivery_fee)?,
            total: parse_money(&self.total)?,
            delivery_instruction: self.delivery_instruction,
            payment_method: PaymentMethod::parse(&self.payment_method)
                .ok_or_else(|| bad("payment method", &self.payment_method))?,
            status: OrderStatus::parse(&self.status)
                .ok_or_else(|| bad("order status", &self.status))?,
            created_at: parse_ts(&self.created_at)?,
            deleted_at: parse_ts_opt(self.deleted_at.as_deref())?,
        })
    }
}

#[derive(FromRow)]
struct DbOrderItem {
    id: String,
    order_id: String,
    product_id: String,
    unit_price: String,
    quantity: i64,
    total_price: String,
}

impl DbOrderItem {
    fn into_item(self) -> Result<OrderItem, StoreError> {
        Ok(OrderItem {
            id: parse_uuid(&self.id)?,
            order_id: parse_uuid(&self.order_id)?,
            product_id: parse_uuid(&self.product_id)?,
            unit_price: parse_money(&self.unit_price)?,
            quantity: u32::try_from(self.quantity)
                .map_err(|e| StoreError::DbError(e.to_string()))?,
            total_price: parse_money(&self.total_price)?,
        })
    }
}

#[derive(FromRow)]
struct DbPayment {
    id: String,
    order_id: String,
    created_by: Option<String>,
    amount: String,
    method: String,
    status: String,
    external_id: Option<String>,
    created_at: String,
}

impl DbPayment {
    fn into_payment(self) -> Result<Payment, StoreError> {
        Ok(Payment {
            id: parse_uuid(&self.id)?,
            order_id: parse_uuid(&self.order_id)?,
            created_by: parse_uuid_opt(self.created_by.as_deref())?,
            amount: parse_money(&self.amount)?,
            method: PaymentMethod::parse(&self.method).ok_or_else(|| bad("payment method", &self.method))?,
            status: PaymentStatus::parse(&self.status)
                .ok_or_else(|| bad("payment status", &self.status))?,
            external_id: self.external_id,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

#[derive(FromRow)]
struct DbProduct {
    id: String,
    name: String,
    sku: Option<String>,
    price: String,
    status: String,
    created_at: String,
    deleted_at: Option<String>,
}

impl DbProduct {
    fn into_product(self) -> Result<Product, StoreError> {
        Ok(Product {
            id: parse_uuid(&self.id)?,
            name: self.name,
            sku: self.sku,
            price: parse_money(&self.price)?,
            status: ActiveStatus::parse(&self.status)
                .ok_or_else(|| bad("product status", &self.status))?,
            created_at: parse_ts(&self.created_at)?,
            deleted_at: parse_ts_opt(self.deleted_at.as_deref())?,
        })
    }
}

#[derive(FromRow)]
struct DbUser {
    id: String,
    name: String,
    email: String,
    created_at: String,
}

impl DbUser {
    fn into_user(self) -> Result<User, StoreError> {
        Ok(User {
            id: parse_uuid(&self.id)?,
            name: self.name,
            email: self.email,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

#[derive(FromRow)]
struct DbAddress {
    id: String,
    user_id: Option<String>,
    name: String,
    phone: Option<String>,
    address: String,
    landmark: Option<String>,
    house_number: Option<String>,
    city: String,
    state: Option<String>,
    zip: Option<String>,
    country: String,
    created_at: String,
}

impl DbAddress {
    fn into_address(self) -> Result<ShippingAddress, StoreError> {
        Ok(ShippingAddress {
            id: parse_uuid(&self.id)?,
            user_id: parse_uuid_opt(self.user_id.as_deref())?,
            name: self.name,
            phone: self.phone,
            address: self.address,
            landmark: self.landmark,
            house_number: self.house_number,
            city: self.city,
            state: self.state,
            zip: self.zip,
            country: self.country,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

#[async_trait]
impl CartStore for SqliteStore {
    async fn create_cart(&self, cart: Cart) -> Result<Cart, StoreError> {
        sqlx::query(
            "INSERT INTO carts (id, session_id, user_id, coupon_id, order_id, shipping_address_id, \
             subtotal, discount, tax, delivery_fee, total, delivery_instruction, payment_method, \
             status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(cart.id.to_string())
        .bind(&cart.session_id)
        .bind(cart.user_id.map(|u| u.to_string()))
        .bind(cart.coupon_id.map(|u| u.to_string()))
        .bind(cart.order_id.map(|u| u.to_string()))
        .bind(cart.shipping_address_id.map(|u| u.to_string()))
        .bind(cart.subtotal.to_string())
        .bind(cart.discount.to_string())
        .bind(cart.tax.to_string())
        .bind(cart.delivery_fee.to_string())
        .bind(cart.total.to_string())
        .bind(&cart.delivery_instruction)
        .bind(cart.payment_method.as_str())
        .bind(cart.status.as_str())
        .bind(cart.created_at.to_rfc3339())
        .bind(cart.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::DbError(e.to_string()))?;
        Ok(cart)
    }

    async fn find_cart(&self, key: &CartKey) -> Result<Option<Cart>, StoreError> {
        let row: Option<DbCart> = match key {
            CartKey::Cart(id) => {
                sqlx::query_as(&format!("SELECT {CART_COLS} FROM carts WHERE id = ?"))
                    .bind(id.to_string())
                    .fetch_optional(&self.pool)
                    .await
            }
            CartKey::Order(order_id) => {
                sqlx::query_as(&format!("SELECT {CART_COLS} FROM carts WHERE order_id = ?"))
                    .bind(order_id.to_string())
                    .fetch_optional(&self.pool)
                    .await
            }
            CartKey::Session(session_id) => {
                sqlx::query_as(&format!(
                    "SELECT {CART_COLS} FROM carts WHERE session_id = ? AND order_id IS NULL LIMIT 1"
                ))
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await
            }
        }
        .map_err(|e| StoreError::DbError(e.to_string()))?;
        row.map(|r| r.into_cart()).transpose()
    }

    async fn open_cart_for_session(&self, session_id: &str) -> Result<Option<Cart>, StoreError> {
        self.find_cart(&CartKey::Session(session_id.to_string()))
            .await
    }

    async fn update_cart(&self, cart: Cart) -> Result<Option<Cart>, StoreError> {
        let updated = sqlx::query(
            "UPDATE carts SET session_id = ?, user_id = ?, coupon_id = ?, order_id = ?, \
             shipping_address_id = ?, subtotal = ?, discount = ?, tax = ?, delivery_fee = ?, \
             total = ?, delivery_instruction = ?, payment_method = ?, status = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(&cart.session_id)
        .bind(cart.user_id.map(|u| u.to_string()))
        .bind(cart.coupon_id.map(|u| u.to_string()))
        .bind(cart.order_id.map(|u| u.to_string()))
        .bind(cart.shipping_address_id.map(|u| u.to_string()))
        .bind(cart.subtotal.to_string())
        .bind(cart.discount.to_string())
        .bind(cart.tax.to_string())
        .bind(cart.delivery_fee.to_string())
        .bind(cart.total.to_string())
        .bind(&cart.delivery_instruction)
        .bind(cart.payment_method.as_str())
        .bind(cart.status.as_str())
        .bind(cart.updated_at.to_rfc3339())
        .bind(cart.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::DbError(e.to_string()))?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(cart))
    }

    async fn delete_cart(&self, id: Uuid) -> Result<bool, StoreError> {
        sqlx::query("DELETE FROM cart_items WHERE cart_id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::DbError(e.to_string()))?;
        let res = sqlx::query("DELETE FROM carts WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::DbError(e.to_string()))?;
        Ok(res.rows_affected() > 0)
    }

    async fn insert_item(&self, item: CartItem) -> Result<CartItem, StoreError> {
        sqlx::query(
            "INSERT INTO cart_items (id, cart_id, product_id, unit_price, quantity, total_price, deleted_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(item.id.to_string())
        .bind(item.cart_id.to_string())
        .bind(item.product_id.to_string())
        .bind(item.unit_price.to_string())
        .bind(item.quantity as i64)
        .bind(item.total_price.to_string())
        .bind(item.deleted_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::DbError(e.to_string()))?;
        Ok(item)
    }

    async fn update_item(&self, item: CartItem) -> Result<Option<CartItem>, StoreError> {
        let updated = sqlx::query(
            "UPDATE cart_items SET unit_price = ?, quantity = ?, total_price = ?, deleted_at = ? \
             WHERE id = ?",
        )
        .bind(item.unit_price.to_string())
        .bind(item.quantity as i64)
        .bind(item.total_price.to_string())
        .bind(item.deleted_at.map(|t| t.to_rfc3339()))
        .bind(item.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::DbError(e.to_string()))?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(item))
    }

    async fn find_item(
        &self,
        cart_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<CartItem>, StoreError> {
        let row: Option<DbCartItem> = sqlx::query_as(
            "SELECT id, cart_id, product_id, unit_price, quantity, total_price, deleted_at \
             FROM cart_items WHERE cart_id = ? AND product_id = ? AND deleted_at IS NULL LIMIT 1",
        )
        .bind(cart_id.to_string())
        .bind(product_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::DbError(e.to_string()))?;
        row.map(|r| r.into_item()).transpose()
    }

    async fn items_for_cart(&self, cart_id: Uuid) -> Result<Vec<CartItem>, StoreError> {
        let rows: Vec<DbCartItem> = sqlx::query_as(
            "SELECT id, cart_id, product_id, unit_price, quantity, total_price, deleted_at \
             FROM cart_items WHERE cart_id = ? AND deleted_at IS NULL ORDER BY rowid",
        )
        .bind(cart_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::DbError(e.to_string()))?;
        rows.into_iter().map(|r| r.into_item()).collect()
    }
}

#[async_trait]
impl CouponStore for SqliteStore {
    async fn insert_coupon(&self, coupon: Coupon) -> Result<Coupon, StoreError> {
        sqlx::query(
            "INSERT INTO coupons (id, code, discount_type, discount, from_date, to_date, status, \
             created_at, deleted_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(coupon.id.to_string())
        .bind(&coupon.code)
        .bind(coupon.discount_type.as_str())
        .bind(coupon.discount.to_string())
        .bind(coupon.from_date.map(|t| t.to_rfc3339()))
        .bind(coupon.to_date.map(|t| t.to_rfc3339()))
        .bind(coupon.status.as_str())
        .bind(coupon.created_at.to_rfc3339())
        .bind(coupon.deleted_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::DbError(e.to_string()))?;
        Ok(coupon)
    }

    async fn coupon_by_id(&self, id: Uuid) -> Result<Option<Coupon>, StoreError> {
        let row: Option<DbCoupon> = sqlx::query_as(
            "SELECT id, code, discount_type, discount, from_date, to_date, status, created_at, \
             deleted_at FROM coupons WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::DbError(e.to_string()))?;
        row.map(|r| r.into_coupon()).transpose()
    }

    async fn coupon_by_code(&self, code: &str) -> Result<Option<Coupon>, StoreError> {
        let row: Option<DbCoupon> = sqlx::query_as(
            "SELECT id, code, discount_type, discount, from_date, to_date, status, created_at, \
             deleted_at FROM coupons WHERE code = ? AND deleted_at IS NULL LIMIT 1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::DbError(e.to_string()))?;
        row.map(|r| r.into_coupon()).transpose()
    }
}

#[async_trait]
impl TaxStore for SqliteStore {
    async fn insert_tax(&self, tax: Tax) -> Result<Tax, StoreError> {
        sqlx::query(
            "INSERT INTO taxes (id, name, rate, status, created_at, deleted_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(tax.id.to_string())
        .bind(&tax.name)
        .bind(tax.rate.to_string())
        .bind(tax.status.as_str())
        .bind(tax.created_at.to_rfc3339())
        .bind(tax.deleted_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::DbError(e.to_string()))?;
        Ok(tax)
    }

    async fn list_taxes(&self) -> Result<Vec<Tax>, StoreError> {
        let rows: Vec<DbTax> = sqlx::query_as(
            "SELECT id, name, rate, status, created_at, deleted_at FROM taxes",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::DbError(e.to_string()))?;
        rows.into_iter().map(|r| r.into_tax()).collect()
    }
}

#[async_trait]
impl OrderStore for SqliteStore {
    async fn next_order_number(&self) -> Result<u64, StoreError> {
        let value: i64 = sqlx::query_scalar(
            "UPDATE order_counter SET value = value + 1 WHERE id = 1 RETURNING value",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::DbError(e.to_string()))?;
        Ok(value as u64)
    }

    async fn insert_order(&self, order: Order) -> Result<Order, StoreError> {
        sqlx::query(
            "INSERT INTO orders (id, user_id, coupon_id, shipping_address_id, order_number, \
             subtotal, discount, tax, delivery_fee, total, delivery_instruction, payment_method, \
             status, created_at, deleted_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(order.id.to_string())
        .bind(order.user_id.map(|u| u.to_string()))
        .bind(order.coupon_id.map(|u| u.to_string()))
        .bind(order.shipping_address_id.map(|u| u.to_string()))
        .bind(&order.order_number)
        .bind(order.subtotal.to_string())
        .bind(order.discount.to_string())
        .bind(order.tax.to_string())
        .bind(order.delivery_fee.to_string())
        .bind(order.total.to_string())
        .bind(&order.delivery_instruction)
        .bind(order.payment_method.as_str())
        .bind(order.status.as_str())
        .bind(order.created_at.to_rfc3339())
        .bind(order.deleted_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::DbError(e.to_string()))?;
        Ok(order)
    }

    async fn order_by_id(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        let row: Option<DbOrder> =
            sqlx::query_as(&format!("SELECT {ORDER_COLS} FROM orders WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::DbError(e.to_string()))?;
        row.map(|r| r.into_order()).transpose()
    }

    async fn insert_order_items(&self, items: Vec<OrderItem>) -> Result<(), StoreError> {
        for item in items {
            sqlx::query(
                "INSERT INTO order_items (id, order_id, product_id, unit_price, quantity, total_price) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(item.id.to_string())
            .bind(item.order_id.to_string())
            .bind(item.product_id.to_string())
            .bind(item.unit_price.to_string())
            .bind(item.quantity as i64)
            .bind(item.total_price.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::DbError(e.to_string()))?;
        }
        Ok(())
    }

    async fn items_for_order(&self, order_id: Uuid) -> Result<Vec<OrderItem>, StoreError> {
        let rows: Vec<DbOrderItem> = sqlx::query_as(
            "SELECT id, order_id, product_id, unit_price, quantity, total_price \
             FROM order_items WHERE order_id = ? ORDER BY rowid",
        )
        .bind(order_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::DbError(e.to_string()))?;
        rows.into_iter().map(|r| r.into_item()).collect()
    }

    async fn set_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Order>, StoreError> {
        let updated = sqlx::query("UPDATE orders SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::DbError(e.to_string()))?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.order_by_id(id).await
    }

    async fn set_orders_deleted(&self, ids: &[Uuid], deleted: bool) -> Result<u64, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let stamp = deleted.then(|| Utc::now().to_rfc3339());
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("UPDATE orders SET deleted_at = ? WHERE id IN ({placeholders})");
        let mut query = sqlx::query(&sql).bind(stamp);
        for id in ids {
            query = query.bind(id.to_string());
        }
        let res = query
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::DbError(e.to_string()))?;
        Ok(res.rows_affected())
    }
}

#[async_trait]
impl PaymentStore for SqliteStore {
    async fn insert_payment(&self, payment: Payment) -> Result<Payment, StoreError> {
        sqlx::query(
            "INSERT INTO payments (id, order_id, created_by, amount, method, status, external_id, \
             created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(payment.id.to_string())
        .bind(payment.order_id.to_string())
        .bind(payment.created_by.map(|u| u.to_string()))
        .bind(payment.amount.to_string())
        .bind(payment.method.as_str())
        .bind(payment.status.as_str())
        .bind(&payment.external_id)
        .bind(payment.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::DbError(e.to_string()))?;
        Ok(payment)
    }

    async fn payments_for_order(&self, order_id: Uuid) -> Result<Vec<Payment>, StoreError> {
        let rows: Vec<DbPayment> = sqlx::query_as(
            "SELECT id, order_id, created_by, amount, method, status, external_id, created_at \
             FROM payments WHERE order_id = ? ORDER BY rowid",
        )
        .bind(order_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::DbError(e.to_string()))?;
        rows.into_iter().map(|r| r.into_payment()).collect()
    }
}

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn insert_product(&self, product: Product) -> Result<Product, StoreError> {
        sqlx::query(
            "INSERT INTO products (id, name, sku, price, status, created_at, deleted_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(product.id.to_string())
        .bind(&product.name)
        .bind(&product.sku)
        .bind(product.price.to_string())
        .bind(product.status.as_str())
        .bind(product.created_at.to_rfc3339())
        .bind(product.deleted_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::DbError(e.to_string()))?;
        Ok(product)
    }

    async fn product_by_id(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        let row: Option<DbProduct> = sqlx::query_as(
            "SELECT id, name, sku, price, status, created_at, deleted_at FROM products WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::DbError(e.to_string()))?;
        row.map(|r| r.into_product()).transpose()
    }
}

#[async_trait]
impl DirectoryStore for SqliteStore {
    async fn insert_user(&self, user: User) -> Result<User, StoreError> {
        sqlx::query("INSERT INTO users (id, name, email, created_at) VALUES (?, ?, ?, ?)")
            .bind(user.id.to_string())
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.created_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::DbError(e.to_string()))?;
        Ok(user)
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row: Option<DbUser> =
            sqlx::query_as("SELECT id, name, email, created_at FROM users WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::DbError(e.to_string()))?;
        row.map(|r| r.into_user()).transpose()
    }

    async fn insert_address(
        &self,
        address: ShippingAddress,
    ) -> Result<ShippingAddress, StoreError> {
        sqlx::query(
            "INSERT INTO shipping_addresses (id, user_id, name, phone, address, landmark, \
             house_number, city, state, zip, country, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(address.id.to_string())
        .bind(address.user_id.map(|u| u.to_string()))
        .bind(&address.name)
        .bind(&address.phone)
        .bind(&address.address)
        .bind(&address.landmark)
        .bind(&address.house_number)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.zip)
        .bind(&address.country)
        .bind(address.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::DbError(e.to_string()))?;
        Ok(address)
    }

    async fn address_by_id(&self, id: Uuid) -> Result<Option<ShippingAddress>, StoreError> {
        let row: Option<DbAddress> = sqlx::query_as(
            "SELECT id, user_id, name, phone, address, landmark, house_number, city, state, zip, \
             country, created_at FROM shipping_addresses WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::DbError(e.to_string()))?;
        row.map(|r| r.into_address()).transpose()
    }
}
