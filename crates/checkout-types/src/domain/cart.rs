use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CartStatus {
    #[serde(rename = "In Progress")]
    InProgress,
    Ordered,
    Canceled,
    Delivered,
}

impl CartStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CartStatus::InProgress => "In Progress",
            CartStatus::Ordered => "Ordered",
            CartStatus::Canceled => "Canceled",
            CartStatus::Delivered => "Delivered",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "In Progress" => Some(CartStatus::InProgress),
            "Ordered" => Some(CartStatus::Ordered),
            "Canceled" => Some(CartStatus::Canceled),
            "Delivered" => Some(CartStatus::Delivered),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Card,
    Wallet,
    #[serde(rename = "cod")]
    CashOnDelivery,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Wallet => "wallet",
            PaymentMethod::CashOnDelivery => "cod",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "card" => Some(PaymentMethod::Card),
            "wallet" => Some(PaymentMethod::Wallet),
            "cod" => Some(PaymentMethod::CashOnDelivery),
            _ => None,
        }
    }
}

/// How a cart is looked up: by shopper session, by the order it produced,
/// or by its raw id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartKey {
    Session(String),
    Order(Uuid),
    Cart(Uuid),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub id: Uuid,
    pub session_id: String,
    pub user_id: Option<Uuid>,
    pub coupon_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
    pub shipping_address_id: Option<Uuid>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
    pub delivery_instruction: Option<String>,
    pub payment_method: PaymentMethod,
    pub status: CartStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Opens a cart for a session, seeded with the first item's unit price
    /// as subtotal. The pricing pipeline overwrites every derived field
    /// right after the first item lands.
    pub fn open(
        session_id: impl Into<String>,
        user_id: Option<Uuid>,
        unit_price: Decimal,
    ) -> anyhow::Result<Self> {
        let session_id = session_id.into();
        if session_id.trim().is_empty() {
            anyhow::bail!("session id empty");
        }
        if unit_price < Decimal::ZERO {
            anyhow::bail!("unit price negative");
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            session_id,
            user_id,
            coupon_id: None,
            order_id: None,
            shipping_address_id: None,
            subtotal: unit_price,
            discount: Decimal::ZERO,
            tax: Decimal::ZERO,
            delivery_fee: Decimal::ZERO,
            total: unit_price,
            delivery_instruction: None,
            payment_method: PaymentMethod::CashOnDelivery,
            status: CartStatus::InProgress,
            created_at: now,
            updated_at: now,
        })
    }

    /// A cart stays open until checkout links it to an order.
    pub fn is_open(&self) -> bool {
        self.order_id.is_none()
    }

    /// Writes all four derived amounts at once so they can never disagree
    /// with each other within a settled cart.
    pub fn apply_totals(&mut self, subtotal: Decimal, tax: Decimal, discount: Decimal) {
        self.subtotal = subtotal;
        self.tax = tax;
        self.discount = discount;
        self.total = subtotal + tax - discount;
        self.updated_at = Utc::now();
    }

    pub fn link_order(&mut self, order_id: Uuid) {
        self.order_id = Some(order_id);
        self.status = CartStatus::Ordered;
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub total_price: Decimal,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl CartItem {
    pub fn new(
        cart_id: Uuid,
        product_id: Uuid,
        unit_price: Decimal,
        quantity: u32,
    ) -> anyhow::Result<Self> {
        if quantity == 0 {
            anyhow::bail!("item quantity must be > 0");
        }
        if unit_price < Decimal::ZERO {
            anyhow::bail!("unit price negative");
        }
        Ok(Self {
            id: Uuid::new_v4(),
            cart_id,
            product_id,
            unit_price,
            quantity,
            total_price: unit_price * Decimal::from(quantity),
            deleted_at: None,
        })
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
        self.total_price = self.unit_price * Decimal::from(quantity);
    }

    pub fn tombstone(&mut self, at: DateTime<Utc>) {
        self.deleted_at = Some(at);
    }

    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn open_cart_seeds_subtotal_with_unit_price() {
        let cart = Cart::open("sess-1", None, dec!(100)).unwrap();
        assert_eq!(cart.subtotal, dec!(100));
        assert_eq!(cart.total, dec!(100));
        assert_eq!(cart.status, CartStatus::InProgress);
        assert!(cart.is_open());
    }

    #[test]
    fn open_cart_rejects_bad_input() {
        assert!(Cart::open("  ", None, dec!(1)).is_err());
        assert!(Cart::open("sess-1", None, dec!(-1)).is_err());
    }

    #[test]
    fn apply_totals_keeps_the_identity() {
        let mut cart = Cart::open("sess-1", None, dec!(100)).unwrap();
        cart.apply_totals(dec!(200), dec!(36), dec!(10));
        assert_eq!(cart.total, dec!(226));
        assert_eq!(cart.total, cart.subtotal + cart.tax - cart.discount);
    }

    #[test]
    fn linking_an_order_closes_the_cart() {
        let mut cart = Cart::open("sess-1", None, dec!(5)).unwrap();
        cart.link_order(Uuid::new_v4());
        assert!(!cart.is_open());
        assert_eq!(cart.status, CartStatus::Ordered);
    }

    #[test]
    fn item_total_tracks_quantity() {
        let mut item = CartItem::new(Uuid::new_v4(), Uuid::new_v4(), dec!(9.99), 2).unwrap();
        assert_eq!(item.total_price, dec!(19.98));
        item.set_quantity(5);
        assert_eq!(item.total_price, dec!(49.95));
        assert_eq!(item.total_price, item.line_total());
    }

    #[test]
    fn item_rejects_zero_quantity() {
        assert!(CartItem::new(Uuid::new_v4(), Uuid::new_v4(), dec!(1), 0).is_err());
    }

    #[test]
    fn status_strings_round_trip() {
        for status in [
            CartStatus::InProgress,
            CartStatus::Ordered,
            CartStatus::Canceled,
            CartStatus::Delivered,
        ] {
            assert_eq!(CartStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(CartStatus::parse("Unknown"), None);
    }
}
