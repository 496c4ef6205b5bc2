use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::cart::{Cart, CartItem, PaymentMethod};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Ordered,
    Canceled,
    Delivered,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Ordered => "Ordered",
            OrderStatus::Canceled => "Canceled",
            OrderStatus::Delivered => "Delivered",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Ordered" => Some(OrderStatus::Ordered),
            "Canceled" => Some(OrderStatus::Canceled),
            "Delivered" => Some(OrderStatus::Delivered),
            _ => None,
        }
    }
}

/// Immutable snapshot of a cart taken at checkout. Totals are carried over
/// verbatim and never recomputed afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub coupon_id: Option<Uuid>,
    pub shipping_address_id: Option<Uuid>,
    pub order_number: String,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
    pub delivery_instruction: Option<String>,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn from_cart(cart: &Cart, sequence: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: cart.user_id,
            coupon_id: cart.coupon_id,
            shipping_address_id: cart.shipping_address_id,
            order_number: Self::format_number(sequence),
            subtotal: cart.subtotal,
            discount: cart.discount,
            tax: cart.tax,
            delivery_fee: cart.delivery_fee,
            total: cart.total,
            delivery_instruction: cart.delivery_instruction.clone(),
            payment_method: cart.payment_method,
            status: OrderStatus::Ordered,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    /// Zero-padded six digit order number, `1` -> `"000001"`.
    pub fn format_number(sequence: u64) -> String {
        format!("{sequence:06}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub total_price: Decimal,
}

impl OrderItem {
    pub fn from_cart_item(order_id: Uuid, item: &CartItem) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            product_id: item.product_id,
            unit_price: item.unit_price,
            quantity: item.quantity,
            total_price: item.total_price,
        }
    }
}
