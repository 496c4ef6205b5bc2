mod cart;
mod catalog;
mod coupon;
mod order;
mod payment;
mod tax;
mod views;

pub use cart::{Cart, CartItem, CartKey, CartStatus, PaymentMethod};
pub use catalog::{Product, ShippingAddress, User};
pub use coupon::{Coupon, DiscountType};
pub use order::{Order, OrderItem, OrderStatus};
pub use payment::{Payment, PaymentStatus};
pub use tax::{combined_rate, Tax};
pub use views::{CartLine, OrderDetail, OrderLine};

use serde::{Deserialize, Serialize};

/// Lifecycle flag shared by catalog rows, coupons and taxes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActiveStatus {
    Active,
    Inactive,
}

impl ActiveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActiveStatus::Active => "active",
            ActiveStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ActiveStatus::Active),
            "inactive" => Some(ActiveStatus::Inactive),
            _ => None,
        }
    }
}
