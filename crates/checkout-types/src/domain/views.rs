//! Read models assembled for API responses. One cart row per item line,
//! one order row with its lines nested.

use serde::{Deserialize, Serialize};

use crate::domain::{
    Cart, CartItem, Coupon, Order, OrderItem, Payment, Product, ShippingAddress, User,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub cart: Cart,
    pub item: CartItem,
    pub user: Option<User>,
    pub coupon: Option<Coupon>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub item: OrderItem,
    pub product: Option<Product>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    pub order: Order,
    pub user: Option<User>,
    pub address: Option<ShippingAddress>,
    pub items: Vec<OrderLine>,
    pub payments: Vec<Payment>,
}
