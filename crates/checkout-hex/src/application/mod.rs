pub mod cart_service;
pub mod coupon_service;
pub mod invoice;
pub mod order_service;
pub mod payment_service;
