use std::time::Duration;

use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use checkout_types::domain::{CartLine, Order, OrderDetail, Payment, PaymentMethod, PaymentStatus};

#[derive(Clone)]
pub struct CheckoutClientBuilder {
    base: Url,
    headers: HeaderMap,
    timeout: Option<Duration>,
    client: Option<reqwest::Client>,
}

#[derive(Clone)]
pub struct CheckoutClient {
    base: Url,
    client: reqwest::Client,
}

/// Server responses arrive wrapped in `{status, message, data}`; only the
/// payload matters to callers.
#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

impl CheckoutClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::builder(base_url)?.build()
    }

    pub fn builder(base_url: &str) -> anyhow::Result<CheckoutClientBuilder> {
        let base = Url::parse(base_url).context("invalid base url")?;
        Ok(CheckoutClientBuilder {
            base,
            headers: HeaderMap::new(),
            timeout: None,
            client: None,
        })
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base.join(path).context("failed to join url")
    }

    pub async fn add_cart_item(
        &self,
        session_id: &str,
        req: AddItemRequest,
    ) -> anyhow::Result<Vec<CartLine>> {
        let res = self
            .client
            .post(self.url(&format!("cart/items/{session_id}"))?)
            .json(&req)
            .send()
            .await?
            .error_for_status()?;
        let env: Envelope<Vec<CartLine>> = res.json().await?;
        Ok(env.data)
    }

    pub async fn remove_cart_item(
        &self,
        session_id: &str,
        product_id: Uuid,
    ) -> anyhow::Result<Vec<CartLine>> {
        let res = self
            .client
            .delete(self.url(&format!("cart/items/{session_id}"))?)
            .query(&[("product_id", product_id.to_string())])
            .send()
            .await?
            .error_for_status()?;
        let env: Envelope<Vec<CartLine>> = res.json().await?;
        Ok(env.data)
    }

    pub async fn decrement_cart_item(
        &self,
        session_id: &str,
        product_id: Uuid,
    ) -> anyhow::Result<Vec<CartLine>> {
        let res = self
            .client
            .post(self.url(&format!("cart/items/{session_id}/decrement"))?)
            .json(&DecrementRequest { product_id })
            .send()
            .await?
            .error_for_status()?;
        let env: Envelope<Vec<CartLine>> = res.json().await?;
        Ok(env.data)
    }

    pub async fn cart_for_session(&self, session_id: &str) -> anyhow::Result<Vec<CartLine>> {
        self.fetch_cart(&format!("cart/session/{session_id}")).await
    }

    pub async fn cart_for_order(&self, order_id: Uuid) -> anyhow::Result<Vec<CartLine>> {
        self.fetch_cart(&format!("cart/order/{order_id}")).await
    }

    pub async fn cart_by_id(&self, cart_id: Uuid) -> anyhow::Result<Vec<CartLine>> {
        self.fetch_cart(&format!("cart/cart/{cart_id}")).await
    }

    async fn fetch_cart(&self, path: &str) -> anyhow::Result<Vec<CartLine>> {
        let res = self
            .client
            .get(self.url(path)?)
            .send()
            .await?
            .error_for_status()?;
        let env: Envelope<Vec<CartLine>> = res.json().await?;
        Ok(env.data)
    }

    pub async fn save_checkout_data(
        &self,
        req: CheckoutDataRequest,
    ) -> anyhow::Result<Vec<CartLine>> {
        let res = self
            .client
            .post(self.url("cart/checkout-data")?)
            .json(&req)
            .send()
            .await?
            .error_for_status()?;
        let env: Envelope<Vec<CartLine>> = res.json().await?;
        Ok(env.data)
    }

    pub async fn apply_coupon(
        &self,
        session_id: &str,
        coupon_code: &str,
    ) -> anyhow::Result<Vec<CartLine>> {
        let res = self
            .client
            .post(self.url("coupons/apply")?)
            .json(&ApplyCouponRequest {
                session_id: session_id.into(),
                coupon_code: coupon_code.into(),
            })
            .send()
            .await?
            .error_for_status()?;
        let env: Envelope<Vec<CartLine>> = res.json().await?;
        Ok(env.data)
    }

    pub async fn remove_coupon(&self, session_id: &str) -> anyhow::Result<Vec<CartLine>> {
        let res = self
            .client
            .post(self.url("coupons/remove")?)
            .json(&RemoveCouponRequest {
                session_id: session_id.into(),
            })
            .send()
            .await?
            .error_for_status()?;
        let env: Envelope<Vec<CartLine>> = res.json().await?;
        Ok(env.data)
    }

    pub async fn place_order(&self, session_id: &str) -> anyhow::Result<Order> {
        let res = self
            .client
            .post(self.url(&format!("orders/{session_id}"))?)
            .send()
            .await?
            .error_for_status()?;
        let env: Envelope<Order> = res.json().await?;
        Ok(env.data)
    }

    pub async fn get_order(&self, order_id: Uuid) -> anyhow::Result<OrderDetail> {
        let res = self
            .client
            .get(self.url(&format!("orders/{order_id}"))?)
            .send()
            .await?
            .error_for_status()?;
        let env: Envelope<OrderDetail> = res.json().await?;
        Ok(env.data)
    }

    pub async fn download_invoice(&self, order_id: Uuid) -> anyhow::Result<String> {
        let res = self
            .client
            .get(self.url(&format!("orders/{order_id}/invoice"))?)
            .send()
            .await?
            .error_for_status()?;
        let env: Envelope<String> = res.json().await?;
        Ok(env.data)
    }

    pub async fn bulk_action(&self, action: &str, order_ids: Vec<Uuid>) -> anyhow::Result<u64> {
        let res = self
            .client
            .post(self.url("orders/bulk-action")?)
            .json(&BulkActionRequest {
                action: action.into(),
                order_ids,
            })
            .send()
            .await?
            .error_for_status()?;
        let env: Envelope<u64> = res.json().await?;
        Ok(env.data)
    }

    pub async fn create_payment(&self, req: CreatePaymentRequest) -> anyhow::Result<Payment> {
        let res = self
            .client
            .post(self.url("payments")?)
            .json(&req)
            .send()
            .await?
            .error_for_status()?;
        let env: Envelope<Payment> = res.json().await?;
        Ok(env.data)
    }
}

impl CheckoutClientBuilder {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(
        mut self,
        key: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> anyhow::Result<Self> {
        let header_name =
            HeaderName::from_bytes(key.as_ref().as_bytes()).context("invalid header name")?;
        let header_value = HeaderValue::from_str(value.as_ref()).context("invalid header value")?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> anyhow::Result<CheckoutClient> {
        if let Some(client) = self.client {
            return Ok(CheckoutClient {
                base: self.base,
                client,
            });
        }

        let mut builder = reqwest::Client::builder();
        if !self.headers.is_empty() {
            builder = builder.default_headers(self.headers);
        }
        if let Some(t) = self.timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()?;
        Ok(CheckoutClient {
            base: self.base,
            client,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    pub quantity: u32,
    pub user_id: Option<Uuid>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct DecrementRequest {
    product_id: Uuid,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CheckoutDataRequest {
    pub session_id: String,
    pub user_id: Option<Uuid>,
    pub shipping_address_id: Option<Uuid>,
    pub delivery_instruction: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct ApplyCouponRequest {
    session_id: String,
    coupon_code: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct RemoveCouponRequest {
    session_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct BulkActionRequest {
    action: String,
    order_ids: Vec<Uuid>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreatePaymentRequest {
    pub order_id: Uuid,
    pub payment_method: PaymentMethod,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub external_id: Option<String>,
    pub created_by: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkout_types::domain::{Cart, CartItem, Order, OrderItem};
    use httpmock::prelude::*;
    use rust_decimal_macros::dec;

    fn sample_cart_line() -> CartLine {
        let cart = Cart::open("sess-1", None, dec!(250)).unwrap();
        let item = CartItem::new(cart.id, Uuid::new_v4(), dec!(125), 2).unwrap();
        CartLine {
            cart,
            item,
            user: None,
            coupon: None,
        }
    }

    #[tokio::test]
    async fn cart_calls_unwrap_the_envelope() {
        let server = MockServer::start();
        let line = sample_cart_line();
        let session_id = line.cart.session_id.clone();
        let product_id = line.item.product_id;

        let add_mock = server.mock(|when, then| {
            when.method(POST)
                .path(format!("/cart/items/{session_id}"))
                .json_body_obj(&AddItemRequest {
                    product_id,
                    quantity: 2,
                    user_id: None,
                });
            then.status(200).json_body(serde_json::json!({
                "status": "success",
                "message": "Product added to cart",
                "data": [line.clone()],
            }));
        });

        let get_mock = server.mock(|when, then| {
            when.method(GET).path(format!("/cart/session/{session_id}"));
            then.status(200).json_body(serde_json::json!({
                "status": "success",
                "message": "Cart retrieved successfully",
                "data": [line.clone()],
            }));
        });

        let remove_mock = server.mock(|when, then| {
            when.method(DELETE)
                .path(format!("/cart/items/{session_id}"))
                .query_param("product_id", product_id.to_string());
            then.status(200).json_body(serde_json::json!({
                "status": "success",
                "message": "Product removed from cart",
                "data": [],
            }));
        });

        let client = CheckoutClient::new(&server.base_url()).unwrap();

        let added = client
            .add_cart_item(
                &session_id,
                AddItemRequest {
                    product_id,
                    quantity: 2,
                    user_id: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].item.quantity, 2);
        assert_eq!(added[0].cart.total, dec!(250));

        let fetched = client.cart_for_session(&session_id).await.unwrap();
        assert_eq!(fetched[0].cart.id, line.cart.id);

        let after_remove = client
            .remove_cart_item(&session_id, product_id)
            .await
            .unwrap();
        assert!(after_remove.is_empty());

        add_mock.assert();
        get_mock.assert();
        remove_mock.assert();
    }

    #[tokio::test]
    async fn order_calls_round_trip() {
        let server = MockServer::start();
        let line = sample_cart_line();
        let order = Order::from_cart(&line.cart, 7);
        let order_item = OrderItem::from_cart_item(order.id, &line.item);

        let place_mock = server.mock(|when, then| {
            when.method(POST).path("/orders/sess-1");
            then.status(200).json_body(serde_json::json!({
                "status": "success",
                "message": "Order placed successfully",
                "data": order.clone(),
            }));
        });

        let detail_mock = server.mock(|when, then| {
            when.method(GET).path(format!("/orders/{}", order.id));
            then.status(200).json_body(serde_json::json!({
                "status": "success",
                "message": "Order found successfully",
                "data": {
                    "order": order.clone(),
                    "user": null,
                    "address": null,
                    "items": [{ "item": order_item, "product": null }],
                    "payments": [],
                },
            }));
        });

        let bulk_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/orders/bulk-action")
                .json_body_obj(&BulkActionRequest {
                    action: "delivered".into(),
                    order_ids: vec![order.id],
                });
            then.status(200).json_body(serde_json::json!({
                "status": "success",
                "message": "Order updated successfully",
                "data": 1,
            }));
        });

        let client = CheckoutClient::new(&server.base_url()).unwrap();

        let placed = client.place_order("sess-1").await.unwrap();
        assert_eq!(placed.order_number, "000007");
        assert_eq!(placed.total, order.total);

        let detail = client.get_order(order.id).await.unwrap();
        assert_eq!(detail.order.id, order.id);
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].item.total_price, dec!(250));

        let touched = client.bulk_action("delivered", vec![order.id]).await.unwrap();
        assert_eq!(touched, 1);

        place_mock.assert();
        detail_mock.assert();
        bulk_mock.assert();
    }

    #[tokio::test]
    async fn error_statuses_surface_as_errors() {
        let server = MockServer::start();

        let missing_mock = server.mock(|when, then| {
            when.method(GET).path_contains("/orders/");
            then.status(404).json_body(serde_json::json!({
                "status": "error",
                "message": "Order not found",
            }));
        });

        let client = CheckoutClient::new(&server.base_url()).unwrap();
        let err = client.get_order(Uuid::new_v4()).await.unwrap_err();
        let status = err
            .downcast_ref::<reqwest::Error>()
            .and_then(|e| e.status());
        assert_eq!(status, Some(reqwest::StatusCode::NOT_FOUND));

        missing_mock.assert();
    }
}
