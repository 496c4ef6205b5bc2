use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    serve, Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::application::cart_service::CartService;
use crate::application::coupon_service::CouponService;
use crate::application::order_service::OrderService;
use crate::application::payment_service::PaymentService;
use crate::errors::AppError;
use checkout_types::domain::{
    CartKey, CartLine, Order, OrderDetail, Payment, PaymentMethod, PaymentStatus,
};
use checkout_types::ports::{CheckoutStore, InvoiceNotifier};

#[derive(Clone)]
pub struct HttpServerConfig {
    pub port: String,
}

/// One service per use-case family, all backed by the same store.
pub struct AppState<S, N>
where
    S: CheckoutStore,
    N: InvoiceNotifier,
{
    pub carts: CartService<S>,
    pub coupons: CouponService<S>,
    pub orders: OrderService<S, N>,
    pub payments: PaymentService<S>,
}

#[derive(Clone)]
pub struct HttpServer<S, N>
where
    S: CheckoutStore,
    N: InvoiceNotifier,
{
    pub state: Arc<AppState<S, N>>,
    pub config: HttpServerConfig,
}

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    pub quantity: u32,
    pub user_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct RemoveItemQuery {
    pub product_id: String,
}

#[derive(Deserialize)]
pub struct DecrementRequest {
    pub product_id: Uuid,
}

#[derive(Deserialize)]
pub struct CheckoutDataRequest {
    pub session_id: String,
    pub user_id: Option<Uuid>,
    pub shipping_address_id: Option<Uuid>,
    pub delivery_instruction: Option<String>,
}

#[derive(Deserialize)]
pub struct ApplyCouponRequest {
    pub session_id: String,
    pub coupon_code: String,
}

#[derive(Deserialize)]
pub struct RemoveCouponRequest {
    pub session_id: String,
}

#[derive(Deserialize)]
pub struct BulkActionRequest {
    pub action: String,
    pub order_ids: Vec<Uuid>,
}

#[derive(Deserialize)]
pub struct CreatePaymentRequest {
    pub order_id: Uuid,
    pub payment_method: PaymentMethod,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub external_id: Option<String>,
    pub created_by: Option<Uuid>,
}

#[derive(Serialize)]
pub struct ApiResponse<T> {
    status: &'static str,
    message: &'static str,
    data: T,
}

fn success<T>(message: &'static str, data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        status: "success",
        message,
        data,
    })
}

impl<S, N> HttpServer<S, N>
where
    S: CheckoutStore,
    N: InvoiceNotifier,
{
    pub async fn new(store: S, notifier: N, config: HttpServerConfig) -> anyhow::Result<Self> {
        let state = AppState {
            carts: CartService::new(store.clone()),
            coupons: CouponService::new(store.clone()),
            orders: OrderService::new(store.clone(), notifier),
            payments: PaymentService::new(store),
        };
        Ok(Self {
            state: Arc::new(state),
            config,
        })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    %request_id,
                    method = %request.method(),
                    uri
                )
            })
            .on_request(
                |request: &axum::extract::Request<_>, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        method = %request.method(),
                        uri = %request.uri(),
                        "request"
                    );
                },
            )
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        status = %response.status(),
                        latency_ms = %latency.as_millis(),
                        "response"
                    );
                },
            );

        let state = self.state.clone();
        let app = Router::new()
            .route("/health", get(health))
            .route("/cart/items/{session_id}", post(add_cart_item::<S, N>))
            .route("/cart/items/{session_id}", delete(remove_cart_item::<S, N>))
            .route(
                "/cart/items/{session_id}/decrement",
                post(decrement_cart_item::<S, N>),
            )
            .route("/cart/{kind}/{value}", get(get_cart::<S, N>))
            .route("/cart/checkout-data", post(save_checkout_data::<S, N>))
            .route("/coupons/apply", post(apply_coupon::<S, N>))
            .route("/coupons/remove", post(remove_coupon::<S, N>))
            .route("/orders/bulk-action", post(bulk_action::<S, N>))
            .route("/orders/{id}", post(place_order::<S, N>))
            .route("/orders/{id}", get(get_order::<S, N>))
            .route("/orders/{id}/invoice", get(download_invoice::<S, N>))
            .route("/payments", post(create_payment::<S, N>))
            .layer(trace_layer)
            .with_state(state);

        let addr: SocketAddr = format!("0.0.0.0:{}", self.config.port).parse()?;
        tracing::info!("starting server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}

async fn health() -> (axum::http::StatusCode, Json<serde_json::Value>) {
    (
        axum::http::StatusCode::OK,
        Json(serde_json::json!({ "status": "ok" })),
    )
}

async fn add_cart_item<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Path(session_id): Path<String>,
    Json(payload): Json<AddItemRequest>,
) -> Result<Json<ApiResponse<Vec<CartLine>>>, AppError>
where
    S: CheckoutStore,
    N: InvoiceNotifier,
{
    let lines = state
        .carts
        .add_item(
            &session_id,
            payload.user_id,
            payload.product_id,
            payload.quantity,
        )
        .await?;
    Ok(success("Product added to cart", lines))
}

async fn remove_cart_item<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Path(session_id): Path<String>,
    Query(query): Query<RemoveItemQuery>,
) -> Result<Json<ApiResponse<Vec<CartLine>>>, AppError>
where
    S: CheckoutStore,
    N: InvoiceNotifier,
{
    let product_id =
        Uuid::parse_str(&query.product_id).map_err(|e| AppError::InvalidInput(e.to_string()))?;
    let lines = state.carts.remove_item(&session_id, product_id).await?;
    Ok(success("Product removed from cart", lines))
}

async fn decrement_cart_item<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Path(session_id): Path<String>,
    Json(payload): Json<DecrementRequest>,
) -> Result<Json<ApiResponse<Vec<CartLine>>>, AppError>
where
    S: CheckoutStore,
    N: InvoiceNotifier,
{
    let lines = state
        .carts
        .decrement_quantity(&session_id, payload.product_id)
        .await?;
    Ok(success("Product quantity decremented", lines))
}

async fn get_cart<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Path((kind, value)): Path<(String, String)>,
) -> Result<Json<ApiResponse<Vec<CartLine>>>, AppError>
where
    S: CheckoutStore,
    N: InvoiceNotifier,
{
    let key = match kind.as_str() {
        "session" => CartKey::Session(value),
        "order" => CartKey::Order(
            Uuid::parse_str(&value).map_err(|e| AppError::InvalidInput(e.to_string()))?,
        ),
        "cart" => CartKey::Cart(
            Uuid::parse_str(&value).map_err(|e| AppError::InvalidInput(e.to_string()))?,
        ),
        _ => return Err(AppError::InvalidInput("Invalid cart lookup kind".into())),
    };
    let lines = state.carts.find_cart(&key).await?;
    Ok(success("Cart retrieved successfully", lines))
}

async fn save_checkout_data<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Json(payload): Json<CheckoutDataRequest>,
) -> Result<Json<ApiResponse<Vec<CartLine>>>, AppError>
where
    S: CheckoutStore,
    N: InvoiceNotifier,
{
    let lines = state
        .carts
        .save_checkout_data(
            &payload.session_id,
            payload.user_id,
            payload.shipping_address_id,
            payload.delivery_instruction,
        )
        .await?;
    Ok(success("Checkout data saved successfully", lines))
}

async fn apply_coupon<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Json(payload): Json<ApplyCouponRequest>,
) -> Result<Json<ApiResponse<Vec<CartLine>>>, AppError>
where
    S: CheckoutStore,
    N: InvoiceNotifier,
{
    let lines = state
        .coupons
        .apply_coupon(&payload.session_id, &payload.coupon_code)
        .await?;
    Ok(success("Coupon applied successfully", lines))
}

async fn remove_coupon<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Json(payload): Json<RemoveCouponRequest>,
) -> Result<Json<ApiResponse<Vec<CartLine>>>, AppError>
where
    S: CheckoutStore,
    N: InvoiceNotifier,
{
    let lines = state.coupons.remove_coupon(&payload.session_id).await?;
    Ok(success("Coupon removed successfully", lines))
}

async fn place_order<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Order>>, AppError>
where
    S: CheckoutStore,
    N: InvoiceNotifier,
{
    let order = state.orders.place_order(&id).await?;
    Ok(success("Order placed successfully", order))
}

async fn get_order<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<OrderDetail>>, AppError>
where
    S: CheckoutStore,
    N: InvoiceNotifier,
{
    let uuid = Uuid::parse_str(&id).map_err(|e| AppError::InvalidInput(e.to_string()))?;
    let detail = state.orders.find_order(uuid).await?;
    Ok(success("Order found successfully", detail))
}

async fn download_invoice<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<String>>, AppError>
where
    S: CheckoutStore,
    N: InvoiceNotifier,
{
    let uuid = Uuid::parse_str(&id).map_err(|e| AppError::InvalidInput(e.to_string()))?;
    let html = state.orders.download_invoice(uuid).await?;
    Ok(success("Order Invoice Downloaded successfully", html))
}

async fn bulk_action<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Json(payload): Json<BulkActionRequest>,
) -> Result<Json<ApiResponse<u64>>, AppError>
where
    S: CheckoutStore,
    N: InvoiceNotifier,
{
    let affected = state
        .orders
        .bulk_action(&payload.action, &payload.order_ids)
        .await?;
    Ok(success("Order updated successfully", affected))
}

async fn create_payment<S, N>(
    State(state): State<Arc<AppState<S, N>>>,
    Json(payload): Json<CreatePaymentRequest>,
) -> Result<Json<ApiResponse<Payment>>, AppError>
where
    S: CheckoutStore,
    N: InvoiceNotifier,
{
    let payment = state
        .payments
        .record_payment(
            payload.order_id,
            payload.payment_method,
            payload.amount,
            payload.status,
            payload.external_id,
            payload.created_by,
        )
        .await?;
    Ok(success("Payment created successfully", payment))
}
