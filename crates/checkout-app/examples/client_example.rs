///  To run :
///  cargo r --example client_example
use checkout_client::{AddItemRequest, CheckoutClient, CheckoutDataRequest, CreatePaymentRequest};
use checkout_hex::inbound::http::{HttpServer, HttpServerConfig};
use checkout_hex::outbound::notify::LogNotifier;
use checkout_repo::build_store;
use checkout_types::domain::{
    Coupon, DiscountType, PaymentMethod, PaymentStatus, Product, ShippingAddress, Tax, User,
};
use checkout_types::ports::{CatalogStore, CouponStore, DirectoryStore, TaxStore};
use reqwest::StatusCode;
use rust_decimal_macros::dec;
use tempfile::tempdir;

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Start server on ephemeral port.
    let port = find_free_port();
    let addr = format!("http://127.0.0.1:{port}/");

    // Use a temp file-backed SQLite DB so multiple connections see the same data.
    let tmp = tempdir()?;
    let db_path = tmp.path().join("checkout.db");
    let db_url = format!("sqlite://{}", db_path.display());

    let store = build_store(Some(&db_url)).await?;

    // Catalog and checkout reference data the storefront would already have.
    let product = Product::new("Copper Kettle", dec!(450))?;
    store.insert_product(product.clone()).await?;
    store.insert_tax(Tax::new("GST", dec!(10))?).await?;
    store
        .insert_coupon(Coupon::new("SAVE5", DiscountType::Percentage, dec!(5))?)
        .await?;
    let user = User::new("Asha Rao", "asha@example.com")?;
    store.insert_user(user.clone()).await?;
    let address = ShippingAddress::new(Some(user.id), "Asha Rao", "12 Hill Rd", "Pune", "IN")?;
    store.insert_address(address.clone()).await?;

    let server = HttpServer::new(
        store,
        LogNotifier,
        HttpServerConfig {
            port: port.to_string(),
        },
    )
    .await?;

    let handle = tokio::spawn(async move {
        server.run().await.expect("server run");
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    // Use client against the running server.
    let client = CheckoutClient::new(&addr)?;

    let lines = client
        .add_cart_item(
            "demo-session",
            AddItemRequest {
                product_id: product.id,
                quantity: 2,
                user_id: Some(user.id),
            },
        )
        .await?;
    println!(
        "Cart after add: subtotal={} tax={} total={}",
        lines[0].cart.subtotal, lines[0].cart.tax, lines[0].cart.total
    );

    let lines = client.apply_coupon("demo-session", "SAVE5").await?;
    println!(
        "Coupon applied: discount={} total={}",
        lines[0].cart.discount, lines[0].cart.total
    );

    client
        .save_checkout_data(CheckoutDataRequest {
            session_id: "demo-session".into(),
            user_id: Some(user.id),
            shipping_address_id: Some(address.id),
            delivery_instruction: Some("Ring twice".into()),
        })
        .await?;

    let order = client.place_order("demo-session").await?;
    println!("Placed order {} total={}", order.order_number, order.total);

    let detail = client.get_order(order.id).await?;
    println!(
        "Order detail: {} item(s), customer {:?}",
        detail.items.len(),
        detail.user.map(|u| u.name)
    );

    let invoice = client.download_invoice(order.id).await?;
    println!("Invoice is {} bytes of HTML", invoice.len());

    let payment = client
        .create_payment(CreatePaymentRequest {
            order_id: order.id,
            payment_method: PaymentMethod::Card,
            amount: order.total,
            status: PaymentStatus::Completed,
            external_id: Some("demo-txn-1".into()),
            created_by: Some(user.id),
        })
        .await?;
    println!("Recorded payment of {} ({:?})", payment.amount, payment.status);

    // A lookup for an order that never existed comes back as a plain 404.
    match client.get_order(uuid::Uuid::new_v4()).await {
        Ok(_) => println!("Unexpectedly found a phantom order"),
        Err(err) => {
            if err
                .downcast_ref::<reqwest::Error>()
                .and_then(|e| e.status())
                == Some(StatusCode::NOT_FOUND)
            {
                println!("Phantom order lookup returned 404, as expected");
            } else {
                return Err(err);
            }
        }
    }

    handle.abort();
    Ok(())
}
