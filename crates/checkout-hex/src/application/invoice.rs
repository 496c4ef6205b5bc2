use checkout_types::domain::OrderDetail;

const TEMPLATE: &str = include_str!("../templates/invoice.html");

/// Renders the invoice document for an order. Pure string substitution over
/// a bundled template: the same detail always yields the same output.
pub fn render_invoice(detail: &OrderDetail) -> String {
    let order = &detail.order;

    let mut rows = String::new();
    for line in &detail.items {
        let name = line
            .product
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or("(product no longer available)");
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            line.item.product_id,
            name,
            line.item.unit_price,
            line.item.quantity,
            line.item.total_price,
        ));
    }

    let customer = detail
        .user
        .as_ref()
        .map(|u| u.name.as_str())
        .unwrap_or("Guest");
    let address = detail
        .address
        .as_ref()
        .map(|a| a.one_line())
        .unwrap_or_default();
    let contact = detail
        .address
        .as_ref()
        .and_then(|a| a.phone.as_deref())
        .unwrap_or_default();

    TEMPLATE
        .replace("{{order_number}}", &format!("#ORD{}", order.order_number))
        .replace(
            "{{order_date}}",
            &order.created_at.format("%a %b %d %Y").to_string(),
        )
        .replace("{{customer_name}}", customer)
        .replace("{{delivery_address}}", &address)
        .replace("{{delivery_contact}}", contact)
        .replace("{{order_items}}", rows.trim_end())
        .replace("{{subtotal}}", &order.subtotal.to_string())
        .replace("{{tax}}", &order.tax.to_string())
        .replace("{{discount}}", &order.discount.to_string())
        .replace("{{delivery_fee}}", &order.delivery_fee.to_string())
        .replace("{{total}}", &order.total.to_string())
}
