use utoipa::OpenApi;

use crate::handlers::{cart, orders, payments};

#[derive(OpenApi)]
#[openapi(
    info(title = "Settlement service", description = "Cart, order and bank-transfer payment API"),
    paths(
        cart::add_to_cart,
        cart::get_cart,
        cart::checkout,
        cart::update_cart,
        cart::remove_from_cart,
        orders::place_order,
        orders::get_order,
        orders::list_orders,
        orders::update_order_status,
        payments::create_qr,
        payments::webhook,
    ),
    components(schemas(
        cart::AddToCartRequest,
        cart::QuantityMode,
        cart::UpdateCartRequest,
        cart::CheckoutRequest,
        cart::CartLineResponse,
        cart::CartResponse,
        cart::UpdateCartResponse,
        orders::PlaceOrderRequest,
        orders::UpdateOrderStatusRequest,
        orders::OrderItemResponse,
        orders::OrderResponse,
        orders::ListOrdersResponse,
        payments::CreateQrRequest,
        payments::QrResponse,
        payments::WebhookRequest,
        payments::WebhookResponse,
    )),
    tags(
        (name = "cart", description = "Per-user shopping cart"),
        (name = "orders", description = "Order placement and lookup"),
        (name = "payments", description = "Payment QR issuance and bank webhooks"),
    )
)]
pub struct ApiDoc;
