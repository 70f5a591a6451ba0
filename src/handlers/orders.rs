use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::order::{OrderItemView, OrderStatus, OrderView, PlaceOrder};
use crate::errors::AppError;

use super::auth::AuthenticatedUser;
use super::Orders;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    pub address: String,
    pub payment_method: String,
    /// Cart lines to order; their current prices are frozen into the order.
    pub cart_ids: Vec<i64>,
    #[serde(default)]
    pub coupon: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    /// One of PENDING, PROCESSING, SHIPPED, DELIVERED, CANCELLED.
    pub order_status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub item_price: i64,
    pub item_discounted_price: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: i64,
    pub user_id: i64,
    pub address: String,
    pub payment_method: String,
    pub final_price: i64,
    pub coupon: Option<String>,
    pub order_status: String,
    pub payment_status: String,
    pub created_at: String,
    pub items: Vec<OrderItemResponse>,
}

impl From<OrderItemView> for OrderItemResponse {
    fn from(i: OrderItemView) -> Self {
        OrderItemResponse {
            id: i.id,
            product_id: i.product_id,
            quantity: i.quantity,
            item_price: i.item_price,
            item_discounted_price: i.item_discounted_price,
        }
    }
}

impl From<OrderView> for OrderResponse {
    fn from(o: OrderView) -> Self {
        OrderResponse {
            id: o.id,
            user_id: o.user_id,
            address: o.address,
            payment_method: o.payment_method,
            final_price: o.final_price,
            coupon: o.coupon,
            order_status: o.order_status.to_string(),
            payment_status: o.payment_status.to_string(),
            created_at: o.created_at.to_rfc3339(),
            items: o.items.into_iter().map(OrderItemResponse::from).collect(),
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /order
///
/// Places an order from the selected cart lines. The header and all items are
/// written in a single database transaction; the cart is only cleared when
/// the service is configured to do so.
#[utoipa::path(
    post,
    path = "/order",
    request_body = PlaceOrderRequest,
    params(("X-User-Id" = i64, Header, description = "Authenticated user id")),
    responses(
        (status = 201, description = "Order placed", body = OrderResponse),
        (status = 400, description = "Missing address, payment method or cart lines"),
        (status = 404, description = "A selected cart line was not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn place_order(
    user: AuthenticatedUser,
    orders: web::Data<Orders>,
    body: web::Json<PlaceOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let request = PlaceOrder {
        address: body.address,
        payment_method: body.payment_method,
        coupon: body.coupon,
        cart_ids: body.cart_ids,
    };

    let order = web::block(move || orders.place_order(user.0, request)).await??;

    Ok(HttpResponse::Created().json(OrderResponse::from(order)))
}

/// GET /order/{id}
///
/// Returns one of the caller's orders together with its items.
#[utoipa::path(
    get,
    path = "/order/{id}",
    params(
        ("id" = i64, Path, description = "Order id"),
        ("X-User-Id" = i64, Header, description = "Authenticated user id"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    user: AuthenticatedUser,
    orders: web::Data<Orders>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let order = web::block(move || orders.get_order(user.0, order_id)).await??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// GET /order
///
/// Returns a paginated list of the caller's orders (without their items),
/// newest first.
#[utoipa::path(
    get,
    path = "/order",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
        ("X-User-Id" = i64, Header, description = "Authenticated user id"),
    ),
    responses((status = 200, description = "Paginated list of orders", body = ListOrdersResponse)),
    tag = "orders"
)]
pub async fn list_orders(
    user: AuthenticatedUser,
    orders: web::Data<Orders>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);

    let result = web::block(move || orders.list_orders(user.0, page, limit)).await??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: result.items.into_iter().map(OrderResponse::from).collect(),
        total: result.total,
        page,
        limit,
    }))
}

/// PUT /admin/order/{id}/status
///
/// Records a fulfillment status transition. Mounted under `/admin`, which the
/// gateway restricts to staff.
#[utoipa::path(
    put,
    path = "/admin/order/{id}/status",
    request_body = UpdateOrderStatusRequest,
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Status recorded", body = OrderResponse),
        (status = 400, description = "Unknown status"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    orders: web::Data<Orders>,
    path: web::Path<i64>,
    body: web::Json<UpdateOrderStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let status: OrderStatus = body.order_status.parse()?;

    let order = web::block(move || orders.update_order_status(order_id, status)).await??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}
