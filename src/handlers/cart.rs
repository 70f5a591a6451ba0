use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::cart::{CartLine, CartUpdate, CheckoutSnapshot, PricedCartLine};
use crate::errors::AppError;

use super::auth::AuthenticatedUser;
use super::Carts;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: i64,
    pub quantity: i32,
}

/// How `quantity` in an update is applied to the line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum QuantityMode {
    #[default]
    Set,
    Add,
    Subtract,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartRequest {
    pub quantity: i32,
    #[serde(default)]
    pub mode: QuantityMode,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub cart_ids: Vec<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLineResponse {
    pub cart_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub product_image: Option<String>,
    pub quantity: i32,
    pub unit_price: i64,
    /// Percentage of the offer applied, 0 when none is active.
    pub offer_rate: i32,
    pub item_price: i64,
    pub item_discounted_price: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub items: Vec<CartLineResponse>,
    pub total_price: i64,
    pub total_discounted_price: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateCartResponse {
    pub cart_id: i64,
    /// Absent when the line was removed.
    pub quantity: Option<i32>,
    pub removed: bool,
}

impl From<PricedCartLine> for CartLineResponse {
    fn from(p: PricedCartLine) -> Self {
        CartLineResponse {
            cart_id: p.line.id,
            product_id: p.line.product_id,
            product_name: p.line.product_name,
            product_image: p.line.product_image,
            quantity: p.line.quantity,
            unit_price: p.line.unit_price,
            offer_rate: p.offer_rate,
            item_price: p.item_price,
            item_discounted_price: p.item_discounted_price,
        }
    }
}

impl From<CheckoutSnapshot> for CartResponse {
    fn from(s: CheckoutSnapshot) -> Self {
        CartResponse {
            items: s.lines.into_iter().map(CartLineResponse::from).collect(),
            total_price: s.total_price,
            total_discounted_price: s.total_discounted_price,
        }
    }
}

impl From<CartLine> for UpdateCartResponse {
    fn from(line: CartLine) -> Self {
        UpdateCartResponse {
            cart_id: line.id,
            quantity: Some(line.quantity),
            removed: false,
        }
    }
}

impl From<CartUpdate> for UpdateCartResponse {
    fn from(update: CartUpdate) -> Self {
        match update {
            CartUpdate::Updated(line) => line.into(),
            CartUpdate::Removed(cart_id) => UpdateCartResponse {
                cart_id,
                quantity: None,
                removed: true,
            },
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /cart
///
/// Adds a product to the caller's cart. Adding a product that is already in
/// the cart increases that line's quantity instead of creating a new line.
#[utoipa::path(
    post,
    path = "/cart",
    request_body = AddToCartRequest,
    params(("X-User-Id" = i64, Header, description = "Authenticated user id")),
    responses(
        (status = 201, description = "New cart line", body = CartLineResponse),
        (status = 200, description = "Quantity merged into existing line", body = CartLineResponse),
        (status = 400, description = "Invalid quantity"),
        (status = 404, description = "Product not found"),
    ),
    tag = "cart"
)]
pub async fn add_to_cart(
    user: AuthenticatedUser,
    carts: web::Data<Carts>,
    body: web::Json<AddToCartRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let added =
        web::block(move || carts.add_to_cart(user.0, body.product_id, body.quantity)).await??;

    let line = CartLineResponse::from(added.line);
    if added.created {
        Ok(HttpResponse::Created().json(line))
    } else {
        Ok(HttpResponse::Ok().json(line))
    }
}

/// GET /cart
///
/// Returns every line in the caller's cart priced at the current offers.
#[utoipa::path(
    get,
    path = "/cart",
    params(("X-User-Id" = i64, Header, description = "Authenticated user id")),
    responses((status = 200, description = "Priced cart", body = CartResponse)),
    tag = "cart"
)]
pub async fn get_cart(
    user: AuthenticatedUser,
    carts: web::Data<Carts>,
) -> Result<HttpResponse, AppError> {
    let summary = web::block(move || carts.cart_summary(user.0)).await??;

    Ok(HttpResponse::Ok().json(CartResponse::from(summary)))
}

/// POST /cart/checkout
///
/// Prices the selected lines without placing an order.
#[utoipa::path(
    post,
    path = "/cart/checkout",
    request_body = CheckoutRequest,
    params(("X-User-Id" = i64, Header, description = "Authenticated user id")),
    responses(
        (status = 200, description = "Checkout snapshot", body = CartResponse),
        (status = 400, description = "No lines selected"),
        (status = 404, description = "A selected line is not in the cart"),
    ),
    tag = "cart"
)]
pub async fn checkout(
    user: AuthenticatedUser,
    carts: web::Data<Carts>,
    body: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let snapshot = web::block(move || carts.checkout(user.0, &body.cart_ids)).await??;

    Ok(HttpResponse::Ok().json(CartResponse::from(snapshot)))
}

/// PUT /cart/{cart_id}
///
/// Sets, adds to, or subtracts from a line's quantity. A line whose quantity
/// reaches zero is removed.
#[utoipa::path(
    put,
    path = "/cart/{cart_id}",
    request_body = UpdateCartRequest,
    params(
        ("cart_id" = i64, Path, description = "Cart line id"),
        ("X-User-Id" = i64, Header, description = "Authenticated user id"),
    ),
    responses(
        (status = 200, description = "Updated or removed line", body = UpdateCartResponse),
        (status = 400, description = "Invalid quantity"),
        (status = 404, description = "Cart line not found"),
    ),
    tag = "cart"
)]
pub async fn update_cart(
    user: AuthenticatedUser,
    carts: web::Data<Carts>,
    path: web::Path<i64>,
    body: web::Json<UpdateCartRequest>,
) -> Result<HttpResponse, AppError> {
    let cart_id = path.into_inner();
    let body = body.into_inner();

    let response: UpdateCartResponse = web::block(move || match body.mode {
        QuantityMode::Set => carts
            .set_quantity(user.0, cart_id, body.quantity)
            .map(UpdateCartResponse::from),
        QuantityMode::Add => carts
            .increase_quantity(user.0, cart_id, body.quantity)
            .map(UpdateCartResponse::from),
        QuantityMode::Subtract => carts
            .decrease_quantity(user.0, cart_id, body.quantity)
            .map(UpdateCartResponse::from),
    })
    .await??;

    Ok(HttpResponse::Ok().json(response))
}

/// DELETE /cart/{cart_id}
#[utoipa::path(
    delete,
    path = "/cart/{cart_id}",
    params(
        ("cart_id" = i64, Path, description = "Cart line id"),
        ("X-User-Id" = i64, Header, description = "Authenticated user id"),
    ),
    responses((status = 204, description = "Line removed (or already absent)")),
    tag = "cart"
)]
pub async fn remove_from_cart(
    user: AuthenticatedUser,
    carts: web::Data<Carts>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let cart_id = path.into_inner();

    web::block(move || carts.remove(user.0, cart_id)).await??;

    Ok(HttpResponse::NoContent().finish())
}
