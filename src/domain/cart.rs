use super::errors::DomainError;

/// A persisted (user, product, quantity) row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i32,
}

/// A cart line joined with the product columns it is priced from. The unit
/// price is read from the catalog at query time, never frozen at add time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineView {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub product_name: String,
    pub product_image: Option<String>,
    pub unit_price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedCartLine {
    pub line: CartLineView,
    pub offer_rate: i32,
    pub item_price: i64,
    pub item_discounted_price: i64,
}

/// Priced view of a set of cart lines. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CheckoutSnapshot {
    pub lines: Vec<PricedCartLine>,
    pub total_price: i64,
    pub total_discounted_price: i64,
}

/// Result of a quantity change that may collapse the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartUpdate {
    Updated(CartLine),
    Removed(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedLine {
    pub line: PricedCartLine,
    /// False when the quantity was merged into an existing line.
    pub created: bool,
}

/// `item_price - floor(item_price * rate / 100)`, with the rate clamped to
/// 0..=100. Only the discount amount is floored.
pub fn discounted_price(item_price: i64, rate: i32) -> Result<i64, DomainError> {
    let rate = i64::from(rate.clamp(0, 100));
    if rate == 0 {
        return Ok(item_price);
    }
    let discount = item_price
        .checked_mul(rate)
        .map(|scaled| scaled.div_euclid(100))
        .ok_or_else(|| DomainError::Internal("discount overflow".to_string()))?;
    Ok(item_price - discount)
}

pub fn price_line(line: CartLineView, rate: i32) -> Result<PricedCartLine, DomainError> {
    let item_price = line
        .unit_price
        .checked_mul(i64::from(line.quantity))
        .ok_or_else(|| DomainError::Internal("item price overflow".to_string()))?;
    let item_discounted_price = discounted_price(item_price, rate)?;

    Ok(PricedCartLine {
        line,
        offer_rate: rate.clamp(0, 100),
        item_price,
        item_discounted_price,
    })
}

impl CheckoutSnapshot {
    pub fn from_lines(lines: Vec<PricedCartLine>) -> Result<Self, DomainError> {
        let overflow = || DomainError::Internal("cart total overflow".to_string());
        let mut total_price: i64 = 0;
        let mut total_discounted_price: i64 = 0;
        for line in &lines {
            total_price = total_price
                .checked_add(line.item_price)
                .ok_or_else(overflow)?;
            total_discounted_price = total_discounted_price
                .checked_add(line.item_discounted_price)
                .ok_or_else(overflow)?;
        }

        Ok(Self {
            lines,
            total_price,
            total_discounted_price,
        })
    }
}
