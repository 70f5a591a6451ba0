use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::errors::DomainError;

/// Fulfillment status. Moved by order management only, never by payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "PROCESSING" => Ok(OrderStatus::Processing),
            "SHIPPED" => Ok(OrderStatus::Shipped),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::invalid(format!("unknown order status '{other}'"))),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settlement status, moved only by webhook reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Incomplete,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "UNPAID",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Incomplete => "INCOMPLETE",
        }
    }

    /// Status after a bank report of `transferred` against `final_price`.
    /// PAID is terminal so an out-of-order notification cannot downgrade it.
    pub fn reconcile(self, final_price: i64, transferred: i64) -> PaymentStatus {
        if self == PaymentStatus::Paid || final_price <= transferred {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Incomplete
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNPAID" => Ok(PaymentStatus::Unpaid),
            "PAID" => Ok(PaymentStatus::Paid),
            "INCOMPLETE" => Ok(PaymentStatus::Incomplete),
            other => Err(DomainError::Internal(format!(
                "unknown payment status '{other}'"
            ))),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub address: String,
    pub payment_method: String,
    pub coupon: Option<String>,
    pub cart_ids: Vec<i64>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: i64,
    pub address: String,
    pub payment_method: String,
    pub final_price: i64,
    pub coupon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItemInput {
    pub product_id: i64,
    pub quantity: i32,
    pub item_price: i64,
    pub item_discounted_price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItemView {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub item_price: i64,
    pub item_discounted_price: i64,
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: i64,
    pub user_id: i64,
    pub address: String,
    pub payment_method: String,
    pub final_price: i64,
    pub coupon: Option<String>,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemView>,
}

/// Payment status of an order before and after one bank report was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentSettlement {
    pub final_price: i64,
    pub previous: PaymentStatus,
    pub current: PaymentStatus,
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<OrderView>,
    pub total: i64,
}
