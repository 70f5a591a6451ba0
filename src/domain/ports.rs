use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;

use super::cart::{CartLine, CartLineView, CartUpdate};
use super::catalog::Product;
use super::errors::DomainError;
use super::order::{ListResult, NewOrder, OrderItemInput, OrderStatus, OrderView, PaymentSettlement};
use super::payment::{BankReport, NewTransaction, Transaction};

#[cfg_attr(test, automock)]
pub trait ProductRepository: Send + Sync + 'static {
    fn find_by_id(&self, id: i64) -> Result<Option<Product>, DomainError>;
}

#[cfg_attr(test, automock)]
pub trait OfferRepository: Send + Sync + 'static {
    /// Rate of the offer active for `product_id` at `at`, or 0 when none is.
    fn find_offer_rate(&self, product_id: i64, at: DateTime<Utc>) -> Result<i32, DomainError>;
}

/// Cart line persistence. Every line operation is scoped to the owning user;
/// a line owned by someone else is reported as not found.
pub trait CartRepository: Send + Sync + 'static {
    fn check_if_item_is_already_added(
        &self,
        user_id: i64,
        product_id: i64,
    ) -> Result<Option<i64>, DomainError>;

    /// Inserts the line, or adds `quantity` to the existing line for the same
    /// (user, product) pair in the same statement.
    fn add_to_cart(&self, user_id: i64, product_id: i64, quantity: i32)
        -> Result<CartLine, DomainError>;

    fn update_quantity_add(&self, user_id: i64, cart_id: i64, delta: i32)
        -> Result<CartLine, DomainError>;

    /// A line driven to zero or below is deleted in the same transaction and
    /// reported as `Removed`; it is never visible at that quantity.
    fn update_quantity_less(&self, user_id: i64, cart_id: i64, delta: i32)
        -> Result<CartUpdate, DomainError>;

    /// Same collapse rule as [`CartRepository::update_quantity_less`].
    fn update_quantity(&self, user_id: i64, cart_id: i64, quantity: i32)
        -> Result<CartUpdate, DomainError>;

    /// Idempotent: removing an absent line succeeds.
    fn remove_from_cart(&self, user_id: i64, cart_id: i64) -> Result<(), DomainError>;

    /// The user's whole cart when `cart_ids` is `None`, otherwise only the
    /// listed lines. Lines with a non-positive quantity are never returned.
    fn get_cart(&self, user_id: i64, cart_ids: Option<&[i64]>) -> Result<Vec<CartLineView>, DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    /// Writes the header and every item atomically. Lines in `clear_cart_ids`
    /// are deleted from the user's cart in the same transaction.
    fn create(
        &self,
        order: NewOrder,
        items: Vec<OrderItemInput>,
        clear_cart_ids: &[i64],
    ) -> Result<OrderView, DomainError>;
    fn find_by_id(&self, id: i64) -> Result<Option<OrderView>, DomainError>;
    fn list_for_user(&self, user_id: i64, page: i64, limit: i64)
        -> Result<ListResult, DomainError>;
    fn update_order_status(&self, id: i64, status: OrderStatus) -> Result<(), DomainError>;
    /// Applies a transfer of `transferred` to the order's payment status
    /// under a row lock, so concurrent reports cannot downgrade PAID.
    fn reconcile_payment(&self, id: i64, transferred: i64) -> Result<PaymentSettlement, DomainError>;
}

#[cfg_attr(test, automock)]
pub trait TransactionRepository: Send + Sync + 'static {
    /// Fails with `Conflict` when the code is already taken.
    fn create(&self, tx: NewTransaction) -> Result<Transaction, DomainError>;
    /// Stores the bank report on the transaction matched by `code`.
    fn record_report(&self, code: &str, report: &BankReport) -> Result<Transaction, DomainError>;
}
