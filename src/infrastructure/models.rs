use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::cart::{CartLine, CartLineView};
use crate::domain::catalog::Product;
use crate::domain::errors::DomainError;
use crate::domain::order::{OrderItemView, OrderView};
use crate::domain::payment::{BankReport, Transaction};
use crate::schema::{cart_items, offers, order_items, orders, products, transactions};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    pub price: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products)]
pub struct NewProductRow {
    pub name: String,
    pub image: Option<String>,
    pub price: i64,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            image: row.image,
            price: row.price,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = offers)]
pub struct NewOfferRow {
    pub product_id: i64,
    pub rate: i32,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = cart_items)]
#[diesel(belongs_to(ProductRow, foreign_key = product_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartItemRow {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = cart_items)]
pub struct NewCartItemRow {
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i32,
}

impl From<CartItemRow> for CartLine {
    fn from(row: CartItemRow) -> Self {
        CartLine {
            id: row.id,
            user_id: row.user_id,
            product_id: row.product_id,
            quantity: row.quantity,
        }
    }
}

impl From<(CartItemRow, ProductRow)> for CartLineView {
    fn from((item, product): (CartItemRow, ProductRow)) -> Self {
        CartLineView {
            id: item.id,
            user_id: item.user_id,
            product_id: item.product_id,
            quantity: item.quantity,
            product_name: product.name,
            product_image: product.image,
            unit_price: product.price,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: i64,
    pub user_id: i64,
    pub address: String,
    pub payment_method: String,
    pub final_price: i64,
    pub coupon: Option<String>,
    pub order_status: String,
    pub payment_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub user_id: i64,
    pub address: String,
    pub payment_method: String,
    pub final_price: i64,
    pub coupon: Option<String>,
    pub order_status: String,
    pub payment_status: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemRow {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub item_price: i64,
    pub item_discounted_price: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItemRow {
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub item_price: i64,
    pub item_discounted_price: i64,
}

impl OrderRow {
    pub fn into_view(self, items: Vec<OrderItemRow>) -> Result<OrderView, DomainError> {
        Ok(OrderView {
            id: self.id,
            user_id: self.user_id,
            address: self.address,
            payment_method: self.payment_method,
            final_price: self.final_price,
            coupon: self.coupon,
            order_status: self.order_status.parse()?,
            payment_status: self.payment_status.parse()?,
            created_at: self.created_at,
            items: items
                .into_iter()
                .map(|i| OrderItemView {
                    id: i.id,
                    product_id: i.product_id,
                    quantity: i.quantity,
                    item_price: i.item_price,
                    item_discounted_price: i.item_discounted_price,
                })
                .collect(),
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = transactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TransactionRow {
    pub id: Uuid,
    pub code: String,
    pub order_id: i64,
    pub user_id: i64,
    pub account_number: String,
    pub bank_name: String,
    pub amount: i64,
    pub gateway: Option<String>,
    pub transaction_date: Option<NaiveDateTime>,
    pub reported_account_number: Option<String>,
    pub sub_account: Option<String>,
    pub transfer_type: Option<String>,
    pub transfer_amount: Option<i64>,
    pub accumulated: Option<i64>,
    pub reference_code: Option<String>,
    pub content: Option<String>,
    pub description: Option<String>,
    pub bank_transaction_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = transactions)]
pub struct NewTransactionRow {
    pub id: Uuid,
    pub code: String,
    pub order_id: i64,
    pub user_id: i64,
    pub account_number: String,
    pub bank_name: String,
    pub amount: i64,
}

/// Bank-reported columns written by the webhook.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = transactions)]
#[diesel(treat_none_as_null = true)]
pub struct TransactionReportChangeset {
    pub gateway: Option<String>,
    pub transaction_date: Option<NaiveDateTime>,
    pub reported_account_number: Option<String>,
    pub sub_account: Option<String>,
    pub transfer_type: Option<String>,
    pub transfer_amount: Option<i64>,
    pub accumulated: Option<i64>,
    pub reference_code: Option<String>,
    pub content: Option<String>,
    pub description: Option<String>,
    pub bank_transaction_id: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

impl From<&BankReport> for TransactionReportChangeset {
    fn from(r: &BankReport) -> Self {
        TransactionReportChangeset {
            gateway: r.gateway.clone(),
            transaction_date: r.transaction_date,
            reported_account_number: r.account_number.clone(),
            sub_account: r.sub_account.clone(),
            transfer_type: r.transfer_type.clone(),
            transfer_amount: Some(r.transfer_amount),
            accumulated: r.accumulated,
            reference_code: r.reference_code.clone(),
            content: r.content.clone(),
            description: r.description.clone(),
            bank_transaction_id: r.bank_transaction_id,
            updated_at: Utc::now(),
        }
    }
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        // A transfer amount is only ever written together with the report.
        let report = row.transfer_amount.map(|transfer_amount| BankReport {
            gateway: row.gateway,
            transaction_date: row.transaction_date,
            account_number: row.reported_account_number,
            sub_account: row.sub_account,
            transfer_type: row.transfer_type,
            transfer_amount,
            accumulated: row.accumulated,
            reference_code: row.reference_code,
            content: row.content,
            description: row.description,
            bank_transaction_id: row.bank_transaction_id,
        });

        Transaction {
            id: row.id,
            code: row.code,
            order_id: row.order_id,
            user_id: row.user_id,
            account_number: row.account_number,
            bank_name: row.bank_name,
            amount: row.amount,
            report,
            created_at: row.created_at,
        }
    }
}
