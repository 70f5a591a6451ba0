use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::payment::{BankReport, NewTransaction, Transaction};
use crate::domain::ports::TransactionRepository;
use crate::schema::transactions;

use super::models::{NewTransactionRow, TransactionReportChangeset, TransactionRow};

#[derive(Clone)]
pub struct DieselTransactionRepository {
    pool: DbPool,
}

impl DieselTransactionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl TransactionRepository for DieselTransactionRepository {
    fn create(&self, tx: NewTransaction) -> Result<Transaction, DomainError> {
        let mut conn = self.pool.get()?;

        let row = diesel::insert_into(transactions::table)
            .values(&NewTransactionRow {
                id: tx.id,
                code: tx.code,
                order_id: tx.order_id,
                user_id: tx.user_id,
                account_number: tx.account_number,
                bank_name: tx.bank_name,
                amount: tx.amount,
            })
            .returning(TransactionRow::as_returning())
            .get_result(&mut conn)?;

        Ok(row.into())
    }

    fn record_report(&self, code: &str, report: &BankReport) -> Result<Transaction, DomainError> {
        let mut conn = self.pool.get()?;

        let row = diesel::update(transactions::table.filter(transactions::code.eq(code)))
            .set(&TransactionReportChangeset::from(report))
            .returning(TransactionRow::as_returning())
            .get_result(&mut conn)
            .optional()?;

        row.map(Transaction::from)
            .ok_or(DomainError::NotFound("Transaction"))
    }
}
