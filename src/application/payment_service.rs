use uuid::Uuid;

use crate::config::PaymentConfig;
use crate::domain::errors::DomainError;
use crate::domain::order::PaymentStatus;
use crate::domain::payment::{
    extract_code, generate_code, qr_link, BankNotification, NewTransaction, QrDescriptor,
    Reconciliation,
};
use crate::domain::ports::{OrderRepository, TransactionRepository};

/// Attempts at drawing a payment code before giving up on collisions.
const MAX_CODE_ATTEMPTS: usize = 5;

/// `transferType` of money arriving on the receiving account.
const INCOMING_TRANSFER: &str = "in";

pub struct PaymentService<R, T> {
    orders: R,
    transactions: T,
    config: PaymentConfig,
}

impl<R: OrderRepository, T: TransactionRepository> PaymentService<R, T> {
    pub fn new(orders: R, transactions: T, config: PaymentConfig) -> Self {
        Self {
            orders,
            transactions,
            config,
        }
    }

    /// Checks an `Authorization: Apikey <key>` header against the configured
    /// webhook key. Everything is accepted when no key is configured.
    pub fn accepts_webhook_key(&self, authorization: Option<&str>) -> bool {
        let Some(expected) = self.config.webhook_api_key.as_deref() else {
            return true;
        };
        authorization
            .and_then(|h| h.trim().strip_prefix("Apikey "))
            .is_some_and(|key| keys_match(key.trim(), expected))
    }

    /// Issues a fresh payment code for the order and records a pending
    /// transaction. Every call yields a new, independent code.
    pub fn create_qr(&self, user_id: i64, order_id: i64, amount: i64) -> Result<QrDescriptor, DomainError> {
        if amount <= 0 {
            return Err(DomainError::invalid("amount must be positive"));
        }
        let order = self
            .orders
            .find_by_id(order_id)?
            .filter(|o| o.user_id == user_id)
            .ok_or(DomainError::NotFound("Order"))?;
        if order.payment_status == PaymentStatus::Paid {
            return Err(DomainError::Conflict(format!("order {order_id} is already paid")));
        }

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = generate_code(&self.config.code_prefix, &mut rand::thread_rng());
            let pending = NewTransaction {
                id: Uuid::new_v4(),
                code: code.clone(),
                order_id,
                user_id,
                account_number: self.config.account_number.clone(),
                bank_name: self.config.bank_name.clone(),
                amount,
            };

            match self.transactions.create(pending) {
                Ok(tx) => {
                    log::info!("payment code {} issued for order {} ({})", tx.code, order_id, amount);
                    return Ok(QrDescriptor {
                        order_id,
                        link: qr_link(
                            &self.config.qr_base_url,
                            &tx.account_number,
                            &tx.bank_name,
                            amount,
                            &tx.code,
                        ),
                        account_number: tx.account_number,
                        bank_name: tx.bank_name,
                        amount,
                        code: tx.code,
                    });
                }
                Err(DomainError::Conflict(_)) => {
                    log::warn!("payment code {} collided (attempt {})", code, attempt);
                }
                Err(e) => return Err(e),
            }
        }

        Err(DomainError::Conflict(
            "could not allocate a unique payment code".to_string(),
        ))
    }

    /// Matches a bank notification to its transaction by code, stores the
    /// report, then settles the order's payment status. Only incoming
    /// transfers are accepted.
    pub fn reconcile(&self, notification: BankNotification) -> Result<Reconciliation, DomainError> {
        let report = notification.report;
        if report.transfer_amount < 0 {
            return Err(DomainError::invalid("transferAmount must not be negative"));
        }
        if let Some(kind) = report
            .transfer_type
            .as_deref()
            .filter(|t| !t.trim().eq_ignore_ascii_case(INCOMING_TRANSFER))
        {
            return Err(DomainError::invalid(format!(
                "transferType '{kind}' cannot settle a payment"
            )));
        }
        let code = Some(notification.code.trim().to_string())
            .filter(|c| !c.is_empty())
            .or_else(|| {
                report
                    .content
                    .as_deref()
                    .and_then(|c| extract_code(&self.config.code_prefix, c))
            })
            .ok_or_else(|| DomainError::invalid("notification carries no payment code"))?;

        let tx = self.transactions.record_report(&code, &report)?;
        let settled = self
            .orders
            .reconcile_payment(tx.order_id, report.transfer_amount)?;

        if settled.previous == PaymentStatus::Paid && report.transfer_amount < settled.final_price {
            log::warn!(
                "ignoring short transfer {} on paid order {} (code {})",
                report.transfer_amount,
                tx.order_id,
                code
            );
        }

        log::info!(
            "order {} payment {} -> {} (transferred {} of {})",
            tx.order_id,
            settled.previous,
            settled.current,
            report.transfer_amount,
            settled.final_price
        );

        Ok(Reconciliation {
            order_id: tx.order_id,
            code,
            previous: settled.previous,
            current: settled.current,
        })
    }
}

/// Compares without short-circuiting on the first differing byte.
fn keys_match(given: &str, expected: &str) -> bool {
    let (given, expected) = (given.as_bytes(), expected.as_bytes());
    given.len() == expected.len()
        && given
            .iter()
            .zip(expected)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}
