use chrono::{DateTime, NaiveDateTime, Utc};
use rand::Rng;
use uuid::Uuid;

use super::errors::DomainError;
use super::order::PaymentStatus;

/// Numeric part of a payment code is always this many digits.
pub const CODE_DIGITS: usize = 7;

const CODE_SPACE: u32 = 10_000_000;

/// Format the bank uses for `transactionDate`.
pub const BANK_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub id: Uuid,
    pub code: String,
    pub order_id: i64,
    pub user_id: i64,
    pub account_number: String,
    pub bank_name: String,
    pub amount: i64,
}

/// Fields the bank reports for a transfer. Empty until the webhook fires.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BankReport {
    pub gateway: Option<String>,
    pub transaction_date: Option<NaiveDateTime>,
    pub account_number: Option<String>,
    pub sub_account: Option<String>,
    pub transfer_type: Option<String>,
    pub transfer_amount: i64,
    pub accumulated: Option<i64>,
    pub reference_code: Option<String>,
    pub content: Option<String>,
    pub description: Option<String>,
    pub bank_transaction_id: Option<i64>,
}

/// Inbound webhook payload, matched to a transaction by `code`.
#[derive(Debug, Clone)]
pub struct BankNotification {
    pub code: String,
    pub report: BankReport,
}

#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: Uuid,
    pub code: String,
    pub order_id: i64,
    pub user_id: i64,
    pub account_number: String,
    pub bank_name: String,
    pub amount: i64,
    pub report: Option<BankReport>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrDescriptor {
    pub order_id: i64,
    pub account_number: String,
    pub bank_name: String,
    pub amount: i64,
    pub code: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub order_id: i64,
    pub code: String,
    pub previous: PaymentStatus,
    pub current: PaymentStatus,
}

/// Fixed prefix followed by a zero-padded random 7-digit number.
pub fn generate_code<R: Rng + ?Sized>(prefix: &str, rng: &mut R) -> String {
    let n = rng.gen_range(0..CODE_SPACE);
    format!("{prefix}{n:0width$}", width = CODE_DIGITS)
}

pub fn qr_link(base_url: &str, account_number: &str, bank_name: &str, amount: i64, code: &str) -> String {
    format!("{base_url}?acc={account_number}&bank={bank_name}&amount={amount}&des={code}")
}

/// Finds `prefix` followed by exactly [`CODE_DIGITS`] digits in free-form
/// transfer content, as typed by the payer.
pub fn extract_code(prefix: &str, content: &str) -> Option<String> {
    if prefix.is_empty() {
        return None;
    }
    let upper = content.to_ascii_uppercase();
    let prefix = prefix.to_ascii_uppercase();
    upper.match_indices(&prefix).find_map(|(start, _)| {
        let digits: String = upper[start + prefix.len()..]
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        (digits.len() == CODE_DIGITS).then(|| format!("{prefix}{digits}"))
    })
}

pub fn parse_bank_date(raw: &str) -> Result<NaiveDateTime, DomainError> {
    NaiveDateTime::parse_from_str(raw, BANK_DATE_FORMAT)
        .map_err(|e| DomainError::invalid(format!("invalid transactionDate '{raw}': {e}")))
}
