use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::errors::DomainError;
use crate::domain::payment::{parse_bank_date, BankNotification, BankReport, QrDescriptor};
use crate::errors::AppError;

use super::auth::AuthenticatedUser;
use super::Payments;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateQrRequest {
    pub order_id: i64,
    pub amount: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QrResponse {
    pub order_id: i64,
    pub account_number: String,
    pub bank_name: String,
    pub amount: i64,
    /// Payment code the payer must put in the transfer description.
    pub description: String,
    pub link: String,
}

impl From<QrDescriptor> for QrResponse {
    fn from(qr: QrDescriptor) -> Self {
        QrResponse {
            order_id: qr.order_id,
            account_number: qr.account_number,
            bank_name: qr.bank_name,
            amount: qr.amount,
            description: qr.code,
            link: qr.link,
        }
    }
}

/// Transfer notification as posted by the bank gateway.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    /// Gateway-side transaction id.
    pub id: Option<i64>,
    pub gateway: Option<String>,
    /// `YYYY-MM-DD HH:MM:SS`
    pub transaction_date: Option<String>,
    pub account_number: Option<String>,
    pub sub_account: Option<String>,
    /// Payment code, when the gateway recognised one in the content.
    pub code: Option<String>,
    pub content: Option<String>,
    pub transfer_type: Option<String>,
    pub transfer_amount: i64,
    pub accumulated: Option<i64>,
    pub reference_code: Option<String>,
    pub description: Option<String>,
}

impl TryFrom<WebhookRequest> for BankNotification {
    type Error = DomainError;

    fn try_from(req: WebhookRequest) -> Result<Self, Self::Error> {
        let transaction_date = req
            .transaction_date
            .as_deref()
            .map(parse_bank_date)
            .transpose()?;

        Ok(BankNotification {
            code: req.code.unwrap_or_default(),
            report: BankReport {
                gateway: req.gateway,
                transaction_date,
                account_number: req.account_number,
                sub_account: req.sub_account,
                transfer_type: req.transfer_type,
                transfer_amount: req.transfer_amount,
                accumulated: req.accumulated,
                reference_code: req.reference_code,
                content: req.content,
                description: req.description,
                bank_transaction_id: req.id,
            },
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookResponse {
    pub success: bool,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /payment/qr
///
/// Issues a new payment code and QR link for one of the caller's orders.
#[utoipa::path(
    post,
    path = "/payment/qr",
    request_body = CreateQrRequest,
    params(("X-User-Id" = i64, Header, description = "Authenticated user id")),
    responses(
        (status = 201, description = "Payment target issued", body = QrResponse),
        (status = 400, description = "Invalid amount"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order already paid"),
    ),
    tag = "payments"
)]
pub async fn create_qr(
    user: AuthenticatedUser,
    payments: web::Data<Payments>,
    body: web::Json<CreateQrRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let qr = web::block(move || payments.create_qr(user.0, body.order_id, body.amount)).await??;

    Ok(HttpResponse::Created().json(QrResponse::from(qr)))
}

/// POST /payment/webhook
///
/// Receives a bank transfer notification and reconciles the order's payment
/// status against the transferred amount.
#[utoipa::path(
    post,
    path = "/payment/webhook",
    request_body = WebhookRequest,
    responses(
        (status = 200, description = "Notification processed", body = WebhookResponse),
        (status = 400, description = "Malformed report, missing code or outgoing transfer"),
        (status = 401, description = "Missing or wrong API key"),
        (status = 404, description = "Unknown payment code or order"),
    ),
    tag = "payments"
)]
pub async fn webhook(
    req: HttpRequest,
    payments: web::Data<Payments>,
    body: web::Json<WebhookRequest>,
) -> Result<HttpResponse, AppError> {
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if !payments.accepts_webhook_key(authorization) {
        return Err(AppError::Unauthorized);
    }

    let notification = BankNotification::try_from(body.into_inner())?;

    web::block(move || payments.reconcile(notification)).await??;

    Ok(HttpResponse::Ok().json(WebhookResponse { success: true }))
}
