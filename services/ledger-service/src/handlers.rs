use crate::errors::ApiError;
use crate::models::{PostTransactionReq, PostTransactionResp};
use actix_web::{web, HttpResponse};
use ledger_engine::{LedgerStore, PostingEngine};
use serde_json::json;

/// Health check endpoint
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "ledger-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Post a double-entry transaction
pub async fn post_transaction<S: LedgerStore>(
    engine: web::Data<PostingEngine<S>>,
    request: web::Json<PostTransactionReq>,
) -> Result<HttpResponse, ApiError> {
    let tx = engine.post_transaction(request.into_inner().into()).await?;
    Ok(HttpResponse::Ok().json(PostTransactionResp::from(&tx)))
}

/// Transaction with its postings
pub async fn get_transaction<S: LedgerStore>(
    engine: web::Data<PostingEngine<S>>,
    reference_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let tx = engine.transaction(&reference_id).await?;
    Ok(HttpResponse::Ok().json(tx))
}

/// All accounts ordered by code
pub async fn list_accounts<S: LedgerStore>(
    engine: web::Data<PostingEngine<S>>,
) -> Result<HttpResponse, ApiError> {
    let accounts = engine.accounts().await?;
    Ok(HttpResponse::Ok().json(json!({
        "count": accounts.len(),
        "accounts": accounts
    })))
}

/// Single account with balance and version
pub async fn get_account<S: LedgerStore>(
    engine: web::Data<PostingEngine<S>>,
    code: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let account = engine.account(&code).await?;
    Ok(HttpResponse::Ok().json(account))
}

/// Prometheus metrics endpoint
pub async fn metrics_endpoint<S: LedgerStore>(
    engine: web::Data<PostingEngine<S>>,
) -> Result<HttpResponse, ApiError> {
    let Some(metrics) = engine.metrics() else {
        return Ok(HttpResponse::NotFound().json(json!({ "error": "Metrics are disabled" })));
    };

    let body = metrics
        .gather_text()
        .map_err(|e| ApiError::Internal(format!("Failed to gather metrics: {}", e)))?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body))
}

/// Configure routes
pub fn configure_routes<S: LedgerStore>(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::Validation(err.to_string()).into()),
    )
    .service(
        web::scope("/api/v1/ledger")
            .route("/transactions", web::post().to(post_transaction::<S>))
            .route(
                "/transactions/{reference_id}",
                web::get().to(get_transaction::<S>),
            )
            .route("/accounts", web::get().to(list_accounts::<S>))
            .route("/accounts/{code}", web::get().to(get_account::<S>)),
    )
    .route("/metrics", web::get().to(metrics_endpoint::<S>))
    .route("/health", web::get().to(health_check));
}
