// HTTP surface tests against the in-memory store

use actix_web::{http::StatusCode, test, web, App};
use ledger_engine::{AccountType, MemoryLedger, Metrics, NewAccount, PostingEngine};
use ledger_service::handlers::configure_routes;
use serde_json::{json, Value};
use std::sync::Arc;

fn engine() -> web::Data<PostingEngine<MemoryLedger>> {
    let store = MemoryLedger::new();
    store
        .open_account(NewAccount::new("1001", "Cash", AccountType::Asset, "CNY"))
        .unwrap();
    store
        .open_account(NewAccount::new("4001", "Fee Income", AccountType::Income, "CNY"))
        .unwrap();

    web::Data::new(
        PostingEngine::new(Arc::new(store)).with_metrics(Arc::new(Metrics::new().unwrap())),
    )
}

fn transfer(reference_id: &str, debit: &str, credit: &str) -> Value {
    json!({
        "reference_id": reference_id,
        "tx_type": "TRANSFER",
        "description": "test transfer",
        "postings": [
            {"account_code": "1001", "direction": "D", "amount": debit},
            {"account_code": "4001", "direction": "C", "amount": credit}
        ]
    })
}

fn post(body: &Value) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/v1/ledger/transactions")
        .set_json(body)
}

#[actix_web::test]
async fn test_post_transaction_success() {
    let engine = engine();
    let app = test::init_service(
        App::new()
            .app_data(engine.clone())
            .configure(configure_routes::<MemoryLedger>),
    )
    .await;

    let req = post(&transfer("tx-1", "50.00", "50.00")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Transaction posted successfully");
    assert_eq!(body["reference_id"], "tx-1");
    assert!(body["tx_id"].as_i64().is_some());
    assert!(body["posted_at"].is_string());

    let req = test::TestRequest::get()
        .uri("/api/v1/ledger/accounts/1001")
        .to_request();
    let account: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(account["balance"], "50.00");
    assert_eq!(account["version"], 2);

    let req = test::TestRequest::get()
        .uri("/api/v1/ledger/accounts/4001")
        .to_request();
    let account: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(account["balance"], "50.00");
    assert_eq!(account["version"], 2);
}

#[actix_web::test]
async fn test_error_statuses() {
    let engine = engine();
    let app = test::init_service(
        App::new()
            .app_data(engine.clone())
            .configure(configure_routes::<MemoryLedger>),
    )
    .await;

    let cases = [
        (transfer("tx-a", "50.00", "49.99"), StatusCode::UNPROCESSABLE_ENTITY, "unbalanced"),
        (transfer("tx-b", "-5.00", "5.00"), StatusCode::BAD_REQUEST, "invalid_amount"),
        (transfer("tx-c", "abc", "5.00"), StatusCode::BAD_REQUEST, "invalid_amount"),
        (
            transfer("tx-g", "12345678901234567.00", "12345678901234567.00"),
            StatusCode::BAD_REQUEST,
            "invalid_amount",
        ),
        (
            json!({
                "reference_id": "tx-d",
                "tx_type": "TRANSFER",
                "postings": [
                    {"account_code": "1001", "direction": "X", "amount": "1.00"},
                    {"account_code": "4001", "direction": "C", "amount": "1.00"}
                ]
            }),
            StatusCode::BAD_REQUEST,
            "invalid_direction",
        ),
        (
            json!({
                "reference_id": "tx-e",
                "tx_type": "TRANSFER",
                "postings": [
                    {"account_code": "1001", "direction": "D", "amount": "1.00"},
                    {"account_code": "9999", "direction": "C", "amount": "1.00"}
                ]
            }),
            StatusCode::NOT_FOUND,
            "account_not_found",
        ),
        (
            json!({
                "reference_id": "tx-f",
                "tx_type": "TRANSFER",
                "postings": [{"account_code": "1001", "direction": "D", "amount": "1.00"}]
            }),
            StatusCode::BAD_REQUEST,
            "invalid_request",
        ),
    ];

    for (body, status, kind) in cases {
        let resp = test::call_service(&app, post(&body).to_request()).await;
        assert_eq!(resp.status(), status, "{}", body);
        let error: Value = test::read_body_json(resp).await;
        assert_eq!(error["error"]["type"], kind);
        assert_eq!(error["error"]["code"], status.as_u16());
    }

    // Nothing was applied
    let account = engine.account("1001").await.unwrap();
    assert!(account.balance.is_zero());
    assert_eq!(account.version, 1);
    assert_eq!(engine.store().transaction_count(), 0);
}

#[actix_web::test]
async fn test_duplicate_reference_is_conflict() {
    let engine = engine();
    let app = test::init_service(
        App::new()
            .app_data(engine.clone())
            .configure(configure_routes::<MemoryLedger>),
    )
    .await;

    let body = transfer("tx-1", "10.00", "10.00");
    let first = test::call_service(&app, post(&body).to_request()).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = test::call_service(&app, post(&body).to_request()).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let error: Value = test::read_body_json(second).await;
    assert_eq!(error["error"]["type"], "duplicate_transaction");

    assert_eq!(engine.store().transaction_count(), 1);
}

#[actix_web::test]
async fn test_malformed_body_is_bad_request() {
    let engine = engine();
    let app = test::init_service(
        App::new()
            .app_data(engine.clone())
            .configure(configure_routes::<MemoryLedger>),
    )
    .await;

    // Amounts must be strings
    let body = json!({
        "reference_id": "tx-1",
        "tx_type": "TRANSFER",
        "postings": [
            {"account_code": "1001", "direction": "D", "amount": 50.0},
            {"account_code": "4001", "direction": "C", "amount": 50.0}
        ]
    });
    let resp = test::call_service(&app, post(&body).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let error: Value = test::read_body_json(resp).await;
    assert_eq!(error["error"]["type"], "validation_error");
}

#[actix_web::test]
async fn test_read_endpoints() {
    let engine = engine();
    let app = test::init_service(
        App::new()
            .app_data(engine.clone())
            .configure(configure_routes::<MemoryLedger>),
    )
    .await;

    let req = post(&transfer("tx-1", "12.3400", "12.34")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/v1/ledger/transactions/tx-1")
        .to_request();
    let tx: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(tx["reference_id"], "tx-1");
    assert_eq!(tx["description"], "test transfer");
    assert_eq!(tx["postings"].as_array().map(Vec::len), Some(2));
    assert_eq!(tx["postings"][0]["direction"], "D");
    assert_eq!(tx["postings"][0]["amount"], "12.3400");

    let req = test::TestRequest::get()
        .uri("/api/v1/ledger/transactions/missing")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri("/api/v1/ledger/accounts")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["accounts"][0]["code"], "1001");

    let req = test::TestRequest::get()
        .uri("/api/v1/ledger/accounts/missing")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_health_and_metrics() {
    let engine = engine();
    let app = test::init_service(
        App::new()
            .app_data(engine.clone())
            .configure(configure_routes::<MemoryLedger>),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "ledger-service");

    test::call_service(&app, post(&transfer("tx-1", "1.00", "1.00")).to_request()).await;
    test::call_service(&app, post(&transfer("tx-2", "1.00", "2.00")).to_request()).await;

    let req = test::TestRequest::get().uri("/metrics").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let text = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(text.contains("ledger_transactions_posted_total 1"));
    assert!(text.contains(r#"ledger_transactions_rejected_total{kind="unbalanced"} 1"#));
}
