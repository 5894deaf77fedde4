//! Bitget 제휴 클라이언트 통합 테스트 (mockito HTTP 서버 사용).

use gatekeeper_core::DateRange;
use gatekeeper_exchange::{
    AffiliateApi, BitgetClient, Credentials, ExchangeError, RateLimiter, SignedClient,
    SignedClientConfig,
};
use mockito::Matcher;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn client_for(server: &mockito::Server, limiter: Arc<RateLimiter>) -> BitgetClient {
    let signed = SignedClient::new(
        SignedClientConfig::new(server.url()),
        Credentials::new("test-key", "test-secret", "test-pass"),
        limiter,
    )
    .unwrap();
    BitgetClient::new(signed, "/customerList", "/customerTradeVolume")
}

#[tokio::test]
async fn test_customer_list_sends_signed_request() {
    let mut server = mockito::Server::new_async().await;
    let body = r#"{"code":"00000","msg":"success","data":[{"uid":"123456","registerTime":"1700000000000"}]}"#;

    let mock = server
        .mock("POST", "/customerList")
        .match_header("ACCESS-KEY", "test-key")
        .match_header("ACCESS-PASSPHRASE", "test-pass")
        .match_header("ACCESS-TIMESTAMP", Matcher::Regex(r"^\d{13}$".to_string()))
        .match_header("ACCESS-SIGN", Matcher::Regex(r"^[A-Za-z0-9+/]{43}=$".to_string()))
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(serde_json::json!({
            "uid": "123456",
            "pageNo": "1",
            "pageSize": "100"
        })))
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let limiter = Arc::new(RateLimiter::with_defaults());
    let client = client_for(&server, limiter.clone());

    let response = client
        .customer_list("123456", &CancellationToken::new())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response, body);
    assert_eq!(limiter.stats().total_requests, 1);
    assert_eq!(limiter.stats().total_errors, 0);
}

#[tokio::test]
async fn test_trade_volume_sends_date_range() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/customerTradeVolume")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "uid": "123456",
            "startTime": "1709222400000",
            "endTime": "1710475200000"
        })))
        .with_status(200)
        .with_body(r#"{"code":"00000","msg":"success","data":[]}"#)
        .create_async()
        .await;

    let client = client_for(&server, Arc::new(RateLimiter::with_defaults()));
    let range = DateRange {
        start_ms: 1_709_222_400_000,
        end_ms: 1_710_475_200_000,
    };

    client
        .customer_trade_volume("123456", range, &CancellationToken::new())
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_http_error_status_is_reported() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/customerList")
        .with_status(429)
        .with_body("too many requests")
        .create_async()
        .await;

    let limiter = Arc::new(RateLimiter::with_defaults());
    let client = client_for(&server, limiter.clone());

    let err = client
        .customer_list("123456", &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        ExchangeError::HttpStatus { status, body } => {
            assert_eq!(status, 429);
            assert_eq!(body, "too many requests");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(limiter.stats().total_errors, 1);
}

#[tokio::test]
async fn test_cancelled_request_never_reaches_server() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/customerList")
        .expect(0)
        .create_async()
        .await;

    let client = client_for(&server, Arc::new(RateLimiter::with_defaults()));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = client.customer_list("123456", &cancel).await.unwrap_err();

    assert!(matches!(err, ExchangeError::RateLimiterCancelled));
    mock.assert_async().await;
}
