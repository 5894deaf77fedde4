//! HMAC-SHA256 서명 HTTP 클라이언트.
//!
//! 모든 요청은 공유 rate limiter에서 토큰을 획득한 뒤 전송됩니다.
//! 서명 대상 문자열: `timestamp + METHOD + path + query + body`.

use crate::error::ExchangeError;
use crate::rate_limiter::RateLimiter;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use gatekeeper_core::ExchangeConfig;
use hmac::{Hmac, Mac};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use sha2::Sha256;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

const HEADER_ACCESS_KEY: &str = "ACCESS-KEY";
const HEADER_ACCESS_SIGN: &str = "ACCESS-SIGN";
const HEADER_ACCESS_TIMESTAMP: &str = "ACCESS-TIMESTAMP";
const HEADER_ACCESS_PASSPHRASE: &str = "ACCESS-PASSPHRASE";
const HEADER_LOCALE: &str = "locale";

/// 에러 로그에 남길 응답 본문 최대 길이.
const MAX_ERROR_BODY: usize = 512;

// ============================================================================
// 설정
// ============================================================================

/// API 자격증명.
pub struct Credentials {
    pub api_key: String,
    secret_key: SecretString,
    passphrase: SecretString,
}

impl Credentials {
    pub fn new(
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
        passphrase: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: SecretString::new(secret_key.into().into_boxed_str()),
            passphrase: SecretString::new(passphrase.into().into_boxed_str()),
        }
    }

    pub fn from_config(config: &ExchangeConfig) -> Self {
        Self::new(&config.api_key, &config.secret_key, &config.passphrase)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"***REDACTED***")
            .field("secret_key", &"***REDACTED***")
            .field("passphrase", &"***REDACTED***")
            .finish()
    }
}

/// 서명 클라이언트 설정.
#[derive(Debug, Clone)]
pub struct SignedClientConfig {
    /// REST API 기본 URL (경로 앞부분)
    pub base_url: String,
    /// 요청 타임아웃
    pub timeout: Duration,
}

impl SignedClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_config(config: &ExchangeConfig) -> Self {
        Self::new(&config.base_url).with_timeout(Duration::from_secs(config.request_timeout_secs))
    }
}

// ============================================================================
// 클라이언트
// ============================================================================

/// rate limit 이 적용된 서명 POST 클라이언트.
#[derive(Debug)]
pub struct SignedClient {
    http: Client,
    config: SignedClientConfig,
    credentials: Credentials,
    limiter: Arc<RateLimiter>,
}

impl SignedClient {
    pub fn new(
        config: SignedClientConfig,
        credentials: Credentials,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, ExchangeError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ExchangeError::NetworkError(e.to_string()))?;

        Ok(Self {
            http,
            config,
            credentials,
            limiter,
        })
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// 요청 서명을 생성합니다 (base64 인코딩된 HMAC-SHA256).
    pub fn sign(
        &self,
        timestamp: &str,
        method: &str,
        path: &str,
        query: &str,
        body: &str,
    ) -> Result<String, ExchangeError> {
        sign_payload(
            self.credentials.secret_key.expose_secret(),
            timestamp,
            method,
            path,
            query,
            body,
        )
    }

    /// 서명된 POST 요청을 보내고 응답 본문을 그대로 반환합니다.
    pub async fn post<B>(
        &self,
        path: &str,
        body: &B,
        cancel: &CancellationToken,
    ) -> Result<String, ExchangeError>
    where
        B: Serialize + ?Sized,
    {
        self.limiter.acquire(cancel).await?;

        let started = Instant::now();
        let result = self.send_signed(path, body, cancel).await;
        let elapsed = started.elapsed();

        self.limiter.record_result(result.is_ok());

        let status = match &result {
            Ok((status, _)) => *status,
            Err(ExchangeError::HttpStatus { status, .. }) => *status,
            Err(_) => 0,
        };
        record_call(path, status, elapsed, result.as_ref().err());

        result.map(|(_, body)| body)
    }

    async fn send_signed<B>(
        &self,
        path: &str,
        body: &B,
        cancel: &CancellationToken,
    ) -> Result<(u16, String), ExchangeError>
    where
        B: Serialize + ?Sized,
    {
        let payload = serde_json::to_string(body)?;
        let timestamp = chrono::Utc::now().timestamp_millis().to_string();
        let signature = self.sign(&timestamp, "POST", path, "", &payload)?;

        let request = self
            .http
            .post(format!("{}{}", self.config.base_url, path))
            .header(HEADER_ACCESS_KEY, self.credentials.api_key.as_str())
            .header(HEADER_ACCESS_SIGN, signature)
            .header(HEADER_ACCESS_TIMESTAMP, timestamp)
            .header(
                HEADER_ACCESS_PASSPHRASE,
                self.credentials.passphrase.expose_secret(),
            )
            .header(CONTENT_TYPE, "application/json")
            .header(HEADER_LOCALE, "en-US")
            .body(payload)
            .send();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ExchangeError::Cancelled),
            response = request => response?,
        };

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let mut body = text;
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(ExchangeError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok((status.as_u16(), text))
    }
}

/// 비밀키로 `timestamp + method + path + query + body` 를 서명합니다.
pub fn sign_payload(
    secret: &str,
    timestamp: &str,
    method: &str,
    path: &str,
    query: &str,
    body: &str,
) -> Result<String, ExchangeError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ExchangeError::SigningError(e.to_string()))?;
    mac.update(timestamp.as_bytes());
    mac.update(method.to_uppercase().as_bytes());
    mac.update(path.as_bytes());
    mac.update(query.as_bytes());
    mac.update(body.as_bytes());

    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

fn record_call(path: &str, status: u16, elapsed: Duration, error: Option<&ExchangeError>) {
    let outcome = match error {
        None => "success",
        Some(err) => err.category(),
    };

    metrics::counter!(
        "exchange_requests_total",
        "path" => path.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("exchange_request_duration_seconds", "path" => path.to_string())
        .record(elapsed.as_secs_f64());

    match error {
        None => debug!(
            path = %path,
            status,
            elapsed_ms = elapsed.as_millis() as u64,
            "Exchange API call completed"
        ),
        Some(err) => warn!(
            path = %path,
            status,
            elapsed_ms = elapsed.as_millis() as u64,
            error = %err,
            "Exchange API call failed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_payload_is_deterministic_base64() {
        let a = sign_payload("secret", "1700000000000", "POST", "/customerList", "", "{}").unwrap();
        let b = sign_payload("secret", "1700000000000", "post", "/customerList", "", "{}").unwrap();
        assert_eq!(a, b);
        // SHA-256 출력 32바이트 → base64 44자
        assert_eq!(a.len(), 44);
        assert!(BASE64.decode(&a).is_ok());

        let other = sign_payload("secret", "1700000000001", "POST", "/customerList", "", "{}").unwrap();
        assert_ne!(a, other);
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let creds = Credentials::new("key-123", "secret-456", "pass-789");
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("key-123"));
        assert!(!rendered.contains("secret-456"));
        assert!(!rendered.contains("pass-789"));
    }

    #[test]
    fn test_config_trims_trailing_slash() {
        let config = SignedClientConfig::new("https://api.example.com/agent/");
        assert_eq!(config.base_url, "https://api.example.com/agent");
    }
}
