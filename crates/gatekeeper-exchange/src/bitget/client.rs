use super::types::{CustomerListRequest, CustomerTradeVolumeRequest};
use super::AffiliateApi;
use crate::client::{Credentials, SignedClient, SignedClientConfig};
use crate::error::ExchangeError;
use crate::rate_limiter::RateLimiter;
use async_trait::async_trait;
use gatekeeper_core::{DateRange, ExchangeConfig};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Bitget 제휴 API 클라이언트.
#[derive(Debug)]
pub struct BitgetClient {
    client: SignedClient,
    customer_list_path: String,
    customer_trade_volume_path: String,
}

impl BitgetClient {
    pub fn new(
        client: SignedClient,
        customer_list_path: impl Into<String>,
        customer_trade_volume_path: impl Into<String>,
    ) -> Self {
        Self {
            client,
            customer_list_path: customer_list_path.into(),
            customer_trade_volume_path: customer_trade_volume_path.into(),
        }
    }

    /// 설정과 공유 rate limiter로 클라이언트를 생성합니다.
    pub fn from_config(
        config: &ExchangeConfig,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, ExchangeError> {
        let client = SignedClient::new(
            SignedClientConfig::from_config(config),
            Credentials::from_config(config),
            limiter,
        )?;

        Ok(Self::new(
            client,
            &config.customer_list_path,
            &config.customer_trade_volume_path,
        ))
    }
}

#[async_trait]
impl AffiliateApi for BitgetClient {
    async fn customer_list(
        &self,
        uid: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ExchangeError> {
        info!(uid = %uid, endpoint = %self.customer_list_path, "Requesting affiliate customer list");
        self.client
            .post(&self.customer_list_path, &CustomerListRequest::new(uid), cancel)
            .await
    }

    async fn customer_trade_volume(
        &self,
        uid: &str,
        range: DateRange,
        cancel: &CancellationToken,
    ) -> Result<String, ExchangeError> {
        info!(
            uid = %uid,
            endpoint = %self.customer_trade_volume_path,
            start_ms = range.start_ms,
            end_ms = range.end_ms,
            "Requesting affiliate customer trade volume"
        );
        let body = CustomerTradeVolumeRequest::new(uid, range.start_ms, range.end_ms);
        self.client
            .post(&self.customer_trade_volume_path, &body, cancel)
            .await
    }
}
