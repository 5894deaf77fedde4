//! Bitget 제휴(affiliate) API.

mod client;
mod types;

pub use client::BitgetClient;
pub use types::*;

use crate::error::ExchangeError;
use async_trait::async_trait;
use gatekeeper_core::DateRange;
use tokio_util::sync::CancellationToken;

/// 제휴 고객 조회 API.
///
/// 응답 본문을 그대로 반환하며, 봉투(envelope) 해석은 호출자가 합니다.
#[async_trait]
pub trait AffiliateApi: Send + Sync {
    /// UID로 제휴 고객 목록을 조회합니다.
    async fn customer_list(
        &self,
        uid: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ExchangeError>;

    /// UID의 기간 거래량 목록을 조회합니다.
    async fn customer_trade_volume(
        &self,
        uid: &str,
        range: DateRange,
        cancel: &CancellationToken,
    ) -> Result<String, ExchangeError>;
}
