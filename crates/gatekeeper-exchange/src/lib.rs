//! 거래소 제휴(affiliate) API 연동.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 프로세스 전역에서 공유되는 토큰 버킷 rate limiter
//! - HMAC-SHA256 서명 HTTP 클라이언트
//! - Bitget 제휴 API 타입 및 `AffiliateApi` trait

pub mod bitget;
pub mod client;
pub mod error;
pub mod rate_limiter;

pub use bitget::{
    sum_volumes, AffiliateApi, ApiEnvelope, BitgetClient, CustomerInfo, CustomerVolume, SUCCESS_CODE,
};
pub use client::{Credentials, SignedClient, SignedClientConfig};
pub use error::*;
pub use rate_limiter::{RateLimiter, RateLimiterConfig, RateLimiterStats};
