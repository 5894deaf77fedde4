//! 관리자 서비스 계층.
//!
//! HTTP 등 외부 인터페이스는 이 계층을 호출하기만 합니다.

mod broadcast;
mod customers;

pub use broadcast::BroadcastService;
pub use customers::CustomerService;

use gatekeeper_store::StoreError;
use thiserror::Error;
use uuid::Uuid;

/// 관리자 서비스 에러.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Empty request: {0}")]
    EmptyRequest(&'static str),

    /// 일부 고객 비활성화 실패
    #[error("Failed to deactivate {} customer(s)", failed.len())]
    PartialDeactivation { failed: Vec<Uuid> },

    /// 일부 수신자에게 전송 실패
    #[error("Failed to deliver to {} chat(s)", failed.len())]
    PartialDelivery { failed: Vec<i64> },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type AdminResult<T> = Result<T, AdminError>;
