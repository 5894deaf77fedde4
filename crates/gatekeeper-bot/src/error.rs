//! 봇 계층 에러 타입.
//!
//! - `WorkflowError` - 워크플로 결과 분류 (사용자 응답으로 변환됨)
//! - `MessengerError` - 메신저 API 호출 실패
//! - `HandlerError` - 메시지 핸들러 실패
//! - `DispatchError` - 디스패처가 호출자에게 돌려주는 실패

use gatekeeper_core::CommandError;
use gatekeeper_exchange::ExchangeError;
use gatekeeper_store::StoreError;
use thiserror::Error;

/// 워크플로 에러.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// 거래소에 해당 UID가 없음
    #[error("UID not found on exchange")]
    UidNotFound,

    /// 거래소 호출 또는 응답 해석 실패
    #[error("Exchange unavailable: {0}")]
    ServiceUnavailable(#[source] ExchangeError),

    /// 고유 제약 충돌 (`CustomerExists` / `SocialBindingExists` / `TradingBindingExists`)
    #[error("Binding conflict: {0}")]
    Conflict(#[source] StoreError),

    /// 소셜 바인딩이 비활성 상태
    #[error("Social binding is inactive")]
    InactiveBinding,

    /// 변경할 내용 없음
    #[error("Nothing to update")]
    NothingToUpdate,

    /// UID에 대한 바인딩 없음
    #[error("Binding not found")]
    BindingNotFound,

    /// 그 밖의 저장소 에러
    #[error("Store error: {0}")]
    Store(#[source] StoreError),
}

impl From<ExchangeError> for WorkflowError {
    fn from(err: ExchangeError) -> Self {
        WorkflowError::ServiceUnavailable(err)
    }
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        if err.is_conflict() {
            WorkflowError::Conflict(err)
        } else {
            WorkflowError::Store(err)
        }
    }
}

/// 메신저 API 에러.
#[derive(Debug, Error)]
pub enum MessengerError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// API가 `ok: false` 로 응답
    #[error("{method} failed: {description}")]
    Api {
        method: &'static str,
        description: String,
    },

    #[error("Decode error: {0}")]
    Decode(String),
}

/// 메시지 핸들러 에러.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// 사용자에게 응답할 분류된 에러
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Messenger error: {0}")]
    Messenger(#[from] MessengerError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// 디스패처 에러.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Handler failed: {0}")]
    Handler(#[source] HandlerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_conflicts_become_workflow_conflicts() {
        let err: WorkflowError = StoreError::TradingBindingExists.into();
        assert!(matches!(
            err,
            WorkflowError::Conflict(StoreError::TradingBindingExists)
        ));

        let err: WorkflowError = StoreError::QueryError("boom".to_string()).into();
        assert!(matches!(err, WorkflowError::Store(_)));
    }

    #[test]
    fn test_command_error_passes_through_handler_error() {
        let err: HandlerError = CommandError::not_found("없음").into();
        assert_eq!(err.to_string(), "없음");
    }
}
