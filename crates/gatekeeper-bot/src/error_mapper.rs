//! 워크플로 에러 → 사용자 응답 변환.

use crate::error::WorkflowError;
use gatekeeper_core::messages::{
    inactive_binding, ALREADY_REGISTERED_MESSAGE, BINDING_NOT_FOUND_MESSAGE,
    INTERNAL_ERROR_MESSAGE, NOTHING_TO_UPDATE_MESSAGE, SERVICE_UNAVAILABLE_MESSAGE,
    SOCIAL_ALREADY_BOUND_MESSAGE, UID_ALREADY_VERIFIED_MESSAGE, UID_NOT_FOUND_MESSAGE,
};
use gatekeeper_core::{CommandError, ErrorKind};
use gatekeeper_store::StoreError;
use tracing::{error, warn};

/// 워크플로 에러를 분류된 `CommandError` 로 변환합니다.
///
/// 내부 상세 정보는 로그에만 남기고 응답 메시지에는 포함하지 않습니다.
pub struct ErrorMapper;

impl ErrorMapper {
    pub fn map(err: &WorkflowError, uid: &str) -> CommandError {
        match err {
            WorkflowError::UidNotFound => {
                CommandError::new(ErrorKind::NotFound, UID_NOT_FOUND_MESSAGE)
            }
            WorkflowError::ServiceUnavailable(source) => {
                warn!(uid = %uid, category = source.category(), error = %source, "Exchange unavailable");
                CommandError::new(ErrorKind::ServiceUnavailable, SERVICE_UNAVAILABLE_MESSAGE)
            }
            WorkflowError::Conflict(StoreError::CustomerExists) => {
                CommandError::new(ErrorKind::Conflict, ALREADY_REGISTERED_MESSAGE)
            }
            WorkflowError::Conflict(StoreError::SocialBindingExists) => {
                CommandError::new(ErrorKind::Conflict, SOCIAL_ALREADY_BOUND_MESSAGE)
            }
            WorkflowError::Conflict(StoreError::TradingBindingExists) => {
                CommandError::new(ErrorKind::Conflict, UID_ALREADY_VERIFIED_MESSAGE)
            }
            WorkflowError::InactiveBinding => {
                CommandError::new(ErrorKind::InvalidFormat, inactive_binding(uid))
            }
            WorkflowError::NothingToUpdate => {
                CommandError::new(ErrorKind::InvalidFormat, NOTHING_TO_UPDATE_MESSAGE)
            }
            WorkflowError::BindingNotFound => {
                CommandError::new(ErrorKind::NotFound, BINDING_NOT_FOUND_MESSAGE)
            }
            other => {
                error!(uid = %uid, error = %other, "Unhandled workflow error");
                CommandError::new(ErrorKind::Internal, INTERNAL_ERROR_MESSAGE)
            }
        }
    }
}
