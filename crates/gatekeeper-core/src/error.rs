//! 명령 처리 에러 타입.
//!
//! 사용자에게 그대로 전달해도 되는 분류된 에러(`CommandError`)와
//! 그 분류(`ErrorKind`)를 정의합니다. 내부 상세 정보는 이 타입에 담지 않습니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 명령 에러 분류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// 잘못된 명령 형식 또는 인자
    InvalidFormat,
    /// 거래소 또는 저장소에서 UID를 찾을 수 없음
    NotFound,
    /// 이미 바인딩된 신원
    Conflict,
    /// 외부 API / 네트워크 / 요청 한도 장애
    ServiceUnavailable,
    /// 분류되지 않은 내부 에러
    Internal,
}

impl ErrorKind {
    /// 로그 필드용 문자열을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidFormat => "invalid_format",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::ServiceUnavailable => "service_unavailable",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 사용자에게 응답할 메시지를 가진 분류된 명령 에러.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CommandError {
    /// 에러 분류
    pub kind: ErrorKind,
    /// 사용자에게 보낼 메시지
    pub message: String,
}

impl CommandError {
    /// 새 명령 에러를 생성합니다.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidFormat, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

/// 명령 처리용 Result 타입.
pub type CommandResult<T> = Result<T, CommandError>;
