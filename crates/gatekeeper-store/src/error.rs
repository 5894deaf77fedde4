//! 저장소 에러 타입.

use thiserror::Error;
use uuid::Uuid;

/// 저장소 관련 에러.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 고객 레코드 중복
    #[error("Customer already exists")]
    CustomerExists,

    /// 소셜 계정이 이미 다른 고객에 바인딩됨
    #[error("Social binding already exists")]
    SocialBindingExists,

    /// 거래소 UID가 이미 바인딩됨
    #[error("Trading binding already exists")]
    TradingBindingExists,

    /// 레코드를 찾을 수 없음
    #[error("Record not found: {0}")]
    NotFound(String),

    /// 일부 고객 비활성화 실패
    #[error("Failed to deactivate {} customer(s)", failed.len())]
    PartialDeactivation { failed: Vec<Uuid> },

    /// 데이터베이스 연결 오류
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// 중복 레코드 (어떤 바인딩인지 특정되지 않은 경우)
    #[error("Duplicate record: {0}")]
    DuplicateError(String),

    /// 쿼리 실행 오류
    #[error("Query error: {0}")]
    QueryError(String),

    /// 저장된 값을 해석할 수 없음
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl StoreError {
    /// 바인딩 충돌 에러인지 확인합니다.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StoreError::CustomerExists
                | StoreError::SocialBindingExists
                | StoreError::TradingBindingExists
        )
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("Row not found".to_string()),
            sqlx::Error::PoolTimedOut => StoreError::ConnectionError("pool timed out".to_string()),
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    // PostgreSQL 고유 제약 조건 위반 (23505)
                    StoreError::DuplicateError(db_err.message().to_string())
                } else {
                    StoreError::QueryError(db_err.message().to_string())
                }
            }
            _ => StoreError::QueryError(err.to_string()),
        }
    }
}

/// insert 실패를 변환합니다. 고유 제약 위반은 `conflict` 로 대체합니다.
pub(crate) fn conflict_or(err: sqlx::Error, conflict: StoreError) -> StoreError {
    match StoreError::from(err) {
        StoreError::DuplicateError(_) => conflict,
        other => other,
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: StoreError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert!(!err.is_conflict());
    }

    #[test]
    fn test_conflict_or_keeps_non_duplicate_errors() {
        let err = conflict_or(sqlx::Error::PoolTimedOut, StoreError::TradingBindingExists);
        assert!(matches!(err, StoreError::ConnectionError(_)));
        assert!(StoreError::TradingBindingExists.is_conflict());
    }
}
