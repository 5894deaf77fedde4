//! 고객 및 바인딩 엔티티.
//!
//! 이 모듈은 영속화되는 엔티티를 정의합니다:
//! - `Customer` - 메신저 신원과 거래소 신원을 묶는 루트 레코드
//! - `SocialBinding` - 메신저 계정 연결
//! - `TradingBinding` - 거래소 UID 연결
//! - `TradingHistory` - 기간별 거래량 스냅샷
//! - `CustomerView` - 조회용 조인 모델

use super::{BindingStatus, MemberRole, SocialPlatform, TradingPeriod, TradingPlatform};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 고객 루트 레코드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// 새 ID로 고객을 생성합니다.
    pub fn new(username: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// 고객과 메신저 계정의 연결.
///
/// (customer_id, platform) 과 (platform, user_id) 가 각각 유일합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialBinding {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub platform: SocialPlatform,
    /// 메신저 측 사용자 ID
    pub user_id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub status: BindingStatus,
    /// 바인딩 시점의 그룹 역할
    pub member_role: MemberRole,
    /// 소프트 비활성화 시각
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deactivated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 고객과 거래소 UID의 연결. UID는 전역적으로 유일합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingBinding {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub platform: TradingPlatform,
    pub uid: String,
    /// 거래소 가입 시각
    #[serde(skip_serializing_if = "Option::is_none")]
    pub register_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 기간별 거래량 스냅샷.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingHistory {
    pub id: Uuid,
    pub binding_id: Uuid,
    pub volume: Decimal,
    pub period: TradingPeriod,
    pub trading_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// 고객 / 소셜 바인딩 / 트레이딩 바인딩 조인 뷰.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerView {
    pub customer: Customer,
    pub social: SocialBinding,
    pub trading: TradingBinding,
}

impl CustomerView {
    /// 바인딩된 UID를 반환합니다.
    pub fn uid(&self) -> &str {
        &self.trading.uid
    }

    /// 활성 상태인 소셜 바인딩인지 확인합니다.
    pub fn is_active(&self) -> bool {
        self.social.is_active
    }
}
