//! 저장소 입력 모델.

use chrono::{DateTime, NaiveDate, Utc};
use gatekeeper_core::{
    BindingStatus, CustomerView, MemberRole, SocialPlatform, TradingPeriod, TradingPlatform,
    UserContext,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 새 소셜 바인딩 입력.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSocialBinding {
    pub platform: SocialPlatform,
    pub user_id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub member_role: MemberRole,
    pub status: BindingStatus,
}

impl NewSocialBinding {
    /// 요청자 컨텍스트로부터 활성 상태의 바인딩 입력을 생성합니다.
    pub fn from_context(ctx: &UserContext) -> Self {
        Self {
            platform: ctx.platform,
            user_id: ctx.user_id.clone(),
            username: ctx.username.clone(),
            first_name: ctx.first_name.clone(),
            last_name: ctx.last_name.clone(),
            member_role: ctx.member_role,
            status: BindingStatus::Normal,
        }
    }
}

/// 새 트레이딩 바인딩 입력.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTradingBinding {
    pub platform: TradingPlatform,
    pub uid: String,
    pub register_time: Option<DateTime<Utc>>,
}

/// 인증 완료 시 한 번에 생성되는 고객 + 두 바인딩.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVerifiedBinding {
    /// 고객 표시 이름
    pub username: String,
    pub social: NewSocialBinding,
    pub trading: NewTradingBinding,
}

/// 소셜 바인딩 연락처 필드 갱신 입력.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactUpdate {
    pub user_id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl ContactUpdate {
    pub fn from_context(ctx: &UserContext) -> Self {
        Self {
            user_id: ctx.user_id.clone(),
            username: ctx.username.clone(),
            first_name: ctx.first_name.clone(),
            last_name: ctx.last_name.clone(),
        }
    }
}

/// 거래 이력 스냅샷 입력.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTradingHistory {
    pub volume: Decimal,
    pub period: TradingPeriod,
    pub trading_date: NaiveDate,
}

/// 페이지 요청. 범위를 벗어난 값은 기본값으로 보정합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    pub fn new(page: i64, limit: i64) -> Self {
        let page = if page < 1 { 1 } else { page.min(u32::MAX as i64) as u32 };
        let limit = if limit < 1 || limit > Self::MAX_LIMIT as i64 {
            Self::DEFAULT_LIMIT
        } else {
            limit as u32
        };
        Self { page, limit }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

/// 고객 목록 페이지.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerPage {
    pub items: Vec<CustomerView>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_normalization() {
        assert_eq!(PageRequest::new(0, 0), PageRequest { page: 1, limit: 10 });
        assert_eq!(PageRequest::new(-3, 101), PageRequest { page: 1, limit: 10 });
        assert_eq!(PageRequest::new(3, 100), PageRequest { page: 3, limit: 100 });
        assert_eq!(PageRequest::new(3, 20).offset(), 40);
    }

    #[test]
    fn test_new_social_binding_from_context() {
        let ctx = UserContext::telegram("123456", "42").with_names("krabs", "Eugene", "Krabs");
        let social = NewSocialBinding::from_context(&ctx);
        assert_eq!(social.user_id, "42");
        assert_eq!(social.platform, SocialPlatform::Telegram);
        assert_eq!(social.status, BindingStatus::Normal);
        assert_eq!(social.member_role, MemberRole::Member);
    }
}
