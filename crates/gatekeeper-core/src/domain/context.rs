//! 명령 요청자 컨텍스트.

use super::{MemberRole, SocialPlatform};
use serde::{Deserialize, Serialize};

/// 인바운드 명령마다 메신저 메타데이터로 구성되는 요청자 정보.
///
/// 영속화되지 않으며, 모든 워크플로 호출에 명시적으로 전달됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    /// 인증 대상 UID
    pub uid: String,
    /// 메신저 측 사용자(채팅) ID
    pub user_id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// 추정된 그룹 역할
    pub member_role: MemberRole,
    pub platform: SocialPlatform,
}

impl UserContext {
    /// 텔레그램 개인 채팅 요청자 컨텍스트를 생성합니다.
    pub fn telegram(uid: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            user_id: user_id.into(),
            username: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            member_role: MemberRole::Member,
            platform: SocialPlatform::Telegram,
        }
    }

    /// 표시 이름을 설정합니다.
    pub fn with_names(
        mut self,
        username: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }

    /// 멤버 역할을 설정합니다.
    pub fn with_role(mut self, role: MemberRole) -> Self {
        self.member_role = role;
        self
    }

    /// 고객 레코드에 사용할 이름. 사용자명이 없으면 이름으로 대체합니다.
    pub fn display_name(&self) -> String {
        if !self.username.is_empty() {
            return self.username.clone();
        }
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}
