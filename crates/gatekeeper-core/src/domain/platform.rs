//! 플랫폼 및 상태 열거형.
//!
//! 모든 열거형은 저장소에 소문자 텍스트로 기록됩니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 알 수 없는 열거형 값 파싱 에러.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("알 수 없는 {kind} 값: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// `as_str` / `FromStr` / `Display` 를 한 번에 정의합니다.
macro_rules! text_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            /// 저장용 문자열 표현을 반환합니다.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text,)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($text => Ok($ty::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// 메신저 플랫폼.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialPlatform {
    Telegram,
    Line,
}

text_enum!(SocialPlatform, "social platform", {
    Telegram => "telegram",
    Line => "line",
});

/// 거래소 플랫폼.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradingPlatform {
    Bitget,
    BingX,
}

text_enum!(TradingPlatform, "trading platform", {
    Bitget => "bitget",
    BingX => "bingx",
});

/// 소셜 바인딩 관리 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingStatus {
    #[default]
    Normal,
    Whitelisted,
    Blacklisted,
}

text_enum!(BindingStatus, "binding status", {
    Normal => "normal",
    Whitelisted => "whitelisted",
    Blacklisted => "blacklisted",
});

/// 그룹 내 멤버 역할 스냅샷.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Creator,
    Administrator,
    #[default]
    Member,
    Restricted,
    Left,
    Kicked,
    Unknown,
}

text_enum!(MemberRole, "member role", {
    Creator => "creator",
    Administrator => "administrator",
    Member => "member",
    Restricted => "restricted",
    Left => "left",
    Kicked => "kicked",
    Unknown => "unknown",
});

impl MemberRole {
    /// 사용자에게 보여줄 역할 이름을 반환합니다.
    pub fn label(&self) -> &'static str {
        match self {
            MemberRole::Creator => "소유자",
            MemberRole::Administrator => "관리자",
            MemberRole::Member => "멤버",
            MemberRole::Restricted => "제한됨",
            MemberRole::Left => "나감",
            MemberRole::Kicked => "차단됨",
            MemberRole::Unknown => "알 수 없음",
        }
    }

    /// 그룹 관리 권한(소유자/관리자)이 있는지 확인합니다.
    pub fn is_privileged(&self) -> bool {
        matches!(self, MemberRole::Creator | MemberRole::Administrator)
    }

    /// 저장값을 해석하되 알 수 없는 값은 `Unknown` 으로 취급합니다.
    pub fn from_stored(value: &str) -> Self {
        value.parse().unwrap_or(MemberRole::Unknown)
    }
}

/// 거래 이력 집계 주기.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradingPeriod {
    Daily,
    Weekly,
    Monthly,
}

text_enum!(TradingPeriod, "trading period", {
    Daily => "daily",
    Weekly => "weekly",
    Monthly => "monthly",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_role_parse_and_label() {
        assert_eq!("administrator".parse::<MemberRole>().unwrap(), MemberRole::Administrator);
        assert_eq!("CREATOR".parse::<MemberRole>().unwrap(), MemberRole::Creator);
        assert_eq!(MemberRole::from_stored("owner"), MemberRole::Unknown);
        assert_eq!(MemberRole::Member.label(), "멤버");
        assert!(MemberRole::Creator.is_privileged());
        assert!(!MemberRole::Restricted.is_privileged());
    }

    #[test]
    fn test_platform_round_trip_text() {
        assert_eq!(SocialPlatform::Telegram.as_str(), "telegram");
        assert_eq!("bingx".parse::<TradingPlatform>().unwrap(), TradingPlatform::BingX);
        let err = "kraken".parse::<TradingPlatform>().unwrap_err();
        assert_eq!(err.kind, "trading platform");
    }

    #[test]
    fn test_binding_status_default() {
        assert_eq!(BindingStatus::default(), BindingStatus::Normal);
        assert_eq!(BindingStatus::Blacklisted.to_string(), "blacklisted");
    }
}
