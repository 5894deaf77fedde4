//! # Gatekeeper Core
//!
//! 커뮤니티 멤버십 인증 봇의 핵심 도메인 모델 및 공통 인프라를 제공합니다.
//!
//! 이 크레이트는 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 고객 / 소셜 바인딩 / 트레이딩 바인딩 도메인 모델
//! - 명령 에러 분류 체계
//! - 사용자 응답 메시지 템플릿
//! - 설정 관리
//! - 로깅 인프라
//! - 시간대 기반 조회 구간 계산

pub mod calendar;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod messages;

pub use calendar::*;
pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
