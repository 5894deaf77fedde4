//! # Gatekeeper Bot
//!
//! 텔레그램 커뮤니티 멤버십 인증 봇.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 인바운드 메시지 디스패치 미들웨어 (핸들러 패닉 격리, 에러 응답 변환)
//! - 명령 인자 검증
//! - 인증 / 거래량 / 계정 변경 / 상태 조회 워크플로
//! - 그룹 콘텐츠 필터
//! - 메신저 추상화와 Telegram Bot API 어댑터
//! - 관리자 서비스 (고객 관리, 메시지 동시 전송)

pub mod admin;
pub mod commands;
pub mod dispatch;
pub mod error;
pub mod error_mapper;
pub mod group_filter;
pub mod messenger;
pub mod telegram;
pub mod validator;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use commands::{BotCommand, PrivateCommandHandler};
pub use dispatch::{ChatKind, HandlerOutcome, InboundMessage, MessageDispatcher, MessageHandler};
pub use error::{DispatchError, HandlerError, MessengerError, WorkflowError};
pub use error_mapper::ErrorMapper;
pub use group_filter::{FilterOutcome, GroupContentFilter, GroupFilterConfig};
pub use messenger::{deliver_all, DeliveryReport, MessageRef, Messenger, Outgoing};
pub use telegram::{TelegramMessenger, TelegramPoller};
pub use validator::CommandValidator;
