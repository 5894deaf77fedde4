//! 인바운드 메시지 디스패치 미들웨어.
//!
//! 모든 핸들러는 `MessageDispatcher` 를 통해서만 실행됩니다:
//! 1. 구조화된 필드로 수신 로그를 남기고
//! 2. 채팅 종류에 따라 핸들러를 고른 뒤
//! 3. 핸들러를 별도 태스크로 실행해 패닉이 디스패처로 번지지 않게 하고
//! 4. 결과(`HandlerOutcome`)에 따라 응답과 로그를 처리합니다.

use crate::error::{DispatchError, HandlerError};
use crate::messenger::Messenger;
use async_trait::async_trait;
use gatekeeper_core::messages::INTERNAL_ERROR_MESSAGE;
use gatekeeper_core::CommandError;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// 채팅 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatKind::Private => "private",
            ChatKind::Group => "group",
            ChatKind::Supergroup => "supergroup",
            ChatKind::Channel => "channel",
        }
    }
}

impl fmt::Display for ChatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 메시지 발신자.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sender {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl Sender {
    /// 경고 메시지에 쓸 호칭. 사용자명이 없으면 이름을 씁니다.
    pub fn mention(&self) -> &str {
        if self.username.is_empty() {
            &self.first_name
        } else {
            &self.username
        }
    }
}

/// 플랫폼 독립적인 인바운드 메시지.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub chat_id: i64,
    pub chat_kind: ChatKind,
    pub message_id: i32,
    /// 포럼 토픽(스레드) ID
    pub thread_id: Option<i32>,
    pub sender: Option<Sender>,
    /// 본문. 텍스트가 없는 메시지는 빈 문자열
    pub text: String,
}

/// 메시지 핸들러.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// 메시지를 처리합니다.
    ///
    /// `HandlerError::Command` 는 사용자에게 그대로 응답되고,
    /// 그 밖의 에러는 디스패처 호출자에게 전달됩니다.
    async fn handle(
        &self,
        message: InboundMessage,
        cancel: CancellationToken,
    ) -> Result<(), HandlerError>;
}

/// 핸들러 실행 결과.
#[derive(Debug)]
pub enum HandlerOutcome {
    Completed,
    /// 사용자에게 응답할 분류된 에러
    Rejected(CommandError),
    /// 예상하지 못한 실패
    Failed(HandlerError),
    /// 핸들러 패닉 (페이로드 문자열)
    Faulted(String),
}

impl HandlerOutcome {
    /// 핸들러 태스크의 join 결과를 분류합니다.
    pub fn from_join(joined: Result<Result<(), HandlerError>, JoinError>) -> Self {
        match joined {
            Ok(Ok(())) => HandlerOutcome::Completed,
            Ok(Err(HandlerError::Command(e))) => HandlerOutcome::Rejected(e),
            Ok(Err(e)) => HandlerOutcome::Failed(e),
            Err(e) if e.is_panic() => HandlerOutcome::Faulted(panic_message(e.into_panic())),
            Err(e) => HandlerOutcome::Failed(HandlerError::Other(anyhow::anyhow!(
                "handler task aborted: {e}"
            ))),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// 채팅 종류별로 핸들러를 고르고 실패를 격리하는 디스패처.
pub struct MessageDispatcher {
    messenger: Arc<dyn Messenger>,
    private: Option<Arc<dyn MessageHandler>>,
    group: Option<Arc<dyn MessageHandler>>,
    shutdown: CancellationToken,
}

impl MessageDispatcher {
    /// 새 디스패처를 생성합니다. 이벤트마다 `shutdown` 의 자식 토큰이 핸들러에 전달됩니다.
    pub fn new(messenger: Arc<dyn Messenger>, shutdown: CancellationToken) -> Self {
        Self {
            messenger,
            private: None,
            group: None,
            shutdown,
        }
    }

    /// 개인 채팅 핸들러를 설정합니다.
    pub fn with_private_handler(mut self, handler: Arc<dyn MessageHandler>) -> Self {
        self.private = Some(handler);
        self
    }

    /// 그룹 핸들러를 설정합니다. 분류되지 않은 채팅의 기본 핸들러도 겸합니다.
    pub fn with_group_handler(mut self, handler: Arc<dyn MessageHandler>) -> Self {
        self.group = Some(handler);
        self
    }

    fn select(&self, kind: ChatKind) -> Option<Arc<dyn MessageHandler>> {
        match kind {
            ChatKind::Private => self.private.clone(),
            ChatKind::Group | ChatKind::Supergroup | ChatKind::Channel => self.group.clone(),
        }
    }

    /// 이벤트 하나를 처리합니다.
    pub async fn handle(&self, event: InboundMessage) -> Result<(), DispatchError> {
        let sender = event.sender.clone().unwrap_or_default();
        info!(
            chat_id = event.chat_id,
            chat_kind = %event.chat_kind,
            sender_id = sender.id,
            username = %sender.username,
            first_name = %sender.first_name,
            last_name = %sender.last_name,
            message_id = event.message_id,
            text = %event.text,
            "Message received"
        );

        let Some(handler) = self.select(event.chat_kind) else {
            debug!(chat_kind = %event.chat_kind, "No handler for chat kind");
            return Ok(());
        };

        let chat_id = event.chat_id;
        let thread_id = event.thread_id;
        let cancel = self.shutdown.child_token();
        let started = Instant::now();

        let joined = tokio::spawn(async move { handler.handle(event, cancel).await }).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match HandlerOutcome::from_join(joined) {
            HandlerOutcome::Completed => {
                info!(chat_id, elapsed_ms, "Message handled");
                Ok(())
            }
            HandlerOutcome::Rejected(err) => {
                self.reply(chat_id, &err.message, thread_id).await;
                info!(
                    chat_id,
                    error_kind = %err.kind,
                    message = %err.message,
                    elapsed_ms,
                    "Command rejected"
                );
                Ok(())
            }
            HandlerOutcome::Failed(err) => {
                error!(chat_id, error = %err, elapsed_ms, "Handler failed");
                Err(DispatchError::Handler(err))
            }
            HandlerOutcome::Faulted(panic) => {
                error!(chat_id, panic = %panic, elapsed_ms, "Handler panicked");
                self.reply(chat_id, INTERNAL_ERROR_MESSAGE, thread_id).await;
                Ok(())
            }
        }
    }

    async fn reply(&self, chat_id: i64, text: &str, thread_id: Option<i32>) {
        if let Err(e) = self.messenger.send_text(chat_id, text, thread_id).await {
            warn!(chat_id, error = %e, "Failed to send error reply");
        }
    }
}
