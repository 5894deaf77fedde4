//! Telegram Bot API 어댑터.
//!
//! `Messenger` 구현과 long polling 수신 루프를 제공합니다.

use crate::dispatch::{ChatKind, InboundMessage, MessageDispatcher, Sender};
use crate::error::MessengerError;
use crate::messenger::{MessageRef, Messenger};
use async_trait::async_trait;
use gatekeeper_core::MemberRole;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// 기본 Bot API 주소.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Bot API 공통 응답.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

/// 업데이트.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

/// 메시지.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i32,
    #[serde(default)]
    pub message_thread_id: Option<i32>,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
struct ChatMember {
    status: String,
}

#[derive(Debug, Deserialize)]
struct ChatInviteLink {
    invite_link: String,
}

impl InboundMessage {
    /// Bot API 메시지를 변환합니다.
    pub fn from_telegram(message: &Message) -> Self {
        let chat_kind = match message.chat.kind.as_str() {
            "private" => ChatKind::Private,
            "supergroup" => ChatKind::Supergroup,
            "channel" => ChatKind::Channel,
            _ => ChatKind::Group,
        };

        Self {
            chat_id: message.chat.id,
            chat_kind,
            message_id: message.message_id,
            thread_id: message.message_thread_id,
            sender: message.from.as_ref().map(|user| Sender {
                id: user.id,
                username: user.username.clone().unwrap_or_default(),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone().unwrap_or_default(),
            }),
            text: message.text.clone().unwrap_or_default(),
        }
    }
}

/// Telegram Bot API 클라이언트.
pub struct TelegramMessenger {
    client: reqwest::Client,
    /// `{api_base}/bot{token}`
    endpoint: String,
}

impl fmt::Debug for TelegramMessenger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramMessenger")
            .field("endpoint", &"***REDACTED***")
            .finish()
    }
}

impl TelegramMessenger {
    pub fn new(bot_token: &str) -> Result<Self, MessengerError> {
        Self::with_api_base(DEFAULT_API_BASE, bot_token)
    }

    /// API 주소를 지정해 생성합니다 (로컬 Bot API 서버, 테스트용).
    pub fn with_api_base(api_base: &str, bot_token: &str) -> Result<Self, MessengerError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/bot{}", api_base.trim_end_matches('/'), bot_token),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<T, MessengerError> {
        let mut request = self
            .client
            .post(format!("{}/{}", self.endpoint, method))
            .json(&params);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        let parsed: ApiResponse<T> = serde_json::from_str(&body).map_err(|e| {
            MessengerError::Decode(format!("{method}: HTTP {status}: {e}"))
        })?;
        if !parsed.ok {
            return Err(MessengerError::Api {
                method,
                description: parsed.description.unwrap_or_else(|| format!("HTTP {status}")),
            });
        }
        parsed
            .result
            .ok_or_else(|| MessengerError::Decode(format!("{method}: missing result")))
    }

    /// 새 업데이트를 long polling 으로 가져옵니다.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, MessengerError> {
        let params = json!({
            "offset": offset,
            "timeout": timeout_secs,
            "allowed_updates": ["message"],
        });
        self.call(
            "getUpdates",
            params,
            Some(Duration::from_secs(timeout_secs) + REQUEST_TIMEOUT),
        )
        .await
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        thread_id: Option<i32>,
    ) -> Result<MessageRef, MessengerError> {
        let mut params = json!({
            "chat_id": chat_id,
            "text": text,
            "disable_web_page_preview": true,
        });
        if let Some(thread_id) = thread_id {
            params["message_thread_id"] = json!(thread_id);
        }

        let sent: Message = self.call("sendMessage", params, None).await?;
        debug!(chat_id, message_id = sent.message_id, "Message sent");
        Ok(MessageRef {
            chat_id,
            message_id: sent.message_id,
        })
    }

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), MessengerError> {
        let _: bool = self
            .call(
                "deleteMessage",
                json!({ "chat_id": chat_id, "message_id": message_id }),
                None,
            )
            .await?;
        Ok(())
    }

    async fn create_invite_link(
        &self,
        chat_id: i64,
        member_limit: u32,
    ) -> Result<String, MessengerError> {
        let link: ChatInviteLink = self
            .call(
                "createChatInviteLink",
                json!({ "chat_id": chat_id, "member_limit": member_limit }),
                None,
            )
            .await?;
        Ok(link.invite_link)
    }

    async fn member_role(&self, chat_id: i64, user_id: i64) -> Result<MemberRole, MessengerError> {
        let member: ChatMember = self
            .call(
                "getChatMember",
                json!({ "chat_id": chat_id, "user_id": user_id }),
                None,
            )
            .await?;
        Ok(MemberRole::from_stored(&member.status))
    }
}

/// Long polling 수신 루프.
///
/// 업데이트마다 태스크를 띄워 디스패처로 넘기므로 이벤트끼리는 동시에 처리됩니다.
pub struct TelegramPoller {
    messenger: Arc<TelegramMessenger>,
    dispatcher: Arc<MessageDispatcher>,
    poll_timeout_secs: u64,
    retry_delay: Duration,
}

impl TelegramPoller {
    pub fn new(messenger: Arc<TelegramMessenger>, dispatcher: Arc<MessageDispatcher>) -> Self {
        Self {
            messenger,
            dispatcher,
            poll_timeout_secs: 30,
            retry_delay: Duration::from_secs(5),
        }
    }

    /// 종료 토큰이 취소될 때까지 폴링합니다. 진행 중인 이벤트는 끝날 때까지 기다립니다.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!("텔레그램 봇 폴링 시작");
        let mut offset = 0_i64;
        let mut in_flight = JoinSet::new();

        loop {
            while in_flight.try_join_next().is_some() {}

            let polled = tokio::select! {
                _ = shutdown.cancelled() => break,
                polled = self.messenger.get_updates(offset, self.poll_timeout_secs) => polled,
            };

            match polled {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        let Some(message) = update.message else {
                            continue;
                        };
                        let dispatcher = Arc::clone(&self.dispatcher);
                        in_flight.spawn(async move {
                            let event = InboundMessage::from_telegram(&message);
                            if let Err(e) = dispatcher.handle(event).await {
                                error!(error = %e, "업데이트 처리 실패");
                            }
                        });
                    }
                }
                Err(e) => {
                    error!(error = %e, "업데이트 폴링 실패");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.retry_delay) => {}
                    }
                }
            }
        }

        if !in_flight.is_empty() {
            warn!(count = in_flight.len(), "Waiting for in-flight updates");
        }
        while in_flight.join_next().await.is_some() {}
        info!("텔레그램 봇 폴링 종료");
    }
}
