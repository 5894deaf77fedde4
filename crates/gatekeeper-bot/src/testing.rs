//! 단위 테스트용 가짜 구현.

use crate::error::MessengerError;
use crate::messenger::{MessageRef, Messenger};
use async_trait::async_trait;
use gatekeeper_core::{DateRange, MemberRole};
use gatekeeper_exchange::{AffiliateApi, ExchangeError};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// 미리 정해둔 응답 본문을 돌려주는 제휴 API.
#[derive(Default)]
pub struct FakeAffiliate {
    customers: HashMap<String, String>,
    volumes: HashMap<String, String>,
    unavailable: bool,
    calls: AtomicUsize,
}

impl FakeAffiliate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_customer(mut self, uid: &str, register_time: &str) -> Self {
        self.customers.insert(
            uid.to_string(),
            format!(
                r#"{{"code":"00000","msg":"success","data":[{{"uid":"{uid}","registerTime":"{register_time}"}}]}}"#
            ),
        );
        self
    }

    /// `(volumn, time)` 목록으로 거래량 응답을 구성합니다.
    pub fn with_volumes(mut self, uid: &str, entries: &[(&str, &str)]) -> Self {
        let data = entries
            .iter()
            .map(|(volume, time)| format!(r#"{{"uid":"{uid}","volumn":"{volume}","time":"{time}"}}"#))
            .collect::<Vec<_>>()
            .join(",");
        self.volumes.insert(
            uid.to_string(),
            format!(r#"{{"code":"00000","msg":"success","data":[{data}]}}"#),
        );
        self
    }

    pub fn with_raw_volume_body(mut self, uid: &str, body: &str) -> Self {
        self.volumes.insert(uid.to_string(), body.to_string());
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn respond(&self, table: &HashMap<String, String>, uid: &str) -> Result<String, ExchangeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(ExchangeError::HttpStatus {
                status: 503,
                body: "maintenance".to_string(),
            });
        }
        Ok(table
            .get(uid)
            .cloned()
            .unwrap_or_else(|| r#"{"code":"00000","msg":"success","data":[]}"#.to_string()))
    }
}

#[async_trait]
impl AffiliateApi for FakeAffiliate {
    async fn customer_list(
        &self,
        uid: &str,
        _cancel: &CancellationToken,
    ) -> Result<String, ExchangeError> {
        self.respond(&self.customers, uid)
    }

    async fn customer_trade_volume(
        &self,
        uid: &str,
        _range: DateRange,
        _cancel: &CancellationToken,
    ) -> Result<String, ExchangeError> {
        self.respond(&self.volumes, uid)
    }
}

/// 전송된 메시지.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub chat_id: i64,
    pub message_id: i32,
    pub text: String,
    pub thread_id: Option<i32>,
}

/// 호출을 기록하는 메신저.
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<Sent>>,
    deleted: Mutex<Vec<(i64, i32)>>,
    roles: HashMap<(i64, i64), MemberRole>,
    failing_chats: HashSet<i64>,
    role_lookup_fails: bool,
    next_id: AtomicI32,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI32::new(1000),
            ..Default::default()
        }
    }

    pub fn with_role(mut self, chat_id: i64, user_id: i64, role: MemberRole) -> Self {
        self.roles.insert((chat_id, user_id), role);
        self
    }

    pub fn failing_for(mut self, chat_id: i64) -> Self {
        self.failing_chats.insert(chat_id);
        self
    }

    pub fn with_failing_role_lookup(mut self) -> Self {
        self.role_lookup_fails = true;
        self
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, chat_id: i64) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|s| s.chat_id == chat_id)
            .map(|s| s.text)
            .collect()
    }

    pub fn deleted(&self) -> Vec<(i64, i32)> {
        self.deleted.lock().unwrap().clone()
    }

    fn check(&self, chat_id: i64, method: &'static str) -> Result<(), MessengerError> {
        if self.failing_chats.contains(&chat_id) {
            return Err(MessengerError::Api {
                method,
                description: "Forbidden: bot was blocked by the user".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        thread_id: Option<i32>,
    ) -> Result<MessageRef, MessengerError> {
        self.check(chat_id, "sendMessage")?;
        let message_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(Sent {
            chat_id,
            message_id,
            text: text.to_string(),
            thread_id,
        });
        Ok(MessageRef {
            chat_id,
            message_id,
        })
    }

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), MessengerError> {
        self.check(chat_id, "deleteMessage")?;
        self.deleted.lock().unwrap().push((chat_id, message_id));
        Ok(())
    }

    async fn create_invite_link(
        &self,
        chat_id: i64,
        member_limit: u32,
    ) -> Result<String, MessengerError> {
        self.check(chat_id, "createChatInviteLink")?;
        assert_eq!(member_limit, 1);
        Ok(format!("https://t.me/+invite{}", chat_id.unsigned_abs()))
    }

    async fn member_role(&self, chat_id: i64, user_id: i64) -> Result<MemberRole, MessengerError> {
        if self.role_lookup_fails {
            return Err(MessengerError::Decode("getChatMember timed out".to_string()));
        }
        Ok(self
            .roles
            .get(&(chat_id, user_id))
            .copied()
            .unwrap_or(MemberRole::Member))
    }
}
