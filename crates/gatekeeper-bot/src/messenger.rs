//! 메신저 추상화와 동시 전송 유틸리티.

use crate::error::MessengerError;
use async_trait::async_trait;
use futures::future::join_all;
use gatekeeper_core::MemberRole;
use std::sync::Arc;
use tracing::{debug, warn};

/// 전송된 메시지 참조.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i32,
}

/// 메신저 API.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// 텍스트 메시지를 전송합니다. `thread_id` 가 있으면 해당 토픽에 전송합니다.
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        thread_id: Option<i32>,
    ) -> Result<MessageRef, MessengerError>;

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), MessengerError>;

    /// 사용 횟수가 제한된 초대 링크를 생성합니다.
    async fn create_invite_link(
        &self,
        chat_id: i64,
        member_limit: u32,
    ) -> Result<String, MessengerError>;

    /// 그룹 내 사용자 역할을 조회합니다.
    async fn member_role(&self, chat_id: i64, user_id: i64) -> Result<MemberRole, MessengerError>;
}

/// 전송할 메시지.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub chat_id: i64,
    pub text: String,
    pub thread_id: Option<i32>,
}

impl Outgoing {
    pub fn new(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            thread_id: None,
        }
    }
}

/// 동시 전송 결과.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    /// 전송에 실패한 채팅 ID
    pub failed: Vec<i64>,
}

impl DeliveryReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// 수신자마다 태스크를 하나씩 띄워 동시에 전송하고 모두 끝날 때까지 기다립니다.
///
/// 일부가 실패해도 이미 전송된 메시지는 그대로 둡니다.
pub async fn deliver_all(messenger: Arc<dyn Messenger>, targets: Vec<Outgoing>) -> DeliveryReport {
    let mut chat_ids = Vec::with_capacity(targets.len());
    let mut handles = Vec::with_capacity(targets.len());

    for target in targets {
        let messenger = Arc::clone(&messenger);
        chat_ids.push(target.chat_id);
        handles.push(tokio::spawn(async move {
            messenger
                .send_text(target.chat_id, &target.text, target.thread_id)
                .await
        }));
    }

    let mut report = DeliveryReport::default();
    for (chat_id, joined) in chat_ids.into_iter().zip(join_all(handles).await) {
        match joined {
            Ok(Ok(_)) => report.delivered += 1,
            Ok(Err(e)) => {
                warn!(chat_id, error = %e, "Message delivery failed");
                report.failed.push(chat_id);
            }
            Err(e) => {
                warn!(chat_id, error = %e, "Delivery task aborted");
                report.failed.push(chat_id);
            }
        }
    }

    debug!(
        delivered = report.delivered,
        failed = report.failed.len(),
        "Fan-out delivery finished"
    );
    report
}

/// 그룹마다 1회용 초대 링크를 동시에 생성합니다.
///
/// 생성에 성공한 링크와 실패한 그룹 ID를 함께 반환합니다.
pub async fn create_invite_links(
    messenger: &dyn Messenger,
    group_ids: &[i64],
) -> (Vec<String>, Vec<i64>) {
    let results = join_all(
        group_ids
            .iter()
            .map(|&group_id| async move { (group_id, messenger.create_invite_link(group_id, 1).await) }),
    )
    .await;

    let mut links = Vec::new();
    let mut failed = Vec::new();
    for (group_id, result) in results {
        match result {
            Ok(link) => links.push(link),
            Err(e) => {
                warn!(group_id, error = %e, "Invite link creation failed");
                failed.push(group_id);
            }
        }
    }
    (links, failed)
}
