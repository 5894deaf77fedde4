use super::{AdminError, AdminResult};
use crate::messenger::{deliver_all, Messenger, Outgoing};
use std::sync::Arc;
use tracing::{info, warn};

/// 관리자 메시지 동시 전송.
pub struct BroadcastService {
    messenger: Arc<dyn Messenger>,
}

impl BroadcastService {
    pub fn new(messenger: Arc<dyn Messenger>) -> Self {
        Self { messenger }
    }

    /// 단일 채팅에 전송합니다.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> AdminResult<()> {
        self.messenger
            .send_text(chat_id, text, None)
            .await
            .map_err(|e| {
                warn!(chat_id, error = %e, "Admin message delivery failed");
                AdminError::PartialDelivery {
                    failed: vec![chat_id],
                }
            })?;
        Ok(())
    }

    /// 여러 고객(개인 채팅)에게 동시에 전송합니다.
    pub async fn send_to_customers(&self, chat_ids: &[i64], text: &str) -> AdminResult<()> {
        self.fan_out("customers", chat_ids, text).await
    }

    /// 여러 그룹에 동시에 전송합니다.
    pub async fn send_to_groups(&self, group_ids: &[i64], text: &str) -> AdminResult<()> {
        self.fan_out("groups", group_ids, text).await
    }

    async fn fan_out(&self, audience: &'static str, chat_ids: &[i64], text: &str) -> AdminResult<()> {
        if chat_ids.is_empty() {
            return Err(AdminError::EmptyRequest("chat_ids"));
        }

        let targets = chat_ids
            .iter()
            .map(|&chat_id| Outgoing::new(chat_id, text))
            .collect();
        let report = deliver_all(Arc::clone(&self.messenger), targets).await;

        info!(
            audience,
            requested = chat_ids.len(),
            delivered = report.delivered,
            failed = report.failed.len(),
            "Broadcast finished"
        );
        if report.is_complete() {
            Ok(())
        } else {
            Err(AdminError::PartialDelivery {
                failed: report.failed,
            })
        }
    }
}
