//! 그룹 콘텐츠 필터.
//!
//! 감시 대상 그룹(및 토픽)에서 일반 멤버가 금지 패턴을 게시하면 메시지를 삭제하고
//! 같은 스레드에 경고를 보낸 뒤, 일정 시간이 지나면 경고도 삭제합니다.
//! 소유자와 관리자의 메시지는 검사하지 않습니다.

use crate::dispatch::{InboundMessage, MessageHandler};
use crate::error::HandlerError;
use crate::messenger::Messenger;
use async_trait::async_trait;
use gatekeeper_core::messages::user_warning;
use gatekeeper_core::TelegramConfig;
use regex::RegexSet;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// 필터 설정.
#[derive(Debug, Clone)]
pub struct GroupFilterConfig {
    pub monitored_group_ids: HashSet<i64>,
    /// 비어 있으면 그룹 전체
    pub monitored_topic_ids: HashSet<i32>,
    pub patterns: RegexSet,
    pub send_warning: bool,
    pub warning_delete_after: Duration,
}

impl GroupFilterConfig {
    /// 텔레그램 설정에서 필터 설정을 만듭니다. 잘못된 정규식은 에러입니다.
    pub fn from_config(config: &TelegramConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            monitored_group_ids: config.monitored_group_ids.iter().copied().collect(),
            monitored_topic_ids: config.monitored_topic_ids.iter().copied().collect(),
            patterns: RegexSet::new(&config.forbidden_patterns)?,
            send_warning: config.send_warning,
            warning_delete_after: Duration::from_secs(config.warning_delete_after_secs),
        })
    }

    fn in_scope(&self, message: &InboundMessage) -> bool {
        if !self.monitored_group_ids.contains(&message.chat_id) {
            return false;
        }
        match message.thread_id {
            Some(thread_id) if !self.monitored_topic_ids.is_empty() => {
                self.monitored_topic_ids.contains(&thread_id)
            }
            _ => true,
        }
    }
}

/// 검사 결과.
#[derive(Debug)]
pub enum FilterOutcome {
    /// 검사 대상이 아님 (범위 밖, 빈 텍스트, 관리자, 역할 조회 실패)
    Ignored,
    /// 검사했고 문제 없음
    Allowed,
    /// 메시지를 삭제함. 경고를 보냈다면 경고 삭제 태스크를 함께 반환합니다.
    Removed {
        warning_cleanup: Option<JoinHandle<()>>,
    },
}

/// 그룹 콘텐츠 필터 핸들러.
pub struct GroupContentFilter {
    messenger: Arc<dyn Messenger>,
    config: GroupFilterConfig,
}

impl GroupContentFilter {
    pub fn new(messenger: Arc<dyn Messenger>, config: GroupFilterConfig) -> Self {
        Self { messenger, config }
    }

    /// 메시지를 검사하고 필요하면 삭제합니다.
    pub async fn inspect(&self, message: &InboundMessage) -> FilterOutcome {
        if !self.config.in_scope(message) || message.text.trim().is_empty() {
            return FilterOutcome::Ignored;
        }
        let Some(sender) = &message.sender else {
            return FilterOutcome::Ignored;
        };

        let role = match self.messenger.member_role(message.chat_id, sender.id).await {
            Ok(role) => role,
            Err(e) => {
                warn!(chat_id = message.chat_id, user_id = sender.id, error = %e, "Member lookup failed");
                return FilterOutcome::Ignored;
            }
        };
        if role.is_privileged() {
            debug!(chat_id = message.chat_id, user_id = sender.id, role = %role, "Privileged sender");
            return FilterOutcome::Ignored;
        }

        if !self.config.patterns.is_match(&message.text) {
            return FilterOutcome::Allowed;
        }

        info!(
            chat_id = message.chat_id,
            user_id = sender.id,
            message_id = message.message_id,
            "Forbidden content removed"
        );
        if let Err(e) = self
            .messenger
            .delete_message(message.chat_id, message.message_id)
            .await
        {
            warn!(chat_id = message.chat_id, message_id = message.message_id, error = %e, "Failed to delete message");
        }

        if !self.config.send_warning {
            return FilterOutcome::Removed {
                warning_cleanup: None,
            };
        }

        let warning = user_warning(sender.mention());
        let sent = match self
            .messenger
            .send_text(message.chat_id, &warning, message.thread_id)
            .await
        {
            Ok(sent) => sent,
            Err(e) => {
                warn!(chat_id = message.chat_id, error = %e, "Failed to send warning");
                return FilterOutcome::Removed {
                    warning_cleanup: None,
                };
            }
        };

        let messenger = Arc::clone(&self.messenger);
        let delay = self.config.warning_delete_after;
        let cleanup = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = messenger.delete_message(sent.chat_id, sent.message_id).await {
                warn!(chat_id = sent.chat_id, message_id = sent.message_id, error = %e, "Failed to delete warning");
            }
        });

        FilterOutcome::Removed {
            warning_cleanup: Some(cleanup),
        }
    }
}

#[async_trait]
impl MessageHandler for GroupContentFilter {
    async fn handle(
        &self,
        message: InboundMessage,
        _cancel: CancellationToken,
    ) -> Result<(), HandlerError> {
        self.inspect(&message).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{ChatKind, Sender};
    use crate::testing::RecordingMessenger;
    use gatekeeper_core::MemberRole;

    const GROUP: i64 = -100200;

    fn filter_config() -> TelegramConfig {
        TelegramConfig {
            monitored_group_ids: vec![GROUP],
            monitored_topic_ids: vec![5],
            forbidden_patterns: vec![r"t\.me/".to_string(), r"(?i)https?://".to_string()],
            ..Default::default()
        }
    }

    fn filter(messenger: Arc<RecordingMessenger>) -> GroupContentFilter {
        GroupContentFilter::new(
            messenger,
            GroupFilterConfig::from_config(&filter_config()).unwrap(),
        )
    }

    fn group_message(text: &str, thread_id: Option<i32>) -> InboundMessage {
        InboundMessage {
            chat_id: GROUP,
            chat_kind: ChatKind::Supergroup,
            message_id: 77,
            thread_id,
            sender: Some(Sender {
                id: 9,
                username: String::new(),
                first_name: "Plankton".to_string(),
                last_name: String::new(),
            }),
            text: text.to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_member_link_is_removed_and_warning_cleaned_up() {
        let messenger = Arc::new(RecordingMessenger::new());
        let outcome = filter(messenger.clone())
            .inspect(&group_message("join t.me/scam", Some(5)))
            .await;

        let FilterOutcome::Removed {
            warning_cleanup: Some(cleanup),
        } = outcome
        else {
            panic!("expected removal with warning");
        };

        let sent = messenger.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].thread_id, Some(5));
        assert!(sent[0].text.contains("@Plankton"));
        assert_eq!(messenger.deleted(), vec![(GROUP, 77)]);

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert_eq!(messenger.deleted().len(), 1);

        cleanup.await.unwrap();
        assert_eq!(messenger.deleted(), vec![(GROUP, 77), (GROUP, sent[0].message_id)]);
    }

    #[tokio::test]
    async fn test_admin_messages_are_ignored() {
        let messenger = Arc::new(RecordingMessenger::new().with_role(GROUP, 9, MemberRole::Administrator));
        let outcome = filter(messenger.clone())
            .inspect(&group_message("https://example.com", Some(5)))
            .await;

        assert!(matches!(outcome, FilterOutcome::Ignored));
        assert!(messenger.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_role_lookup_failure_leaves_message() {
        let messenger = Arc::new(RecordingMessenger::new().with_failing_role_lookup());
        let outcome = filter(messenger.clone())
            .inspect(&group_message("https://example.com", Some(5)))
            .await;

        assert!(matches!(outcome, FilterOutcome::Ignored));
        assert!(messenger.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_scope_rules() {
        let messenger = Arc::new(RecordingMessenger::new());
        let filter = filter(messenger.clone());

        // 감시하지 않는 토픽
        let outcome = filter.inspect(&group_message("t.me/x", Some(6))).await;
        assert!(matches!(outcome, FilterOutcome::Ignored));

        // 다른 그룹
        let mut other = group_message("t.me/x", Some(5));
        other.chat_id = -1;
        assert!(matches!(filter.inspect(&other).await, FilterOutcome::Ignored));

        // 빈 텍스트 (사진 등)
        assert!(matches!(
            filter.inspect(&group_message("  ", Some(5))).await,
            FilterOutcome::Ignored
        ));

        // 스레드 없는 메시지는 그룹 전체 범위로 검사
        assert!(matches!(
            filter.inspect(&group_message("good morning", None)).await,
            FilterOutcome::Allowed
        ));
        assert!(messenger.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_warning_disabled() {
        let messenger = Arc::new(RecordingMessenger::new());
        let config = TelegramConfig {
            send_warning: false,
            ..filter_config()
        };
        let filter = GroupContentFilter::new(
            messenger.clone(),
            GroupFilterConfig::from_config(&config).unwrap(),
        );

        let outcome = filter.inspect(&group_message("t.me/x", Some(5))).await;

        assert!(matches!(
            outcome,
            FilterOutcome::Removed {
                warning_cleanup: None
            }
        ));
        assert!(messenger.sent().is_empty());
    }
}
