//! 개인 채팅 명령 처리.
//!
//! - `/start`, `/help` - 안내 메시지
//! - `/verify <uid>` - UID 인증 후 초대 링크 발급
//! - `/volume <uid>` - 이번 달 거래량 조회
//! - `/account <uid>` - 바인딩된 텔레그램 계정 변경 후 초대 링크 발급
//! - `/status <uid>` - 바인딩된 계정의 그룹 역할 조회

use crate::dispatch::{InboundMessage, MessageHandler, Sender};
use crate::error::{HandlerError, WorkflowError};
use crate::error_mapper::ErrorMapper;
use crate::messenger::{create_invite_links, deliver_all, Messenger, Outgoing};
use crate::validator::CommandValidator;
use crate::workflow::{AccountWorkflow, StatusWorkflow, VerifyWorkflow, VolumeWorkflow};
use async_trait::async_trait;
use gatekeeper_core::messages::{
    member_status_reply, volume_reply, ACCOUNT_COMMAND, HELP_MESSAGE, MEMBER_INFO_UPDATED_MESSAGE,
    PROCESSING_MESSAGE, STATUS_COMMAND, UNKNOWN_TEXT_MESSAGE, VERIFY_COMMAND,
    VERIFY_SUCCESS_MESSAGE, VOLUME_COMMAND, WELCOME_MESSAGE,
};
use gatekeeper_core::{CommandError, UserContext};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// 봇 명령 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Help,
    Verify,
    Volume,
    Account,
    Status,
    /// 명령이 아닌 텍스트 또는 알 수 없는 명령
    Text,
}

impl BotCommand {
    /// 첫 토큰으로 명령을 판별합니다. `/verify@my_bot` 형태도 허용합니다.
    pub fn parse(text: &str) -> Self {
        let Some(first) = text.split_whitespace().next() else {
            return BotCommand::Text;
        };
        let Some(name) = first.strip_prefix('/') else {
            return BotCommand::Text;
        };
        let name = name.split('@').next().unwrap_or_default().to_lowercase();

        match name.as_str() {
            "start" => BotCommand::Start,
            "help" => BotCommand::Help,
            "verify" => BotCommand::Verify,
            "volume" => BotCommand::Volume,
            "account" => BotCommand::Account,
            "status" => BotCommand::Status,
            _ => BotCommand::Text,
        }
    }
}

/// 개인 채팅 명령 핸들러.
pub struct PrivateCommandHandler {
    messenger: Arc<dyn Messenger>,
    verify: VerifyWorkflow,
    volume: VolumeWorkflow,
    account: AccountWorkflow,
    status: StatusWorkflow,
    invite_group_ids: Vec<i64>,
}

impl PrivateCommandHandler {
    pub fn new(
        messenger: Arc<dyn Messenger>,
        verify: VerifyWorkflow,
        volume: VolumeWorkflow,
        account: AccountWorkflow,
        status: StatusWorkflow,
        invite_group_ids: Vec<i64>,
    ) -> Self {
        Self {
            messenger,
            verify,
            volume,
            account,
            status,
            invite_group_ids,
        }
    }

    async fn send(&self, chat_id: i64, text: &str) -> Result<(), HandlerError> {
        self.messenger.send_text(chat_id, text, None).await?;
        Ok(())
    }

    async fn handle_verify(
        &self,
        message: &InboundMessage,
        sender: &Sender,
        cancel: &CancellationToken,
    ) -> Result<(), HandlerError> {
        let uid = CommandValidator::validate_uid(&message.text, VERIFY_COMMAND)?;
        self.send(message.chat_id, PROCESSING_MESSAGE).await?;

        let ctx = user_context(&uid, sender);
        self.verify
            .handle_verification(&uid, &ctx, cancel)
            .await
            .map_err(|e| reject(&e, &uid))?;

        self.send(message.chat_id, VERIFY_SUCCESS_MESSAGE).await?;
        self.deliver_invite_links(message.chat_id, &uid).await;
        Ok(())
    }

    async fn handle_volume(
        &self,
        message: &InboundMessage,
        cancel: &CancellationToken,
    ) -> Result<(), HandlerError> {
        let uid = CommandValidator::validate_uid(&message.text, VOLUME_COMMAND)?;
        let total = self
            .volume
            .handle_volume_check(&uid, cancel)
            .await
            .map_err(|e| reject(&e, &uid))?;

        self.send(message.chat_id, &volume_reply(total)).await
    }

    async fn handle_account(
        &self,
        message: &InboundMessage,
        sender: &Sender,
    ) -> Result<(), HandlerError> {
        let uid = CommandValidator::validate_uid(&message.text, ACCOUNT_COMMAND)?;
        let ctx = user_context(&uid, sender);
        self.account
            .handle_update_command(&uid, &ctx)
            .await
            .map_err(|e| reject(&e, &uid))?;

        self.send(message.chat_id, MEMBER_INFO_UPDATED_MESSAGE).await?;
        self.deliver_invite_links(message.chat_id, &uid).await;
        Ok(())
    }

    async fn handle_status(&self, message: &InboundMessage) -> Result<(), HandlerError> {
        let uid = CommandValidator::validate_uid(&message.text, STATUS_COMMAND)?;
        let role = self.status.check(&uid).await.map_err(|e| reject(&e, &uid))?;

        self.send(message.chat_id, &member_status_reply(&uid, role.label()))
            .await
    }

    /// 초대 링크를 발급해 동시에 전송합니다. 실패는 기록만 하고 되돌리지 않습니다.
    async fn deliver_invite_links(&self, chat_id: i64, uid: &str) {
        let (links, failed_groups) =
            create_invite_links(self.messenger.as_ref(), &self.invite_group_ids).await;
        let targets = links
            .into_iter()
            .map(|link| Outgoing::new(chat_id, link))
            .collect();
        let report = deliver_all(Arc::clone(&self.messenger), targets).await;

        if failed_groups.is_empty() && report.is_complete() {
            info!(uid = %uid, links = report.delivered, "Invite links delivered");
        } else {
            warn!(
                uid = %uid,
                delivered = report.delivered,
                failed_groups = ?failed_groups,
                failed_deliveries = report.failed.len(),
                "Invite links partially delivered"
            );
        }
    }
}

fn reject(err: &WorkflowError, uid: &str) -> CommandError {
    ErrorMapper::map(err, uid)
}

/// 개인 채팅 요청자는 멤버 역할로 간주합니다.
fn user_context(uid: &str, sender: &Sender) -> UserContext {
    UserContext::telegram(uid, sender.id.to_string()).with_names(
        &sender.username,
        &sender.first_name,
        &sender.last_name,
    )
}

#[async_trait]
impl MessageHandler for PrivateCommandHandler {
    async fn handle(
        &self,
        message: InboundMessage,
        cancel: CancellationToken,
    ) -> Result<(), HandlerError> {
        let Some(sender) = message.sender.clone() else {
            return Ok(());
        };

        match BotCommand::parse(&message.text) {
            BotCommand::Start => self.send(message.chat_id, WELCOME_MESSAGE).await,
            BotCommand::Help => self.send(message.chat_id, HELP_MESSAGE).await,
            BotCommand::Text => self.send(message.chat_id, UNKNOWN_TEXT_MESSAGE).await,
            BotCommand::Verify => self.handle_verify(&message, &sender, &cancel).await,
            BotCommand::Volume => self.handle_volume(&message, &cancel).await,
            BotCommand::Account => self.handle_account(&message, &sender).await,
            BotCommand::Status => self.handle_status(&message).await,
        }
    }
}
