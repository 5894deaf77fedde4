use crate::error::WorkflowError;
use gatekeeper_core::UserContext;
use gatekeeper_store::{BindingStore, ContactUpdate};
use std::sync::Arc;
use tracing::info;

/// 소셜 계정 바인딩 변경 워크플로.
pub struct AccountWorkflow {
    store: Arc<dyn BindingStore>,
}

impl AccountWorkflow {
    pub fn new(store: Arc<dyn BindingStore>) -> Self {
        Self { store }
    }

    /// UID에 바인딩된 소셜 계정 정보를 요청자의 현재 정보로 교체합니다.
    pub async fn handle_update_command(
        &self,
        uid: &str,
        ctx: &UserContext,
    ) -> Result<(), WorkflowError> {
        match self.store.social_active_by_uid(uid).await? {
            None => return Err(WorkflowError::BindingNotFound),
            Some(false) => return Err(WorkflowError::InactiveBinding),
            Some(true) => {}
        }

        let changed = self
            .store
            .update_contact_by_uid(uid, &ContactUpdate::from_context(ctx))
            .await?;
        if changed == 0 {
            return Err(WorkflowError::NothingToUpdate);
        }

        info!(uid = %uid, user_id = %ctx.user_id, "Social binding updated");
        Ok(())
    }
}
