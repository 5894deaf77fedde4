use crate::error::WorkflowError;
use gatekeeper_core::MemberRole;
use gatekeeper_store::{BindingStore, StoreError};
use std::sync::Arc;

/// 바인딩된 텔레그램 계정의 그룹 역할 조회.
pub struct StatusWorkflow {
    store: Arc<dyn BindingStore>,
}

impl StatusWorkflow {
    pub fn new(store: Arc<dyn BindingStore>) -> Self {
        Self { store }
    }

    pub async fn check(&self, uid: &str) -> Result<MemberRole, WorkflowError> {
        match self.store.member_role_by_uid(uid).await {
            Ok(role) => Ok(role),
            Err(StoreError::NotFound(_)) => Err(WorkflowError::BindingNotFound),
            Err(e) => Err(e.into()),
        }
    }
}
