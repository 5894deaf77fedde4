use super::{AdminError, AdminResult};
use gatekeeper_core::{BindingStatus, CustomerView, MemberRole};
use gatekeeper_store::{BindingStore, CustomerPage, PageRequest, StoreError};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// 고객 조회 / 상태 변경 / 비활성화.
pub struct CustomerService {
    store: Arc<dyn BindingStore>,
}

impl CustomerService {
    pub fn new(store: Arc<dyn BindingStore>) -> Self {
        Self { store }
    }

    pub async fn get_by_uid(&self, uid: &str) -> AdminResult<CustomerView> {
        self.store
            .find_by_uid(uid)
            .await?
            .ok_or_else(|| AdminError::NotFound(format!("customer with uid {uid}")))
    }

    /// 페이지 단위 목록. 범위를 벗어난 페이지/크기는 기본값으로 보정됩니다.
    pub async fn list(&self, page: i64, limit: i64) -> AdminResult<CustomerPage> {
        Ok(self.store.list_customers(PageRequest::new(page, limit)).await?)
    }

    pub async fn update_status(
        &self,
        customer_id: Uuid,
        status: BindingStatus,
        role: MemberRole,
    ) -> AdminResult<()> {
        let updated = self
            .store
            .update_social_status(customer_id, status, role)
            .await?;
        if updated == 0 {
            return Err(AdminError::NotFound(format!("customer {customer_id}")));
        }
        info!(customer_id = %customer_id, status = %status, role = %role, "Customer status updated");
        Ok(())
    }

    /// 고객들을 소프트 비활성화합니다. 실패한 ID만 에러로 돌려줍니다.
    pub async fn deactivate(&self, customer_ids: &[Uuid]) -> AdminResult<()> {
        if customer_ids.is_empty() {
            return Err(AdminError::EmptyRequest("customer_ids"));
        }

        match self.store.deactivate_customers(customer_ids).await {
            Ok(()) => {
                info!(count = customer_ids.len(), "Customers deactivated");
                Ok(())
            }
            Err(StoreError::PartialDeactivation { failed }) => {
                warn!(requested = customer_ids.len(), failed = failed.len(), "Partial deactivation");
                Err(AdminError::PartialDeactivation { failed })
            }
            Err(e) => Err(e.into()),
        }
    }
}
