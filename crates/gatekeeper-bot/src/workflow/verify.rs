use crate::error::WorkflowError;
use gatekeeper_core::{parse_epoch_millis, TradingPlatform, UserContext};
use gatekeeper_exchange::{AffiliateApi, ApiEnvelope, CustomerInfo};
use gatekeeper_store::{BindingStore, NewSocialBinding, NewTradingBinding, NewVerifiedBinding};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// UID 인증 워크플로.
pub struct VerifyWorkflow {
    api: Arc<dyn AffiliateApi>,
    store: Arc<dyn BindingStore>,
}

impl VerifyWorkflow {
    pub fn new(api: Arc<dyn AffiliateApi>, store: Arc<dyn BindingStore>) -> Self {
        Self { api, store }
    }

    /// 거래소에서 UID를 확인하고 고객과 두 바인딩을 한 번에 생성합니다.
    ///
    /// 성공하면 생성된 고객 ID를 반환합니다.
    pub async fn handle_verification(
        &self,
        uid: &str,
        ctx: &UserContext,
        cancel: &CancellationToken,
    ) -> Result<Uuid, WorkflowError> {
        info!(uid = %uid, user_id = %ctx.user_id, "Verification started");

        let body = self.api.customer_list(uid, cancel).await?;
        let customers = ApiEnvelope::<Vec<CustomerInfo>>::parse_list(&body)?;
        let Some(customer) = customers.into_iter().next() else {
            info!(uid = %uid, "UID not found on exchange");
            return Err(WorkflowError::UidNotFound);
        };

        let register_time = parse_epoch_millis(&customer.register_time);
        if register_time.is_none() {
            warn!(uid = %uid, register_time = %customer.register_time, "Unparsable register time");
        }

        let input = NewVerifiedBinding {
            username: ctx.display_name(),
            social: NewSocialBinding::from_context(ctx),
            trading: NewTradingBinding {
                platform: TradingPlatform::Bitget,
                uid: uid.to_string(),
                register_time,
            },
        };

        let view = self.store.create_verified(input).await?;
        info!(uid = %uid, customer_id = %view.customer.id, "Verification completed");
        Ok(view.customer.id)
    }
}
