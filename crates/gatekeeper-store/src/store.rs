//! 바인딩 저장소 인터페이스.

use crate::error::StoreResult;
use crate::model::{
    ContactUpdate, CustomerPage, NewTradingHistory, NewVerifiedBinding, PageRequest,
};
use async_trait::async_trait;
use gatekeeper_core::{BindingStatus, CustomerView, MemberRole};
use uuid::Uuid;

/// 고객 / 소셜 바인딩 / 트레이딩 바인딩 저장소.
#[async_trait]
pub trait BindingStore: Send + Sync {
    /// 고객과 두 바인딩을 하나의 트랜잭션으로 생성합니다.
    ///
    /// 생성 순서는 고객 → 트레이딩 바인딩 → 소셜 바인딩이며, 어느 단계든 실패하면
    /// 전체가 롤백됩니다. 고유 제약 위반은 `CustomerExists` /
    /// `TradingBindingExists` / `SocialBindingExists` 로 반환됩니다.
    async fn create_verified(&self, input: NewVerifiedBinding) -> StoreResult<CustomerView>;

    /// UID로 조인 뷰를 조회합니다.
    async fn find_by_uid(&self, uid: &str) -> StoreResult<Option<CustomerView>>;

    /// UID에 연결된 소셜 바인딩의 멤버 역할을 조회합니다. 없으면 `NotFound`.
    async fn member_role_by_uid(&self, uid: &str) -> StoreResult<MemberRole>;

    /// UID에 연결된 소셜 바인딩의 활성 여부. 바인딩이 없으면 `None`.
    async fn social_active_by_uid(&self, uid: &str) -> StoreResult<Option<bool>>;

    /// UID에 연결된 소셜 바인딩의 연락처 필드를 갱신하고 실제 변경된 행 수를 반환합니다.
    async fn update_contact_by_uid(&self, uid: &str, update: &ContactUpdate) -> StoreResult<u64>;

    /// 생성일 역순으로 고객 목록을 조회합니다.
    async fn list_customers(&self, page: PageRequest) -> StoreResult<CustomerPage>;

    /// 소셜 바인딩의 관리 상태와 멤버 역할을 변경합니다.
    async fn update_social_status(
        &self,
        customer_id: Uuid,
        status: BindingStatus,
        role: MemberRole,
    ) -> StoreResult<u64>;

    /// 고객들의 소셜 바인딩을 소프트 비활성화합니다.
    ///
    /// 일부 실패 시 `PartialDeactivation` 으로 실패한 ID를 반환합니다.
    async fn deactivate_customers(&self, customer_ids: &[Uuid]) -> StoreResult<()>;

    /// UID의 거래 이력 스냅샷을 기록(upsert)하고 기록한 건수를 반환합니다.
    async fn record_trading_history(
        &self,
        uid: &str,
        entries: &[NewTradingHistory],
    ) -> StoreResult<usize>;
}
