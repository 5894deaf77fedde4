//! 인메모리 저장소 구현.
//!
//! PostgreSQL 스키마와 같은 고유 제약을 검사합니다. 쓰기는 상태 복사본에서
//! 수행한 뒤 모든 단계가 성공했을 때만 반영하므로, 실패한 생성은 흔적을 남기지 않습니다.

use crate::error::{StoreError, StoreResult};
use crate::model::{
    ContactUpdate, CustomerPage, NewTradingHistory, NewVerifiedBinding, PageRequest,
};
use crate::store::BindingStore;
use async_trait::async_trait;
use chrono::Utc;
use gatekeeper_core::{
    BindingStatus, Customer, CustomerView, MemberRole, SocialBinding, TradingBinding,
    TradingHistory,
};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
struct State {
    customers: Vec<Customer>,
    socials: Vec<SocialBinding>,
    tradings: Vec<TradingBinding>,
    histories: Vec<TradingHistory>,
}

impl State {
    fn trading_by_uid(&self, uid: &str) -> Option<&TradingBinding> {
        self.tradings.iter().find(|t| t.uid == uid)
    }

    fn social_index_for_customer(&self, customer_id: Uuid) -> Option<usize> {
        self.socials.iter().position(|s| s.customer_id == customer_id)
    }

    fn view(&self, customer_id: Uuid) -> Option<CustomerView> {
        let customer = self.customers.iter().find(|c| c.id == customer_id)?;
        let social = self.socials.iter().find(|s| s.customer_id == customer_id)?;
        let trading = self.tradings.iter().find(|t| t.customer_id == customer_id)?;
        Some(CustomerView {
            customer: customer.clone(),
            social: social.clone(),
            trading: trading.clone(),
        })
    }

    fn insert_customer(&mut self, customer: Customer) -> StoreResult<()> {
        if self.customers.iter().any(|c| c.id == customer.id) {
            return Err(StoreError::CustomerExists);
        }
        self.customers.push(customer);
        Ok(())
    }

    fn insert_trading(&mut self, trading: TradingBinding) -> StoreResult<()> {
        let duplicate = self.tradings.iter().any(|t| {
            t.uid == trading.uid
                || (t.customer_id == trading.customer_id && t.platform == trading.platform)
        });
        if duplicate {
            return Err(StoreError::TradingBindingExists);
        }
        self.tradings.push(trading);
        Ok(())
    }

    fn insert_social(&mut self, social: SocialBinding) -> StoreResult<()> {
        let duplicate = self.socials.iter().any(|s| {
            (s.customer_id == social.customer_id && s.platform == social.platform)
                || (s.platform == social.platform && s.user_id == social.user_id)
        });
        if duplicate {
            return Err(StoreError::SocialBindingExists);
        }
        self.socials.push(social);
        Ok(())
    }
}

/// 인메모리 바인딩 저장소.
#[derive(Debug, Default)]
pub struct MemoryBindingStore {
    state: Mutex<State>,
}

impl MemoryBindingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn customer_count(&self) -> usize {
        self.lock().customers.len()
    }

    pub fn social_count(&self) -> usize {
        self.lock().socials.len()
    }

    pub fn trading_count(&self) -> usize {
        self.lock().tradings.len()
    }

    /// 기록된 거래 이력을 반환합니다.
    pub fn histories(&self) -> Vec<TradingHistory> {
        self.lock().histories.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl BindingStore for MemoryBindingStore {
    async fn create_verified(&self, input: NewVerifiedBinding) -> StoreResult<CustomerView> {
        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4(),
            username: input.username,
            created_at: now,
            updated_at: now,
        };
        let trading = TradingBinding {
            id: Uuid::new_v4(),
            customer_id: customer.id,
            platform: input.trading.platform,
            uid: input.trading.uid,
            register_time: input.trading.register_time,
            created_at: now,
            updated_at: now,
        };
        let social = SocialBinding {
            id: Uuid::new_v4(),
            customer_id: customer.id,
            platform: input.social.platform,
            user_id: input.social.user_id,
            username: input.social.username,
            first_name: input.social.first_name,
            last_name: input.social.last_name,
            is_active: true,
            status: input.social.status,
            member_role: input.social.member_role,
            deactivated_at: None,
            created_at: now,
            updated_at: now,
        };

        let mut state = self.lock();
        let mut staged = (*state).clone();
        staged.insert_customer(customer.clone())?;
        staged.insert_trading(trading.clone())?;
        staged.insert_social(social.clone())?;
        *state = staged;

        Ok(CustomerView {
            customer,
            social,
            trading,
        })
    }

    async fn find_by_uid(&self, uid: &str) -> StoreResult<Option<CustomerView>> {
        let state = self.lock();
        Ok(state
            .trading_by_uid(uid)
            .and_then(|t| state.view(t.customer_id)))
    }

    async fn member_role_by_uid(&self, uid: &str) -> StoreResult<MemberRole> {
        let state = self.lock();
        state
            .trading_by_uid(uid)
            .and_then(|t| state.social_index_for_customer(t.customer_id))
            .map(|i| state.socials[i].member_role)
            .ok_or_else(|| StoreError::NotFound(format!("binding for uid {uid}")))
    }

    async fn social_active_by_uid(&self, uid: &str) -> StoreResult<Option<bool>> {
        let state = self.lock();
        Ok(state
            .trading_by_uid(uid)
            .and_then(|t| state.social_index_for_customer(t.customer_id))
            .map(|i| state.socials[i].is_active))
    }

    async fn update_contact_by_uid(&self, uid: &str, update: &ContactUpdate) -> StoreResult<u64> {
        let mut state = self.lock();
        let Some(customer_id) = state.trading_by_uid(uid).map(|t| t.customer_id) else {
            return Ok(0);
        };
        let Some(index) = state.social_index_for_customer(customer_id) else {
            return Ok(0);
        };

        let taken = state.socials.iter().enumerate().any(|(i, s)| {
            i != index && s.platform == state.socials[index].platform && s.user_id == update.user_id
        });
        if taken {
            return Err(StoreError::SocialBindingExists);
        }

        let social = &mut state.socials[index];
        let unchanged = social.user_id == update.user_id
            && social.username == update.username
            && social.first_name == update.first_name
            && social.last_name == update.last_name;
        if unchanged {
            return Ok(0);
        }

        social.user_id = update.user_id.clone();
        social.username = update.username.clone();
        social.first_name = update.first_name.clone();
        social.last_name = update.last_name.clone();
        social.updated_at = Utc::now();
        Ok(1)
    }

    async fn list_customers(&self, page: PageRequest) -> StoreResult<CustomerPage> {
        let state = self.lock();
        let mut views: Vec<CustomerView> = state
            .customers
            .iter()
            .filter_map(|c| state.view(c.id))
            .collect();
        views.sort_by(|a, b| b.customer.created_at.cmp(&a.customer.created_at));

        let total = views.len() as u64;
        let items = views
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();

        Ok(CustomerPage {
            items,
            total,
            page: page.page,
            limit: page.limit,
        })
    }

    async fn update_social_status(
        &self,
        customer_id: Uuid,
        status: BindingStatus,
        role: MemberRole,
    ) -> StoreResult<u64> {
        let mut state = self.lock();
        let mut updated = 0;
        for social in state.socials.iter_mut().filter(|s| s.customer_id == customer_id) {
            social.status = status;
            social.member_role = role;
            social.updated_at = Utc::now();
            updated += 1;
        }
        Ok(updated)
    }

    async fn deactivate_customers(&self, customer_ids: &[Uuid]) -> StoreResult<()> {
        let mut state = self.lock();
        let now = Utc::now();
        let mut failed = Vec::new();

        for id in customer_ids {
            match state.social_index_for_customer(*id) {
                Some(index) => {
                    let social = &mut state.socials[index];
                    social.is_active = false;
                    social.deactivated_at = Some(now);
                    social.updated_at = now;
                }
                None => failed.push(*id),
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(StoreError::PartialDeactivation { failed })
        }
    }

    async fn record_trading_history(
        &self,
        uid: &str,
        entries: &[NewTradingHistory],
    ) -> StoreResult<usize> {
        let mut state = self.lock();
        let binding_id = state
            .trading_by_uid(uid)
            .map(|t| t.id)
            .ok_or_else(|| StoreError::NotFound(format!("trading binding for uid {uid}")))?;

        for entry in entries {
            let existing = state.histories.iter().position(|h| {
                h.binding_id == binding_id
                    && h.period == entry.period
                    && h.trading_date == entry.trading_date
            });
            match existing {
                Some(index) => state.histories[index].volume = entry.volume,
                None => state.histories.push(TradingHistory {
                    id: Uuid::new_v4(),
                    binding_id,
                    volume: entry.volume,
                    period: entry.period,
                    trading_date: entry.trading_date,
                    created_at: Utc::now(),
                }),
            }
        }

        Ok(entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewSocialBinding, NewTradingBinding};
    use chrono::NaiveDate;
    use gatekeeper_core::{SocialPlatform, TradingPeriod, TradingPlatform, UserContext};
    use rust_decimal_macros::dec;

    fn verified(uid: &str, user_id: &str) -> NewVerifiedBinding {
        let ctx = UserContext::telegram(uid, user_id).with_names("krabs", "Eugene", "Krabs");
        NewVerifiedBinding {
            username: ctx.display_name(),
            social: NewSocialBinding::from_context(&ctx),
            trading: NewTradingBinding {
                platform: TradingPlatform::Bitget,
                uid: uid.to_string(),
                register_time: None,
            },
        }
    }

    fn contact(user_id: &str, username: &str) -> ContactUpdate {
        ContactUpdate {
            user_id: user_id.to_string(),
            username: username.to_string(),
            first_name: "Eugene".to_string(),
            last_name: "Krabs".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_verified_creates_all_three() {
        let store = MemoryBindingStore::new();
        let view = store.create_verified(verified("123456", "42")).await.unwrap();

        assert_eq!(view.trading.uid, "123456");
        assert_eq!(view.social.customer_id, view.customer.id);
        assert_eq!(view.social.platform, SocialPlatform::Telegram);
        assert!(view.social.is_active);
        assert_eq!(store.customer_count(), 1);
        assert_eq!(store.social_count(), 1);
        assert_eq!(store.trading_count(), 1);

        let found = store.find_by_uid("123456").await.unwrap().unwrap();
        assert_eq!(found, view);
    }

    #[tokio::test]
    async fn test_reverify_same_uid_is_trading_conflict_and_rolls_back() {
        let store = MemoryBindingStore::new();
        store.create_verified(verified("123456", "42")).await.unwrap();

        // 같은 UID를 다른 텔레그램 계정으로 재인증
        let err = store.create_verified(verified("123456", "77")).await.unwrap_err();
        assert!(matches!(err, StoreError::TradingBindingExists));

        // 고객 단계는 성공했지만 롤백되어 보이지 않아야 함
        assert_eq!(store.customer_count(), 1);
        assert_eq!(store.social_count(), 1);
    }

    #[tokio::test]
    async fn test_same_social_account_different_uid_is_social_conflict() {
        let store = MemoryBindingStore::new();
        store.create_verified(verified("123456", "42")).await.unwrap();

        let err = store.create_verified(verified("654321", "42")).await.unwrap_err();
        assert!(matches!(err, StoreError::SocialBindingExists));
        assert_eq!(store.customer_count(), 1);
        assert_eq!(store.trading_count(), 1);
    }

    #[tokio::test]
    async fn test_member_role_and_active_lookup() {
        let store = MemoryBindingStore::new();
        store.create_verified(verified("123456", "42")).await.unwrap();

        assert_eq!(store.member_role_by_uid("123456").await.unwrap(), MemberRole::Member);
        assert_eq!(store.social_active_by_uid("123456").await.unwrap(), Some(true));
        assert_eq!(store.social_active_by_uid("999999").await.unwrap(), None);
        assert!(matches!(
            store.member_role_by_uid("999999").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_contact_counts_only_real_changes() {
        let store = MemoryBindingStore::new();
        store.create_verified(verified("123456", "42")).await.unwrap();

        let same = store
            .update_contact_by_uid("123456", &contact("42", "krabs"))
            .await
            .unwrap();
        assert_eq!(same, 0);

        let changed = store
            .update_contact_by_uid("123456", &contact("43", "krabs_new"))
            .await
            .unwrap();
        assert_eq!(changed, 1);

        let view = store.find_by_uid("123456").await.unwrap().unwrap();
        assert_eq!(view.social.user_id, "43");
        assert_eq!(view.social.username, "krabs_new");
    }

    #[tokio::test]
    async fn test_update_contact_rejects_account_bound_elsewhere() {
        let store = MemoryBindingStore::new();
        store.create_verified(verified("111111", "42")).await.unwrap();
        store.create_verified(verified("222222", "77")).await.unwrap();

        let err = store
            .update_contact_by_uid("222222", &contact("42", "krabs"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::SocialBindingExists));
    }

    #[tokio::test]
    async fn test_deactivate_is_soft_and_reports_failures() {
        let store = MemoryBindingStore::new();
        let view = store.create_verified(verified("123456", "42")).await.unwrap();
        let unknown = Uuid::new_v4();

        let err = store
            .deactivate_customers(&[view.customer.id, unknown])
            .await
            .unwrap_err();
        match err {
            StoreError::PartialDeactivation { failed } => assert_eq!(failed, vec![unknown]),
            other => panic!("unexpected error: {:?}", other),
        }

        let view = store.find_by_uid("123456").await.unwrap().unwrap();
        assert!(!view.social.is_active);
        assert!(view.social.deactivated_at.is_some());
        assert_eq!(store.customer_count(), 1);
    }

    #[tokio::test]
    async fn test_list_customers_newest_first() {
        let store = MemoryBindingStore::new();
        for (i, uid) in ["100001", "100002", "100003"].iter().enumerate() {
            store
                .create_verified(verified(uid, &format!("{}", 40 + i)))
                .await
                .unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let page = store.list_customers(PageRequest::new(1, 2)).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].uid(), "100003");

        let second = store.list_customers(PageRequest::new(2, 2)).await.unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].uid(), "100001");
    }

    #[tokio::test]
    async fn test_record_trading_history_upserts() {
        let store = MemoryBindingStore::new();
        store.create_verified(verified("123456", "42")).await.unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        let entry = |volume| NewTradingHistory {
            volume,
            period: TradingPeriod::Daily,
            trading_date: date,
        };

        store.record_trading_history("123456", &[entry(dec!(10.50))]).await.unwrap();
        store.record_trading_history("123456", &[entry(dec!(12.00))]).await.unwrap();

        let histories = store.histories();
        assert_eq!(histories.len(), 1);
        assert_eq!(histories[0].volume, dec!(12.00));

        assert!(matches!(
            store.record_trading_history("999999", &[entry(dec!(1))]).await,
            Err(StoreError::NotFound(_))
        ));
    }
}
