use crate::error::WorkflowError;
use chrono_tz::Tz;
use gatekeeper_core::{parse_epoch_millis, DateRange, TradingPeriod};
use gatekeeper_exchange::{sum_volumes, AffiliateApi, ApiEnvelope, CustomerVolume};
use gatekeeper_store::{BindingStore, NewTradingHistory};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// 이번 달 거래량 조회 워크플로.
pub struct VolumeWorkflow {
    api: Arc<dyn AffiliateApi>,
    store: Arc<dyn BindingStore>,
    tz: Tz,
    record_history: bool,
}

impl VolumeWorkflow {
    pub fn new(api: Arc<dyn AffiliateApi>, store: Arc<dyn BindingStore>, tz: Tz) -> Self {
        Self {
            api,
            store,
            tz,
            record_history: false,
        }
    }

    /// 조회 후 일별 거래 이력 스냅샷을 비동기로 기록합니다.
    pub fn with_history_recording(mut self, enabled: bool) -> Self {
        self.record_history = enabled;
        self
    }

    /// 설정된 시간대 기준 이번 달 1일 00:00부터 현재까지의 거래량 합계.
    pub async fn handle_volume_check(
        &self,
        uid: &str,
        cancel: &CancellationToken,
    ) -> Result<Decimal, WorkflowError> {
        let range = DateRange::current_month(self.tz);
        info!(uid = %uid, start_ms = range.start_ms, end_ms = range.end_ms, "Volume check started");

        let body = self.api.customer_trade_volume(uid, range, cancel).await?;
        let entries = ApiEnvelope::<Vec<CustomerVolume>>::parse_list(&body)?;
        if entries.is_empty() {
            return Err(WorkflowError::UidNotFound);
        }

        let total = sum_volumes(&entries)?;
        info!(uid = %uid, entries = entries.len(), total = %total, "Volume check completed");

        if self.record_history {
            self.spawn_history_recording(uid, &entries);
        }

        Ok(total)
    }

    fn spawn_history_recording(&self, uid: &str, entries: &[CustomerVolume]) {
        let histories: Vec<NewTradingHistory> = entries
            .iter()
            .filter_map(|entry| {
                let volume = entry.volume_decimal().ok()?;
                let Some(time) = parse_epoch_millis(&entry.time) else {
                    warn!(uid = %uid, time = %entry.time, "Skipping volume entry without time");
                    return None;
                };
                Some(NewTradingHistory {
                    volume,
                    period: TradingPeriod::Daily,
                    trading_date: time.with_timezone(&self.tz).date_naive(),
                })
            })
            .collect();

        let store = Arc::clone(&self.store);
        let uid = uid.to_string();
        tokio::spawn(async move {
            match store.record_trading_history(&uid, &histories).await {
                Ok(count) => info!(uid = %uid, count, "Trading history recorded"),
                Err(e) => error!(uid = %uid, error = %e, "Failed to record trading history"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeAffiliate;
    use gatekeeper_core::{TradingPlatform, UserContext, DEFAULT_TIME_ZONE};
    use gatekeeper_store::{
        MemoryBindingStore, NewSocialBinding, NewTradingBinding, NewVerifiedBinding,
    };
    use rust_decimal_macros::dec;

    fn workflow(api: FakeAffiliate, store: Arc<MemoryBindingStore>) -> VolumeWorkflow {
        VolumeWorkflow::new(Arc::new(api), store, DEFAULT_TIME_ZONE)
    }

    #[tokio::test]
    async fn test_volume_sums_exactly() {
        let api = FakeAffiliate::new().with_volumes(
            "123456",
            &[("100.5", "1709251200000"), ("10.25", "1709337600000")],
        );
        let total = workflow(api, Arc::new(MemoryBindingStore::new()))
            .handle_volume_check("123456", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(total, dec!(110.75));
    }

    #[tokio::test]
    async fn test_empty_volume_is_uid_not_found() {
        let err = workflow(FakeAffiliate::new(), Arc::new(MemoryBindingStore::new()))
            .handle_volume_check("999999", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::UidNotFound));
    }

    #[tokio::test]
    async fn test_unparsable_volume_is_service_unavailable() {
        let api = FakeAffiliate::new().with_volumes("123456", &[("12,5", "1709251200000")]);
        let err = workflow(api, Arc::new(MemoryBindingStore::new()))
            .handle_volume_check("123456", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_non_success_code_is_service_unavailable() {
        let api = FakeAffiliate::new().with_raw_volume_body(
            "123456",
            r#"{"code":"40014","msg":"Incorrect permissions","data":null}"#,
        );
        let err = workflow(api, Arc::new(MemoryBindingStore::new()))
            .handle_volume_check("123456", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_history_recorded_in_background() {
        let store = Arc::new(MemoryBindingStore::new());
        let ctx = UserContext::telegram("123456", "42");
        store
            .create_verified(NewVerifiedBinding {
                username: "42".to_string(),
                social: NewSocialBinding::from_context(&ctx),
                trading: NewTradingBinding {
                    platform: TradingPlatform::Bitget,
                    uid: "123456".to_string(),
                    register_time: None,
                },
            })
            .await
            .unwrap();

        let api = FakeAffiliate::new().with_volumes(
            "123456",
            &[("100.5", "1709251200000"), ("10.25", "1709337600000")],
        );
        workflow(api, store.clone())
            .with_history_recording(true)
            .handle_volume_check("123456", &CancellationToken::new())
            .await
            .unwrap();

        for _ in 0..20 {
            if !store.histories().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        let histories = store.histories();
        assert_eq!(histories.len(), 2);
        assert!(histories.iter().all(|h| h.period == TradingPeriod::Daily));
    }
}
