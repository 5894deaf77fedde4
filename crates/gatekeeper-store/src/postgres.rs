//! PostgreSQL 저장소 구현.

use crate::error::{conflict_or, StoreError, StoreResult};
use crate::model::{
    ContactUpdate, CustomerPage, NewTradingHistory, NewVerifiedBinding, PageRequest,
};
use crate::store::BindingStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatekeeper_core::{
    BindingStatus, Customer, CustomerView, DatabaseConfig, MemberRole, SocialBinding,
    TradingBinding,
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ============================================================================
// 연결 풀
// ============================================================================

/// 데이터베이스 연결 풀 래퍼.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 새로운 데이터베이스 연결 풀을 생성합니다.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        info!("Database connection established");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 스키마 DDL을 적용합니다 (개발/테스트용).
    pub async fn apply_schema(&self) -> StoreResult<()> {
        sqlx::raw_sql(crate::SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }
}

// ============================================================================
// 조회 모델
// ============================================================================

const VIEW_SELECT: &str = r#"
    SELECT
        c.id            AS customer_id,
        c.username      AS customer_username,
        c.created_at    AS customer_created_at,
        c.updated_at    AS customer_updated_at,
        s.id            AS social_id,
        s.platform      AS social_platform,
        s.user_id       AS social_user_id,
        s.username      AS social_username,
        s.first_name    AS social_first_name,
        s.last_name     AS social_last_name,
        s.is_active     AS social_is_active,
        s.status        AS social_status,
        s.member_role   AS social_member_role,
        s.deactivated_at AS social_deactivated_at,
        s.created_at    AS social_created_at,
        s.updated_at    AS social_updated_at,
        t.id            AS trading_id,
        t.platform      AS trading_platform,
        t.uid           AS trading_uid,
        t.register_time AS trading_register_time,
        t.created_at    AS trading_created_at,
        t.updated_at    AS trading_updated_at
    FROM customers c
    JOIN customer_social_bindings s ON s.customer_id = c.id
    JOIN customer_trading_bindings t ON t.customer_id = c.id
"#;

/// 조인 뷰 레코드.
#[derive(Debug, FromRow)]
struct CustomerViewRecord {
    customer_id: Uuid,
    customer_username: String,
    customer_created_at: DateTime<Utc>,
    customer_updated_at: DateTime<Utc>,
    social_id: Uuid,
    social_platform: String,
    social_user_id: String,
    social_username: String,
    social_first_name: String,
    social_last_name: String,
    social_is_active: bool,
    social_status: String,
    social_member_role: String,
    social_deactivated_at: Option<DateTime<Utc>>,
    social_created_at: DateTime<Utc>,
    social_updated_at: DateTime<Utc>,
    trading_id: Uuid,
    trading_platform: String,
    trading_uid: String,
    trading_register_time: Option<DateTime<Utc>>,
    trading_created_at: DateTime<Utc>,
    trading_updated_at: DateTime<Utc>,
}

impl TryFrom<CustomerViewRecord> for CustomerView {
    type Error = StoreError;

    fn try_from(r: CustomerViewRecord) -> Result<Self, Self::Error> {
        let invalid = |e: gatekeeper_core::UnknownVariant| StoreError::InvalidData(e.to_string());

        Ok(CustomerView {
            customer: Customer {
                id: r.customer_id,
                username: r.customer_username,
                created_at: r.customer_created_at,
                updated_at: r.customer_updated_at,
            },
            social: SocialBinding {
                id: r.social_id,
                customer_id: r.customer_id,
                platform: r.social_platform.parse().map_err(invalid)?,
                user_id: r.social_user_id,
                username: r.social_username,
                first_name: r.social_first_name,
                last_name: r.social_last_name,
                is_active: r.social_is_active,
                status: r.social_status.parse().map_err(invalid)?,
                member_role: MemberRole::from_stored(&r.social_member_role),
                deactivated_at: r.social_deactivated_at,
                created_at: r.social_created_at,
                updated_at: r.social_updated_at,
            },
            trading: TradingBinding {
                id: r.trading_id,
                customer_id: r.customer_id,
                platform: r.trading_platform.parse().map_err(invalid)?,
                uid: r.trading_uid,
                register_time: r.trading_register_time,
                created_at: r.trading_created_at,
                updated_at: r.trading_updated_at,
            },
        })
    }
}

// ============================================================================
// 저장소
// ============================================================================

/// PostgreSQL 바인딩 저장소.
#[derive(Clone)]
pub struct PgBindingStore {
    pool: PgPool,
}

impl PgBindingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn from_database(db: &Database) -> Self {
        Self::new(db.pool().clone())
    }
}

#[async_trait]
impl BindingStore for PgBindingStore {
    #[instrument(skip(self, input), fields(uid = %input.trading.uid))]
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

        // 에러로 조기 반환하면 tx 가 drop 되면서 롤백됨
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO customers (id, username, created_at, updated_at) VALUES ($1, $2, $3, $3)",
        )
        .bind(customer.id)
        .bind(&customer.username)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_or(e, StoreError::CustomerExists))?;

        sqlx::query(
            r#"
            INSERT INTO customer_trading_bindings
                (id, customer_id, platform, uid, register_time, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            "#,
        )
        .bind(trading.id)
        .bind(trading.customer_id)
        .bind(trading.platform.as_str())
        .bind(&trading.uid)
        .bind(trading.register_time)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_or(e, StoreError::TradingBindingExists))?;

        sqlx::query(
            r#"
            INSERT INTO customer_social_bindings
                (id, customer_id, platform, user_id, username, first_name, last_name,
                 is_active, status, member_role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, $8, $9, $10, $10)
            "#,
        )
        .bind(social.id)
        .bind(social.customer_id)
        .bind(social.platform.as_str())
        .bind(&social.user_id)
        .bind(&social.username)
        .bind(&social.first_name)
        .bind(&social.last_name)
        .bind(social.status.as_str())
        .bind(social.member_role.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_or(e, StoreError::SocialBindingExists))?;

        tx.commit().await?;

        debug!(customer_id = %customer.id, "Verified binding committed");

        Ok(CustomerView {
            customer,
            social,
            trading,
        })
    }

    async fn find_by_uid(&self, uid: &str) -> StoreResult<Option<CustomerView>> {
        let query = format!("{VIEW_SELECT} WHERE t.uid = $1");
        let record = sqlx::query_as::<_, CustomerViewRecord>(&query)
            .bind(uid)
            .fetch_optional(&self.pool)
            .await?;

        record.map(CustomerView::try_from).transpose()
    }

    async fn member_role_by_uid(&self, uid: &str) -> StoreResult<MemberRole> {
        let role: Option<String> = sqlx::query_scalar(
            r#"
            SELECT s.member_role
            FROM customer_trading_bindings t
            JOIN customer_social_bindings s ON s.customer_id = t.customer_id
            WHERE t.uid = $1
            "#,
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;

        role.map(|r| MemberRole::from_stored(&r))
            .ok_or_else(|| StoreError::NotFound(format!("binding for uid {uid}")))
    }

    async fn social_active_by_uid(&self, uid: &str) -> StoreResult<Option<bool>> {
        let active: Option<bool> = sqlx::query_scalar(
            r#"
            SELECT s.is_active
            FROM customer_trading_bindings t
            JOIN customer_social_bindings s ON s.customer_id = t.customer_id
            WHERE t.uid = $1
            "#,
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(active)
    }

    async fn update_contact_by_uid(&self, uid: &str, update: &ContactUpdate) -> StoreResult<u64> {
        // 값이 모두 같으면 0행으로 집계되도록 IS DISTINCT FROM 조건 사용
        let result = sqlx::query(
            r#"
            UPDATE customer_social_bindings s
            SET user_id = $2,
                username = $3,
                first_name = $4,
                last_name = $5,
                updated_at = NOW()
            FROM customer_trading_bindings t
            WHERE t.customer_id = s.customer_id
              AND t.uid = $1
              AND (s.user_id, s.username, s.first_name, s.last_name)
                  IS DISTINCT FROM ($2, $3, $4, $5)
            "#,
        )
        .bind(uid)
        .bind(&update.user_id)
        .bind(&update.username)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or(e, StoreError::SocialBindingExists))?;

        Ok(result.rows_affected())
    }

    async fn list_customers(&self, page: PageRequest) -> StoreResult<CustomerPage> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM customers c
            JOIN customer_social_bindings s ON s.customer_id = c.id
            JOIN customer_trading_bindings t ON t.customer_id = c.id
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let query = format!("{VIEW_SELECT} ORDER BY c.created_at DESC LIMIT $1 OFFSET $2");
        let records = sqlx::query_as::<_, CustomerViewRecord>(&query)
            .bind(i64::from(page.limit))
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let items = records
            .into_iter()
            .map(CustomerView::try_from)
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(CustomerPage {
            items,
            total: total.max(0) as u64,
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
        let result = sqlx::query(
            r#"
            UPDATE customer_social_bindings
            SET status = $2, member_role = $3, updated_at = NOW()
            WHERE customer_id = $1
            "#,
        )
        .bind(customer_id)
        .bind(status.as_str())
        .bind(role.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn deactivate_customers(&self, customer_ids: &[Uuid]) -> StoreResult<()> {
        let mut failed = Vec::new();

        for id in customer_ids {
            let result = sqlx::query(
                r#"
                UPDATE customer_social_bindings
                SET is_active = FALSE, deactivated_at = NOW(), updated_at = NOW()
                WHERE customer_id = $1
                "#,
            )
            .bind(id)
            .execute(&self.pool)
            .await;

            match result {
                Ok(done) if done.rows_affected() > 0 => {}
                Ok(_) => {
                    warn!(customer_id = %id, "No social binding to deactivate");
                    failed.push(*id);
                }
                Err(e) => {
                    warn!(customer_id = %id, error = %e, "Failed to deactivate customer");
                    failed.push(*id);
                }
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
        let binding_id: Uuid =
            sqlx::query_scalar("SELECT id FROM customer_trading_bindings WHERE uid = $1")
                .bind(uid)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| StoreError::NotFound(format!("trading binding for uid {uid}")))?;

        let mut tx = self.pool.begin().await?;

        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO trading_histories (id, binding_id, volume, period, trading_date)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (binding_id, period, trading_date)
                DO UPDATE SET volume = EXCLUDED.volume
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(binding_id)
            .bind(entry.volume)
            .bind(entry.period.as_str())
            .bind(entry.trading_date)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(entries.len())
    }
}
