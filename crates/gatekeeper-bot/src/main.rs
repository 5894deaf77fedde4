//! Gatekeeper 봇 실행 파일.
//!
//! 설정 → 로깅 → 데이터베이스 → 거래소 클라이언트 → 디스패처 → long polling 순서로
//! 구성하고, Ctrl+C / SIGTERM 을 받으면 진행 중인 이벤트를 마친 뒤 종료합니다.

use std::sync::Arc;

use anyhow::Context;
use gatekeeper_bot::group_filter::{GroupContentFilter, GroupFilterConfig};
use gatekeeper_bot::workflow::{AccountWorkflow, StatusWorkflow, VerifyWorkflow, VolumeWorkflow};
use gatekeeper_bot::{MessageDispatcher, PrivateCommandHandler, TelegramMessenger, TelegramPoller};
use gatekeeper_core::{init_logging, AppConfig, LogConfig};
use gatekeeper_exchange::{AffiliateApi, BitgetClient, RateLimiter, RateLimiterConfig};
use gatekeeper_store::{BindingStore, Database, PgBindingStore};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    let config = AppConfig::load_default().context("설정 로드 실패")?;
    init_logging(LogConfig::from_settings(&config.logging)).map_err(|e| anyhow::anyhow!(e))?;
    config.validate().context("설정 검증 실패")?;
    info!(?config, "Configuration loaded");

    let tz = config.exchange.tz()?;

    let database = Database::connect(&config.database)
        .await
        .context("데이터베이스 연결 실패")?;
    let store: Arc<dyn BindingStore> = Arc::new(PgBindingStore::from_database(&database));

    let shutdown = CancellationToken::new();

    let limiter = Arc::new(RateLimiter::new(RateLimiterConfig {
        rate_per_second: config.exchange.rate_per_second,
        burst: config.exchange.burst,
    }));
    let stats_reporter = Arc::clone(&limiter).spawn_stats_reporter(shutdown.clone());
    let api: Arc<dyn AffiliateApi> =
        Arc::new(BitgetClient::from_config(&config.exchange, Arc::clone(&limiter))?);

    let telegram = Arc::new(TelegramMessenger::new(&config.telegram.bot_token)?);

    let private_handler = PrivateCommandHandler::new(
        telegram.clone(),
        VerifyWorkflow::new(api.clone(), store.clone()),
        VolumeWorkflow::new(api, store.clone(), tz)
            .with_history_recording(config.features.record_trading_history),
        AccountWorkflow::new(store.clone()),
        StatusWorkflow::new(store),
        config.telegram.invite_group_ids.clone(),
    );
    let group_filter = GroupContentFilter::new(
        telegram.clone(),
        GroupFilterConfig::from_config(&config.telegram).context("금지 패턴 정규식 오류")?,
    );

    let dispatcher = Arc::new(
        MessageDispatcher::new(telegram.clone(), shutdown.clone())
            .with_private_handler(Arc::new(private_handler))
            .with_group_handler(Arc::new(group_filter)),
    );

    info!(
        invite_groups = config.telegram.invite_group_ids.len(),
        monitored_groups = config.telegram.monitored_group_ids.len(),
        record_trading_history = config.features.record_trading_history,
        "Gatekeeper bot starting"
    );

    tokio::spawn(shutdown_signal(shutdown.clone()));
    TelegramPoller::new(telegram, dispatcher).run(shutdown.clone()).await;

    shutdown.cancel();
    if let Err(e) = stats_reporter.await {
        warn!(error = %e, "Rate limiter stats reporter ended abnormally");
    }
    database.pool().close().await;
    info!("Gatekeeper bot stopped gracefully");
    Ok(())
}

/// Ctrl+C 또는 SIGTERM 을 받으면 종료 토큰을 취소합니다.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    shutdown_token.cancel();
}
