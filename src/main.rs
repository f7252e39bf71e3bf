use std::time::Duration;

use percapita_api::{
    ApiClient, BatchItem, BatchReport, EnrollmentPage, EnrollmentQuery, ReconciliationService,
};
use percapita_core::config::{
    api_base_url_from_env_value, bool_from_env_value, run_interval_from_env_value,
};
use percapita_core::constants::{ENV_API_TOKEN, ENV_API_URL, ENV_RUN_INTERVAL_SECS, ENV_USE_BATCH};
use percapita_core::{CoreConfig, EnrollmentStatus};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Periodic reconciliation job.
///
/// Each pass lists every enrollment still `PENDIENTE`, reconciles them against the loaded
/// extracts and writes changed statuses back. Without an interval a single pass is made and a
/// failure to list enrollments is returned as an error; with an interval, failures are logged and
/// the next pass is attempted after the delay.
///
/// # Environment Variables
/// - `PERCAPITA_API_URL`: backend base URL (default: "http://127.0.0.1:8000")
/// - `PERCAPITA_API_TOKEN`: bearer token sent with every request (optional)
/// - `PERCAPITA_USE_BATCH`: use the batched validation endpoint (default: true)
/// - `PERCAPITA_RUN_INTERVAL_SECS`: seconds between passes (unset: run once)
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("percapita_run=info".parse()?)
                .add_directive("percapita_api=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CoreConfig::new(
        api_base_url_from_env_value(std::env::var(ENV_API_URL).ok()),
        std::env::var(ENV_API_TOKEN).ok(),
        bool_from_env_value(ENV_USE_BATCH, std::env::var(ENV_USE_BATCH).ok(), true)?,
    )?;
    let interval = run_interval_from_env_value(std::env::var(ENV_RUN_INTERVAL_SECS).ok())?;

    tracing::info!("++ Reconciling against {}", config.api_base_url());

    let service = ReconciliationService::new(ApiClient::new(&config)?, config.use_batch_endpoint());

    let Some(interval) = interval else {
        run_once(&service).await?;
        return Ok(());
    };

    tracing::info!("++ Running every {}s", interval.as_secs());
    loop {
        if let Err(e) = run_once(&service).await {
            tracing::error!("Reconciliation pass failed: {:#}", e);
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("++ Shutting down");
                return Ok(());
            }
        }
    }
}

async fn run_once(service: &ReconciliationService<ApiClient>) -> anyhow::Result<BatchReport> {
    let run_id = uuid::Uuid::new_v4();
    let started = std::time::Instant::now();

    let query = EnrollmentQuery::default().with_status(EnrollmentStatus::Pendiente);
    let page = service.client().list_enrollments(&query).await?;
    let items = batch_items(&page);
    tracing::info!(%run_id, pending = items.len(), "reconciliation pass started");

    let report = service.reconcile_batch(&items).await;
    tracing::info!(
        %run_id,
        procesados = report.total_procesados,
        actualizados = report.total_actualizados,
        per_record = report.per_record,
        elapsed_ms = elapsed_ms(started.elapsed()),
        "reconciliation pass finished"
    );
    Ok(report)
}

/// Saved enrollments only; records without an id cannot be written back.
fn batch_items(page: &EnrollmentPage) -> Vec<BatchItem> {
    page.usuarios
        .iter()
        .filter_map(BatchItem::from_enrollment)
        .collect()
}

fn elapsed_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
