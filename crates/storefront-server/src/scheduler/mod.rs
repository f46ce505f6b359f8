//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup, registers the recurring
//! maintenance jobs, and hands the same scheduler to the [`CronJobRegistry`]
//! behind the dynamic-jobs API.

mod registry;

use std::sync::Arc;

use sqlx::PgPool;
use storefront_sheets::SheetSync;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

pub use registry::{CronJobRegistry, JobAction, JobInfo, JobRegistry, JobRegistryError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    config: Arc<storefront_core::AppConfig>,
    sheets: Arc<SheetSync>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_token_cleanup_job(&scheduler, pool, &config.token_cleanup_cron).await?;
    if let Some(cron) = config.sheets_sync_cron.as_deref() {
        register_sheets_sync_job(&scheduler, sheets, cron).await?;
    }

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the expired refresh-token cleanup job (hourly by default).
async fn register_token_cleanup_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let pool = Arc::clone(&pool);

        Box::pin(async move {
            run_token_cleanup(&pool).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered token_cleanup job");
    Ok(())
}

/// Delete expired refresh tokens and log how many went.
async fn run_token_cleanup(pool: &PgPool) {
    match storefront_db::delete_expired_refresh_tokens(pool).await {
        Ok(0) => tracing::debug!("scheduler: no expired refresh tokens"),
        Ok(n) => tracing::info!(deleted = n, "scheduler: deleted expired refresh tokens"),
        Err(e) => tracing::error!(error = %e, "scheduler: refresh token cleanup failed"),
    }
}

/// Register a recurring full sheet sync.
async fn register_sheets_sync_job(
    scheduler: &JobScheduler,
    sheets: Arc<SheetSync>,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let sheets = Arc::clone(&sheets);

        Box::pin(async move {
            tracing::info!("scheduler: starting scheduled sheets sync");
            sheets.full_sync().await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered sheets_sync job");
    Ok(())
}
