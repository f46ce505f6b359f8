//! Named cron jobs that can be added, rescheduled and removed at runtime.

use std::{collections::BTreeMap, fmt, str::FromStr, sync::Arc};

use async_trait::async_trait;
use serde::Serialize;
use storefront_sheets::SheetSync;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

/// What a dynamic job does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobAction {
    /// Log that the job ran.
    Log,
    /// Rewrite the product sheet from the datastore.
    SheetsSync,
}

impl FromStr for JobAction {
    type Err = JobRegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "log" => Ok(Self::Log),
            "sheets-sync" => Ok(Self::SheetsSync),
            other => Err(JobRegistryError::UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for JobAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Log => write!(f, "log"),
            Self::SheetsSync => write!(f, "sheets-sync"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobInfo {
    pub name: String,
    pub cron: String,
    pub action: JobAction,
}

#[derive(Debug, Error)]
pub enum JobRegistryError {
    #[error("job '{0}' already exists")]
    AlreadyExists(String),
    #[error("job '{0}' not found")]
    NotFound(String),
    #[error("invalid cron expression '{cron}': {reason}")]
    InvalidSchedule { cron: String, reason: String },
    #[error("unknown job action '{0}', expected 'log' or 'sheets-sync'")]
    UnknownAction(String),
    #[error("scheduler error: {0}")]
    Scheduler(String),
}

#[async_trait]
pub trait JobRegistry: Send + Sync {
    /// Fails with [`JobRegistryError::AlreadyExists`] when `name` is taken.
    async fn add(&self, name: &str, cron: &str, action: JobAction)
        -> Result<JobInfo, JobRegistryError>;

    /// Replaces the schedule and action of an existing job.
    async fn update(
        &self,
        name: &str,
        cron: &str,
        action: JobAction,
    ) -> Result<JobInfo, JobRegistryError>;

    async fn delete(&self, name: &str) -> Result<(), JobRegistryError>;

    /// Jobs sorted by name.
    async fn list(&self) -> Vec<JobInfo>;
}

/// [`JobRegistry`] backed by the process-wide [`JobScheduler`].
pub struct CronJobRegistry {
    scheduler: JobScheduler,
    sheets: Arc<SheetSync>,
    jobs: Mutex<BTreeMap<String, (Uuid, JobInfo)>>,
}

impl CronJobRegistry {
    #[must_use]
    pub fn new(scheduler: JobScheduler, sheets: Arc<SheetSync>) -> Self {
        Self {
            scheduler,
            sheets,
            jobs: Mutex::new(BTreeMap::new()),
        }
    }

    fn build_job(&self, name: &str, cron: &str, action: JobAction) -> Result<Job, JobRegistryError> {
        let name: Arc<str> = Arc::from(name);
        let sheets = Arc::clone(&self.sheets);

        Job::new_async(cron, move |_uuid, _lock| {
            let name = Arc::clone(&name);
            let sheets = Arc::clone(&sheets);

            Box::pin(async move {
                match action {
                    JobAction::Log => {
                        tracing::info!(job = %name, "scheduler: dynamic job fired");
                    }
                    JobAction::SheetsSync => {
                        tracing::info!(job = %name, "scheduler: dynamic sheets sync starting");
                        sheets.full_sync().await;
                    }
                }
            })
        })
        .map_err(|e| JobRegistryError::InvalidSchedule {
            cron: cron.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl JobRegistry for CronJobRegistry {
    async fn add(
        &self,
        name: &str,
        cron: &str,
        action: JobAction,
    ) -> Result<JobInfo, JobRegistryError> {
        let mut jobs = self.jobs.lock().await;
        if jobs.contains_key(name) {
            return Err(JobRegistryError::AlreadyExists(name.to_string()));
        }

        let job = self.build_job(name, cron, action)?;
        let id = self
            .scheduler
            .add(job)
            .await
            .map_err(|e| JobRegistryError::Scheduler(e.to_string()))?;

        let info = JobInfo {
            name: name.to_string(),
            cron: cron.to_string(),
            action,
        };
        jobs.insert(name.to_string(), (id, info.clone()));
        tracing::info!(job = name, cron, %action, "scheduler: added dynamic job");
        Ok(info)
    }

    async fn update(
        &self,
        name: &str,
        cron: &str,
        action: JobAction,
    ) -> Result<JobInfo, JobRegistryError> {
        let mut jobs = self.jobs.lock().await;
        let Some((old_id, _)) = jobs.get(name).cloned() else {
            return Err(JobRegistryError::NotFound(name.to_string()));
        };

        // The replacement is scheduled before the old job goes away; any
        // failure leaves the old job running.
        let job = self.build_job(name, cron, action)?;
        let id = self
            .scheduler
            .add(job)
            .await
            .map_err(|e| JobRegistryError::Scheduler(e.to_string()))?;

        if let Err(e) = self.scheduler.remove(&old_id).await {
            if let Err(rollback) = self.scheduler.remove(&id).await {
                tracing::error!(job = name, error = %rollback, "scheduler: failed to drop replacement job");
            }
            return Err(JobRegistryError::Scheduler(e.to_string()));
        }

        let info = JobInfo {
            name: name.to_string(),
            cron: cron.to_string(),
            action,
        };
        jobs.insert(name.to_string(), (id, info.clone()));
        tracing::info!(job = name, cron, %action, "scheduler: rescheduled dynamic job");
        Ok(info)
    }

    async fn delete(&self, name: &str) -> Result<(), JobRegistryError> {
        let mut jobs = self.jobs.lock().await;
        let Some((id, _)) = jobs.get(name).cloned() else {
            return Err(JobRegistryError::NotFound(name.to_string()));
        };

        self.scheduler
            .remove(&id)
            .await
            .map_err(|e| JobRegistryError::Scheduler(e.to_string()))?;
        jobs.remove(name);
        tracing::info!(job = name, "scheduler: removed dynamic job");
        Ok(())
    }

    async fn list(&self) -> Vec<JobInfo> {
        self.jobs
            .lock()
            .await
            .values()
            .map(|(_, info)| info.clone())
            .collect()
    }
}
