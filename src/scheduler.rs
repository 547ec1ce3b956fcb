use anyhow::Result;
use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info};

use crate::config::{SchedulerConfig, parse_sweep_time};
use crate::db::Store;

/// Deletes expired sessions once a day at the configured time.
///
/// Expired sessions are already rejected at validation; the sweep only keeps
/// the table from growing without bound.
pub struct SessionSweeper {
    store: Store,
    config: SchedulerConfig,
}

impl SessionSweeper {
    pub const fn new(store: Store, config: SchedulerConfig) -> Self {
        Self { store, config }
    }

    /// Starts the cron scheduler. The returned handle must be kept alive for
    /// the jobs to keep firing.
    pub async fn start(&self) -> Result<JobScheduler> {
        let expr = cron_expression(&self.config.sweep_time)?;
        let sched = JobScheduler::new().await?;

        let store = self.store.clone();
        let job = Job::new_async(expr.as_str(), move |_uuid, _lock| {
            let store = store.clone();
            Box::pin(async move {
                if let Err(e) = sweep_expired_sessions(&store).await {
                    error!("Session sweep failed: {e:#}");
                }
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        info!(
            sweep_time = %self.config.sweep_time,
            "Session sweeper scheduled"
        );
        Ok(sched)
    }
}

pub async fn sweep_expired_sessions(store: &Store) -> Result<()> {
    let removed = store.delete_expired_sessions(Utc::now()).await?;

    if removed > 0 {
        info!(removed, "Swept expired sessions");
    } else {
        debug!("No expired sessions to sweep");
    }

    Ok(())
}

/// Turns "HH:MM" into a six-field cron expression firing daily at that time.
fn cron_expression(sweep_time: &str) -> Result<String> {
    let (hour, minute) = parse_sweep_time(sweep_time)?;
    Ok(format!("0 {minute} {hour} * * *"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cron_expression() {
        assert_eq!(cron_expression("03:00").unwrap(), "0 0 3 * * *");
        assert_eq!(cron_expression("14:30").unwrap(), "0 30 14 * * *");
        assert!(cron_expression("25:00").is_err());
    }
}
