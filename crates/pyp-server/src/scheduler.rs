//! Background job scheduler.
//!
//! Registers the recurring OTP purge at server startup.

use std::sync::Arc;

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Every five minutes, on the minute.
pub const OTP_PURGE_SCHEDULE: &str = "0 */5 * * * *";

/// Builds and starts the background job scheduler.
///
/// The returned handle must be kept alive for the lifetime of the process;
/// dropping it shuts the jobs down.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(pool: PgPool) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_otp_purge_job(&scheduler, pool).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_otp_purge_job(
    scheduler: &JobScheduler,
    pool: PgPool,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async(OTP_PURGE_SCHEDULE, move |_uuid, _lock| {
        let pool = Arc::clone(&pool);

        Box::pin(async move {
            match pyp_db::purge_expired_otps(&pool).await {
                Ok(0) => tracing::debug!("scheduler: no expired OTPs"),
                Ok(removed) => tracing::info!(removed, "scheduler: purged expired OTPs"),
                Err(e) => tracing::error!(error = %e, "scheduler: OTP purge failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purge_schedule_is_a_valid_cron_expression() {
        let job = Job::new_async(OTP_PURGE_SCHEDULE, |_uuid, _lock| Box::pin(async {}));
        assert!(job.is_ok());
    }
}
