//! Periodic housekeeping: recurring-transaction generation and trial expiry.
//!
//! The same jobs back the `process-recurring` and `expire-trials` handlers, so an
//! external cron can drive them over HTTP instead of the in-process loop.

use crate::{
    core::{
        recurring::{self, ProcessingReport},
        system_state, trial,
    },
    errors::Result,
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::time::Duration;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::{error, info, instrument, warn};

/// Outcome of one housekeeping pass. A job that failed is `None`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HousekeepingReport {
    /// Recurring processor results
    pub recurring: Option<ProcessingReport>,
    /// Trials expired by the sweep
    pub expired_trials: Option<u64>,
}

/// Processes templates due on `today` and records the run.
///
/// Failing to record the run date does not fail the job: the ledger rows are
/// already committed by then.
pub async fn run_recurring_job(db: &DatabaseConnection, today: NaiveDate) -> Result<ProcessingReport> {
    let report = recurring::process_due_templates(db, today).await?;
    if let Err(e) = system_state::set_last_recurring_run(db, today).await {
        warn!(error = %e, %today, "Failed to record recurring run");
    }
    info!("{}", recurring::format_processing_summary(&report));
    Ok(report)
}

/// Expires overdue trials and records the sweep.
pub async fn run_trial_sweep(db: &DatabaseConnection, now: DateTime<Utc>) -> Result<u64> {
    let expired = trial::expire_trials(db, now).await?;
    if let Err(e) = system_state::set_last_trial_sweep(db, now).await {
        warn!(error = %e, "Failed to record trial sweep");
    }
    Ok(expired)
}

/// Runs every housekeeping job once for the instant `now`.
///
/// Jobs are independent: a failure in one is logged and the next still runs.
#[instrument(skip(db))]
pub async fn run_housekeeping_once(db: &DatabaseConnection, now: DateTime<Utc>) -> HousekeepingReport {
    let recurring = run_recurring_job(db, now.date_naive())
        .await
        .inspect_err(|e| error!(error = %e, "Recurring job failed"))
        .ok();
    let expired_trials = run_trial_sweep(db, now)
        .await
        .inspect_err(|e| error!(error = %e, "Trial sweep failed"))
        .ok();
    HousekeepingReport {
        recurring,
        expired_trials,
    }
}

/// Spawns a task that runs housekeeping immediately and then every `interval`.
///
/// Failures are logged and the loop keeps going.
pub fn spawn_housekeeping(db: DatabaseConnection, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = interval.as_secs(), "Housekeeping scheduler started");

        loop {
            ticker.tick().await;
            let report = run_housekeeping_once(&db, Utc::now()).await;
            info!(
                generated = report.recurring.as_ref().map(|r| r.succeeded),
                failed = report.recurring.as_ref().map(|r| r.failures.len()),
                expired_trials = report.expired_trials,
                "Housekeeping pass complete"
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Frequency, Transaction};
    use crate::test_utils::*;
    use chrono::Duration as ChronoDuration;
    use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait};

    #[tokio::test]
    async fn test_housekeeping_runs_both_jobs_and_records_them() -> Result<()> {
        let db = setup_test_db().await?;
        let now = reference_time();
        create_test_template(&db, "u1", "Rent", 1500.0, Frequency::Monthly, reference_date())
            .await?;
        trial::start_trial(&db, "u2", "Two", 7, now - ChronoDuration::days(8)).await?;

        let report = run_housekeeping_once(&db, now).await;
        assert_eq!(report.recurring.map(|r| r.succeeded), Some(1));
        assert_eq!(report.expired_trials, Some(1));
        assert_eq!(system_state::last_recurring_run(&db).await?, Some(reference_date()));
        assert_eq!(system_state::last_trial_sweep(&db).await?, Some(now));

        // same instant again: nothing new is due or overdue
        let again = run_housekeeping_once(&db, now).await;
        assert_eq!(again.recurring.map(|r| r.processed), Some(0));
        assert_eq!(again.expired_trials, Some(0));
        Ok(())
    }

    #[tokio::test]
    async fn test_trial_sweep_runs_when_recurring_job_fails() -> Result<()> {
        let db = setup_test_db().await?;
        let now = reference_time();
        trial::start_trial(&db, "u2", "Two", 7, now - ChronoDuration::days(8)).await?;
        db.execute_unprepared("DROP TABLE recurring_transactions").await?;

        let report = run_housekeeping_once(&db, now).await;
        assert!(report.recurring.is_none());
        assert_eq!(report.expired_trials, Some(1));
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_first_runs_both_succeed() -> Result<()> {
        let db = setup_test_db().await?;
        let today = reference_date();
        create_test_template(&db, "u1", "Rent", 1500.0, Frequency::Monthly, today).await?;

        let (a, b) = tokio::join!(run_recurring_job(&db, today), run_recurring_job(&db, today));
        let (a, b) = (a?, b?);
        assert_eq!(a.succeeded + b.succeeded, 1);
        assert_eq!(Transaction::find().count(&db).await?, 1);
        assert_eq!(system_state::last_recurring_run(&db).await?, Some(today));
        Ok(())
    }

    #[tokio::test]
    async fn test_back_dated_run_keeps_latest_date() -> Result<()> {
        let db = setup_test_db().await?;
        let today = reference_date();
        run_recurring_job(&db, today).await?;
        run_recurring_job(&db, today - ChronoDuration::days(3)).await?;
        assert_eq!(system_state::last_recurring_run(&db).await?, Some(today));
        Ok(())
    }

    #[tokio::test]
    async fn test_spawned_loop_runs_first_pass_immediately() -> Result<()> {
        let db = setup_test_db().await?;
        let today = Utc::now().date_naive();
        create_test_template(&db, "u1", "Gym", 50.0, Frequency::Weekly, today).await?;

        let handle = spawn_housekeeping(db.clone(), Duration::from_secs(3600));
        let mut recorded = None;
        for _ in 0..50 {
            recorded = system_state::last_recurring_run(&db).await?;
            if recorded.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        handle.abort();

        assert_eq!(recorded, Some(today));
        Ok(())
    }
}
