//! Free-trial lifecycle.
//!
//! New profiles start in `trial` with a fixed end moment. A trial past its end is
//! flipped to `expired` either lazily, when the user's status is checked, or in bulk
//! by the scheduled sweep. Paying users (`active`) are never touched.

use crate::{
    entities::{Profile, SubscriptionStatus, profile},
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{Set, prelude::*, sea_query::Expr};
use serde::Serialize;
use tracing::{info, instrument};

/// Longest trial, in days, that can be granted.
pub const MAX_TRIAL_DAYS: i64 = 365;

/// Subscription state as reported to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialStatus {
    /// User the status belongs to
    pub user_id: String,
    /// Current status after any expiry was applied
    pub status: SubscriptionStatus,
    /// End of the trial period
    pub trial_ends_at: DateTime<Utc>,
    /// Whole days left in the trial, rounded up; 0 unless in trial
    pub days_remaining: i64,
    /// Convenience flag for `status == expired`
    pub is_expired: bool,
}

/// Whole days between `now` and `ends_at`, rounded up, never negative.
#[must_use]
pub fn days_remaining(now: DateTime<Utc>, ends_at: DateTime<Utc>) -> i64 {
    let left = ends_at - now;
    if left <= Duration::zero() {
        return 0;
    }
    let days = left.num_days();
    if left > Duration::days(days) { days + 1 } else { days }
}

/// Creates a profile whose trial ends `trial_days` after `now`.
pub async fn start_trial(
    db: &DatabaseConnection,
    user_id: &str,
    display_name: &str,
    trial_days: i64,
    now: DateTime<Utc>,
) -> Result<profile::Model> {
    if user_id.trim().is_empty() {
        return Err(Error::validation("user_id cannot be empty"));
    }
    if !(1..=MAX_TRIAL_DAYS).contains(&trial_days) {
        return Err(Error::validation(format!(
            "trial length must be between 1 and {MAX_TRIAL_DAYS} days, got {trial_days}"
        )));
    }
    if Profile::find_by_id(user_id.to_string()).one(db).await?.is_some() {
        return Err(Error::validation(format!("profile {user_id} already exists")));
    }

    let model = profile::ActiveModel {
        user_id: Set(user_id.to_string()),
        display_name: Set(display_name.to_string()),
        subscription_status: Set(SubscriptionStatus::Trial),
        trial_ends_at: Set(now + Duration::days(trial_days)),
        created_at: Set(now),
    };
    model.insert(db).await.map_err(Into::into)
}

/// Reports a user's trial status, expiring the trial first if it has run out.
#[instrument(skip(db))]
pub async fn check_trial(
    db: &DatabaseConnection,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<TrialStatus> {
    let mut profile = Profile::find_by_id(user_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("profile", user_id))?;

    if profile.subscription_status == SubscriptionStatus::Trial && profile.trial_ends_at <= now {
        let mut active: profile::ActiveModel = profile.into();
        active.subscription_status = Set(SubscriptionStatus::Expired);
        profile = active.update(db).await?;
        info!(user_id, "Trial expired");
    }

    let days = match profile.subscription_status {
        SubscriptionStatus::Trial => days_remaining(now, profile.trial_ends_at),
        SubscriptionStatus::Active | SubscriptionStatus::Expired => 0,
    };

    Ok(TrialStatus {
        is_expired: profile.subscription_status == SubscriptionStatus::Expired,
        user_id: profile.user_id,
        status: profile.subscription_status,
        trial_ends_at: profile.trial_ends_at,
        days_remaining: days,
    })
}

/// Expires every trial whose end is at or before `now`. Returns how many were expired.
#[instrument(skip(db))]
pub async fn expire_trials(db: &DatabaseConnection, now: DateTime<Utc>) -> Result<u64> {
    let result = Profile::update_many()
        .col_expr(
            profile::Column::SubscriptionStatus,
            Expr::value(SubscriptionStatus::Expired),
        )
        .filter(profile::Column::SubscriptionStatus.eq(SubscriptionStatus::Trial))
        .filter(profile::Column::TrialEndsAt.lte(now))
        .exec(db)
        .await?;

    if result.rows_affected > 0 {
        info!(count = result.rows_affected, "Expired overdue trials");
    }
    Ok(result.rows_affected)
}

/// Marks a user as a paying subscriber.
pub async fn activate_subscription(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<profile::Model> {
    let profile = Profile::find_by_id(user_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("profile", user_id))?;
    let mut active: profile::ActiveModel = profile.into();
    active.subscription_status = Set(SubscriptionStatus::Active);
    active.update(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{reference_time, setup_test_db};

    #[test]
    fn test_days_remaining_rounds_up() {
        let now = reference_time();
        assert_eq!(days_remaining(now, now + Duration::days(7)), 7);
        assert_eq!(days_remaining(now, now + Duration::hours(25)), 2);
        assert_eq!(days_remaining(now, now + Duration::minutes(1)), 1);
        assert_eq!(days_remaining(now, now), 0);
        assert_eq!(days_remaining(now, now - Duration::days(3)), 0);
    }

    #[tokio::test]
    async fn test_check_trial_active_then_expired() -> Result<()> {
        let db = setup_test_db().await?;
        let start = reference_time();
        start_trial(&db, "u1", "Trader One", 7, start).await?;

        let status = check_trial(&db, "u1", start + Duration::days(2)).await?;
        assert_eq!(status.status, SubscriptionStatus::Trial);
        assert_eq!(status.days_remaining, 5);
        assert!(!status.is_expired);

        let status = check_trial(&db, "u1", start + Duration::days(8)).await?;
        assert_eq!(status.status, SubscriptionStatus::Expired);
        assert_eq!(status.days_remaining, 0);
        assert!(status.is_expired);

        // expiry was persisted
        let stored = Profile::find_by_id("u1".to_string()).one(&db).await?;
        assert_eq!(
            stored.map(|p| p.subscription_status),
            Some(SubscriptionStatus::Expired)
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_check_trial_unknown_user() -> Result<()> {
        let db = setup_test_db().await?;
        let result = check_trial(&db, "ghost", reference_time()).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_start_trial_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let now = reference_time();
        assert!(start_trial(&db, "u1", "One", 0, now).await.is_err());
        assert!(start_trial(&db, "u1", "One", i64::MAX, now).await.is_err());
        start_trial(&db, "u1", "One", 7, now).await?;
        assert!(matches!(
            start_trial(&db, "u1", "One", 7, now).await,
            Err(Error::Validation { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_expire_trials_sweeps_only_overdue_trials() -> Result<()> {
        let db = setup_test_db().await?;
        let now = reference_time();
        start_trial(&db, "old", "Old", 7, now - Duration::days(10)).await?;
        start_trial(&db, "fresh", "Fresh", 7, now).await?;
        start_trial(&db, "payer", "Payer", 7, now - Duration::days(30)).await?;
        activate_subscription(&db, "payer").await?;

        assert_eq!(expire_trials(&db, now).await?, 1);
        assert_eq!(expire_trials(&db, now).await?, 0);

        let payer = check_trial(&db, "payer", now).await?;
        assert_eq!(payer.status, SubscriptionStatus::Active);
        let fresh = check_trial(&db, "fresh", now).await?;
        assert_eq!(fresh.status, SubscriptionStatus::Trial);
        let old = check_trial(&db, "old", now).await?;
        assert!(old.is_expired);

        Ok(())
    }
}
