//! Notification business logic.
//!
//! Notifications are plain rows: the recurring processor writes one per generated
//! ledger transaction and the UI lists and dismisses them.

use crate::{
    entities::{Notification, notification},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::Expr};

/// Notification kind used for rows written by the recurring processor
pub const RECURRING_TRANSACTION_KIND: &str = "recurring_transaction";

/// Creates a notification for `user_id`.
pub async fn create_notification<C>(
    db: &C,
    user_id: &str,
    title: String,
    message: String,
    kind: &str,
    reference_id: Option<i64>,
) -> Result<notification::Model>
where
    C: ConnectionTrait,
{
    let model = notification::ActiveModel {
        user_id: Set(user_id.to_string()),
        title: Set(title),
        message: Set(message),
        kind: Set(kind.to_string()),
        reference_id: Set(reference_id),
        is_read: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Lists a user's unread notifications, newest first.
pub async fn list_unread(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Vec<notification::Model>> {
    Notification::find()
        .filter(notification::Column::UserId.eq(user_id))
        .filter(notification::Column::IsRead.eq(false))
        .order_by_desc(notification::Column::CreatedAt)
        .order_by_desc(notification::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Marks one of the user's notifications as read.
pub async fn mark_read(db: &DatabaseConnection, user_id: &str, notification_id: i64) -> Result<()> {
    let result = Notification::update_many()
        .col_expr(notification::Column::IsRead, Expr::value(true))
        .filter(notification::Column::Id.eq(notification_id))
        .filter(notification::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::not_found("notification", notification_id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    #[tokio::test]
    async fn test_create_list_and_mark_read() -> Result<()> {
        let db = setup_test_db().await?;

        let first = create_notification(
            &db,
            "user1",
            "Rent".to_string(),
            "Generated".to_string(),
            RECURRING_TRANSACTION_KIND,
            Some(7),
        )
        .await?;
        create_notification(
            &db,
            "user2",
            "Other".to_string(),
            "Not yours".to_string(),
            RECURRING_TRANSACTION_KIND,
            None,
        )
        .await?;

        let unread = list_unread(&db, "user1").await?;
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].reference_id, Some(7));

        mark_read(&db, "user1", first.id).await?;
        assert!(list_unread(&db, "user1").await?.is_empty());

        let result = mark_read(&db, "user2", first.id).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));

        Ok(())
    }
}
