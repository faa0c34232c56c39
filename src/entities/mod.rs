//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod comment;
pub mod notification;
pub mod post;
pub mod profile;
pub mod reaction;
pub mod recurring_execution;
pub mod recurring_transaction;
pub mod sea_orm_active_enums;
pub mod system_state;
pub mod trade;
pub mod transaction;

// Re-export specific types to avoid conflicts
pub use comment::{Column as CommentColumn, Entity as Comment, Model as CommentModel};
pub use notification::{
    Column as NotificationColumn, Entity as Notification, Model as NotificationModel,
};
pub use post::{Column as PostColumn, Entity as Post, Model as PostModel};
pub use profile::{Column as ProfileColumn, Entity as Profile, Model as ProfileModel};
pub use reaction::{Column as ReactionColumn, Entity as Reaction, Model as ReactionModel};
pub use recurring_execution::{
    Column as RecurringExecutionColumn, Entity as RecurringExecution,
    Model as RecurringExecutionModel,
};
pub use recurring_transaction::{
    Column as RecurringTransactionColumn, Entity as RecurringTransaction,
    Model as RecurringTransactionModel,
};
pub use sea_orm_active_enums::{
    Frequency, ReactionKind, SubscriptionStatus, TradeSide, TransactionKind,
};
pub use system_state::{
    Column as SystemStateColumn, Entity as SystemState, Model as SystemStateModel,
};
pub use trade::{Column as TradeColumn, Entity as Trade, Model as TradeModel};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
};
