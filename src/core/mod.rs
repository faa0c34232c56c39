/// Notifications shown to users
pub mod notification;
/// Recurring transaction templates and the processor that advances them
pub mod recurring;
/// Date arithmetic for recurrence frequencies
pub mod schedule;
/// Posts, reactions, comments and trader rankings
pub mod social;
/// Scheduler bookkeeping stored in `system_state`
pub mod system_state;
/// Trade journal, bulk delete and AI classification
pub mod trades;
/// Ledger transactions
pub mod transaction;
/// Trending categories and hashtags
pub mod trending;
/// Free-trial lifecycle
pub mod trial;
