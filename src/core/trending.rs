//! Trending topics aggregation.
//!
//! Each post in the trailing window gets a score of `reactions * 2 + comments * 3`.
//! Category scores sum the posts in that category. Hashtag scores sum every post that
//! contains the hashtag, so a post with three hashtags counts three times across the
//! hashtag list; hashtag totals are not comparable to category totals.

use crate::{
    entities::{Comment, Post, Reaction, comment, post, reaction},
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use sea_orm::{QueryOrder, QuerySelect, prelude::*};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::LazyLock;

const REACTION_WEIGHT: u64 = 2;
const COMMENT_WEIGHT: u64 = 3;
/// Longest trailing window, in days, that trending accepts.
pub const MAX_WINDOW_DAYS: i64 = 365;

static HASHTAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"(?:^|[^\w&])#(\w+)").expect("hashtag pattern is valid")
});

/// A post with its engagement counts, the input of [`compute_trending`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostEngagement {
    /// Post category
    pub category: String,
    /// Post body
    pub content: String,
    /// Number of reactions on the post
    pub reactions: u64,
    /// Number of comments on the post
    pub comments: u64,
}

/// Aggregated score of one category or hashtag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicScore {
    /// Category name or `#hashtag`
    pub name: String,
    /// Sum of post scores
    pub score: u64,
    /// Number of posts contributing
    pub post_count: usize,
}

/// Top categories and hashtags, each sorted by descending score.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrendingTopics {
    /// Highest scoring categories
    pub categories: Vec<TopicScore>,
    /// Highest scoring hashtags
    pub hashtags: Vec<TopicScore>,
}

/// Score of a single post.
#[must_use]
pub const fn post_score(reactions: u64, comments: u64) -> u64 {
    reactions * REACTION_WEIGHT + comments * COMMENT_WEIGHT
}

/// Extracts the distinct hashtags of a text, lower-cased, in order of first appearance.
#[must_use]
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for captures in HASHTAG_RE.captures_iter(text) {
        let tag = format!("#{}", captures[1].to_lowercase());
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// Accumulates scores while remembering first-seen order for stable tie breaking.
#[derive(Default)]
struct Tally {
    index: HashMap<String, usize>,
    entries: Vec<TopicScore>,
}

impl Tally {
    fn add(&mut self, name: &str, score: u64) {
        if let Some(&i) = self.index.get(name) {
            let entry = &mut self.entries[i];
            entry.score += score;
            entry.post_count += 1;
        } else {
            self.index.insert(name.to_string(), self.entries.len());
            self.entries.push(TopicScore {
                name: name.to_string(),
                score,
                post_count: 1,
            });
        }
    }

    fn top(mut self, limit: usize) -> Vec<TopicScore> {
        // sort_by is stable: equal scores keep first-seen order
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(limit);
        self.entries
    }
}

/// Computes the top `limit` categories and hashtags for a set of posts.
#[must_use]
pub fn compute_trending(posts: &[PostEngagement], limit: usize) -> TrendingTopics {
    let mut categories = Tally::default();
    let mut hashtags = Tally::default();

    for post in posts {
        let score = post_score(post.reactions, post.comments);
        categories.add(&post.category, score);
        for tag in extract_hashtags(&post.content) {
            hashtags.add(&tag, score);
        }
    }

    TrendingTopics {
        categories: categories.top(limit),
        hashtags: hashtags.top(limit),
    }
}

fn tally_post_ids(post_ids: Vec<i64>) -> HashMap<i64, u64> {
    let mut counts = HashMap::new();
    for post_id in post_ids {
        *counts.entry(post_id).or_insert(0) += 1;
    }
    counts
}

/// Loads posts created within `window_days` before `now` with their engagement counts,
/// oldest first.
pub async fn load_post_engagement(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
    window_days: i64,
) -> Result<Vec<PostEngagement>> {
    if !(1..=MAX_WINDOW_DAYS).contains(&window_days) {
        return Err(Error::validation(format!(
            "trending window must be between 1 and {MAX_WINDOW_DAYS} days, got {window_days}"
        )));
    }
    let since = now - Duration::days(window_days);
    let posts = Post::find()
        .filter(post::Column::CreatedAt.gte(since))
        .filter(post::Column::CreatedAt.lte(now))
        .order_by_asc(post::Column::CreatedAt)
        .order_by_asc(post::Column::Id)
        .all(db)
        .await?;

    if posts.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
    let reactions = tally_post_ids(
        Reaction::find()
            .select_only()
            .column(reaction::Column::PostId)
            .filter(reaction::Column::PostId.is_in(ids.clone()))
            .into_tuple::<i64>()
            .all(db)
            .await?,
    );
    let comments = tally_post_ids(
        Comment::find()
            .select_only()
            .column(comment::Column::PostId)
            .filter(comment::Column::PostId.is_in(ids))
            .into_tuple::<i64>()
            .all(db)
            .await?,
    );

    Ok(posts
        .into_iter()
        .map(|p| PostEngagement {
            reactions: reactions.get(&p.id).copied().unwrap_or(0),
            comments: comments.get(&p.id).copied().unwrap_or(0),
            category: p.category,
            content: p.content,
        })
        .collect())
}

/// Trending categories and hashtags for the window ending at `now`.
pub async fn trending_topics(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
    window_days: i64,
    limit: usize,
) -> Result<TrendingTopics> {
    let posts = load_post_engagement(db, now, window_days).await?;
    Ok(compute_trending(&posts, limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::social;
    use crate::entities::ReactionKind;
    use crate::test_utils::*;

    fn engagement(category: &str, content: &str, reactions: u64, comments: u64) -> PostEngagement {
        PostEngagement {
            category: category.to_string(),
            content: content.to_string(),
            reactions,
            comments,
        }
    }

    #[test]
    fn test_category_score_example() {
        let posts = vec![
            engagement("Options", "Selling puts", 3, 2),
            engagement("Options", "Iron condor", 1, 0),
        ];

        let topics = compute_trending(&posts, 5);
        assert_eq!(topics.categories.len(), 1);
        assert_eq!(topics.categories[0].name, "Options");
        assert_eq!(topics.categories[0].score, 14);
        assert_eq!(topics.categories[0].post_count, 2);
    }

    #[test]
    fn test_hashtags_count_post_for_every_tag() {
        let posts = vec![
            engagement("Stocks", "Watching #SPY and #QQQ today #spy", 1, 1),
            engagement("Crypto", "#BTC breakout", 0, 1),
        ];

        let topics = compute_trending(&posts, 5);
        let names: Vec<&str> = topics.hashtags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["#spy", "#qqq", "#btc"]);
        // repeated tag in one post counts once
        assert_eq!(topics.hashtags[0].score, 5);
        assert_eq!(topics.hashtags[0].post_count, 1);
        assert_eq!(topics.hashtags[1].score, 5);
        assert_eq!(topics.hashtags[2].score, 3);
        // hashtag totals double count relative to categories
        let hashtag_total: u64 = topics.hashtags.iter().map(|t| t.score).sum();
        let category_total: u64 = topics.categories.iter().map(|t| t.score).sum();
        assert_eq!(hashtag_total, 13);
        assert_eq!(category_total, 8);
    }

    #[test]
    fn test_top_limit_and_stable_ties() {
        let posts: Vec<PostEngagement> = ["A", "B", "C", "D", "E", "F", "G"]
            .iter()
            .map(|c| engagement(c, "", 1, 0))
            .chain(std::iter::once(engagement("Z", "", 5, 0)))
            .collect();

        let topics = compute_trending(&posts, 5);
        let names: Vec<&str> = topics.categories.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Z", "A", "B", "C", "D"]);
    }

    #[test]
    fn test_extract_hashtags() {
        assert_eq!(extract_hashtags("#Day1 gains"), vec!["#day1"]);
        assert_eq!(extract_hashtags("no tags here"), Vec::<String>::new());
        assert_eq!(extract_hashtags("email me a#b or &#39;"), Vec::<String>::new());
        assert_eq!(
            extract_hashtags("(#theta) #theta,#Gamma"),
            vec!["#theta", "#gamma"]
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(compute_trending(&[], 5), TrendingTopics::default());
    }

    #[tokio::test]
    async fn test_trending_topics_from_database() -> Result<()> {
        let db = setup_test_db().await?;
        let now = Utc::now();

        let first = create_test_post(&db, "Options", "Selling #puts", now - Duration::days(1)).await?;
        let second = create_test_post(&db, "Options", "#puts again", now - Duration::days(2)).await?;
        let old = create_test_post(&db, "Crypto", "#btc", now - Duration::days(10)).await?;

        for (user, kind) in [
            ("u1", ReactionKind::Like),
            ("u2", ReactionKind::Like),
            ("u3", ReactionKind::Fire),
        ] {
            social::add_reaction(&db, first.id, user, kind).await?;
        }
        social::add_reaction(&db, second.id, "u1", ReactionKind::Like).await?;
        social::add_comment(&db, first.id, "u4", "Nice").await?;
        social::add_comment(&db, first.id, "u5", "Agreed").await?;
        // engagement on a post outside the window is ignored
        for user in ["u1", "u2", "u3", "u4"] {
            social::add_reaction(&db, old.id, user, ReactionKind::Like).await?;
        }

        let topics = trending_topics(&db, now, 7, 5).await?;
        assert_eq!(topics.categories.len(), 1);
        assert_eq!(topics.categories[0].name, "Options");
        assert_eq!(topics.categories[0].score, 14);
        assert_eq!(topics.hashtags.len(), 1);
        assert_eq!(topics.hashtags[0].name, "#puts");
        assert_eq!(topics.hashtags[0].score, 14);

        for window in [0, MAX_WINDOW_DAYS + 1, i64::MAX] {
            assert!(matches!(
                trending_topics(&db, now, window, 5).await,
                Err(Error::Validation { .. })
            ));
        }

        Ok(())
    }
}
