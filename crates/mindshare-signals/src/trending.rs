//! Frequency-ranked trending topics.

use std::collections::HashMap;

use mindshare_core::{CanonicalPost, Trend, TrendingTopic};

/// Ranked positions that are labelled [`Trend::Up`].
///
/// Positional placeholder, not a velocity measurement: nothing here compares
/// counts across time.
const UP_POSITIONS: usize = 5;

/// Count tag occurrences across `posts` and return the `top_n` most frequent.
///
/// The unit counted is a post mentioning a tag: each post adds one per tag in
/// its normalized tag set, so explicit tags and text hashtags both count,
/// and a hashtag repeated inside one post counts once. Ties keep first-seen
/// order.
/// The first five ranked topics are labelled `up`, the rest `stable`.
#[must_use]
pub fn trending_topics(posts: &[CanonicalPost], top_n: usize) -> Vec<TrendingTopic> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for tag in posts.iter().flat_map(|p| p.tags.iter()) {
        match index.get(tag.as_str()) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(tag.as_str(), counts.len());
                counts.push((tag.as_str(), 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));

    counts
        .into_iter()
        .take(top_n)
        .enumerate()
        .map(|(position, (topic, mentions))| TrendingTopic {
            topic: topic.to_string(),
            mentions,
            trend: if position < UP_POSITIONS {
                Trend::Up
            } else {
                Trend::Stable
            },
        })
        .collect()
}
