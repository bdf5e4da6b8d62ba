//! JSON rendering of engine reads.

use mindshare_core::SentimentLabel;
use mindshare_signals::SignalEngine;
use serde_json::{json, Value};

/// Everything the engine can tell about its current state.
pub(crate) fn full_report(engine: &SignalEngine, narratives: usize, trending: usize) -> Value {
    let state = engine.get_snapshot();
    json!({
        "last_updated": state.last_updated,
        "posts": state.posts.len(),
        "influencers": state.influencers.len(),
        "mindshare": engine.get_mindshare_snapshot(),
        "narratives": engine.get_narratives(narratives),
        "trending": engine.get_trending_topics(trending),
    })
}

/// One-line summary printed on every merge in `watch` mode.
pub(crate) fn summary_line(engine: &SignalEngine) -> String {
    let state = engine.get_snapshot();
    let mindshare = engine.get_mindshare_snapshot();
    let top = engine
        .get_trending_topics(3)
        .into_iter()
        .map(|t| t.topic)
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "score={:.1} change={:+.1}% posts={} influencers={} top=[{}]",
        mindshare.score,
        mindshare.change_pct,
        state.posts.len(),
        state.influencers.len(),
        top
    )
}

pub(crate) fn classification(value: f64, label: SentimentLabel) -> Value {
    json!({ "value": value, "label": label })
}
