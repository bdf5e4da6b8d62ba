use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;

use super::*;
use crate::error::ChannelError;
use crate::normalize::normalize_posts;
use crate::sentiment::classify;
use crate::sources::{RawFeedBatch, StaticFeedSource};
use crate::store::FeedBatch;
use crate::types::{InfluencerShape, PostShape, RawInfluencer, RawPost};
use mindshare_core::SentimentLabel;

fn post(id: &str, tag: &str) -> RawPost {
    RawPost::decode(PostShape::Social, json!({ "id": id, "tags": [tag], "likes": 1 })).unwrap()
}

fn influencer(id: &str) -> RawInfluencer {
    RawInfluencer::decode(InfluencerShape::Creator, json!({ "id": id, "name": id })).unwrap()
}

fn test_config() -> EngineConfig {
    EngineConfig {
        fast_poll_interval_ms: 1_000,
        slow_poll_interval_ms: 5_000,
        push_reconnect_delay_ms: 500,
        ..EngineConfig::default()
    }
}

fn engine_with(sources: Vec<Arc<StaticFeedSource>>) -> SignalEngine {
    let sources = sources
        .into_iter()
        .map(|s| s as Arc<dyn FeedSource>)
        .collect();
    SignalEngine::new(test_config(), sources).expect("valid config")
}

fn post_ids(engine: &SignalEngine) -> Vec<String> {
    engine
        .get_snapshot()
        .posts
        .iter()
        .map(|p| p.id.clone())
        .collect()
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[test]
fn new_rejects_invalid_config() {
    let config = EngineConfig {
        rolling_cap_size: 0,
        ..EngineConfig::default()
    };
    let result = SignalEngine::new(config, Vec::new());
    assert!(matches!(
        result,
        Err(ConfigError::InvalidKnob {
            knob: "rolling_cap_size",
            ..
        })
    ));
}

#[test]
fn reads_are_empty_before_first_merge() {
    let engine = engine_with(Vec::new());
    let snapshot = engine.get_snapshot();
    assert!(snapshot.posts.is_empty());
    assert!(snapshot.influencers.is_empty());
    assert!(snapshot.last_updated.is_none());

    let mindshare = engine.get_mindshare_snapshot();
    assert!(mindshare.score.abs() < f64::EPSILON);
    assert!(engine.narratives().is_empty());
    assert!(engine.trending().is_empty());
}

#[test]
fn pushed_duplicate_keeps_first_seen_engagement() {
    let engine = engine_with(Vec::new());
    let raw = vec![
        json!({ "id": "1", "likes": 10, "shares": 5, "comments": 2, "tags": ["#bonk"], "sentiment": 0.5 }),
        json!({ "id": "1", "likes": 999, "tags": ["#bonk"] }),
        json!({ "id": "2", "likes": 0, "tags": ["#sol"], "sentiment": -0.4 }),
    ]
    .into_iter()
    .map(|v| RawPost::decode(PostShape::Social, v).unwrap())
    .collect();

    let posts = normalize_posts(raw, 0);
    engine.ingest(IngestionEvent::Push(FeedBatch::Posts(posts)));

    let snapshot = engine.get_snapshot();
    assert_eq!(snapshot.posts.len(), 2);
    assert_eq!(snapshot.posts.snapshot()[0].id, "1");
    assert_eq!(snapshot.posts.snapshot()[0].engagement(), 17);

    let narratives = engine.get_narratives(12);
    let bonk = narratives.iter().find(|n| n.tag == "#bonk").unwrap();
    let sol = narratives.iter().find(|n| n.tag == "#sol").unwrap();
    assert_eq!(bonk.mention_count, 1);
    assert_eq!(sol.mention_count, 1);
    assert_eq!(bonk.avg_sentiment_label, SentimentLabel::Positive);
    assert_eq!(sol.avg_sentiment_label, SentimentLabel::Negative);

    assert_eq!(classify(Some(0.5)), SentimentLabel::Positive);
    assert_eq!(classify(Some(-0.4)), SentimentLabel::Negative);
}

#[tokio::test]
async fn refresh_with_one_failing_source_keeps_the_other() {
    let a = Arc::new(StaticFeedSource::new("a").failing());
    let b = Arc::new(
        StaticFeedSource::new("b")
            .with_posts(vec![post("b1", "#sol"), post("b2", "#bonk")])
            .with_influencers(vec![influencer("i1")]),
    );
    let engine = engine_with(vec![a, b]);

    engine.refresh().await;

    assert_eq!(post_ids(&engine), vec!["b1", "b2"]);
    assert_eq!(engine.get_snapshot().influencers.len(), 1);
    assert!(engine.get_snapshot().last_updated.is_some());
}

#[tokio::test]
async fn refresh_keeps_previous_data_when_every_source_fails() {
    let engine = engine_with(vec![
        Arc::new(StaticFeedSource::new("a").failing()),
        Arc::new(StaticFeedSource::new("b").failing()),
    ]);
    let seeded = normalize_posts(vec![post("old", "#sol")], 0);
    engine.ingest(IngestionEvent::Push(FeedBatch::Posts(seeded)));
    let stamped = engine.get_snapshot().last_updated;

    engine.refresh().await;

    assert_eq!(post_ids(&engine), vec!["old"]);
    assert_eq!(engine.get_snapshot().last_updated, stamped);
}

fn post_at(id: &str, created_at_secs: i64) -> RawPost {
    RawPost::decode(
        PostShape::Social,
        json!({ "id": id, "tags": ["#a"], "created_at": created_at_secs }),
    )
    .unwrap()
}

#[tokio::test]
async fn poll_across_sources_keeps_newest_posts_within_cap() {
    let old = Arc::new(
        StaticFeedSource::new("old")
            .with_posts(vec![post_at("o1", 1_600_000_000), post_at("o2", 1_600_000_100)]),
    );
    let new = Arc::new(
        StaticFeedSource::new("new")
            .with_posts(vec![post_at("n1", 1_700_000_100), post_at("n2", 1_700_000_000)]),
    );
    let config = EngineConfig {
        rolling_cap_size: 2,
        ..test_config()
    };
    let sources: Vec<Arc<dyn FeedSource>> = vec![old, new];
    let engine = SignalEngine::new(config, sources).expect("valid config");

    engine.refresh().await;

    assert_eq!(post_ids(&engine), vec!["n1", "n2"]);
    let snapshot = engine.get_snapshot();
    let stamps: Vec<i64> = snapshot.posts.iter().map(|p| p.timestamp_ms).collect();
    assert_eq!(stamps, vec![1_700_000_100_000, 1_700_000_000_000]);
}

#[tokio::test]
async fn poll_replaces_rather_than_accumulates() {
    let source = Arc::new(StaticFeedSource::new("s").with_posts(vec![post("p1", "#a")]));
    let engine = engine_with(vec![Arc::clone(&source)]);

    engine.refresh().await;
    source.set_posts(vec![post("p2", "#b"), post("p3", "#c")]);
    engine.refresh().await;

    assert_eq!(post_ids(&engine), vec!["p2", "p3"]);
}

#[tokio::test(start_paused = true)]
async fn start_fetches_immediately_then_on_each_interval() {
    let source = Arc::new(StaticFeedSource::new("s").with_posts(vec![post("p1", "#a")]));
    let mut engine = engine_with(vec![Arc::clone(&source)]);
    engine.start();

    settle().await;
    assert_eq!(source.post_fetches(), 1);
    assert_eq!(source.influencer_fetches(), 1);
    assert_eq!(post_ids(&engine), vec!["p1"]);

    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert_eq!(source.post_fetches(), 2);
    assert_eq!(source.influencer_fetches(), 1);

    tokio::time::sleep(Duration::from_millis(4_000)).await;
    assert_eq!(source.post_fetches(), 6);
    assert_eq!(source.influencer_fetches(), 2);

    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn hidden_engine_makes_no_calls_and_refreshes_on_visible() {
    let source = Arc::new(StaticFeedSource::new("s").with_posts(vec![post("p1", "#a")]));
    let mut engine = engine_with(vec![Arc::clone(&source)]);
    engine.set_visibility(Visibility::Hidden);
    engine.start();

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(source.post_fetches(), 0);
    assert_eq!(source.influencer_fetches(), 0);
    assert!(engine.get_snapshot().last_updated.is_none());

    engine.set_visibility(Visibility::Visible);
    settle().await;
    assert_eq!(source.post_fetches(), 1);
    assert_eq!(source.influencer_fetches(), 1);

    // The interval restarts from the visibility refresh.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(source.post_fetches(), 1);
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(source.post_fetches(), 2);

    engine.set_visibility(Visibility::Hidden);
    settle().await;
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(source.post_fetches(), 2);

    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn refresh_now_polls_both_feeds() {
    let source = Arc::new(StaticFeedSource::new("s"));
    let mut engine = engine_with(vec![Arc::clone(&source)]);
    engine.start();
    settle().await;

    engine.refresh_now();
    settle().await;

    assert_eq!(source.post_fetches(), 2);
    assert_eq!(source.influencer_fetches(), 2);

    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn push_batches_merge_while_polling_is_suspended() {
    let (tx, rx) = mpsc::unbounded_channel();
    let source = Arc::new(StaticFeedSource::new("live").with_push(rx));
    let mut engine = engine_with(vec![Arc::clone(&source)]);
    engine.set_visibility(Visibility::Hidden);
    engine.start();

    tx.send(Ok(RawFeedBatch::Posts(vec![post("p1", "#a")]))).unwrap();
    settle().await;
    tx.send(Ok(RawFeedBatch::Posts(vec![post("p2", "#b"), post("p1", "#z")]))).unwrap();
    settle().await;

    assert_eq!(source.post_fetches(), 0);
    assert_eq!(post_ids(&engine), vec!["p2", "p1"]);
    let snapshot = engine.get_snapshot();
    let first = &snapshot.posts.snapshot()[1];
    assert!(first.tags.contains("#z"));

    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn push_channel_reconnects_after_failure() {
    let (tx1, rx1) = mpsc::unbounded_channel();
    let (tx2, rx2) = mpsc::unbounded_channel();
    let source = Arc::new(StaticFeedSource::new("live").with_push(rx1).with_push(rx2));
    let mut engine = engine_with(vec![Arc::clone(&source)]);
    engine.set_visibility(Visibility::Hidden);
    engine.start();

    tx1.send(Ok(RawFeedBatch::Posts(vec![post("p1", "#a")]))).unwrap();
    tx1.send(Err(ChannelError::Transport("connection reset".into())))
        .unwrap();
    settle().await;
    assert_eq!(source.subscriptions(), 1);

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(source.subscriptions(), 2);

    tx2.send(Ok(RawFeedBatch::Posts(vec![post("p2", "#b")]))).unwrap();
    settle().await;
    assert_eq!(post_ids(&engine), vec!["p2", "p1"]);

    drop(tx2);
    tokio::time::sleep(Duration::from_millis(600)).await;
    // No third channel queued: the push loop gives up, polling is unaffected.
    assert_eq!(source.subscriptions(), 3);

    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_in_flight_fetches_and_stops_ticking() {
    let slow = Arc::new(
        StaticFeedSource::new("slow")
            .with_posts(vec![post("p1", "#a")])
            .with_delay(Duration::from_secs(5)),
    );
    let mut engine = engine_with(vec![Arc::clone(&slow)]);
    engine.start();
    settle().await;
    assert_eq!(slow.post_fetches(), 1);

    let started = tokio::time::Instant::now();
    engine.shutdown().await;
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(!engine.is_running());
    assert!(engine.get_snapshot().last_updated.is_none());

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(slow.post_fetches(), 1);
}

#[tokio::test(start_paused = true)]
async fn engine_can_restart_after_shutdown() {
    let source = Arc::new(StaticFeedSource::new("s").with_posts(vec![post("p1", "#a")]));
    let mut engine = engine_with(vec![Arc::clone(&source)]);

    engine.start();
    settle().await;
    engine.shutdown().await;

    engine.start();
    assert!(engine.is_running());
    settle().await;
    assert_eq!(source.post_fetches(), 2);

    engine.shutdown().await;
}
