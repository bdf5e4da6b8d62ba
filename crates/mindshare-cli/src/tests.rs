use super::*;
use crate::sources::{InfluencerShapeArg, PostShapeArg};

#[test]
fn parses_snapshot_with_overrides() {
    let cli = Cli::try_parse_from([
        "mindshare-cli",
        "snapshot",
        "--narratives",
        "5",
        "--trending",
        "3",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Snapshot {
            narratives: Some(5),
            trending: Some(3)
        }
    ));
}

#[test]
fn parses_global_source_args_after_subcommand() {
    let cli = Cli::try_parse_from([
        "mindshare-cli",
        "watch",
        "--posts-url",
        "https://feeds.example.com/posts",
        "--posts-shape",
        "tweet",
        "--influencers-shape",
        "account",
    ])
    .expect("expected valid cli args");

    assert!(matches!(cli.command, Commands::Watch));
    assert_eq!(
        cli.sources.posts_url.as_deref(),
        Some("https://feeds.example.com/posts")
    );
    assert_eq!(cli.sources.posts_shape, PostShapeArg::Tweet);
    assert_eq!(cli.sources.influencers_shape, InfluencerShapeArg::Account);
}

#[test]
fn classify_accepts_negative_values() {
    let cli = Cli::try_parse_from(["mindshare-cli", "classify", "-0.4"])
        .expect("expected valid cli args");
    let Commands::Classify { value } = cli.command else {
        panic!("expected classify command");
    };
    assert!((value + 0.4).abs() < f64::EPSILON);
}

#[test]
fn subcommand_is_required() {
    assert!(Cli::try_parse_from(["mindshare-cli"]).is_err());
}

#[test]
fn fixture_source_serves_file_contents() {
    let dir = std::env::temp_dir().join(format!("mindshare-cli-fixture-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("feed.json");
    std::fs::write(
        &path,
        r##"{"posts":[{"id":"1","text":"gm #sol"},{"text":"dropped"},"not a record"],"influencers":[{"id":"c1"},42]}"##,
    )
    .unwrap();

    let args = SourceArgs {
        fixture: Some(path),
        ..SourceArgs::default()
    };
    let sources = build_sources(&args, &mindshare_core::EngineConfig::default()).unwrap();
    assert_eq!(sources.len(), 1);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let engine = SignalEngine::new(mindshare_core::EngineConfig::default(), sources).unwrap();
    rt.block_on(engine.refresh());

    let state = engine.get_snapshot();
    assert_eq!(state.posts.len(), 1);
    assert_eq!(state.influencers.len(), 1);
    assert_eq!(engine.get_trending_topics(8)[0].topic, "#sol");

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn no_sources_configured_is_detected() {
    assert!(SourceArgs::default().is_empty());
}
