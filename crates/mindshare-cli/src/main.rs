mod report;
mod sources;

use clap::{Parser, Subcommand};
use mindshare_signals::{classify, SignalEngine};
use tracing_subscriber::EnvFilter;

use crate::sources::{build_sources, SourceArgs};

#[derive(Debug, Parser)]
#[command(name = "mindshare-cli")]
#[command(about = "Aggregate social feeds into mindshare, narrative and trending views")]
struct Cli {
    #[command(flatten)]
    sources: SourceArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch every feed once and print a JSON report
    Snapshot {
        /// Number of narratives to include (defaults to MINDSHARE_NARRATIVE_TOP_N)
        #[arg(long)]
        narratives: Option<usize>,
        /// Number of trending topics to include (defaults to MINDSHARE_TRENDING_TOP_N)
        #[arg(long)]
        trending: Option<usize>,
    },
    /// Poll continuously and print a summary after every merge until Ctrl-C
    Watch,
    /// Label a raw sentiment value as positive, neutral or negative
    Classify {
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Classify { value } => {
            let label = classify(Some(value));
            println!("{}", report::classification(value, label));
        }
        Commands::Snapshot {
            narratives,
            trending,
        } => {
            let engine = build_engine(&cli.sources)?;
            engine.refresh().await;
            let narratives = narratives.unwrap_or(engine.config().narrative_top_n);
            let trending = trending.unwrap_or(engine.config().trending_top_n);
            let report = report::full_report(&engine, narratives, trending);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Watch => {
            let mut engine = build_engine(&cli.sources)?;
            watch(&mut engine).await;
        }
    }

    Ok(())
}

/// Loads config, installs the log subscriber and wires up the sources.
fn build_engine(args: &SourceArgs) -> anyhow::Result<SignalEngine> {
    let config = mindshare_core::load_engine_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    if args.is_empty() {
        anyhow::bail!(
            "no feed sources configured; pass --posts-url, --influencers-url or --fixture"
        );
    }
    let sources = build_sources(args, &config)?;
    Ok(SignalEngine::new(config, sources)?)
}

async fn watch(engine: &mut SignalEngine) {
    let mut updates = engine.subscribe();
    engine.start();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("{}", report::summary_line(engine));
            }
            () = &mut shutdown => break,
        }
    }

    engine.shutdown().await;
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("received shutdown signal, stopping");
}

#[cfg(test)]
mod tests;
