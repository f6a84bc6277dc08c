use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use brandlens_common::Config;
use brandlens_ingest::directory::YouTubeDirectory;
use brandlens_ingest::extract::llm::OpenAiChunkExtractor;
use brandlens_ingest::extract::ExtractionEngine;
use brandlens_ingest::transcript::proxy::ProxyPool;
use brandlens_ingest::transcript::TranscriptChain;
use brandlens_ingest::IngestPipeline;
use brandlens_store::Store;
use llm_client::LlmClient;

#[derive(Parser)]
#[command(about = "Ingest channels into the analytics store")]
struct Cli {
    /// Channel id to ingest (repeat for multiple channels)
    #[arg(long = "channel")]
    channels: Vec<String>,

    /// Max number of recent videos to ingest per channel
    #[arg(long, default_value_t = 20)]
    max_videos: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("brandlens_ingest=info".parse()?)
                .add_directive("brandlens_store=info".parse()?)
                .add_directive("brandlens_common=info".parse()?)
                .add_directive("llm_client=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    if cli.channels.is_empty() {
        eprintln!("Please provide at least one --channel <CHANNEL_ID>");
        std::process::exit(1);
    }

    let config = Config::from_env();

    let store = Store::connect(&config.db_path).await?;

    let directory = Arc::new(YouTubeDirectory::new(&config.youtube_api_key));
    let proxies = Arc::new(ProxyPool::new(&config.proxy_list_url));
    let transcripts = TranscriptChain::from_config(&config, proxies);

    let llm = LlmClient::new(&config.openai_api_key, &config.openai_model);
    let extraction = ExtractionEngine::new(store.clone(), Arc::new(OpenAiChunkExtractor::new(llm)));

    let pipeline = IngestPipeline::new(store, directory, transcripts, extraction);
    info!(run_id = %pipeline.run_id(), channels = cli.channels.len(), "Ingestion run starting");

    for channel_id in &cli.channels {
        // Per-video failures are logged and counted; they never change the
        // process exit code.
        pipeline.ingest_channel(channel_id, cli.max_videos).await;
    }

    Ok(())
}
