use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use generation_gateway::backend::OllamaBackend;
use generation_gateway::cache::ResultCache;
use generation_gateway::config::{Args, validate_model_name};
use generation_gateway::executor::CachedRetryExecutor;
use generation_gateway::generation::GenerationService;
use generation_gateway::handlers::router;
use generation_gateway::proxy::{ChatProxyHandler, HttpUpstream};
use generation_gateway::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let model_name = validate_model_name(&args.model)?;
    let client = reqwest::Client::new();

    let cache = ResultCache::open(&args.cache_dir)?;
    let executor = CachedRetryExecutor::new(cache, args.retry_policy());
    let backend = OllamaBackend::new(client.clone(), args.backend_url());
    let generation = GenerationService::load(&backend, model_name, executor).await?;

    let chat = ChatProxyHandler::new(HttpUpstream::new(client, args.upstream_url.clone()));

    let state = Arc::new(AppState { generation, chat });
    let app = router(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(port = args.port, "gateway listening on http://localhost:{}", args.port);
    info!(backend = %args.backend_url(), model = model_name, "serving generation");
    info!(upstream = %args.upstream_url, "forwarding chat requests");
    info!(
        cache_dir = %args.cache_dir.display(),
        max_retries = args.max_retries,
        retry_delay = args.retry_delay,
        "generation cache and retry policy"
    );
    axum::serve(listener, app).await?;
    Ok(())
}
