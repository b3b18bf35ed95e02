use company_docs_core::core::config::Config;
use company_docs_core::core::database;
use company_docs_core::features::company_profiles::clients::OpenAiClient;
use company_docs_core::features::company_profiles::repositories::PgProfileRepository;
use company_docs_core::features::company_profiles::services::{ExtractionService, ProfileMerger};
use company_docs_core::features::documents::clients::LlmWhispererClient;
use company_docs_core::features::documents::repositories::{
    DocumentRepository, PgDocumentRepository,
};
use company_docs_core::features::documents::services::{
    CleanupService, DocumentPipeline, IntakeService, JobRegistry, OcrOrchestrator, PollPolicy,
};
use company_docs_core::features::documents::DocumentProcessor;
use company_docs_core::modules::storage::LocalFileStorage;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "System info: tokio_worker_threads={}, pid={}",
        worker_threads,
        std::process::id()
    );
    tracing::info!("Configuration loaded successfully");

    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    tracing::info!("Running database migrations...");
    database::run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    let storage = Arc::new(LocalFileStorage::new(config.app.upload_dir.clone()));
    storage
        .ensure_directories()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to prepare upload directory: {}", e))?;

    let documents: Arc<dyn DocumentRepository> = Arc::new(PgDocumentRepository::new(pool.clone()));
    let profiles = Arc::new(PgProfileRepository::new(pool.clone()));
    let registry = Arc::new(JobRegistry::new());

    let ocr_client = Arc::new(LlmWhispererClient::new(&config.ocr));
    let llm_client = Arc::new(OpenAiClient::new(&config.llm));
    tracing::info!(
        "External clients initialized (OCR: {}, LLM: {} via {})",
        config.ocr.base_url,
        config.llm.model,
        config.llm.base_url
    );

    let pipeline = Arc::new(DocumentPipeline::new(
        Arc::clone(&documents),
        Arc::clone(&registry),
        IntakeService::new(Arc::clone(&documents), Arc::clone(&storage), Arc::clone(&registry)),
        OcrOrchestrator::new(ocr_client, PollPolicy::from_config(&config.ocr)),
        ExtractionService::from_config(llm_client, &config.llm),
        ProfileMerger::new(profiles),
        CleanupService::new(documents, storage, registry),
    ));
    tracing::info!("Document pipeline initialized");

    let processor = DocumentProcessor::new(pipeline, &config.worker, config.app.job_retention);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    processor.run(shutdown_rx).await;

    pool.close().await;
    tracing::info!("Document processor stopped");
    Ok(())
}
