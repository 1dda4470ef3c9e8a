use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod settings;

use application::services::{
    DomainIndexStore, EmbeddingEngine, PipelineConfig, QueryOrchestrator, RerankEngine,
    TextGenerator,
};
use domain::DomainCatalog;
#[cfg(feature = "fastembed-engine")]
use infrastructure::{FastEmbedEngine, FastEmbedReranker};
use infrastructure::{
    load_domain_store, NoOpGenerator, RemoteGenerator, SimpleEmbedEngine, TokenOverlapReranker,
};
use settings::{AppConfig, ConfigManager, EmbeddingBackend, GeneratorBackend, RerankerBackend};

pub const DEFAULT_SERVICE_HOST: &str = "127.0.0.1";
pub const DEFAULT_SERVICE_PORT: u16 = 5000;

/// Application-lifetime context shared by the binaries.
pub struct AppHandles {
    pub orchestrator: Arc<QueryOrchestrator>,
    pub catalog: Arc<DomainCatalog>,
    pub store: Arc<DomainIndexStore>,
    pub embedder: Arc<dyn EmbeddingEngine>,
    pub config: AppConfig,
    pub data_dir: PathBuf,
    pub indexes_dir: PathBuf,
}

/// Bootstraps from the resolved data directory (`MEDIRAG_DATA_DIR` or the OS default).
pub fn build_environment() -> Result<AppHandles> {
    let data_dir = resolve_data_dir()?;
    build_environment_at(data_dir)
}

/// Loads config, domain indexes and model backends rooted at `data_dir`.
pub fn build_environment_at(data_dir: PathBuf) -> Result<AppHandles> {
    std::fs::create_dir_all(&data_dir).context("failed to create data directory")?;
    let config = ConfigManager::load(&data_dir)
        .context("failed to load config file")?
        .current();

    let indexes_dir = resolve_indexes_dir(&config, &data_dir)?;
    info!(
        target: "medirag::bootstrap",
        data_dir = %data_dir.display(),
        indexes_dir = %indexes_dir.display(),
        embedding = config.embedding.id(),
        embedding_model = config.embedding.model_name(),
        reranker = config.reranker.id(),
        generator = config.generator.id(),
        "bootstrapping pipeline"
    );

    let catalog = Arc::new(DomainCatalog::medical(&indexes_dir));
    let store = Arc::new(load_domain_store(&catalog));

    let embedder =
        init_embedder(&config.embedding).context("failed to initialise embedding backend")?;
    warn_on_dimension_mismatch(embedder.as_ref(), &store);
    let reranker =
        init_reranker(&config.reranker).context("failed to initialise reranking backend")?;
    let generator =
        init_generator(&config.generator).context("failed to initialise generation backend")?;

    let orchestrator = QueryOrchestrator::new(
        Arc::clone(&embedder),
        Arc::clone(&store),
        Arc::clone(&catalog),
        reranker,
        generator,
        PipelineConfig::default(),
    )
    .map_err(|err| anyhow!(err))
    .context("failed to build query pipeline")?;

    Ok(AppHandles {
        orchestrator: Arc::new(orchestrator),
        catalog,
        store,
        embedder,
        config,
        data_dir,
        indexes_dir,
    })
}

pub fn init_embedder(backend: &EmbeddingBackend) -> Result<Arc<dyn EmbeddingEngine>> {
    match backend {
        EmbeddingBackend::Simple { model, dimensions } => {
            let engine = SimpleEmbedEngine::try_new(model.clone(), *dimensions)
                .map_err(|err| anyhow!(err.to_string()))?;
            Ok(Arc::new(engine))
        }
        #[cfg(feature = "fastembed-engine")]
        EmbeddingBackend::FastEmbed { model } => {
            let engine = FastEmbedEngine::try_new(model).map_err(|err| anyhow!(err.to_string()))?;
            Ok(Arc::new(engine))
        }
    }
}

fn init_reranker(backend: &RerankerBackend) -> Result<Arc<dyn RerankEngine>> {
    match backend {
        RerankerBackend::TokenOverlap => Ok(Arc::new(TokenOverlapReranker::new())),
        #[cfg(feature = "fastembed-engine")]
        RerankerBackend::FastEmbed { model } => {
            let engine =
                FastEmbedReranker::try_new(model).map_err(|err| anyhow!(err.to_string()))?;
            Ok(Arc::new(engine))
        }
    }
}

fn init_generator(backend: &GeneratorBackend) -> Result<Arc<dyn TextGenerator>> {
    match backend {
        GeneratorBackend::Disabled => Ok(Arc::new(NoOpGenerator)),
        GeneratorBackend::Remote {
            endpoint,
            timeout_secs,
        } => {
            let generator =
                RemoteGenerator::new(endpoint.clone(), std::time::Duration::from_secs(*timeout_secs))
                    .map_err(|err| anyhow!(err.to_string()))?;
            Ok(Arc::new(generator))
        }
    }
}

fn warn_on_dimension_mismatch(embedder: &dyn EmbeddingEngine, store: &DomainIndexStore) {
    let Some(dims) = embedder.dims() else {
        return;
    };
    for name in store.loaded() {
        let Ok(index) = store.get(&name) else {
            continue;
        };
        let index_dims = index.dense().dims();
        if index_dims != dims {
            warn!(
                target: "medirag::bootstrap",
                domain = %name,
                index_dims,
                embedder_dims = dims,
                model = embedder.model(),
                "dense index was built with a different embedder; dense search will be skipped"
            );
        }
    }
}

/// Initialise the global tracing subscriber once; filter from `MEDIRAG_LOG`.
pub fn init_tracing() {
    init_tracing_with_writer(std::io::stderr);
}

fn init_tracing_with_writer<W>(make_writer: fn() -> W)
where
    W: std::io::Write + Send + Sync + 'static,
{
    static INIT: std::sync::OnceLock<()> = std::sync::OnceLock::new();

    let _ = INIT.get_or_init(|| {
        let filter = std::env::var("MEDIRAG_LOG").unwrap_or_else(|_| "info".into());
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(make_writer)
            .compact()
            .try_init();
    });
}

/// Host and port for the HTTP service, from `MEDIRAG_SERVICE_HOST` / `MEDIRAG_SERVICE_PORT`.
pub fn service_address() -> (String, u16) {
    let host =
        std::env::var("MEDIRAG_SERVICE_HOST").unwrap_or_else(|_| DEFAULT_SERVICE_HOST.to_string());
    let port = std::env::var("MEDIRAG_SERVICE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_SERVICE_PORT);
    (host, port)
}

fn resolve_data_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("MEDIRAG_DATA_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let dirs = directories::ProjectDirs::from("dev", "medirag", "MediRAG")
        .ok_or_else(|| anyhow!("unable to determine OS data dir"))?;
    Ok(dirs.data_dir().to_path_buf())
}

fn resolve_indexes_dir(config: &AppConfig, data_dir: &Path) -> Result<PathBuf> {
    let dir = std::env::var_os("MEDIRAG_INDEXES_DIR")
        .map(PathBuf::from)
        .or_else(|| config.indexes_dir.clone())
        .unwrap_or_else(|| data_dir.join("indexes"));
    std::fs::create_dir_all(&dir).context("failed to create indexes directory")?;
    Ok(dir)
}
