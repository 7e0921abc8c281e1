mod error;
mod routes;

use axum::{
    extract::FromRef,
    routing::get,
    Router,
};
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use trajview_api::dir::TrajectoryDir;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: TrajectoryDir,
}

impl FromRef<AppState> for TrajectoryDir {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub traj_dir: PathBuf,
    pub root_dir: PathBuf,
    pub web_dir: PathBuf,
    pub port: String,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());
        let root_dir = var("TRAJVIEW_ROOT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let traj_dir = var("TRAJVIEW_TRAJ_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| root_dir.join("trajs"));
        let web_dir = var("TRAJVIEW_WEB_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| root_dir.join("web"));
        let port = var("PORT").unwrap_or_else(|| "3000".into());
        Self {
            traj_dir,
            root_dir,
            web_dir,
            port,
        }
    }
}

fn app(config: &ServerConfig) -> Router {
    let state = AppState {
        store: TrajectoryDir::new(&config.traj_dir, &config.root_dir),
    };

    let api = Router::new()
        .route("/health", get(routes::health::health))
        .route("/files", get(routes::trajectories::list_files))
        .route("/models", get(routes::trajectories::list_models))
        .route(
            "/trajectory",
            get(routes::trajectories::get_trajectory_query)
                .post(routes::trajectories::post_trajectory),
        )
        .route("/trajectory/{id}", get(routes::trajectories::get_trajectory));

    let mut app = Router::new().nest("/api", api);

    // Unknown paths such as `/<model>_<task>` fall back to the page itself.
    if config.web_dir.exists() {
        tracing::info!("serving static files from {}", config.web_dir.display());
        let index_html = config.web_dir.join("index.html");
        app = app.fallback_service(
            ServeDir::new(&config.web_dir).fallback(ServeFile::new(index_html)),
        );
    }

    app.layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trajview_server=info,tower_http=info".into()),
        )
        .init();

    let config = ServerConfig::from_env();
    tracing::info!("trajectory directory: {}", config.traj_dir.display());
    tracing::info!("root directory: {}", config.root_dir.display());
    if !config.traj_dir.exists() {
        tracing::warn!(
            "trajectory directory {} does not exist; the catalog will be empty",
            config.traj_dir.display()
        );
    }

    let app = app(&config);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server at http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
