use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use trajview_api::dir::TrajectoryDir;
use trajview_api::{Catalog, StoreError, TrajectoryStore};
use trajview_api_client::ApiClient;
use trajview_runtime_config::StoreSettings;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where trajectories come from. Without flags the configured directory is used.
#[derive(Debug, Clone, Default, Args)]
pub struct StoreArgs {
    /// Read trajectories from this directory
    #[arg(long, conflicts_with = "server")]
    pub dir: Option<PathBuf>,

    /// Read trajectories from a trajview server (e.g. http://localhost:3000)
    #[arg(long)]
    pub server: Option<String>,
}

/// Either store behind one type, since the store trait is not object safe.
#[derive(Debug, Clone)]
pub enum Store {
    Dir(TrajectoryDir),
    Remote(ApiClient),
}

impl Store {
    pub fn open(args: &StoreArgs, settings: &StoreSettings) -> Result<Self> {
        if let Some(url) = &args.server {
            let client = ApiClient::new(url, REQUEST_TIMEOUT)
                .with_context(|| format!("Failed to create client for {url}"))?;
            return Ok(Self::Remote(client));
        }
        let dir = args
            .dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&settings.traj_dir));
        Ok(Self::Dir(TrajectoryDir::at(dir)))
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Dir(dir) => dir.traj_dir().display().to_string(),
            Self::Remote(client) => client.base_url().to_string(),
        }
    }
}

impl TrajectoryStore for Store {
    async fn list_files(&self) -> Result<Vec<String>, StoreError> {
        match self {
            Self::Dir(dir) => dir.list_files().await,
            Self::Remote(client) => client.list_files().await,
        }
    }

    async fn catalog(&self) -> Result<Catalog, StoreError> {
        match self {
            Self::Dir(dir) => dir.catalog().await,
            Self::Remote(client) => client.catalog().await,
        }
    }

    async fn fetch(&self, id: &str) -> Result<Vec<u8>, StoreError> {
        match self {
            Self::Dir(dir) => dir.fetch(id).await,
            Self::Remote(client) => client.fetch(id).await,
        }
    }
}
