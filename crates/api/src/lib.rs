//! Trajectory store contract and wire types shared by the trajview server,
//! its HTTP client and the replay engine.
//!
//! The store is read-only and content-addressed by filename
//! (`<model>_<task>.json`). The server exposes it over HTTP; the client and
//! [`dir::TrajectoryDir`] both implement [`TrajectoryStore`].

use serde::{Deserialize, Serialize};

#[cfg(feature = "fs")]
pub mod dir;
pub mod store;

pub use store::{StoreError, TrajectoryStore};
pub use trajview_core::{Catalog, TaskEntry};

// ─── Health ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

/// `GET /api/files`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilesResponse {
    pub files: Vec<String>,
}

/// `GET /api/models`: filenames grouped by model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelsResponse {
    pub models: Catalog,
}

// ─── Trajectories ────────────────────────────────────────────────────────────

/// `GET /api/trajectory?id=..` query, or the legacy `POST /api/trajectory` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrajectoryQuery {
    #[serde(default)]
    pub id: Option<String>,
}

impl TrajectoryQuery {
    /// The requested id, when present and not blank.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }
}

/// 404 body of the trajectory endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrajectoryNotFound {
    pub error: String,
    pub id: String,
    #[serde(default)]
    pub tried: Vec<String>,
}

/// Body of every other error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}
