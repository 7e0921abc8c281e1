use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::store::{filename_for_id, StoreError, TrajectoryStore};
use trajview_core::route::TRAJECTORY_EXTENSION;

/// Trajectories stored as files on disk.
///
/// Listing reads `traj_dir` only. Fetching looks in `traj_dir` first and
/// then in `root_dir`, reporting both paths when neither has the file.
#[derive(Debug, Clone)]
pub struct TrajectoryDir {
    traj_dir: PathBuf,
    root_dir: PathBuf,
}

impl TrajectoryDir {
    pub fn new(traj_dir: impl Into<PathBuf>, root_dir: impl Into<PathBuf>) -> Self {
        Self {
            traj_dir: traj_dir.into(),
            root_dir: root_dir.into(),
        }
    }

    /// A store whose fallback root is the parent of `traj_dir`.
    pub fn at(traj_dir: impl Into<PathBuf>) -> Self {
        let traj_dir = traj_dir.into();
        let root_dir = traj_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self { traj_dir, root_dir }
    }

    pub fn traj_dir(&self) -> &Path {
        &self.traj_dir
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Paths probed for `filename`, in order.
    pub fn candidates(&self, filename: &str) -> Vec<PathBuf> {
        vec![self.traj_dir.join(filename), self.root_dir.join(filename)]
    }
}

impl TrajectoryStore for TrajectoryDir {
    async fn list_files(&self) -> Result<Vec<String>, StoreError> {
        let mut dir = match tokio::fs::read_dir(&self.traj_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("trajectory dir {} does not exist", self.traj_dir.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.ends_with(TRAJECTORY_EXTENSION) {
                files.push(name);
            }
        }
        files.sort();
        Ok(files)
    }

    async fn fetch(&self, id: &str) -> Result<Vec<u8>, StoreError> {
        let filename = filename_for_id(id)?;
        let candidates = self.candidates(&filename);
        for path in &candidates {
            match tokio::fs::read(path).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::IsADirectory) => {
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(StoreError::NotFound {
            id: id.to_string(),
            tried: candidates
                .iter()
                .map(|path| path.display().to_string())
                .collect(),
        })
    }
}
