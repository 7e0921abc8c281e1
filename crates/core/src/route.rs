//! Location encoding for trajectories.
//!
//! A trajectory is addressed as `/<model>_<task>` and stored as
//! `<model>_<task>.json`. The first underscore separates model from task, so
//! a task may contain underscores and a model may not.

use std::borrow::Cow;

pub const TRAJECTORY_EXTENSION: &str = ".json";

/// A `(model, task)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrajectoryRef {
    pub model: String,
    pub task: String,
}

impl TrajectoryRef {
    pub fn new(model: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            task: task.into(),
        }
    }

    /// Split an id of the form `<model>_<task>` at its first underscore.
    pub fn parse(id: &str) -> Option<Self> {
        let (model, task) = id.split_once('_')?;
        if model.is_empty() || task.is_empty() {
            return None;
        }
        Some(Self::new(model, task))
    }

    pub fn from_filename(filename: &str) -> Option<Self> {
        Self::parse(strip_extension(filename))
    }

    /// `<model>_<task>`
    pub fn id(&self) -> String {
        format!("{}_{}", self.model, self.task)
    }

    /// `<model>_<task>.json`
    pub fn filename(&self) -> String {
        format!("{}{TRAJECTORY_EXTENSION}", self.id())
    }

    /// `/<model>_<task>`, percent-encoded.
    pub fn path(&self) -> String {
        format!(
            "/{}_{}",
            urlencoding::encode(&self.model),
            urlencoding::encode(&self.task)
        )
    }
}

/// What the current location asks the player to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`
    Root,
    /// `/<model>`: preselect a model, never auto-load.
    Model(String),
    /// `/<model>_<task>`
    Trajectory(TrajectoryRef),
    /// Anything else (asset paths, nested paths). Ignored for auto-load.
    Ignored(String),
}

impl Route {
    pub fn parse(path: &str) -> Self {
        let segment = path.trim_matches('/');
        if segment.is_empty() {
            return Self::Root;
        }
        let decoded = urlencoding::decode(segment)
            .map(Cow::into_owned)
            .unwrap_or_else(|_| segment.to_string());
        if decoded.contains('.') || decoded.contains('/') {
            return Self::Ignored(decoded);
        }
        if let Some(trajectory) = TrajectoryRef::parse(&decoded) {
            return Self::Trajectory(trajectory);
        }
        match decoded.split_once('_') {
            None => Self::Model(decoded),
            Some((model, "")) if !model.is_empty() => Self::Model(model.to_string()),
            Some(_) => Self::Ignored(decoded),
        }
    }

    /// The canonical location for this route. Ignored routes map to `/`.
    pub fn path(&self) -> String {
        match self {
            Self::Root | Self::Ignored(_) => "/".to_string(),
            Self::Model(model) => format!("/{}", urlencoding::encode(model)),
            Self::Trajectory(trajectory) => trajectory.path(),
        }
    }
}

/// Drop a trailing `.json`, if present.
pub fn strip_extension(filename: &str) -> &str {
    filename
        .strip_suffix(TRAJECTORY_EXTENSION)
        .unwrap_or(filename)
}

/// Append `.json` unless the id already ends with it.
pub fn with_extension(id: &str) -> String {
    if id.ends_with(TRAJECTORY_EXTENSION) {
        id.to_string()
    } else {
        format!("{id}{TRAJECTORY_EXTENSION}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trajectory_route_splits_at_first_underscore() {
        let route = Route::parse("/gpt-5_merge-hf-datasets");
        assert_eq!(
            route,
            Route::Trajectory(TrajectoryRef::new("gpt-5", "merge-hf-datasets"))
        );
        assert_eq!(route.path(), "/gpt-5_merge-hf-datasets");

        let route = Route::parse("/claude_fix_the_bug/");
        assert_eq!(
            route,
            Route::Trajectory(TrajectoryRef::new("claude", "fix_the_bug"))
        );
        assert_eq!(route.path(), "/claude_fix_the_bug");
    }

    #[test]
    fn bare_segment_is_a_model_route() {
        assert_eq!(Route::parse("/gpt-5"), Route::Model("gpt-5".to_string()));
        assert_eq!(Route::parse("gpt-5_"), Route::Model("gpt-5".to_string()));
        assert_eq!(Route::Model("gpt-5".to_string()).path(), "/gpt-5");
    }

    #[test]
    fn root_and_asset_paths() {
        assert_eq!(Route::parse(""), Route::Root);
        assert_eq!(Route::parse("///"), Route::Root);
        assert!(matches!(Route::parse("/index.html"), Route::Ignored(_)));
        assert!(matches!(Route::parse("/a/b_c"), Route::Ignored(_)));
        assert!(matches!(Route::parse("/_task"), Route::Ignored(_)));
        assert_eq!(Route::parse("/script.js").path(), "/");
    }

    #[test]
    fn percent_encoded_segments_round_trip() {
        let trajectory = TrajectoryRef::new("my model", "task one");
        let path = trajectory.path();
        assert_eq!(path, "/my%20model_task%20one");
        assert_eq!(Route::parse(&path), Route::Trajectory(trajectory));
    }

    #[test]
    fn filenames_and_ids() {
        let trajectory = TrajectoryRef::from_filename("gpt-5_merge-hf-datasets.json")
            .expect("parses");
        assert_eq!(trajectory.model, "gpt-5");
        assert_eq!(trajectory.task, "merge-hf-datasets");
        assert_eq!(trajectory.filename(), "gpt-5_merge-hf-datasets.json");
        assert_eq!(with_extension("a_b"), "a_b.json");
        assert_eq!(with_extension("a_b.json"), "a_b.json");
        assert!(TrajectoryRef::from_filename("standalone.json").is_none());
    }
}
