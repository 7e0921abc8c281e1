//! Location ⇄ selection resolution.
//!
//! [`resolve`] decides, from the catalog and the current route, which model
//! to preselect, which trajectory to load, and which status to show when the
//! route names something the catalog does not have.

use trajview_core::{Catalog, Route, TaskEntry, TrajectoryRef};

use crate::error::Unresolved;

/// The navigable location. Writes replace the current history entry.
pub trait Location {
    fn current(&self) -> String;
    fn replace(&mut self, path: &str);
}

/// In-memory location used by terminal front ends and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryLocation {
    path: String,
    replacements: usize,
}

impl MemoryLocation {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            replacements: 0,
        }
    }

    pub fn replacements(&self) -> usize {
        self.replacements
    }
}

impl Location for MemoryLocation {
    fn current(&self) -> String {
        if self.path.is_empty() {
            "/".to_string()
        } else {
            self.path.clone()
        }
    }

    fn replace(&mut self, path: &str) {
        self.path = path.to_string();
        self.replacements += 1;
    }
}

/// A catalog entry chosen for loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub model: String,
    pub task: String,
    pub filename: String,
}

impl Target {
    pub fn new(model: &str, entry: &TaskEntry) -> Self {
        Self {
            model: model.to_string(),
            task: entry.task_id.clone(),
            filename: entry.filename.clone(),
        }
    }

    pub fn trajectory_ref(&self) -> TrajectoryRef {
        TrajectoryRef::new(&self.model, &self.task)
    }
}

/// What to do after the catalog arrives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Model whose tasks should be listed.
    pub model: Option<String>,
    /// Task to mark as selected in that list.
    pub task: Option<String>,
    /// Trajectory to load right away.
    pub load: Option<Target>,
    pub unresolved: Option<Unresolved>,
}

impl Resolution {
    fn first_entry(catalog: &Catalog) -> Self {
        let Some((model, entry)) = catalog.first_entry() else {
            return Self::default();
        };
        Self {
            model: Some(model.to_string()),
            task: entry.map(|e| e.task_id.clone()),
            load: entry.map(|e| Target::new(model, e)),
            unresolved: None,
        }
    }

    fn fallback(catalog: &Catalog, unresolved: Unresolved) -> Self {
        Self {
            unresolved: Some(unresolved),
            ..Self::first_entry(catalog)
        }
    }
}

pub fn resolve(catalog: &Catalog, route: &Route) -> Resolution {
    match route {
        Route::Root | Route::Ignored(_) => Resolution::first_entry(catalog),
        Route::Model(model) => {
            if catalog.contains_model(model) {
                Resolution {
                    model: Some(model.clone()),
                    ..Resolution::default()
                }
            } else {
                // No auto-load from a bare model path, even when it misses.
                Resolution {
                    load: None,
                    task: None,
                    ..Resolution::fallback(catalog, Unresolved::Model(model.clone()))
                }
            }
        }
        Route::Trajectory(trajectory) => {
            if !catalog.contains_model(&trajectory.model) {
                return Resolution::fallback(catalog, Unresolved::Model(trajectory.model.clone()));
            }
            match catalog.find_task(&trajectory.model, &trajectory.task) {
                Some(entry) => Resolution {
                    model: Some(trajectory.model.clone()),
                    task: Some(entry.task_id.clone()),
                    load: Some(Target::new(&trajectory.model, entry)),
                    unresolved: None,
                },
                None => Resolution {
                    model: Some(trajectory.model.clone()),
                    unresolved: Some(Unresolved::Task {
                        model: trajectory.model.clone(),
                        task: trajectory.task.clone(),
                    }),
                    ..Resolution::default()
                },
            }
        }
    }
}
