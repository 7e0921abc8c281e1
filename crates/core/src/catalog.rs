use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::route::{strip_extension, TrajectoryRef, TRAJECTORY_EXTENSION};

/// Task name given to files whose name has no underscore.
pub const UNKNOWN_TASK: &str = "unknown";

/// One selectable trajectory of a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEntry {
    pub filename: String,
    #[serde(rename = "task")]
    pub task_id: String,
}

impl TaskEntry {
    /// The route for this entry, when its filename follows `<model>_<task>.json`.
    pub fn trajectory_ref(&self, model: &str) -> Option<TrajectoryRef> {
        TrajectoryRef::from_filename(&self.filename).filter(|r| r.model == model)
    }
}

/// Model → tasks, as offered to the operator for selection.
///
/// Models iterate in name order; tasks keep the order of the file listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    models: BTreeMap<String, Vec<TaskEntry>>,
}

impl Catalog {
    /// Group `.json` filenames by the part before their first underscore.
    pub fn from_filenames<I, S>(filenames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut models: BTreeMap<String, Vec<TaskEntry>> = BTreeMap::new();
        for filename in filenames {
            let filename = filename.as_ref();
            if !filename.ends_with(TRAJECTORY_EXTENSION) {
                continue;
            }
            let base = strip_extension(filename);
            let (model, task) = match base.split_once('_') {
                Some((model, task)) => (model, task),
                None => (base, UNKNOWN_TASK),
            };
            models.entry(model.to_string()).or_default().push(TaskEntry {
                filename: filename.to_string(),
                task_id: task.to_string(),
            });
        }
        Self { models }
    }

    pub fn from_models(models: BTreeMap<String, Vec<TaskEntry>>) -> Self {
        Self { models }
    }

    pub fn into_models(self) -> BTreeMap<String, Vec<TaskEntry>> {
        self.models
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn contains_model(&self, model: &str) -> bool {
        self.models.contains_key(model)
    }

    pub fn tasks(&self, model: &str) -> Option<&[TaskEntry]> {
        self.models.get(model).map(Vec::as_slice)
    }

    pub fn find_task(&self, model: &str, task: &str) -> Option<&TaskEntry> {
        self.tasks(model)?.iter().find(|entry| entry.task_id == task)
    }

    /// Find a filename anywhere in the catalog, with the model that owns it.
    pub fn find_filename(&self, filename: &str) -> Option<(&str, &TaskEntry)> {
        self.models.iter().find_map(|(model, tasks)| {
            tasks
                .iter()
                .find(|entry| entry.filename == filename)
                .map(|entry| (model.as_str(), entry))
        })
    }

    /// The first model and, when it has any, its first task.
    pub fn first_entry(&self) -> Option<(&str, Option<&TaskEntry>)> {
        self.models
            .iter()
            .next()
            .map(|(model, tasks)| (model.as_str(), tasks.first()))
    }
}
