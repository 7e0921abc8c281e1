use std::fmt;

/// A route named something the catalog does not hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unresolved {
    Model(String),
    Task { model: String, task: String },
}

impl fmt::Display for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model(model) => write!(f, "Model not found: {model}"),
            Self::Task { task, .. } => write!(f, "Task not found: {task}"),
        }
    }
}

/// Failures the engine reports to the operator. None of them is fatal:
/// each one leaves the engine in a usable state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    /// Catalog or trajectory fetch rejected, or answered with a non-success status.
    #[error("failed to load {target}: {message}")]
    NetworkFailure { target: String, message: String },

    /// The trajectory body is not JSON.
    #[error("malformed trajectory {filename}: {message}")]
    MalformedPayload { filename: String, message: String },

    #[error("{0}")]
    UnresolvedSelection(Unresolved),
}

impl ReplayError {
    pub fn network(target: impl Into<String>, err: impl fmt::Display) -> Self {
        Self::NetworkFailure {
            target: target.into(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_selection_reads_as_status_text() {
        let err = ReplayError::UnresolvedSelection(Unresolved::Model("o9".into()));
        assert_eq!(err.to_string(), "Model not found: o9");
        let err = ReplayError::UnresolvedSelection(Unresolved::Task {
            model: "gpt-5".into(),
            task: "nope".into(),
        });
        assert_eq!(err.to_string(), "Task not found: nope");
    }
}
