pub mod catalog;
pub mod correlate;
pub mod normalize;
pub mod route;
pub mod trajectory;

pub use catalog::{Catalog, TaskEntry};
pub use correlate::{classify, correlate, ToolResults};
pub use route::{Route, TrajectoryRef};
pub use trajectory::*;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
