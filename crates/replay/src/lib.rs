//! Trajectory replay engine.
//!
//! [`Engine`] is a synchronous state machine built from three injected
//! collaborators: a [`Timer`] for auto-play ticks, a [`Projector`] that
//! receives render events, and a [`Location`] kept in sync with the
//! selection. [`ReplayHost`] drives an engine against a
//! [`trajview_api::TrajectoryStore`] on a tokio runtime.

pub mod engine;
pub mod error;
pub mod host;
pub mod player;
pub mod projector;
pub mod sync;
pub mod timer;

pub use engine::{Command, Effect, Engine, LoadTicket};
pub use error::{ReplayError, Unresolved};
pub use host::ReplayHost;
pub use player::{Direction, PlaybackState, Player, Session};
pub use projector::{
    visible_messages, Controls, EmptyState, ProjectedMessage, ProjectedTool, Projector,
    RenderEvent, ToolGroup,
};
pub use sync::{resolve, Location, MemoryLocation, Resolution, Target};
pub use timer::{DeadlineTimer, ManualTimer, Timer, TimerTicket};
