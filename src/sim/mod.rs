//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only; time is passed in, never read from a clock
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering or platform dependencies

pub mod character;
pub mod coin_field;
pub mod collision;
pub mod events;
pub mod obstacles;
pub mod portal;
pub mod powers;
pub mod rockets;
pub mod snapshot;
pub mod state;
pub mod tick;

pub use character::{Character, Lifecycle};
pub use collision::Rect;
pub use events::{Command, DeathCause, EventQueue, ExplosionCause, GameEvent};
pub use obstacles::{Obstacle, ObstacleManager, SegmentBreak};
pub use portal::{PortalPhase, PortalSystem};
pub use powers::{PowerError, PowerKind, PowerStatus, PowerSystem};
pub use rockets::{Rocket, RocketManager, RocketMode};
pub use snapshot::Snapshot;
pub use state::{GamePhase, GameState, RunSummary};
pub use tick::{TickInput, tick};
