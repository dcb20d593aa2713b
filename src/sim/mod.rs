//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed-rate steps only (gated by the scheduler)
//! - Seeded RNG only
//! - Stable iteration order (spawn order, player last)
//! - No rendering, wire-format or platform dependencies

pub mod capture;
pub mod dot;
pub mod level;
pub mod scheduler;
pub mod store;

pub use capture::{CaptureReport, contains, intersects, resolve};
pub use dot::{Color, Dot, DotState, PlayerPhase, Role};
pub use level::{Level, LevelState, LossReason};
pub use scheduler::TickScheduler;
pub use store::{Bounds, EntityStore};
