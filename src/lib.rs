//! Dots - a capture-the-dots simulation engine
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, capture, level life cycle, tick gate)
//! - `codec`: Fixed-layout packed snapshots read directly by the host
//! - `engine`: Long-lived simulation context driven by the host render loop
//! - `settings`: Tunables and level tables
//! - `ffi`: WebAssembly boundary (wasm32 only)

pub mod codec;
pub mod engine;
pub mod settings;
pub mod sim;

#[cfg(target_arch = "wasm32")]
pub mod ffi;

pub use codec::{FrameView, PackedDot, PackedHeader, PointEvent, Snapshot};
pub use engine::Engine;
pub use settings::{CaptureRule, ConfigError, EngineConfig, LevelSpec, LossRule};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Default canvas size (width, height) in pixels
    pub const SCREEN_SIZE: (u16, u16) = (800, 600);
    /// Default simulation rate
    pub const UPDATES_PER_SECOND: f64 = 60.0;

    /// Free dot radius
    pub const START_RADIUS: f32 = 10.0;
    /// Player dot grows from START_RADIUS to FINAL_RADIUS
    pub const FINAL_RADIUS: f32 = 50.0;
    /// Radius change per tick while growing or shrinking
    pub const GROWTH_SPEED: f32 = 1.0;
    /// Ticks the player dot stays at full size (3 seconds at 60 Hz)
    pub const HANG_TICKS: u32 = 180;
    /// Free dot drift speed (pixels per tick)
    pub const SPEED: f32 = 1.5;

    /// Largest population a level may hold (header counts are single bytes)
    pub const MAX_DOTS: u8 = 200;
}

/// Clamp a point into the `[0, width] x [0, height]` canvas
#[inline]
pub fn clamp_to_canvas(pos: Vec2, width: f32, height: f32) -> Vec2 {
    pos.clamp(Vec2::ZERO, Vec2::new(width, height))
}
