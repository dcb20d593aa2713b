//! Long-lived simulation context
//!
//! The host owns exactly one `Engine` and calls into it synchronously from
//! its render loop. Level transitions reset the engine in place; the handle
//! is never rebuilt. After every completed update (a due tick or a
//! life-cycle command) a fresh immutable [`Snapshot`] replaces the previous
//! one, so a frame the host is reading never changes under it.

use crate::codec::{PackedHeader, PointEvent, Snapshot};
use crate::settings::{ConfigError, EngineConfig};
use crate::sim::level::{Level, LevelState};
use crate::sim::scheduler::TickScheduler;

pub struct Engine {
    config: EngineConfig,
    level: Level,
    scheduler: TickScheduler,
    snapshot: Snapshot,
    frames: u64,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let level = Level::new(&config);
        let scheduler = TickScheduler::new(config.updates_per_second);
        let snapshot = Snapshot::capture(&level, 0);
        log::info!(
            "Engine ready: {}x{} canvas, {} Hz, seed {}, level {} ({} dots, {} to win)",
            config.width,
            config.height,
            config.updates_per_second,
            config.seed,
            level.number(),
            level.total_dots(),
            level.win_threshold()
        );
        Ok(Self {
            config,
            level,
            scheduler,
            snapshot,
            frames: 0,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn width(&self) -> u16 {
        self.config.width
    }

    pub fn height(&self) -> u16 {
        self.config.height
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    #[cfg(test)]
    pub(crate) fn level_mut(&mut self) -> &mut Level {
        &mut self.level
    }

    pub fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    /// Host callback at wall-clock `now_ms`; steps only when a period has elapsed
    ///
    /// Returns whether a simulation step ran.
    pub fn tick_at(&mut self, now_ms: f64) -> bool {
        if !self.scheduler.try_advance(now_ms) {
            return false;
        }
        self.step()
    }

    /// One ungated simulation step (headless drivers and tests)
    pub fn step(&mut self) -> bool {
        let changed = self.level.step();
        if changed {
            self.repack();
        }
        changed
    }

    /// Snapshot of the last completed update
    pub fn pack(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn header(&self) -> &PackedHeader {
        self.snapshot.header()
    }

    /// Place or relocate the player dot at a canvas-space point
    pub fn add_player(&mut self, x: f32, y: f32) -> bool {
        let placed = self.level.add_player(x, y).is_some();
        if placed {
            self.repack();
        }
        placed
    }

    pub fn handle_point(&mut self, event: PointEvent) -> bool {
        self.add_player(event.x, event.y)
    }

    /// Context-dependent click: advance after a win, retry after a loss,
    /// otherwise place the player dot
    pub fn handle_click(&mut self, x: f32, y: f32) -> bool {
        match self.level.state() {
            LevelState::Won => self.next_level(),
            LevelState::Lost => self.restart_level(),
            _ => self.add_player(x, y),
        }
    }

    /// Begin -> Waiting without placing a player
    pub fn start(&mut self) -> bool {
        self.apply(Level::begin)
    }

    pub fn restart_level(&mut self) -> bool {
        self.apply(Level::restart_level)
    }

    pub fn next_level(&mut self) -> bool {
        self.apply(Level::next_level)
    }

    /// Reset with a custom population of `total_dots`
    pub fn load_level(&mut self, total_dots: u8) -> bool {
        self.apply(|level| level.load_level(total_dots))
    }

    fn apply(&mut self, command: impl FnOnce(&mut Level) -> bool) -> bool {
        let applied = command(&mut self.level);
        if applied {
            self.repack();
        }
        applied
    }

    fn repack(&mut self) {
        self.frames += 1;
        self.snapshot = Snapshot::capture(&self.level, self.frames);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, level_state_tag};
    use crate::sim::dot::DotState;
    use glam::Vec2;

    fn engine(config: EngineConfig) -> Engine {
        Engine::new(config).unwrap()
    }

    fn sixty_forty() -> EngineConfig {
        EngineConfig {
            seed: 2024,
            start_dots: Some(60),
            drift_speed: 0.0,
            ..Default::default()
        }
    }

    /// First 40 roamers on a ring of radius 30 around `center`, the rest far away
    fn ring_forty(engine: &mut Engine, center: Vec2) {
        let roamers = engine.level_mut().store_mut().roamers_mut();
        for (idx, dot) in roamers.iter_mut().enumerate() {
            dot.pos = if idx < 40 {
                let theta = idx as f32 / 40.0 * std::f32::consts::TAU;
                center + Vec2::new(theta.cos(), theta.sin()) * 30.0
            } else {
                Vec2::new(700.0, 520.0 + (idx % 5) as f32 * 10.0)
            };
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = EngineConfig {
            width: 0,
            ..Default::default()
        };
        assert!(Engine::new(config).is_err());
    }

    #[test]
    fn test_win_scenario() {
        let mut engine = engine(sixty_forty());
        assert_eq!(engine.header().level_state, level_state_tag(LevelState::Begin));
        assert_eq!(engine.header().total_dots, 60);
        assert_eq!(engine.header().win_threshold, 40);

        let center = Vec2::new(200.0, 200.0);
        assert!(engine.add_player(center.x, center.y));
        assert_eq!(engine.level().state(), LevelState::Clicked);
        ring_forty(&mut engine, center);

        let mut saw_targeted = false;
        for _ in 0..200 {
            let radius_before = engine.level().store().player().unwrap().radius;
            engine.step();
            if radius_before < 39.9 {
                // Ring dots need R >= 40 before the tick to be enclosed
                assert_eq!(engine.header().captured_dots, 0);
            }
            saw_targeted |= engine.level().store().count(DotState::Targeted) == 40;
            if engine.level().state() != LevelState::Clicked {
                break;
            }
        }

        assert!(saw_targeted);
        assert_eq!(engine.header().captured_dots, 40);
        assert_eq!(engine.header().level_state, level_state_tag(LevelState::Won));
        assert_eq!(engine.level().state(), LevelState::Won);

        // Won freezes everything
        let frozen = engine.pack().clone();
        assert!(!engine.step());
        assert!(!engine.add_player(10.0, 10.0));
        assert_eq!(engine.pack(), &frozen);
    }

    #[test]
    fn test_load_level_after_win() {
        let mut engine = engine(sixty_forty());
        let center = Vec2::new(200.0, 200.0);
        engine.add_player(center.x, center.y);
        ring_forty(&mut engine, center);
        while engine.level().state() == LevelState::Clicked {
            engine.step();
        }
        assert_eq!(engine.level().state(), LevelState::Won);

        assert!(engine.load_level(60));
        let header = *engine.header();
        assert_eq!(header.captured_dots, 0);
        assert_eq!(header.level_state, level_state_tag(LevelState::Begin));
        assert_eq!(header.total_dots, 60);
        assert_eq!(engine.level().store().count(DotState::Free), 60);
        assert!(engine.level().store().player().is_none());

        let view = decode(&engine.pack().encode());
        assert_eq!(view.dots.len(), 60);
        assert!(view.dots.iter().all(|d| d.state == 1.0));
    }

    #[test]
    fn test_tick_is_rate_gated() {
        let mut engine = engine(EngineConfig {
            seed: 5,
            ..Default::default()
        });
        engine.add_player(400.0, 300.0);
        assert!(engine.tick_at(0.0));
        let frame = engine.pack().clone();
        let bytes = frame.encode();

        // Faster than 60 Hz: nothing moves, the frame is byte-identical
        for now in [1.0, 5.0, 10.0, 16.0] {
            assert!(!engine.tick_at(now));
        }
        assert_eq!(engine.pack(), &frame);
        assert_eq!(engine.pack().encode(), bytes);

        assert!(engine.tick_at(17.0));
        assert_eq!(engine.pack().frame(), frame.frame() + 1);
    }

    #[test]
    fn test_identical_engines_stay_identical() {
        let config = EngineConfig {
            seed: 31337,
            start_level: 6,
            ..Default::default()
        };
        let mut a = engine(config.clone());
        let mut b = engine(config);
        let clicks = [(5, 300.0, 200.0), (40, 500.0, 400.0), (90, 120.0, 80.0)];

        for t in 0..240u32 {
            for &(at, x, y) in &clicks {
                if at == t {
                    a.handle_click(x, y);
                    b.handle_click(x, y);
                }
            }
            let now = f64::from(t) * 1000.0 / 60.0;
            a.tick_at(now);
            b.tick_at(now);
            assert_eq!(a.pack().encode(), b.pack().encode());
        }
    }

    #[test]
    fn test_handle_click_dispatches_by_state() {
        let mut engine = engine(EngineConfig {
            seed: 1,
            drift_speed: 0.0,
            ..Default::default()
        });
        // Level 1: 5 dots, 1 to win
        let first = engine.level().store().roamers()[0].pos;
        assert!(engine.handle_click(first.x, first.y));
        engine.step();
        assert_eq!(engine.level().state(), LevelState::Won);

        assert!(engine.handle_click(0.0, 0.0));
        assert_eq!(engine.level().number(), 2);
        assert_eq!(engine.level().state(), LevelState::Begin);
        assert_eq!(engine.header().total_dots, 10);
    }

    #[test]
    fn test_start_moves_to_waiting() {
        let mut engine = engine(EngineConfig::default());
        assert!(engine.start());
        assert!(!engine.start());
        assert_eq!(engine.header().level_state, level_state_tag(LevelState::Waiting));
        assert!(engine.step());
    }
}
