//! Level controller and life-cycle state machine
//!
//! Begin -> Waiting -> Clicked -> {Won, Lost}. Won and Lost freeze the
//! simulation (the entity store is kept intact) until the host issues
//! `next_level`, `restart_level` or `load_level`, which reset in place.

use glam::Vec2;

use super::capture::{self, CaptureReport};
use super::dot::{Dot, Growth};
use super::store::{Bounds, EntityStore};
use crate::clamp_to_canvas;
use crate::settings::{EngineConfig, LevelSpec, LossRule};

/// Life-cycle state of a level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelState {
    /// Population spawned and frozen, no player dot yet
    Begin,
    /// Dots drifting, waiting for the player dot
    Waiting,
    /// Player dot placed, captures resolved every tick
    Clicked,
    /// Win threshold reached
    Won,
    /// Loss condition reached
    Lost,
}

impl LevelState {
    pub fn is_terminal(self) -> bool {
        matches!(self, LevelState::Won | LevelState::Lost)
    }
}

/// Why a level was lost
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossReason {
    /// The player dot shrank away
    PlayerExpired,
    /// The level ran out of ticks
    Timeout,
}

/// One round of play: population, thresholds and progress
pub struct Level {
    number: u8,
    state: LevelState,
    spec: LevelSpec,
    captured: u8,
    /// Ticks simulated since leaving Begin
    ticks: u32,
    loss_reason: Option<LossReason>,
    store: EntityStore,
    config: EngineConfig,
    growth: Growth,
}

impl Level {
    pub fn new(config: &EngineConfig) -> Self {
        let store = EntityStore::new(
            config.seed,
            Bounds {
                width: f32::from(config.width),
                height: f32::from(config.height),
                dot_radius: config.dot_radius,
            },
        );
        let mut level = Self {
            number: config.start_level.max(1),
            state: LevelState::Begin,
            spec: config.start_spec(),
            captured: 0,
            ticks: 0,
            loss_reason: None,
            store,
            config: config.clone(),
            growth: Growth {
                final_radius: config.player_final_radius,
                speed: config.growth_speed,
                hang_ticks: config.hang_ticks,
            },
        };
        level.reset(level.spec);
        level
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn state(&self) -> LevelState {
        self.state
    }

    pub fn total_dots(&self) -> u8 {
        self.spec.total_dots
    }

    pub fn win_threshold(&self) -> u8 {
        self.spec.win_threshold
    }

    pub fn captured(&self) -> u8 {
        self.captured
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn loss_reason(&self) -> Option<LossReason> {
        self.loss_reason
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    #[cfg(test)]
    pub(crate) fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    /// Dots in stable serialization order
    pub fn dots(&self) -> impl Iterator<Item = &Dot> {
        self.store.all_dots()
    }

    /// Begin -> Waiting: release the population without placing a player
    pub fn begin(&mut self) -> bool {
        if self.state != LevelState::Begin {
            return false;
        }
        self.state = LevelState::Waiting;
        log::info!("Level {} started", self.number);
        true
    }

    /// Place (or relocate) the player dot; returns its ID when accepted
    ///
    /// A click in Begin starts the level first. Clicks in Won/Lost are ignored.
    /// A relocated player keeps its radius and growth phase, and once it has
    /// shrunk away no further placement is accepted for the level.
    pub fn add_player(&mut self, x: f32, y: f32) -> Option<u32> {
        if !x.is_finite() || !y.is_finite() {
            log::warn!("Ignoring non-finite click ({}, {})", x, y);
            return None;
        }
        if self.state.is_terminal() {
            return None;
        }
        if self.store.player().is_some_and(|p| !p.is_live_player()) {
            log::debug!("Player already expired, ignoring click");
            return None;
        }
        self.begin();

        let raw = Vec2::new(x, y);
        let pos = clamp_to_canvas(
            raw,
            f32::from(self.config.width),
            f32::from(self.config.height),
        );
        if pos != raw {
            log::warn!("Clamped click ({}, {}) to ({}, {})", x, y, pos.x, pos.y);
        }
        let id = match self.store.relocate_player(pos) {
            Some(id) => {
                log::debug!("Player relocated to ({}, {}) as {}", pos.x, pos.y, id);
                id
            }
            None => {
                let id = self.store.add_player(pos, self.config.player_start_radius);
                log::debug!("Player {} placed at ({}, {})", id, pos.x, pos.y);
                id
            }
        };
        self.state = LevelState::Clicked;
        Some(id)
    }

    /// Advance one simulation step; returns false when the level is frozen
    pub fn step(&mut self) -> bool {
        match self.state {
            LevelState::Begin | LevelState::Won | LevelState::Lost => return false,
            LevelState::Waiting | LevelState::Clicked => {}
        }
        self.ticks = self.ticks.saturating_add(1);

        // Dots credited last tick stop being drawn
        self.store.retire_captured();

        let report = capture::resolve(&mut self.store, self.config.capture);
        self.credit(report);
        self.check_outcome();

        if !self.state.is_terminal() {
            self.store.drift_all(self.config.drift_speed);
            if let Some(player) = self.store.player_mut() {
                player.grow(&self.growth);
            }
        }
        true
    }

    fn credit(&mut self, report: CaptureReport) {
        if report.captured == 0 {
            return;
        }
        let gained = u8::try_from(report.captured).unwrap_or(u8::MAX);
        self.captured = self
            .captured
            .saturating_add(gained)
            .min(self.spec.total_dots);
    }

    /// Won/Lost guard, evaluated right after capture resolution
    ///
    /// Roamers only leave Free/Targeted through Captured, and every capture is
    /// credited, so the population never runs dry before the threshold is met.
    fn check_outcome(&mut self) {
        if self.captured >= self.spec.win_threshold {
            self.state = LevelState::Won;
            log::info!(
                "Level {} won: {}/{} captured (needed {})",
                self.number,
                self.captured,
                self.spec.total_dots,
                self.spec.win_threshold
            );
            return;
        }

        let reason = match self.config.loss {
            LossRule::PlayerExpired => {
                let expired = self.state == LevelState::Clicked
                    && !self.store.player().is_some_and(Dot::is_live_player);
                expired.then_some(LossReason::PlayerExpired)
            }
            LossRule::Timeout { ticks } => (self.ticks >= ticks).then_some(LossReason::Timeout),
        };

        if let Some(reason) = reason {
            self.state = LevelState::Lost;
            self.loss_reason = Some(reason);
            log::info!(
                "Level {} lost ({:?}): {}/{} captured",
                self.number,
                reason,
                self.captured,
                self.spec.win_threshold
            );
        }
    }

    /// Replay the current level with a fresh population (terminal states only)
    pub fn restart_level(&mut self) -> bool {
        if !self.state.is_terminal() {
            return false;
        }
        log::info!("Restarting level {}", self.number);
        self.reset(self.spec);
        true
    }

    /// Advance to the next table level (Won only); past the end, replay the last
    pub fn next_level(&mut self) -> bool {
        if self.state != LevelState::Won {
            return false;
        }
        let max = self.config.max_level();
        if self.number >= max {
            log::info!("Level {} is the last one, replaying", self.number);
            self.number = max;
        } else {
            self.number += 1;
        }
        let spec = self.config.level_spec(self.number);
        self.reset(spec);
        true
    }

    /// Reset with a custom population of `total_dots` (terminal states only)
    pub fn load_level(&mut self, total_dots: u8) -> bool {
        if !self.state.is_terminal() {
            return false;
        }
        let spec = LevelSpec::scaled(total_dots, self.config.custom_win_ratio);
        log::info!(
            "Loading custom level: {} dots, {} to win",
            spec.total_dots,
            spec.win_threshold
        );
        self.reset(spec);
        true
    }

    fn reset(&mut self, spec: LevelSpec) {
        self.spec = spec;
        self.captured = 0;
        self.ticks = 0;
        self.loss_reason = None;
        self.state = LevelState::Begin;
        self.store.spawn_level(spec.total_dots);
    }
}
