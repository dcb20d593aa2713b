//! Entity store: every dot of the current level
//!
//! Roamers keep their spawn order for the whole level so that record indices
//! in the packed buffer stay meaningful to the host. The player dot, when
//! present, always comes last.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::dot::{Color, Dot, DotState};

/// Canvas bounds and dot size used when spawning
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
    pub dot_radius: f32,
}

pub struct EntityStore {
    roamers: Vec<Dot>,
    player: Option<Dot>,
    bounds: Bounds,
    rng: Pcg32,
    next_id: u32,
}

impl EntityStore {
    pub fn new(seed: u64, bounds: Bounds) -> Self {
        Self {
            roamers: Vec::new(),
            player: None,
            bounds,
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Replace the population with `total_dots` fresh free dots and drop the player
    pub fn spawn_level(&mut self, total_dots: u8) {
        self.player = None;
        self.roamers.clear();
        self.roamers.reserve(usize::from(total_dots));
        for _ in 0..total_dots {
            let id = self.next_entity_id();
            let pos = self.random_point();
            let target = self.random_point();
            let color = self.random_color();
            self.roamers.push(Dot::roamer(
                id,
                pos,
                self.bounds.dot_radius,
                color,
                target,
            ));
        }
    }

    /// Create or replace the player dot; returns its ID
    pub fn add_player(&mut self, pos: Vec2, radius: f32) -> u32 {
        let id = self.next_entity_id();
        let color = self.random_color();
        self.player = Some(Dot::player(id, pos, radius, color));
        id
    }

    /// Move the player dot to `pos` under a new ID, keeping its size and growth phase
    ///
    /// Returns None when there is no player to move.
    pub fn relocate_player(&mut self, pos: Vec2) -> Option<u32> {
        let previous = self.player.take()?;
        let id = self.next_entity_id();
        self.player = Some(previous.relocated(id, pos));
        Some(id)
    }

    /// All dots in stable order: roamers by spawn order, then the player
    pub fn all_dots(&self) -> impl Iterator<Item = &Dot> {
        self.roamers.iter().chain(self.player.iter())
    }

    pub fn len(&self) -> usize {
        self.roamers.len() + usize::from(self.player.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn roamers(&self) -> &[Dot] {
        &self.roamers
    }

    pub fn player(&self) -> Option<&Dot> {
        self.player.as_ref()
    }

    pub fn player_mut(&mut self) -> Option<&mut Dot> {
        self.player.as_mut()
    }

    /// Live player plus mutable roamers, for capture resolution
    pub fn split_for_capture(&mut self) -> (Option<&Dot>, &mut [Dot]) {
        let player = self.player.as_ref().filter(|p| p.is_live_player());
        (player, &mut self.roamers)
    }

    #[cfg(test)]
    pub(crate) fn roamers_mut(&mut self) -> &mut [Dot] {
        &mut self.roamers
    }

    /// Roamers in the given state
    pub fn count(&self, state: DotState) -> usize {
        self.roamers.iter().filter(|d| d.state() == state).count()
    }

    /// Move every capturable roamer toward its target, picking a new one on arrival
    pub fn drift_all(&mut self, speed: f32) {
        if speed <= 0.0 {
            return;
        }
        for idx in 0..self.roamers.len() {
            if !self.roamers[idx].state().is_capturable() {
                continue;
            }
            if self.roamers[idx].drift(speed) {
                let next = self.random_point();
                self.roamers[idx].target = Some(next);
            }
        }
    }

    /// Captured -> Dead for dots credited on an earlier tick; returns how many
    pub fn retire_captured(&mut self) -> usize {
        let mut retired = 0;
        for dot in &mut self.roamers {
            if dot.state() == DotState::Captured && dot.transition(DotState::Dead) {
                retired += 1;
            }
        }
        retired
    }

    /// Random point at least one dot radius away from every edge
    fn random_point(&mut self) -> Vec2 {
        let r = self.bounds.dot_radius;
        let x = Self::random_axis(&mut self.rng, self.bounds.width, r);
        let y = Self::random_axis(&mut self.rng, self.bounds.height, r);
        Vec2::new(x, y)
    }

    fn random_axis(rng: &mut Pcg32, extent: f32, margin: f32) -> f32 {
        let (lo, hi) = (margin, extent - margin);
        if lo >= hi {
            return extent / 2.0;
        }
        rng.random_range(lo..=hi)
    }

    // TODO avoid colors too similar to the host's background once it is configurable
    fn random_color(&mut self) -> Color {
        (
            self.rng.random::<u8>(),
            self.rng.random::<u8>(),
            self.rng.random::<u8>(),
        )
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Bounds {
        Bounds {
            width: 800.0,
            height: 600.0,
            dot_radius: 10.0,
        }
    }

    #[test]
    fn test_spawn_level() {
        let mut store = EntityStore::new(1, bounds());
        store.spawn_level(60);
        assert_eq!(store.len(), 60);
        assert_eq!(store.count(DotState::Free), 60);
        assert!(store.player().is_none());

        for dot in store.all_dots() {
            assert!(dot.pos.x >= 10.0 && dot.pos.x <= 790.0);
            assert!(dot.pos.y >= 10.0 && dot.pos.y <= 590.0);
            assert_eq!(dot.radius, 10.0);
        }

        // IDs are unique
        let mut ids: Vec<u32> = store.all_dots().map(|d| d.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 60);
    }

    #[test]
    fn test_player_is_replaced_and_last() {
        let mut store = EntityStore::new(1, bounds());
        store.spawn_level(5);
        let first = store.add_player(Vec2::new(100.0, 100.0), 10.0);
        let second = store.add_player(Vec2::new(200.0, 200.0), 10.0);
        assert_ne!(first, second);
        assert_eq!(store.len(), 6);

        let last = store.all_dots().last().unwrap();
        assert_eq!(last.id(), second);
        assert!(last.is_player());
        assert_eq!(last.pos, Vec2::new(200.0, 200.0));

        // Relocation keeps the growth progress
        if let Some(player) = store.player_mut() {
            player.radius = 33.0;
        }
        let third = store.relocate_player(Vec2::new(300.0, 300.0)).unwrap();
        assert_ne!(third, second);
        let player = store.player().unwrap();
        assert_eq!((player.id(), player.radius), (third, 33.0));
        assert_eq!(player.pos, Vec2::new(300.0, 300.0));
        assert_eq!(store.len(), 6);

        // Respawning clears the player
        store.spawn_level(3);
        assert_eq!(store.len(), 3);
        assert!(store.player().is_none());
        assert!(store.relocate_player(Vec2::ZERO).is_none());
    }

    #[test]
    fn test_spawn_is_deterministic() {
        let mut a = EntityStore::new(99, bounds());
        let mut b = EntityStore::new(99, bounds());
        a.spawn_level(20);
        b.spawn_level(20);
        for _ in 0..50 {
            a.drift_all(1.5);
            b.drift_all(1.5);
        }
        for (da, db) in a.all_dots().zip(b.all_dots()) {
            assert_eq!(da.pos, db.pos);
            assert_eq!(da.color, db.color);
        }
    }

    #[test]
    fn test_order_is_stable_while_drifting() {
        let mut store = EntityStore::new(5, bounds());
        store.spawn_level(10);
        let before: Vec<u32> = store.all_dots().map(|d| d.id()).collect();
        for _ in 0..500 {
            store.drift_all(3.0);
        }
        let after: Vec<u32> = store.all_dots().map(|d| d.id()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_retire_captured() {
        let mut store = EntityStore::new(5, bounds());
        store.spawn_level(3);
        store.roamers_mut()[1].transition(DotState::Captured);
        assert_eq!(store.retire_captured(), 1);
        assert_eq!(store.count(DotState::Dead), 1);
        assert_eq!(store.retire_captured(), 0);
    }

    #[test]
    fn test_tiny_canvas_centers_dots() {
        let mut store = EntityStore::new(
            5,
            Bounds {
                width: 10.0,
                height: 10.0,
                dot_radius: 10.0,
            },
        );
        store.spawn_level(2);
        for dot in store.all_dots() {
            assert_eq!(dot.pos, Vec2::new(5.0, 5.0));
        }
    }
}
