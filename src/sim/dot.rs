//! Dot entity and its state machine

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// RGB color, 0-255 per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl From<(u8, u8, u8)> for Color {
    fn from(rgb: (u8, u8, u8)) -> Self {
        Self {
            r: rgb.0,
            g: rgb.1,
            b: rgb.2,
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Capture progress of a dot
///
/// Allowed edges: Free -> Targeted -> Captured -> Dead, Targeted -> Free,
/// Free -> Captured (containment on the first check) and anything -> Dead.
/// Nothing leaves Dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DotState {
    Free,
    Targeted,
    Captured,
    Dead,
}

impl DotState {
    pub fn can_transition(self, next: DotState) -> bool {
        use DotState::*;
        matches!(
            (self, next),
            (Free, Targeted)
                | (Free, Captured)
                | (Targeted, Captured)
                | (Targeted, Free)
                | (Free | Targeted | Captured, Dead)
        )
    }

    /// Still roaming and eligible for capture
    pub fn is_capturable(self) -> bool {
        matches!(self, DotState::Free | DotState::Targeted)
    }
}

/// Growth cycle of the player dot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerPhase {
    Growing,
    /// At full size for the remaining number of ticks
    Holding { ticks_left: u32 },
    Shrinking,
}

/// Role of a dot, orthogonal to its state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Free-roaming target
    Roamer,
    /// The capturing agent placed by the host
    Player(PlayerPhase),
}

/// Player growth parameters, copied out of the engine config
#[derive(Debug, Clone, Copy)]
pub struct Growth {
    pub final_radius: f32,
    pub speed: f32,
    pub hang_ticks: u32,
}

/// A circular entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dot {
    id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub color: Color,
    state: DotState,
    role: Role,
    /// Drift destination (roamers only)
    pub target: Option<Vec2>,
}

impl Dot {
    pub fn roamer(id: u32, pos: Vec2, radius: f32, color: Color, target: Vec2) -> Self {
        Self {
            id,
            pos,
            radius,
            color,
            state: DotState::Free,
            role: Role::Roamer,
            target: Some(target),
        }
    }

    pub fn player(id: u32, pos: Vec2, radius: f32, color: Color) -> Self {
        Self {
            id,
            pos,
            radius,
            color,
            state: DotState::Free,
            role: Role::Player(PlayerPhase::Growing),
            target: None,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn state(&self) -> DotState {
        self.state
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_player(&self) -> bool {
        matches!(self.role, Role::Player(_))
    }

    /// Player dot that has not yet shrunk away
    pub fn is_live_player(&self) -> bool {
        self.is_player() && self.state != DotState::Dead
    }

    /// Same dot under a new ID at `pos`, with its radius, state and role intact
    pub fn relocated(self, id: u32, pos: Vec2) -> Self {
        Self { id, pos, ..self }
    }

    /// Move along an allowed edge; returns false (and leaves the dot alone) otherwise
    pub fn transition(&mut self, next: DotState) -> bool {
        if self.state == next {
            return true;
        }
        let allowed = self.state.can_transition(next);
        debug_assert!(
            allowed,
            "dot {} cannot go {:?} -> {:?}",
            self.id, self.state, next
        );
        if !allowed {
            return false;
        }
        self.state = next;
        true
    }

    /// Step toward the drift target; returns true once the target is reached
    pub fn drift(&mut self, speed: f32) -> bool {
        let Some(target) = self.target else {
            return false;
        };
        let to_target = target - self.pos;
        let dist = to_target.length();
        if dist <= speed {
            self.pos = target;
            true
        } else {
            self.pos += to_target / dist * speed;
            false
        }
    }

    /// Advance the player growth cycle by one tick
    pub fn grow(&mut self, growth: &Growth) {
        let Role::Player(phase) = self.role else {
            return;
        };
        if self.state == DotState::Dead {
            return;
        }
        self.role = Role::Player(match phase {
            PlayerPhase::Growing => {
                self.radius = (self.radius + growth.speed).min(growth.final_radius);
                if self.radius >= growth.final_radius {
                    PlayerPhase::Holding {
                        ticks_left: growth.hang_ticks,
                    }
                } else {
                    PlayerPhase::Growing
                }
            }
            PlayerPhase::Holding { ticks_left: 0 } => PlayerPhase::Shrinking,
            PlayerPhase::Holding { ticks_left } => PlayerPhase::Holding {
                ticks_left: ticks_left - 1,
            },
            PlayerPhase::Shrinking => {
                self.radius = (self.radius - growth.speed).max(0.0);
                if self.radius <= 0.0 {
                    self.state = DotState::Dead;
                }
                PlayerPhase::Shrinking
            }
        });
    }
}
