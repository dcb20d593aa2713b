//! Boundary codec: packed frames the host reads without parsing
//!
//! Protocol version 1 layout (little-endian):
//!
//! ```text
//! header  [u8; 8]   level | level_state | total_dots | win_threshold |
//!                   captured_dots | version | reserved | reserved
//! records [f32; 7]  x | y | radius | state_tag | r | g | b   (x total_dots)
//! ```
//!
//! `total_dots` in the header is the record count (population plus the
//! player dot once placed). Header and record widths are protocol constants;
//! the host slices the buffer by arithmetic.

use bytemuck::{Pod, Zeroable};

use crate::sim::dot::{Dot, DotState};
use crate::sim::level::{Level, LevelState};

/// Wire protocol version carried in every header
pub const PROTOCOL_VERSION: u8 = 1;
/// Header width in bytes
pub const HEADER_LEN: usize = std::mem::size_of::<PackedHeader>();
/// f32 fields per dot record
pub const RECORD_FLOATS: usize = 7;
/// Record width in bytes
pub const RECORD_LEN: usize = std::mem::size_of::<PackedDot>();

/// Wire tag for dots that must not be drawn
pub const TAG_DEAD: f32 = 5.0;

/// Fixed-width frame header
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct PackedHeader {
    pub level: u8,
    pub level_state: u8,
    pub total_dots: u8,
    pub win_threshold: u8,
    pub captured_dots: u8,
    pub version: u8,
    pub reserved: [u8; 2],
}

/// Fixed-width dot record
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PackedDot {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub state: f32,
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

const _: () = assert!(HEADER_LEN == 8);
const _: () = assert!(RECORD_LEN == RECORD_FLOATS * 4);

pub fn level_state_tag(state: LevelState) -> u8 {
    match state {
        LevelState::Begin => 0,
        LevelState::Waiting => 1,
        LevelState::Clicked => 2,
        LevelState::Won => 3,
        LevelState::Lost => 4,
    }
}

/// Wire tag for a dot: 1 Free, 2 Targeted, 3 Captured, 4 live player, 5 dead
pub fn dot_state_tag(dot: &Dot) -> f32 {
    match dot.state() {
        DotState::Dead => TAG_DEAD,
        _ if dot.is_player() => 4.0,
        DotState::Free => 1.0,
        DotState::Targeted => 2.0,
        DotState::Captured => 3.0,
    }
}

impl PackedDot {
    pub fn from_dot(dot: &Dot) -> Self {
        Self {
            x: dot.pos.x,
            y: dot.pos.y,
            radius: dot.radius,
            state: dot_state_tag(dot),
            r: f32::from(dot.color.r),
            g: f32::from(dot.color.g),
            b: f32::from(dot.color.b),
        }
    }
}

/// Immutable picture of the world after one completed update
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    frame: u64,
    header: PackedHeader,
    dots: Vec<PackedDot>,
}

impl Snapshot {
    /// Pack the level as it stands; `frame` numbers successive snapshots
    pub fn capture(level: &Level, frame: u64) -> Self {
        let dots: Vec<PackedDot> = level.dots().map(PackedDot::from_dot).collect();
        let header = PackedHeader {
            level: level.number(),
            level_state: level_state_tag(level.state()),
            total_dots: u8::try_from(dots.len()).unwrap_or(u8::MAX),
            win_threshold: level.win_threshold(),
            captured_dots: level.captured(),
            version: PROTOCOL_VERSION,
            reserved: [0; 2],
        };
        assert_eq!(
            usize::from(header.total_dots),
            dots.len(),
            "record count does not fit the header"
        );
        Self {
            frame,
            header,
            dots,
        }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn header(&self) -> &PackedHeader {
        &self.header
    }

    pub fn dots(&self) -> &[PackedDot] {
        &self.dots
    }

    pub fn header_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.header)
    }

    /// Records as one flat f32 slice (RECORD_FLOATS per dot)
    pub fn floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.dots)
    }

    /// Single linear buffer: header followed by the records
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.dots.len() * RECORD_LEN);
        out.extend_from_slice(self.header_bytes());
        for dot in &self.dots {
            for field in bytemuck::cast_ref::<PackedDot, [f32; RECORD_FLOATS]>(dot) {
                out.extend_from_slice(&field.to_le_bytes());
            }
        }
        out
    }
}

/// Decoded frame, as the host sees it
#[derive(Debug, Clone, PartialEq)]
pub struct FrameView {
    pub header: PackedHeader,
    pub dots: Vec<PackedDot>,
}

/// Decode a frame produced by [`Snapshot::encode`]
///
/// # Panics
///
/// On a version or length mismatch. Either one means engine and host speak
/// different protocol versions, which no retry can fix.
pub fn decode(bytes: &[u8]) -> FrameView {
    assert!(
        bytes.len() >= HEADER_LEN,
        "frame of {} bytes is shorter than the header",
        bytes.len()
    );
    let header: PackedHeader = bytemuck::pod_read_unaligned(&bytes[..HEADER_LEN]);
    assert_eq!(
        header.version, PROTOCOL_VERSION,
        "protocol version mismatch"
    );
    let expected = HEADER_LEN + usize::from(header.total_dots) * RECORD_LEN;
    assert_eq!(
        bytes.len(),
        expected,
        "frame length does not match header count of {} dots",
        header.total_dots
    );

    let dots = bytes[HEADER_LEN..]
        .chunks_exact(RECORD_LEN)
        .map(|chunk| {
            let mut fields = [0.0f32; RECORD_FLOATS];
            for (field, raw) in fields.iter_mut().zip(chunk.chunks_exact(4)) {
                *field = f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
            }
            bytemuck::cast::<[f32; RECORD_FLOATS], PackedDot>(fields)
        })
        .collect();

    FrameView { header, dots }
}

/// Inbound host message: a click in canvas space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointEvent {
    pub x: f32,
    pub y: f32,
}

impl PointEvent {
    /// Build from host coordinates; non-finite input is dropped
    pub fn from_host(x: f64, y: f64) -> Option<Self> {
        let (x, y) = (x as f32, y as f32);
        (x.is_finite() && y.is_finite()).then_some(Self { x, y })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::EngineConfig;

    fn level() -> Level {
        Level::new(&EngineConfig {
            seed: 11,
            start_dots: Some(60),
            ..Default::default()
        })
    }

    #[test]
    fn test_header_layout() {
        let level = level();
        let snap = Snapshot::capture(&level, 0);
        assert_eq!(snap.header_bytes(), &[1, 0, 60, 40, 0, PROTOCOL_VERSION, 0, 0]);
        assert_eq!(snap.floats().len(), 60 * RECORD_FLOATS);
    }

    #[test]
    fn test_encode_decode_matches_snapshot() {
        let mut level = level();
        level.add_player(400.0, 300.0);
        let snap = Snapshot::capture(&level, 3);
        let bytes = snap.encode();
        assert_eq!(bytes.len(), HEADER_LEN + 61 * RECORD_LEN);

        let view = decode(&bytes);
        assert_eq!(view.header, *snap.header());
        assert_eq!(view.dots, snap.dots());
        // Player record is last
        assert_eq!(view.dots[60].state, 4.0);
        assert_eq!(view.dots[60].x, 400.0);
    }

    #[test]
    fn test_record_fields() {
        let level = level();
        let snap = Snapshot::capture(&level, 0);
        let first = level.dots().next().unwrap();
        let rec = snap.dots()[0];
        assert_eq!(rec.x, first.pos.x);
        assert_eq!(rec.radius, first.radius);
        assert_eq!(rec.state, 1.0);
        assert_eq!(rec.g, f32::from(first.color.g));
        assert_ne!(rec.state, TAG_DEAD);
        assert_eq!(&snap.floats()[..RECORD_FLOATS], &[
            rec.x, rec.y, rec.radius, rec.state, rec.r, rec.g, rec.b
        ]);
    }

    #[test]
    #[should_panic(expected = "frame length does not match")]
    fn test_truncated_frame_is_a_contract_violation() {
        let snap = Snapshot::capture(&level(), 0);
        let bytes = snap.encode();
        decode(&bytes[..bytes.len() - 4]);
    }

    #[test]
    #[should_panic(expected = "protocol version mismatch")]
    fn test_version_skew_is_a_contract_violation() {
        let snap = Snapshot::capture(&level(), 0);
        let mut bytes = snap.encode();
        bytes[5] = PROTOCOL_VERSION + 1;
        decode(&bytes);
    }

    #[test]
    fn test_point_event() {
        assert_eq!(
            PointEvent::from_host(10.5, 20.0),
            Some(PointEvent { x: 10.5, y: 20.0 })
        );
        assert_eq!(PointEvent::from_host(f64::NAN, 1.0), None);
    }
}
