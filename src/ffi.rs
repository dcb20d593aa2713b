//! WebAssembly boundary
//!
//! The host creates one `Game`, calls `tick()` from `requestAnimationFrame`,
//! then reads `header()` and the f32 records behind `pack()` straight out of
//! wasm memory. The record pointer stays valid until the next call that
//! mutates the engine.

use wasm_bindgen::prelude::*;

use crate::codec::{PROTOCOL_VERSION, PointEvent, RECORD_FLOATS};
use crate::engine::Engine;
use crate::settings::EngineConfig;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already initialized".into());
    }
}

/// Wall-clock milliseconds: `performance.now()` when available
fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

fn random_seed() -> u64 {
    (js_sys::Math::random() * u32::MAX as f64) as u64
}

#[wasm_bindgen]
pub struct Game {
    engine: Engine,
}

impl Game {
    fn build(config: EngineConfig) -> Result<Game, JsValue> {
        let engine = Engine::new(config).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Game { engine })
    }
}

#[wasm_bindgen]
impl Game {
    /// Default configuration with a random seed
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<Game, JsValue> {
        let config = EngineConfig {
            seed: random_seed(),
            ..Default::default()
        };
        Self::build(config)
    }

    /// Configuration from a (possibly partial) JSON document
    pub fn with_config(json: &str) -> Result<Game, JsValue> {
        let config = EngineConfig::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Self::build(config)
    }

    pub fn height(&self) -> u16 {
        self.engine.height()
    }

    pub fn width(&self) -> u16 {
        self.engine.width()
    }

    pub fn protocol_version(&self) -> u8 {
        PROTOCOL_VERSION
    }

    pub fn tick(&mut self) {
        self.engine.tick_at(now_ms());
    }

    pub fn add_player(&mut self, x: f64, y: f64) {
        if let Some(event) = PointEvent::from_host(x, y) {
            self.engine.handle_point(event);
        }
    }

    pub fn handle_click(&mut self, x: f64, y: f64) {
        if let Some(event) = PointEvent::from_host(x, y) {
            self.engine.handle_click(event.x, event.y);
        }
    }

    /// Begin -> Waiting without placing a player
    pub fn start(&mut self) {
        self.engine.start();
    }

    pub fn restart_level(&mut self) {
        self.engine.restart_level();
    }

    pub fn next_level(&mut self) {
        self.engine.next_level();
    }

    pub fn load_level(&mut self, total_dots: u8) {
        self.engine.load_level(total_dots);
    }

    /// Header bytes: level | state | total | threshold | captured | version | 0 | 0
    pub fn header(&self) -> Vec<u8> {
        self.engine.pack().header_bytes().to_vec()
    }

    /// Pointer to the first record (`RECORD_FLOATS` f32 per dot)
    pub fn pack(&self) -> *const f32 {
        self.engine.pack().floats().as_ptr()
    }

    /// Number of f32 values behind `pack()`
    pub fn pack_len(&self) -> usize {
        self.engine.pack().floats().len()
    }

    pub fn record_floats(&self) -> usize {
        RECORD_FLOATS
    }

    /// Whole frame (header + records) copied into one buffer
    pub fn frame(&self) -> Vec<u8> {
        self.engine.pack().encode()
    }
}
