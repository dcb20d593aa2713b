//! Dots entry point
//!
//! On the web the engine is driven through the exported `Game` type in the
//! library. Natively this runs a headless demo: an autoplayer clicks into
//! the densest cluster of dots and plays through the level table on a
//! synthetic 60 Hz clock, logging every outcome.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::error::Error;

    use dots::sim::LevelState;
    use dots::{Engine, EngineConfig};

    /// Give up after this many level attempts
    const MAX_ATTEMPTS: u32 = 40;
    /// Safety cap on simulated frames per attempt
    const MAX_FRAMES: u32 = 60 * 60;

    pub fn run() -> Result<(), Box<dyn Error>> {
        env_logger::init();

        let config = match std::env::args().nth(1) {
            Some(path) => {
                let json = std::fs::read_to_string(&path)?;
                log::info!("Loaded config from {}", path);
                EngineConfig::from_json(&json)?
            }
            None => EngineConfig {
                seed: 0x5EED,
                ..Default::default()
            },
        };
        let mut engine = Engine::new(config)?;
        let period = engine.scheduler().period_ms();
        let mut now = 0.0;
        let mut wins = 0;

        for attempt in 1..=MAX_ATTEMPTS {
            engine.start();
            // Let the dots spread out a little before aiming
            for _ in 0..30 {
                now += period;
                engine.tick_at(now);
            }
            let (x, y) = densest_point(&engine);
            engine.add_player(x, y);

            let mut frames = 0;
            while !engine.level().state().is_terminal() && frames < MAX_FRAMES {
                now += period;
                engine.tick_at(now);
                frames += 1;
            }

            let header = *engine.header();
            log::info!(
                "Attempt {}: level {} {:?} with {}/{} captured (needed {})",
                attempt,
                header.level,
                engine.level().state(),
                header.captured_dots,
                engine.level().total_dots(),
                header.win_threshold
            );

            match engine.level().state() {
                LevelState::Won if header.level == engine.config().max_level() => {
                    wins += 1;
                    log::info!("Final level cleared after {} attempts", attempt);
                    break;
                }
                LevelState::Won => {
                    wins += 1;
                    engine.next_level();
                }
                _ => {
                    engine.restart_level();
                }
            }
        }

        log::info!("Demo finished: {} levels won", wins);
        Ok(())
    }

    /// Position of the free dot with the most free neighbours in reach
    fn densest_point(engine: &Engine) -> (f32, f32) {
        let reach = engine.config().player_final_radius;
        let free: Vec<_> = engine
            .level()
            .store()
            .roamers()
            .iter()
            .filter(|d| d.state().is_capturable())
            .map(|d| d.pos)
            .collect();

        free.iter()
            .max_by_key(|p| free.iter().filter(|q| p.distance(**q) < reach).count())
            .map(|p| (p.x, p.y))
            .unwrap_or((
                f32::from(engine.width()) / 2.0,
                f32::from(engine.height()) / 2.0,
            ))
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    headless::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Entry point is `dots::ffi::init`, run by wasm-bindgen on module load
}
