//! Swarm Survivor entry point
//!
//! In the browser this exposes [`WebGame`](wasm_game::WebGame) to the page
//! script, which draws the view and plays the audio cues. Natively it runs a
//! headless autopilot session, handy for balance checks:
//!
//! ```text
//! swarm-survivor [config.json] [save.json]
//! ```

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use wasm_bindgen::prelude::*;

    use swarm_survivor::platform;
    use swarm_survivor::sim::{self, AutoSelect, SessionMode, TickInput};
    use swarm_survivor::{GameHost, Settings, SimConfig};

    /// Game instance driven by the page's animation loop
    #[wasm_bindgen]
    pub struct WebGame {
        host: GameHost,
        input: TickInput,
    }

    #[wasm_bindgen]
    impl WebGame {
        #[wasm_bindgen(constructor)]
        pub fn new(width: f32, height: f32) -> WebGame {
            let config = SimConfig {
                arena_width: width,
                arena_height: height,
                ..Default::default()
            };
            let seed = config.seed.unwrap_or_else(platform::fresh_seed);
            log::info!("Arena {width}x{height}, seed {seed}");
            WebGame {
                host: GameHost::new(config, platform::default_store(), seed),
                input: TickInput::default(),
            }
        }

        /// Arrow keys and WASD; anything else is ignored
        pub fn set_key(&mut self, key: &str, down: bool) {
            match key {
                "ArrowUp" | "w" | "W" => self.input.up = down,
                "ArrowDown" | "s" | "S" => self.input.down = down,
                "ArrowLeft" | "a" | "A" => self.input.left = down,
                "ArrowRight" | "d" | "D" => self.input.right = down,
                _ => {}
            }
        }

        /// Step and return `{ view, cues }` as JSON
        pub fn frame(&mut self, now: f64) -> String {
            let cues = self.host.frame(&self.input, now);
            let frame = serde_json::json!({ "view": self.host.view(), "cues": cues });
            serde_json::to_string(&frame).unwrap_or_else(|e| {
                log::error!("Failed to encode frame: {e}");
                "{}".to_string()
            })
        }

        pub fn start(&mut self, hard: bool) -> bool {
            let mode = if hard { SessionMode::Hard } else { SessionMode::Normal };
            sim::start(&mut self.host.state, mode, platform::now_ms())
        }

        pub fn hard_mode_unlocked(&self) -> bool {
            self.host.state.progress.hard_mode_unlocked()
        }

        /// Pick the offered option at `index`
        pub fn select(&mut self, index: usize) -> bool {
            let Some(id) = self.host.state.pending_choice.get(index).copied() else {
                return false;
            };
            sim::select_upgrade(&mut self.host.state, id, platform::now_ms())
        }

        pub fn reroll(&mut self) -> bool {
            sim::reroll_upgrades(&mut self.host.state, platform::now_ms())
        }

        pub fn endless(&mut self) -> bool {
            sim::enter_endless(&mut self.host.state, platform::now_ms())
        }

        pub fn retry(&mut self) -> bool {
            sim::retry(&mut self.host.state, platform::now_ms())
        }

        pub fn menu(&mut self) -> bool {
            sim::return_to_menu(&mut self.host.state, platform::now_ms())
        }

        pub fn visibility(&mut self, hidden: bool) {
            sim::report_visibility(&mut self.host.state, hidden, platform::now_ms());
        }

        pub fn set_auto_select(&mut self, vitality: bool, power: bool) {
            sim::set_auto_select(&mut self.host.state, AutoSelect { vitality, power });
        }

        /// Change mute flags; returns the resulting cues as JSON
        pub fn set_mute(&mut self, music: bool, effects: bool) -> String {
            let cues = self.host.set_settings(Settings {
                mute_music: music,
                mute_sound_effects: effects,
            });
            serde_json::to_string(&cues).unwrap_or_else(|_| "[]".to_string())
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Swarm Survivor (web) starting...");
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use swarm_survivor::{GameHost, SimConfig, platform};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Swarm Survivor (native) starting...");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match args.first() {
        Some(path) => SimConfig::load(path).unwrap_or_else(|e| {
            log::warn!("Using default config: {e}");
            SimConfig::default()
        }),
        None => SimConfig::default(),
    };
    let seed = config.seed.unwrap_or_else(platform::fresh_seed);
    let store = platform::default_store(args.get(1).map(String::as_str));
    let mut host = GameHost::new(config, store, seed);
    autopilot::run(&mut host, platform::now_ms());
}

#[cfg(not(target_arch = "wasm32"))]
mod autopilot {
    use glam::Vec2;
    use swarm_survivor::GameHost;
    use swarm_survivor::sim::{self, GamePhase, SessionMode, SessionState, TickInput};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Give up after this much game time (ms)
    const MAX_RUN_MS: f64 = 20.0 * 60.0 * 1000.0;

    /// Play one session with simulated time starting at `t0`
    pub fn run(host: &mut GameHost, t0: f64) {
        if !sim::start(&mut host.state, SessionMode::Normal, t0) {
            log::error!("Could not start a session");
            return;
        }

        let mut now = t0;
        while now - t0 < MAX_RUN_MS {
            match host.state.phase {
                GamePhase::ChoosingUpgrade => {
                    let choice = host.state.pending_choice.first().copied();
                    if let Some(id) = choice {
                        log::info!("Autopilot takes {}", id.label());
                        sim::select_upgrade(&mut host.state, id, now);
                    }
                }
                GamePhase::GameOver | GamePhase::Won => break,
                _ => {}
            }
            let input = steer(&host.state);
            for cue in host.frame(&input, now) {
                log::debug!("Audio: {cue:?}");
            }
            now += FRAME_MS;
        }
        host.dispatch(now);

        let state = &host.state;
        println!(
            "{:?} after {}s: level {}, score {}, {} weapons, best ever {}",
            state.phase,
            state.game_time,
            state.level,
            state.score,
            state.weapons.len(),
            state.progress.highest_score
        );
    }

    /// Walk away from the crowd, drifting back toward the centre
    fn steer(state: &SessionState) -> TickInput {
        let player = state.player.pos;
        let mut push = (state.center() - player) * 0.002;
        for enemy in &state.enemies {
            let away = player - enemy.pos;
            let d = away.length().max(1.0);
            if d < 300.0 {
                push += away / (d * d) * 100.0;
            }
        }
        if push.length() < 0.05 {
            push = Vec2::ZERO;
        }
        TickInput {
            up: push.y < -0.05,
            down: push.y > 0.05,
            left: push.x < -0.05,
            right: push.x > 0.05,
        }
    }
}
