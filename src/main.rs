//! Void Cadet entry point
//!
//! Handles platform-specific initialization and runs the game loop. The web
//! build drives the core from `requestAnimationFrame` and bridges level
//! generation to host JavaScript; the native build runs headless in demo
//! mode and prints the final state.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;

    use void_cadet::consts::*;
    use void_cadet::error::GenerationError;
    use void_cadet::level::{LevelGenerator, LevelReply, LevelRequest, SummaryReply, SummaryRequest};
    use void_cadet::sim::{Action, FrameStepper, Game, GameStatus, InputMapper};
    use void_cadet::{Level, Tuning};

    /// Host function producing the next level: `(requestJson) => Promise<levelJson>`
    const LEVEL_HOOK: &str = "generateNextPlanet";
    /// Host function producing the review: `(requestJson) => Promise<string>`
    const REVIEW_HOOK: &str = "generatePerformanceReview";
    /// Where each frame's state snapshot is published for the HUD
    const SNAPSHOT_KEY: &str = "voidCadetState";
    /// Warp screen progress (0..=1), absent outside a warp
    const WARP_PROGRESS_KEY: &str = "voidCadetWarpProgress";

    /// Calls a host hook and waits for its string result
    async fn call_host(name: &str, payload: String) -> Result<String, GenerationError> {
        let window = web_sys::window().ok_or(GenerationError::Unavailable)?;
        let hook = js_sys::Reflect::get(&window, &JsValue::from_str(name))
            .map_err(|_| GenerationError::Unavailable)?;
        let hook: js_sys::Function = hook.dyn_into().map_err(|_| GenerationError::Unavailable)?;

        let value = hook
            .call1(&JsValue::NULL, &JsValue::from_str(&payload))
            .map_err(|e| GenerationError::Failed(format!("{:?}", e)))?;
        let result = JsFuture::from(js_sys::Promise::resolve(&value))
            .await
            .map_err(|e| GenerationError::Failed(format!("{:?}", e)))?;
        result
            .as_string()
            .ok_or_else(|| GenerationError::Malformed("hook did not return a string".to_string()))
    }

    /// Level generator backed by host JavaScript
    struct HostGenerator;

    impl LevelGenerator for HostGenerator {
        fn request_level(&mut self, request: LevelRequest, reply: LevelReply) {
            let payload = match serde_json::to_string(&request) {
                Ok(p) => p,
                Err(e) => {
                    let _ = reply.try_send(Err(GenerationError::Failed(e.to_string())));
                    return;
                }
            };
            wasm_bindgen_futures::spawn_local(async move {
                let result = call_host(LEVEL_HOOK, payload)
                    .await
                    .and_then(|json| Level::from_json(&json));
                let _ = reply.send(result).await;
            });
        }

        fn request_summary(&mut self, request: SummaryRequest, reply: SummaryReply) {
            let payload = match serde_json::to_string(&request) {
                Ok(p) => p,
                Err(e) => {
                    let _ = reply.try_send(Err(GenerationError::Failed(e.to_string())));
                    return;
                }
            };
            wasm_bindgen_futures::spawn_local(async move {
                let _ = reply.send(call_host(REVIEW_HOOK, payload).await).await;
            });
        }
    }

    /// Browser-side runner wrapping the core game
    struct Runner {
        game: Game,
        input: InputMapper,
        autopilot: bool,
        stepper: FrameStepper,
        last_time: f64,
        last_status: GameStatus,
    }

    impl Runner {
        fn new(tuning: Tuning) -> Self {
            Self {
                game: Game::new(tuning, Box::new(HostGenerator)),
                input: InputMapper::new(),
                autopilot: false,
                stepper: FrameStepper::new(),
                last_time: 0.0,
                last_status: GameStatus::Menu,
            }
        }

        /// Run simulation ticks
        fn update(&mut self, dt: f32) {
            if self.input.take_actions().contains(&Action::Start) {
                self.stepper.press_start();
            }
            self.stepper
                .advance(&mut self.game, self.input.state(), self.autopilot, dt);

            let status = self.game.state.status;
            if status != self.last_status {
                log::info!("{:?} -> {:?}", self.last_status, status);
                self.last_status = status;
            }
        }

        /// Publish the state for the presentation layer
        fn publish(&self) {
            let Some(window) = web_sys::window() else {
                return;
            };
            match serde_json::to_string(&self.game.state) {
                Ok(json) => {
                    let _ = js_sys::Reflect::set(
                        &window,
                        &JsValue::from_str(SNAPSHOT_KEY),
                        &JsValue::from_str(&json),
                    );
                }
                Err(e) => log::warn!("Snapshot failed: {}", e),
            }

            let progress = match self.game.transition() {
                Some(t) => JsValue::from_f64(t.progress(self.game.time_ticks) as f64),
                None => JsValue::UNDEFINED,
            };
            let _ = js_sys::Reflect::set(&window, &JsValue::from_str(WARP_PROGRESS_KEY), &progress);
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&JsValue::from_str(&e.to_string()));
        }

        log::info!("Void Cadet starting...");

        let runner = Rc::new(RefCell::new(Runner::new(Tuning::load())));

        setup_input_handlers(runner.clone())?;
        setup_focus_release(runner.clone())?;

        // Start game loop
        request_animation_frame(runner)?;

        log::info!("Void Cadet running!");
        Ok(())
    }

    fn setup_input_handlers(runner: Rc<RefCell<Runner>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;

        {
            let runner = runner.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut r = runner.borrow_mut();
                let key = event.key();
                if key == "i" || key == "I" {
                    r.autopilot = !r.autopilot;
                    log::info!("Autopilot: {}", r.autopilot);
                    return;
                }
                let known = void_cadet::sim::input::control_for_key(&key).is_some()
                    || void_cadet::sim::input::action_for_key(&key).is_some();
                if known {
                    // Space would scroll the page otherwise
                    event.prevent_default();
                }
                r.input.key(&key, true);
            });
            window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                runner.borrow_mut().input.key(&event.key(), false);
            });
            window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }

    /// Release held controls when the page loses focus (no key-up arrives)
    fn setup_focus_release(runner: Rc<RefCell<Runner>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        {
            let runner = runner.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    runner.borrow_mut().input.release_all();
                    log::info!("Controls released (tab hidden)");
                }
            });
            document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            )?;
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                runner.borrow_mut().input.release_all();
            });
            window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }

    fn request_animation_frame(runner: Rc<RefCell<Runner>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let closure = Closure::once(move |time: f64| {
            game_loop(runner, time);
        });
        window.request_animation_frame(closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    fn game_loop(runner: Rc<RefCell<Runner>>, time: f64) {
        {
            let mut r = runner.borrow_mut();

            // Calculate delta time
            let dt = if r.last_time > 0.0 {
                ((time - r.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            r.last_time = time;

            r.update(dt);
            r.publish();
        }

        if let Err(e) = request_animation_frame(runner) {
            log::error!("Game loop stopped: {:?}", e);
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless demo run: `void-cadet [seconds]`
#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use anyhow::Context;
    use void_cadet::consts::{SIM_DT, SIM_HZ};
    use void_cadet::level::OfflineGenerator;
    use void_cadet::sim::{Game, GameStatus, TickInput, tick};
    use void_cadet::Tuning;

    env_logger::init();
    log::info!("Void Cadet (native, headless) starting...");

    let seconds: f32 = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse()
            .with_context(|| format!("invalid duration in seconds: {arg}"))?,
        None => 120.0,
    };
    let max_ticks = (seconds * SIM_HZ) as u64;

    let mut game = Game::new(Tuning::load(), Box::new(OfflineGenerator));
    let input = TickInput {
        autopilot: true,
        ..Default::default()
    };

    let mut last_status = game.state.status;
    while game.time_ticks < max_ticks {
        tick(&mut game, &input, SIM_DT);

        let status = game.state.status;
        if status != last_status {
            log::info!(
                "t={:.1}s {:?} -> {:?} (score {}, lives {})",
                game.time_ticks as f32 * SIM_DT,
                last_status,
                status,
                game.state.score,
                game.state.lives
            );
            last_status = status;
        }
        if status == GameStatus::GameOver && game.state.performance_review.is_some() {
            break;
        }
    }

    let summary = serde_json::to_string_pretty(&game.state).context("serializing final state")?;
    println!("{summary}");
    Ok(())
}
