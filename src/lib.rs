pub mod camera;
pub mod input_manager;
pub mod render;
pub mod render_timer;
pub mod simulation;
pub mod state;
pub mod surface_manager;
pub mod telemetry;
pub mod utils;
pub mod wgpu_context;

use std::sync::Arc;

use state::State;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Subsystem lifecycle. Initialization failures are terminal: the app reports
/// the reason and moves straight to `Disposed` with no retry and no degraded
/// rendering. There is deliberately no `Paused` phase; the simulation
/// free-runs and "pausing" only ever means not advancing the stirring flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Uninitialized,
    Initializing,
    Ready,
    Disposed,
}

pub struct App {
    #[cfg(target_arch = "wasm32")]
    proxy: Option<winit::event_loop::EventLoopProxy<State>>,
    state: Option<State>,
    phase: LifecyclePhase,
}

impl App {
    pub fn new(#[cfg(target_arch = "wasm32")] event_loop: &EventLoop<State>) -> Self {
        #[cfg(target_arch = "wasm32")]
        let proxy = Some(event_loop.create_proxy());
        Self {
            state: None,
            phase: LifecyclePhase::Uninitialized,
            #[cfg(target_arch = "wasm32")]
            proxy,
        }
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    fn dispose(&mut self, event_loop: &ActiveEventLoop) {
        // Dropping the state releases every GPU handle; in-flight work is not
        // awaited because device release is terminal.
        self.state = None;
        self.phase = LifecyclePhase::Disposed;
        event_loop.exit();
    }
}

impl ApplicationHandler<State> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.phase != LifecyclePhase::Uninitialized {
            return;
        }
        self.phase = LifecyclePhase::Initializing;

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes()
            .with_title("entropy cafe")
            .with_inner_size(winit::dpi::LogicalSize::new(1280.0, 720.0));

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Unable to create a window: {e}");
                self.phase = LifecyclePhase::Disposed;
                event_loop.exit();
                return;
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match pollster::block_on(State::new(window)) {
                Ok(state) => {
                    self.state = Some(state);
                    self.phase = LifecyclePhase::Ready;
                }
                Err(e) => {
                    log::error!("GPU initialization failed: {e}");
                    self.phase = LifecyclePhase::Disposed;
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            // Run the future asynchronously and use the
            // proxy to send the results to the event loop
            if let Some(proxy) = self.proxy.take() {
                wasm_bindgen_futures::spawn_local(async move {
                    assert!(proxy
                        .send_event(
                            State::new(window)
                                .await
                                .expect("GPU initialization failed")
                        )
                        .is_ok())
                });
            }
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: State) {
        // This is where the wasm proxy.send_event() ends up
        self.state = Some(event);
        self.phase = LifecyclePhase::Ready;
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        if matches!(event, WindowEvent::CloseRequested) {
            self.dispose(event_loop);
            return;
        }

        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        state.render_loop(&event, event_loop);
    }
}

pub fn run() -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        env_logger::init();
    }
    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop = EventLoop::with_user_event().build()?;
    let mut app = App::new(
        #[cfg(target_arch = "wasm32")]
        &event_loop,
    );

    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), wasm_bindgen::JsValue> {
    console_error_panic_hook::set_once();
    run().unwrap_throw();

    Ok(())
}
