use std::sync::Arc;

use wgpu_profiler::{GpuProfiler, GpuProfilerSettings};
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::Window;

use crate::camera::OrbitCamera;
use crate::input_manager::{InputEvent, InputManager};
use crate::render::FluidRenderer;
use crate::render_timer::RenderTimer;
use crate::simulation::FluidSimulator;
use crate::telemetry::{MetricsCallback, Telemetry};
use crate::wgpu_context::{InitError, WgpuContext};

/// Everything the fluid subsystem owns while it is `Ready`: the GPU context,
/// the simulation, the render stages and the per-frame bookkeeping.
pub struct State {
    wgpu_context: WgpuContext,
    camera: OrbitCamera,
    simulator: FluidSimulator,
    renderer: FluidRenderer,
    input_manager: InputManager,
    render_timer: RenderTimer,
    telemetry: Telemetry,
    profiler: GpuProfiler,
    frame_delta: f32,
}

impl State {
    pub async fn new(window: Arc<Window>) -> Result<Self, InitError> {
        let wgpu_context = WgpuContext::new(window).await?;

        let camera = OrbitCamera::new(&wgpu_context);
        let simulator = FluidSimulator::new(&wgpu_context);
        let renderer = FluidRenderer::new(&wgpu_context, simulator.particle_buffer(), &camera);

        // Falls back to a no-op profiler when timestamp queries are missing.
        let profiler = GpuProfiler::new(wgpu_context.get_device(), GpuProfilerSettings::default())
            .unwrap_or_else(|_| {
                GpuProfiler::new(
                    wgpu_context.get_device(),
                    GpuProfilerSettings {
                        enable_timer_queries: false,
                        ..Default::default()
                    },
                )
                .expect("disabled profiler cannot fail")
            });

        Ok(Self {
            wgpu_context,
            camera,
            simulator,
            renderer,
            input_manager: InputManager::new(),
            render_timer: RenderTimer::new(),
            telemetry: Telemetry::new(),
            profiler,
            frame_delta: 0.0,
        })
    }

    /// Reinitializes the particle buffer to the two-layer resting state and
    /// zeroes elapsed time.
    pub fn reset(&mut self) {
        self.simulator.reset(&self.wgpu_context);
    }

    /// One-shot stir pulse, independent of the continuous toggle.
    pub fn stir(&mut self) {
        self.simulator.stir();
    }

    /// Continuous stirring toggle, read every frame.
    pub fn set_stirring(&mut self, active: bool) {
        self.simulator.set_stirring(active);
    }

    pub fn set_metrics_callback(&mut self, callback: MetricsCallback) {
        self.telemetry.set_callback(callback);
    }

    pub fn queue_drag(&mut self, dx: f32, dy: f32) {
        self.input_manager.queue_drag(dx, dy);
    }

    pub fn queue_wheel(&mut self, delta: f32) {
        self.input_manager.queue_wheel(delta);
    }

    pub fn render_loop(&mut self, event: &WindowEvent, event_loop: &ActiveEventLoop) {
        match event {
            WindowEvent::Resized(size) => self.wgpu_context.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                self.update();
                match self.render() {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = self.wgpu_context.window_size();
                        self.wgpu_context.resize(size.x as u32, size.y as u32);
                    }
                    Err(e) => {
                        log::error!("Unable to render: {:?}", e);
                    }
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => self.process_key(*code, event_loop),
            _ => self.input_manager.process_window_event(event),
        }
    }

    fn process_key(&mut self, code: KeyCode, event_loop: &ActiveEventLoop) {
        match code {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::KeyR => self.reset(),
            KeyCode::Space => self.stir(),
            KeyCode::KeyS => {
                let stirring = !self.simulator.is_stirring();
                self.set_stirring(stirring);
            }
            _ => {}
        }
    }

    fn update(&mut self) {
        self.frame_delta = self.render_timer.get_delta().as_secs_f32();

        // Drain the whole input queue before any matrices are derived, so the
        // frame sees one consistent camera.
        for event in self.input_manager.drain() {
            match event {
                InputEvent::Drag { dx, dy } => self.camera.state.apply_drag(dx, dy),
                InputEvent::Wheel { delta } => self.camera.state.apply_wheel(delta),
            }
        }

        let screen_size = self.wgpu_context.window_size();
        self.camera
            .update(&self.wgpu_context, screen_size, self.simulator.time());

        self.telemetry.tick(self.simulator.time());
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.wgpu_context.get_window().request_redraw();

        // We can't render unless the window is configured
        if !self.wgpu_context.is_surface_configured() {
            return Ok(());
        }

        let output = self.wgpu_context.get_surface().get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.wgpu_context.get_device().create_command_encoder(
            &wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            },
        );

        {
            let mut scope = self.profiler.scope("simulate", &mut encoder);
            self.simulator
                .encode(&self.wgpu_context, &mut scope, self.frame_delta);
        }

        self.renderer.encode(
            &mut encoder,
            &mut self.profiler,
            &view,
            &self.camera,
            self.simulator.num_particles(),
        );

        self.profiler.resolve_queries(&mut encoder);

        self.wgpu_context
            .get_queue()
            .submit(std::iter::once(encoder.finish()));
        let _ = self.profiler.end_frame();

        output.present();

        Ok(())
    }
}
