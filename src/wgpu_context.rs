use std::fmt;
use std::sync::Arc;
use wgpu::Adapter;
use winit::window::Window;

use crate::surface_manager::SurfaceManager;

/// Why GPU initialization failed. Each reason is terminal and user-reportable;
/// there is no retry and no degraded-mode rendering.
#[derive(Debug)]
pub enum InitError {
    /// The backend could not produce a renderable surface at all.
    CapabilityUnsupported(wgpu::CreateSurfaceError),
    /// No adapter matched the request.
    NoAdapter(wgpu::RequestAdapterError),
    /// An adapter exists but refused to hand out a device.
    NoDevice(wgpu::RequestDeviceError),
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::CapabilityUnsupported(e) => {
                write!(f, "GPU rendering is unsupported here: {e}")
            }
            InitError::NoAdapter(e) => write!(f, "no GPU adapter available: {e}"),
            InitError::NoDevice(e) => write!(f, "unable to open a GPU device: {e}"),
        }
    }
}

impl std::error::Error for InitError {}

/// Owns the device, queue and (when windowed) surface for the whole subsystem
/// lifetime. Every pass borrows this context for the duration of one frame;
/// nothing else holds GPU handles of its own.
pub struct WgpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_manager: Option<SurfaceManager>,
    adapter: Adapter,
}

impl WgpuContext {
    pub async fn new(window: Arc<Window>) -> Result<Self, InitError> {
        // The instance is a handle to our GPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .map_err(InitError::CapabilityUnsupported)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(InitError::NoAdapter)?;

        let surface_manager = Some(SurfaceManager::new(window, surface, &adapter));

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: Self::get_features(&adapter),
                required_limits: Self::get_limits(&adapter),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(InitError::NoDevice)?;

        Ok(Self {
            device,
            queue,
            surface_manager,
            adapter,
        })
    }

    /// Surfaceless context for integration tests: same device setup, no window.
    pub async fn new_for_test() -> Result<Self, InitError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(InitError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Test Device"),
                required_features: wgpu::Features::empty(),
                required_limits: Self::get_limits(&adapter),
                ..Default::default()
            })
            .await
            .map_err(InitError::NoDevice)?;

        Ok(Self {
            device,
            queue,
            surface_manager: None,
            adapter,
        })
    }

    /// Timestamp queries feed the frame profiler; they are optional, so only
    /// ask for them where the adapter offers them.
    fn get_features(adapter: &Adapter) -> wgpu::Features {
        let timestamps =
            wgpu::Features::TIMESTAMP_QUERY | wgpu::Features::TIMESTAMP_QUERY_INSIDE_ENCODERS;
        adapter.features() & timestamps
    }

    fn get_limits(adapter: &Adapter) -> wgpu::Limits {
        if cfg!(target_arch = "wasm32") {
            // When on web, request the browser's supported limits
            wgpu::Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits())
        } else {
            // For native, use the adapter's reported limits
            adapter.limits()
        }
    }

    pub fn window_size(&self) -> glam::Vec2 {
        match &self.surface_manager {
            Some(surface_manager) => {
                let size = surface_manager.window_size();
                glam::Vec2::new(size.width as f32, size.height as f32)
            }
            None => glam::Vec2::ZERO,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if let Some(surface_manager) = self.surface_manager.as_mut() {
            surface_manager.resize(width, height, &self.device);
        }
    }

    pub fn get_window(&self) -> &Arc<Window> {
        self.surface_manager
            .as_ref()
            .expect("No surface in this context")
            .get_window()
    }

    pub fn get_surface(&self) -> &wgpu::Surface<'static> {
        self.surface_manager
            .as_ref()
            .expect("No surface in this context")
            .get_surface()
    }

    pub fn is_surface_configured(&self) -> bool {
        self.surface_manager
            .as_ref()
            .expect("No surface in this context")
            .is_surface_configured()
    }

    pub fn get_device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn get_queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn get_adapter(&self) -> &Adapter {
        &self.adapter
    }

    pub fn get_surface_config(&self) -> &wgpu::SurfaceConfiguration {
        self.surface_manager
            .as_ref()
            .expect("No surface in this context")
            .get_config()
    }
}
