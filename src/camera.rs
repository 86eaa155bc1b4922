use glam::{Mat4, Vec2, Vec3};
use wgpu::util::DeviceExt;

use crate::simulation::PARTICLE_RADIUS;
use crate::wgpu_context::WgpuContext;

const MIN_DISTANCE: f32 = 3.0;
const MAX_DISTANCE: f32 = 15.0;
const MAX_PHI: f32 = 1.4;

const DRAG_SENSITIVITY: f32 = 0.008;
const WHEEL_SENSITIVITY: f32 = 0.01;

const FOVY: f32 = std::f32::consts::FRAC_PI_4;
const NEAR: f32 = 0.1;
const FAR: f32 = 100.0;

/// Spherical orbit parameters around the container. Mutated only by drag and
/// wheel input; everything else is derived per frame.
#[derive(Debug, Clone, Copy)]
pub struct CameraState {
    pub distance: f32,
    pub theta: f32,
    pub phi: f32,
}

impl CameraState {
    pub fn new() -> Self {
        Self {
            distance: 6.2,
            theta: std::f32::consts::FRAC_PI_4,
            phi: std::f32::consts::PI / 7.0,
        }
    }

    pub fn apply_drag(&mut self, dx: f32, dy: f32) {
        self.theta -= dx * DRAG_SENSITIVITY;
        self.phi = (self.phi + dy * DRAG_SENSITIVITY).clamp(-MAX_PHI, MAX_PHI);
    }

    pub fn apply_wheel(&mut self, delta: f32) {
        self.distance = (self.distance + delta * WHEEL_SENSITIVITY).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    pub fn eye(&self) -> Vec3 {
        Vec3::new(
            self.distance * self.theta.sin() * self.phi.cos(),
            self.distance * self.phi.sin(),
            self.distance * self.theta.cos() * self.phi.cos(),
        )
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), Vec3::ZERO, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(FOVY, aspect, NEAR, FAR)
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self::new()
    }
}

/// View/projection matrices and their general inverses, plus the handful of
/// screen scalars every render pass wants. Rebuilt from `CameraState` each
/// frame, never persisted.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ViewUniforms {
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
    inv_view: [[f32; 4]; 4],
    inv_proj: [[f32; 4]; 4],
    screen_size: [f32; 2],
    particle_radius: f32,
    time: f32,
}

impl ViewUniforms {
    pub fn new() -> Self {
        Self {
            view: Mat4::IDENTITY.to_cols_array_2d(),
            proj: Mat4::IDENTITY.to_cols_array_2d(),
            inv_view: Mat4::IDENTITY.to_cols_array_2d(),
            inv_proj: Mat4::IDENTITY.to_cols_array_2d(),
            screen_size: [1.0, 1.0],
            particle_radius: PARTICLE_RADIUS,
            time: 0.0,
        }
    }

    fn update(&mut self, state: &CameraState, screen_size: Vec2, time: f32) {
        let view = state.view_matrix();
        let proj = state.projection_matrix(screen_size.x / screen_size.y.max(1.0));

        self.view = view.to_cols_array_2d();
        self.proj = proj.to_cols_array_2d();
        // The view matrix is orthonormal, but the projection is not, so both
        // go through the general 4x4 inverse.
        self.inv_view = view.inverse().to_cols_array_2d();
        self.inv_proj = proj.inverse().to_cols_array_2d();
        self.screen_size = screen_size.into();
        self.time = time;
    }
}

impl Default for ViewUniforms {
    fn default() -> Self {
        Self::new()
    }
}

/// The camera the render passes bind: orbit state plus its uniform buffer.
pub struct OrbitCamera {
    pub state: CameraState,
    uniforms: ViewUniforms,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl OrbitCamera {
    pub fn new(wgpu_context: &WgpuContext) -> Self {
        let uniforms = ViewUniforms::new();

        let buffer = wgpu_context
            .get_device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Buffer"),
                contents: bytemuck::cast_slice(&[uniforms]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

        let bind_group_layout = wgpu_context.get_device().create_bind_group_layout(
            &wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("Camera Bind Group Layout"),
            },
        );

        let bind_group = wgpu_context
            .get_device()
            .create_bind_group(&wgpu::BindGroupDescriptor {
                layout: &bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
                label: Some("Camera Bind Group"),
            });

        Self {
            state: CameraState::new(),
            uniforms,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Recomputes all derived matrices and rewrites the uniform buffer.
    pub fn update(&mut self, wgpu_context: &WgpuContext, screen_size: Vec2, time: f32) {
        self.uniforms.update(&self.state, screen_size, time);
        wgpu_context.get_queue().write_buffer(
            &self.buffer,
            0,
            bytemuck::cast_slice(&[self.uniforms]),
        );
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniforms_match_shader_layout() {
        // 4 mat4x4 + vec2 + 2 scalars, 16-byte aligned for the uniform block.
        assert_eq!(std::mem::size_of::<ViewUniforms>(), 272);
        assert_eq!(std::mem::size_of::<ViewUniforms>() % 16, 0);
    }

    #[test]
    fn wheel_zoom_clamps_exactly() {
        let mut state = CameraState::new();
        state.apply_wheel(100_000.0);
        assert_eq!(state.distance, 15.0);
        state.apply_wheel(-100_000.0);
        assert_eq!(state.distance, 3.0);
    }

    #[test]
    fn drag_clamps_pitch() {
        let mut state = CameraState::new();
        state.apply_drag(0.0, 100_000.0);
        assert_eq!(state.phi, 1.4);
        state.apply_drag(0.0, -200_000.0);
        assert_eq!(state.phi, -1.4);
        // Theta is unbounded by design.
        state.apply_drag(10_000.0, 0.0);
        assert!(state.theta.is_finite());
    }

    #[test]
    fn matrix_inverses_round_trip() {
        let state = CameraState::new();
        let view = state.view_matrix();
        let proj = state.projection_matrix(16.0 / 9.0);

        let identity_from_view = view * view.inverse();
        let identity_from_proj = proj * proj.inverse();
        for (product, name) in [(identity_from_view, "view"), (identity_from_proj, "proj")] {
            let diff = (product - Mat4::IDENTITY)
                .to_cols_array()
                .iter()
                .fold(0.0f32, |acc, v| acc.max(v.abs()));
            assert!(diff < 1e-4, "{name} inverse off by {diff}");
        }
    }

    #[test]
    fn eye_respects_spherical_parameters() {
        let state = CameraState {
            distance: 6.0,
            theta: 0.0,
            phi: 0.0,
        };
        let eye = state.eye();
        assert!((eye - Vec3::new(0.0, 0.0, 6.0)).length() < 1e-5);
    }
}
