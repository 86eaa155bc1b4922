use crate::wgpu_context::WgpuContext;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;
pub const KIND_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R8Unorm;
pub const DEPTH_STENCIL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Linear-depth texels at or above this value (or at/below zero) mean "no
/// fluid here". The splat pass clears to `DEPTH_CLEAR`; the smoother and the
/// compositor treat sentinel texels as background.
pub const DEPTH_SENTINEL: f32 = 1000.0;
pub const DEPTH_CLEAR: f64 = 10000.0;

/// An offscreen texture together with its render/bind view.
pub struct RenderTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl RenderTarget {
    fn new(
        wgpu_context: &WgpuContext,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> Self {
        let texture = wgpu_context
            .get_device()
            .create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage,
                view_formats: &[],
            });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

/// All offscreen textures the fluid pipeline renders through.
///
/// Created exactly once at initialization from the initial surface size and
/// owned for the subsystem's whole lifetime. There is deliberately no
/// resize/recreation path mid-life.
pub struct FluidTargets {
    /// Ping-pong pair of linear-depth targets. The splat pass writes `depth_a`;
    /// each smoothing iteration goes a → b (horizontal) then b → a (vertical),
    /// so the smoothed result the compositor reads is always `depth_a`.
    pub depth_a: RenderTarget,
    pub depth_b: RenderTarget,
    /// Coffee/cream mix factor per pixel, written alongside the depth splat.
    pub kind: RenderTarget,
    /// Hardware depth buffer used only for impostor occlusion ordering.
    pub depth_stencil: RenderTarget,
    pub width: u32,
    pub height: u32,
}

impl FluidTargets {
    pub fn new(wgpu_context: &WgpuContext, width: u32, height: u32) -> Self {
        // depth_a also carries copy usages so tests and diagnostics can feed
        // and read it back.
        let sampled = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;
        Self {
            depth_a: RenderTarget::new(
                wgpu_context,
                "depth map texture",
                width,
                height,
                DEPTH_FORMAT,
                sampled | wgpu::TextureUsages::COPY_DST | wgpu::TextureUsages::COPY_SRC,
            ),
            depth_b: RenderTarget::new(
                wgpu_context,
                "depth scratch texture",
                width,
                height,
                DEPTH_FORMAT,
                sampled,
            ),
            kind: RenderTarget::new(
                wgpu_context,
                "kind map texture",
                width,
                height,
                KIND_FORMAT,
                sampled,
            ),
            depth_stencil: RenderTarget::new(
                wgpu_context,
                "impostor depth-stencil texture",
                width,
                height,
                DEPTH_STENCIL_FORMAT,
                wgpu::TextureUsages::RENDER_ATTACHMENT,
            ),
            width,
            height,
        }
    }
}
