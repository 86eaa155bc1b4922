use wgpu_profiler::GpuProfiler;

use crate::camera::OrbitCamera;
use crate::render::bilateral::BilateralSmoother;
use crate::render::compositor::SurfaceCompositor;
use crate::render::container::ContainerRenderer;
use crate::render::depth_splat::DepthSplat;
use crate::render::targets::FluidTargets;
use crate::wgpu_context::WgpuContext;

/// Owns the offscreen targets and the four render stages, and encodes them in
/// their fixed order: splat → smooth → compose → glass. Every stage borrows
/// the same encoder, so the whole frame is one atomic submission.
pub struct FluidRenderer {
    targets: FluidTargets,
    depth_splat: DepthSplat,
    smoother: BilateralSmoother,
    compositor: SurfaceCompositor,
    container: ContainerRenderer,
}

impl FluidRenderer {
    pub fn new(
        wgpu_context: &WgpuContext,
        particle_buffer: &wgpu::Buffer,
        camera: &OrbitCamera,
    ) -> Self {
        let size = wgpu_context.get_surface_config();
        let (width, height) = (size.width.max(1), size.height.max(1));
        let surface_format = size.format;

        let targets = FluidTargets::new(wgpu_context, width, height);
        let depth_splat = DepthSplat::new(wgpu_context, particle_buffer, camera);
        let smoother = BilateralSmoother::new(wgpu_context, &targets);
        let compositor = SurfaceCompositor::new(wgpu_context, &targets, camera, surface_format);
        let container = ContainerRenderer::new(wgpu_context, camera, surface_format);

        Self {
            targets,
            depth_splat,
            smoother,
            compositor,
            container,
        }
    }

    pub fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        profiler: &mut GpuProfiler,
        surface_view: &wgpu::TextureView,
        camera: &OrbitCamera,
        num_particles: u32,
    ) {
        {
            let mut scope = profiler.scope("depth splat", encoder);
            self.depth_splat
                .encode(&mut scope, &self.targets, camera, num_particles);
        }
        {
            let mut scope = profiler.scope("bilateral smooth", encoder);
            self.smoother.encode(&mut scope, &self.targets);
        }
        {
            let mut scope = profiler.scope("compose", encoder);
            self.compositor.encode(&mut scope, surface_view, camera);
        }
        {
            let mut scope = profiler.scope("glass", encoder);
            self.container.encode(&mut scope, surface_view, camera);
        }
    }
}
