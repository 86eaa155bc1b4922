use std::time::{Duration, Instant};

use wgpu::util::DeviceExt;
use wgpu::{BindGroup, BindGroupLayout};

use crate::simulation::particle::{
    resting_layout, Particle, SimUniforms, BASE_STIR_STRENGTH, DT_SCALE, MAX_FRAME_DELTA,
    PULSE_STIR_STRENGTH, STIR_PULSE_SECONDS,
};
use crate::utils::bind_resources::BindResources;
use crate::utils::compute_shader::ComputeShader;
use crate::utils::gpu_buffer::GpuBuffer;
use crate::wgpu_context::WgpuContext;

const WORKGROUP_SIZE: (u32, u32, u32) = (64, 1, 1);

/// Integrates the particle buffer in place with one compute dispatch per
/// frame. The buffer is written only here and read only by the depth splat
/// pass afterwards; pass order inside the frame encoder is the only
/// synchronization.
pub struct FluidSimulator {
    particles: GpuBuffer<Particle>,
    uniform_buffer: wgpu::Buffer,
    simulate_pass: ComputeShader,
    bind_resources: BindResources,
    uniforms: SimUniforms,
    stirring: bool,
    stir_pulse_until: Option<Instant>,
}

impl FluidSimulator {
    pub fn new(wgpu_context: &WgpuContext) -> Self {
        Self::with_particles(wgpu_context, resting_layout())
    }

    /// Builds a simulator around an explicit particle set. The frame path uses
    /// `new`; tests use this to control the initial layout.
    pub fn with_particles(wgpu_context: &WgpuContext, particles: Vec<Particle>) -> Self {
        let uniforms = SimUniforms::new(particles.len() as u32);
        let particles = GpuBuffer::new(wgpu_context, particles, wgpu::BufferUsages::STORAGE);

        let uniform_buffer =
            wgpu_context
                .get_device()
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Sim Uniform Buffer"),
                    contents: bytemuck::bytes_of(&uniforms),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });

        let bind_group_layout = Self::create_bind_group_layout(wgpu_context);
        let bind_group =
            Self::create_bind_group(wgpu_context, &bind_group_layout, &particles, &uniform_buffer);
        let bind_resources = BindResources::new(bind_group_layout, bind_group);

        let simulate_pass = ComputeShader::new(
            wgpu_context,
            wgpu::include_wgsl!("simulate.wgsl"),
            "simulate",
            &bind_resources.bind_group_layout,
            WORKGROUP_SIZE,
        );

        Self {
            particles,
            uniform_buffer,
            simulate_pass,
            bind_resources,
            uniforms,
            stirring: false,
            stir_pulse_until: None,
        }
    }

    fn create_bind_group_layout(wgpu_context: &WgpuContext) -> BindGroupLayout {
        wgpu_context
            .get_device()
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Simulate Bind Group Layout"),
                entries: &[
                    // Binding 0: the particle buffer, integrated in place
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: false },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    // Binding 1: per-frame simulation scalars
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            })
    }

    fn create_bind_group(
        wgpu_context: &WgpuContext,
        layout: &BindGroupLayout,
        particles: &GpuBuffer<Particle>,
        uniform_buffer: &wgpu::Buffer,
    ) -> BindGroup {
        wgpu_context
            .get_device()
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Simulate Bind Group"),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: particles.buffer().as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                ],
            })
    }

    /// Rewrites the whole buffer back to the two-layer resting configuration
    /// and zeroes the elapsed simulation time.
    pub fn reset(&mut self, wgpu_context: &WgpuContext) {
        self.uniforms.time = 0.0;
        self.stir_pulse_until = None;
        self.particles.upload_all(wgpu_context, resting_layout());
    }

    /// One-shot stir burst: stirring is forced on at pulse strength and
    /// auto-clears after the pulse duration, independent of the continuous
    /// toggle.
    pub fn stir(&mut self) {
        self.stir_pulse_until = Some(Instant::now() + Duration::from_secs_f32(STIR_PULSE_SECONDS));
    }

    /// Continuous stirring toggle, read every frame.
    pub fn set_stirring(&mut self, active: bool) {
        self.stirring = active;
    }

    pub fn is_stirring(&self) -> bool {
        self.stirring
    }

    fn stir_state(&mut self) -> (bool, f32) {
        if let Some(until) = self.stir_pulse_until {
            if Instant::now() < until {
                return (true, PULSE_STIR_STRENGTH);
            }
            self.stir_pulse_until = None;
        }
        (self.stirring, BASE_STIR_STRENGTH)
    }

    /// Encodes one integration step for the given wall-clock frame delta.
    ///
    /// The uniform write lands when the queue is flushed, so encode at most
    /// one step per submission.
    pub fn encode(
        &mut self,
        wgpu_context: &WgpuContext,
        encoder: &mut wgpu::CommandEncoder,
        frame_delta: f32,
    ) {
        let dt = frame_delta.min(MAX_FRAME_DELTA) * DT_SCALE;
        self.uniforms.time += dt;
        self.uniforms.dt = dt;

        let (stir_active, stir_strength) = self.stir_state();
        self.uniforms.stir_active = if stir_active { 1.0 } else { 0.0 };
        self.uniforms.stir_strength = stir_strength;

        wgpu_context.get_queue().write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&self.uniforms),
        );

        self.simulate_pass.dispatch_by_items(
            encoder,
            (self.uniforms.num_particles, 1, 1),
            &self.bind_resources.bind_group,
        );
    }

    /// Elapsed simulation time since the last reset.
    pub fn time(&self) -> f32 {
        self.uniforms.time
    }

    pub fn num_particles(&self) -> u32 {
        self.uniforms.num_particles
    }

    pub fn particle_buffer(&self) -> &wgpu::Buffer {
        self.particles.buffer()
    }

    /// Blocking readback of the particle buffer, for tests and diagnostics.
    pub fn download_particles(
        &mut self,
        wgpu_context: &WgpuContext,
    ) -> anyhow::Result<&Vec<Particle>> {
        self.particles.download(wgpu_context)
    }
}
