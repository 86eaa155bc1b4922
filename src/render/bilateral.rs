use wgpu::util::DeviceExt;

use crate::render::targets::{FluidTargets, DEPTH_CLEAR, DEPTH_FORMAT};
use crate::wgpu_context::WgpuContext;

/// How many (horizontal, vertical) iteration pairs the smoother runs per
/// frame: 10 one-dimensional passes in total.
pub const ITERATIONS: usize = 5;

/// Edge-preserving depth smoothing as a separable approximation of a 2D
/// bilateral filter: cheap, and good enough to melt per-particle
/// discretization without blurring across the fluid silhouette.
pub struct BilateralSmoother {
    pipeline: wgpu::RenderPipeline,
    horizontal: wgpu::BindGroup,
    vertical: wgpu::BindGroup,
}

impl BilateralSmoother {
    pub fn new(wgpu_context: &WgpuContext, targets: &FluidTargets) -> Self {
        let device = wgpu_context.get_device();

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bilateral Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        // One 1D kernel, steered by a direction uniform per pass.
        let direction_x = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Bilateral X Direction"),
            contents: bytemuck::cast_slice(&[1.0f32, 0.0]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let direction_y = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Bilateral Y Direction"),
            contents: bytemuck::cast_slice(&[0.0f32, 1.0]),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let make_bind_group = |view: &wgpu::TextureView, direction: &wgpu::Buffer, label| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: direction.as_entire_binding(),
                    },
                ],
            })
        };

        let horizontal =
            make_bind_group(&targets.depth_a.view, &direction_x, "Bilateral H Bind Group");
        let vertical =
            make_bind_group(&targets.depth_b.view, &direction_y, "Bilateral V Bind Group");

        let shader = device.create_shader_module(wgpu::include_wgsl!("bilateral.wgsl"));
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Bilateral Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Bilateral Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: DEPTH_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            horizontal,
            vertical,
        }
    }

    /// Runs the full smoothing schedule. Each iteration ping-pongs
    /// depth_a → depth_b → depth_a, so the smoothed result ends in `depth_a`
    /// and no texture is ever bound for read and write at once.
    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder, targets: &FluidTargets) {
        for _ in 0..ITERATIONS {
            self.encode_pass(encoder, &targets.depth_b.view, &self.horizontal);
            self.encode_pass(encoder, &targets.depth_a.view, &self.vertical);
        }
    }

    fn encode_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        output: &wgpu::TextureView,
        bind_group: &wgpu::BindGroup,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Bilateral Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: DEPTH_CLEAR,
                        g: 0.0,
                        b: 0.0,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, bind_group, &[]);
        render_pass.draw(0..6, 0..1);
    }
}
