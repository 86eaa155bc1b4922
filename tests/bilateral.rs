use entropy_cafe::render::targets::FluidTargets;
use entropy_cafe::render::BilateralSmoother;
use entropy_cafe::simulation::hash01;
use entropy_cafe::wgpu_context::WgpuContext;

mod common;

const SIZE: u32 = 64;
const STEP_COLUMN: u32 = 32;
const NEAR_DEPTH: f32 = 5.0;
const FAR_DEPTH: f32 = 9.0;
const SENTINEL_VALUE: f32 = 10000.0;

/// Synthetic depth buffer: two flat but noisy regions with a sharp step
/// between them, plus two rows of sentinel "background" texels at the top.
fn synthetic_depth() -> Vec<f32> {
    let mut depth = vec![0.0f32; (SIZE * SIZE) as usize];
    for y in 0..SIZE {
        for x in 0..SIZE {
            let value = if y < 2 {
                SENTINEL_VALUE
            } else {
                let base = if x < STEP_COLUMN { NEAR_DEPTH } else { FAR_DEPTH };
                base + (hash01(x * 73 + y * 131) - 0.5) * 0.1
            };
            depth[(y * SIZE + x) as usize] = value;
        }
    }
    depth
}

fn upload_depth(wgpu_context: &WgpuContext, targets: &FluidTargets, depth: &[f32]) {
    wgpu_context.get_queue().write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &targets.depth_a.texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        bytemuck::cast_slice(depth),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(SIZE * 4),
            rows_per_image: Some(SIZE),
        },
        wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
    );
}

fn read_back_depth(wgpu_context: &WgpuContext, targets: &FluidTargets) -> Vec<f32> {
    let device = wgpu_context.get_device();
    let queue = wgpu_context.get_queue();

    let readback = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Depth Readback Buffer"),
        size: u64::from(SIZE * SIZE * 4),
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Depth Readback Encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: &targets.depth_a.texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &readback,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                // 64 texels * 4 bytes matches the 256-byte row alignment.
                bytes_per_row: Some(SIZE * 4),
                rows_per_image: Some(SIZE),
            },
        },
        wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = readback.slice(..);
    let (sender, receiver) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    device.poll(wgpu::PollType::Wait).unwrap();
    receiver.recv().unwrap().unwrap();

    let data = bytemuck::cast_slice::<u8, f32>(&slice.get_mapped_range()).to_vec();
    readback.unmap();
    data
}

fn variance(samples: &[f32]) -> f32 {
    let mean = samples.iter().sum::<f32>() / samples.len() as f32;
    samples.iter().map(|s| (s - mean) * (s - mean)).sum::<f32>() / samples.len() as f32
}

fn region(depth: &[f32], x_range: std::ops::Range<u32>, y_range: std::ops::Range<u32>) -> Vec<f32> {
    let mut samples = Vec::new();
    for y in y_range {
        for x in x_range.clone() {
            samples.push(depth[(y * SIZE + x) as usize]);
        }
    }
    samples
}

#[test]
fn smoothing_reduces_noise_but_preserves_the_step() {
    let Some(setup) = common::setup() else { return };
    let wgpu_context = &setup.wgpu_context;

    let targets = FluidTargets::new(wgpu_context, SIZE, SIZE);
    let smoother = BilateralSmoother::new(wgpu_context, &targets);

    let input = synthetic_depth();
    upload_depth(wgpu_context, &targets, &input);

    let mut encoder = wgpu_context
        .get_device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Bilateral Test Encoder"),
        });
    smoother.encode(&mut encoder, &targets);
    wgpu_context
        .get_queue()
        .submit(std::iter::once(encoder.finish()));

    let output = read_back_depth(wgpu_context, &targets);

    // Noise in the flat interior collapses.
    let interior_before = variance(&region(&input, 4..24, 4..60));
    let interior_after = variance(&region(&output, 4..24, 4..60));
    assert!(
        interior_after < interior_before * 0.5,
        "variance {interior_before} -> {interior_after}"
    );

    // Texels flanking the discontinuity stay where they were: the range
    // weight keeps the two sides from bleeding into each other.
    for y in 4..60 {
        for x in [STEP_COLUMN - 1, STEP_COLUMN] {
            let index = (y * SIZE + x) as usize;
            let drift = (output[index] - input[index]).abs();
            assert!(
                drift < 0.15,
                "edge texel ({x}, {y}) drifted by {drift}"
            );
        }
    }

    // Sentinel texels pass through untouched.
    for x in 0..SIZE {
        assert_eq!(output[x as usize], SENTINEL_VALUE);
        assert_eq!(output[(SIZE + x) as usize], SENTINEL_VALUE);
    }
}
