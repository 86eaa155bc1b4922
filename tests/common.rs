// Not every test file will use every function.
#![allow(dead_code)]

use entropy_cafe::simulation::FluidSimulator;
use entropy_cafe::wgpu_context::WgpuContext;

// A struct to hold all the common objects for a test.
pub struct TestSetup {
    pub wgpu_context: WgpuContext,
}

/// Acquires a surfaceless GPU context, or `None` when the machine has no
/// usable adapter (headless CI), in which case the caller should skip.
pub fn setup() -> Option<TestSetup> {
    match pollster::block_on(WgpuContext::new_for_test()) {
        Ok(wgpu_context) => Some(TestSetup { wgpu_context }),
        Err(e) => {
            eprintln!("skipping GPU test: {e}");
            None
        }
    }
}

/// Runs `steps` integration steps with the given wall-clock frame delta, one
/// submission per step so every step sees its own uniforms.
pub fn step_simulation(
    wgpu_context: &WgpuContext,
    simulator: &mut FluidSimulator,
    steps: usize,
    frame_delta: f32,
) {
    for _ in 0..steps {
        let mut encoder =
            wgpu_context
                .get_device()
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Sim Step Encoder"),
                });
        simulator.encode(wgpu_context, &mut encoder, frame_delta);
        wgpu_context
            .get_queue()
            .submit(std::iter::once(encoder.finish()));
    }
}
