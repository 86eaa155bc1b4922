use glam::Vec3;

use entropy_cafe::simulation::{
    resting_layout, FluidSimulator, Particle, ParticleKind, GLASS_HEIGHT, GLASS_RADIUS, MAX_SPEED,
    NUM_COFFEE, NUM_CREAM, NUM_PARTICLES,
};

mod common;

const FRAME_DELTA: f32 = 0.016;

#[test]
fn reset_restores_the_two_layer_configuration() {
    let Some(setup) = common::setup() else { return };
    let wgpu_context = &setup.wgpu_context;

    let mut simulator = FluidSimulator::new(wgpu_context);
    simulator.set_stirring(true);
    common::step_simulation(wgpu_context, &mut simulator, 120, FRAME_DELTA);

    simulator.reset(wgpu_context);
    assert_eq!(simulator.time(), 0.0);

    let particles = simulator.download_particles(wgpu_context).unwrap();
    assert_eq!(particles.len(), NUM_PARTICLES);

    let coffee = particles
        .iter()
        .filter(|p| p.kind() == ParticleKind::Coffee)
        .count();
    assert_eq!(coffee, NUM_COFFEE);
    assert_eq!(particles.len() - coffee, NUM_CREAM);

    for particle in particles {
        assert_eq!(particle.speed(), 0.0);
        assert!(particle.radial_distance() <= GLASS_RADIUS);
    }
}

#[test]
fn speed_and_radius_stay_bounded_under_stirring() {
    let Some(setup) = common::setup() else { return };
    let wgpu_context = &setup.wgpu_context;

    // Hot start: every particle begins well above the speed clamp, spread
    // through the glass.
    let mut particles = Vec::new();
    for i in 0..512u32 {
        let angle = i as f32 * 0.7;
        let radius = (i % 14) as f32 / 14.0 * (GLASS_RADIUS - 0.1);
        let y = ((i % 23) as f32 / 23.0 - 0.5) * (GLASS_HEIGHT - 0.2);
        let kind = if i % 2 == 0 {
            ParticleKind::Coffee
        } else {
            ParticleKind::Cream
        };
        particles.push(Particle::with_velocity(
            Vec3::new(angle.cos() * radius, y, angle.sin() * radius),
            kind,
            Vec3::new(8.0, -6.0, 7.0),
        ));
    }

    let mut simulator = FluidSimulator::with_particles(wgpu_context, particles);
    simulator.set_stirring(true);
    common::step_simulation(wgpu_context, &mut simulator, 150, FRAME_DELTA);

    for particle in simulator.download_particles(wgpu_context).unwrap() {
        assert!(
            particle.speed() <= MAX_SPEED + 1e-3,
            "speed {} exceeds clamp",
            particle.speed()
        );
        assert!(
            particle.radial_distance() <= GLASS_RADIUS + 1e-3,
            "radius {} escaped the glass",
            particle.radial_distance()
        );
        assert!(particle.position.y.abs() <= GLASS_HEIGHT / 2.0 + 1e-3);
    }
}

#[test]
fn mid_plane_particles_migrate_toward_their_rest_bands() {
    let Some(setup) = common::setup() else { return };
    let wgpu_context = &setup.wgpu_context;

    // One particle of each kind at the vertical mid-plane, at rest, stirring
    // off. Buoyancy alone should carry each monotonically toward its band.
    let particles = vec![
        Particle::new(Vec3::new(0.3, 0.0, 0.0), ParticleKind::Cream),
        Particle::new(Vec3::new(-0.3, 0.0, 0.0), ParticleKind::Coffee),
    ];
    let mut simulator = FluidSimulator::with_particles(wgpu_context, particles);

    let mut cream_heights = vec![0.0f32];
    let mut coffee_heights = vec![0.0f32];
    for _ in 0..12 {
        common::step_simulation(wgpu_context, &mut simulator, 50, FRAME_DELTA);
        let particles = simulator.download_particles(wgpu_context).unwrap();
        cream_heights.push(particles[0].position.y);
        coffee_heights.push(particles[1].position.y);
    }

    for pair in cream_heights.windows(2) {
        assert!(pair[1] >= pair[0] - 1e-4, "cream fell back: {pair:?}");
    }
    for pair in coffee_heights.windows(2) {
        assert!(pair[1] <= pair[0] + 1e-4, "coffee rose back: {pair:?}");
    }

    assert!(
        *cream_heights.last().unwrap() > 0.15,
        "cream barely moved: {cream_heights:?}"
    );
    assert!(
        *coffee_heights.last().unwrap() < -0.15,
        "coffee barely moved: {coffee_heights:?}"
    );
}

/// Variance of the kind value across the particles inside a horizontal slab.
/// A fully unmixed slab (single kind) scores 0.
fn slab_kind_variance(particles: &[Particle], min_y: f32, max_y: f32) -> f32 {
    let kinds: Vec<f32> = particles
        .iter()
        .filter(|p| p.position.y >= min_y && p.position.y <= max_y)
        .map(|p| p.kind)
        .collect();
    if kinds.is_empty() {
        return 0.0;
    }
    let mean = kinds.iter().sum::<f32>() / kinds.len() as f32;
    kinds.iter().map(|k| (k - mean) * (k - mean)).sum::<f32>() / kinds.len() as f32
}

#[test]
fn stirring_mixes_where_resting_does_not() {
    let Some(setup) = common::setup() else { return };
    let wgpu_context = &setup.wgpu_context;

    // Identical initial layouts; only the stirring flag differs.
    let layout = resting_layout();
    let mut stirred = FluidSimulator::with_particles(wgpu_context, layout.clone());
    let mut resting = FluidSimulator::with_particles(wgpu_context, layout);
    stirred.set_stirring(true);

    const STEPS: usize = 1_400;
    common::step_simulation(wgpu_context, &mut stirred, STEPS, FRAME_DELTA);
    common::step_simulation(wgpu_context, &mut resting, STEPS, FRAME_DELTA);

    // This slab starts as pure coffee; only real vertical transport can put
    // cream into it.
    let stirred_variance =
        slab_kind_variance(stirred.download_particles(wgpu_context).unwrap(), -1.0, -0.3);
    let resting_variance =
        slab_kind_variance(resting.download_particles(wgpu_context).unwrap(), -1.0, -0.3);

    assert!(
        stirred_variance > resting_variance + 0.005,
        "stirred {stirred_variance} vs resting {resting_variance}"
    );
}
