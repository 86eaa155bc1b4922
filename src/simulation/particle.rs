use glam::Vec3;
use rand::Rng;

/// Fixed particle populations. The buffer never grows or shrinks at runtime;
/// `reset()` rewrites it in place.
pub const NUM_COFFEE: usize = 40_000;
pub const NUM_CREAM: usize = 25_000;
pub const NUM_PARTICLES: usize = NUM_COFFEE + NUM_CREAM;

// Container and impostor dimensions, in world units.
pub const GLASS_RADIUS: f32 = 1.5;
pub const GLASS_HEIGHT: f32 = 4.0;
pub const PARTICLE_RADIUS: f32 = 0.04;

pub const GRAVITY: f32 = -2.0;

/// Continuous stirring strength, and the stronger burst used by a one-shot
/// stir pulse.
pub const BASE_STIR_STRENGTH: f32 = 5.0;
pub const PULSE_STIR_STRENGTH: f32 = 15.0;
pub const STIR_PULSE_SECONDS: f32 = 0.8;

/// Wall-clock frame deltas are clamped, then scaled down so the liquid moves
/// at the same calm pace regardless of display refresh rate.
pub const MAX_FRAME_DELTA: f32 = 0.05;
pub const DT_SCALE: f32 = 0.5;

pub const MAX_SPEED: f32 = 3.0;

// Rest heights the buoyancy spring pulls each kind toward.
pub const COFFEE_REST_Y: f32 = -1.0;
pub const CREAM_REST_Y: f32 = 1.0;

// Radial margins used when seeding each layer inside the glass.
const COFFEE_SEED_MARGIN: f32 = 0.2;
const CREAM_SEED_MARGIN: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleKind {
    Coffee,
    Cream,
}

impl ParticleKind {
    pub fn as_f32(self) -> f32 {
        match self {
            ParticleKind::Coffee => 0.0,
            ParticleKind::Cream => 1.0,
        }
    }

    pub fn from_f32(value: f32) -> Self {
        if value > 0.5 {
            ParticleKind::Cream
        } else {
            ParticleKind::Coffee
        }
    }
}

/// One fluid particle, packed as 8 floats (32 bytes) to match the layout the
/// simulate kernel and the splat pass read.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Particle {
    pub position: Vec3,
    pub kind: f32,
    pub velocity: Vec3,
    pub pad: f32,
}

impl Particle {
    pub fn new(position: Vec3, kind: ParticleKind) -> Self {
        Self::with_velocity(position, kind, Vec3::ZERO)
    }

    pub fn with_velocity(position: Vec3, kind: ParticleKind, velocity: Vec3) -> Self {
        Self {
            position,
            kind: kind.as_f32(),
            velocity,
            pad: 0.0,
        }
    }

    pub fn kind(&self) -> ParticleKind {
        ParticleKind::from_f32(self.kind)
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Distance from the container axis.
    pub fn radial_distance(&self) -> f32 {
        (self.position.x * self.position.x + self.position.z * self.position.z).sqrt()
    }
}

/// Per-frame simulation scalars, fully rewritten before every dispatch.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SimUniforms {
    pub glass_radius: f32,
    pub glass_height: f32,
    pub dt: f32,
    pub stir_strength: f32,
    pub stir_active: f32,
    pub gravity: f32,
    pub time: f32,
    pub num_particles: u32,
}

impl SimUniforms {
    pub fn new(num_particles: u32) -> Self {
        Self {
            glass_radius: GLASS_RADIUS,
            glass_height: GLASS_HEIGHT,
            dt: 0.0,
            stir_strength: BASE_STIR_STRENGTH,
            stir_active: 0.0,
            gravity: GRAVITY,
            time: 0.0,
            num_particles,
        }
    }
}

/// CPU mirror of the ambient-wave phase hash in `simulate.wgsl`.
///
/// Deliberately a hash of the particle index rather than a seeded PRNG, so the
/// per-particle phase is reproducible across frames and across runs.
pub fn hash01(index: u32) -> f32 {
    let mut x = index;
    x = (x ^ 61) ^ (x >> 16);
    x = x.wrapping_mul(9);
    x ^= x >> 4;
    x = x.wrapping_mul(0x27d4_eb2d);
    x ^= x >> 15;
    x as f32 / u32::MAX as f32
}

/// The two-layer resting configuration: coffee settled in a band near the
/// bottom, cream floating in a band near the top, each sampled uniformly over
/// the disc (square root of the area fraction, so density is even in radius).
pub fn resting_layout() -> Vec<Particle> {
    let mut rng = rand::rng();
    let mut particles = Vec::with_capacity(NUM_PARTICLES);

    let coffee_bottom = -GLASS_HEIGHT / 2.0 + 0.1;
    for _ in 0..NUM_COFFEE {
        let position = disc_sample(
            &mut rng,
            GLASS_RADIUS - COFFEE_SEED_MARGIN,
            coffee_bottom,
            coffee_bottom + GLASS_HEIGHT * 0.5,
        );
        particles.push(Particle::new(position, ParticleKind::Coffee));
    }

    let cream_bottom = GLASS_HEIGHT * 0.1;
    for _ in 0..NUM_CREAM {
        let position = disc_sample(
            &mut rng,
            GLASS_RADIUS - CREAM_SEED_MARGIN,
            cream_bottom,
            cream_bottom + GLASS_HEIGHT * 0.35,
        );
        particles.push(Particle::new(position, ParticleKind::Cream));
    }

    particles
}

fn disc_sample(rng: &mut impl Rng, max_radius: f32, min_y: f32, max_y: f32) -> Vec3 {
    let angle = rng.random_range(0.0..std::f32::consts::TAU);
    let radius = max_radius * rng.random::<f32>().sqrt();
    let y = rng.random_range(min_y..max_y);
    Vec3::new(angle.cos() * radius, y, angle.sin() * radius)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn particle_matches_gpu_layout() {
        assert_eq!(std::mem::size_of::<Particle>(), 32);
        assert_eq!(std::mem::size_of::<SimUniforms>(), 32);
    }

    #[test]
    fn resting_layout_has_exact_populations() {
        let particles = resting_layout();
        assert_eq!(particles.len(), NUM_PARTICLES);

        let coffee = particles
            .iter()
            .filter(|p| p.kind() == ParticleKind::Coffee)
            .count();
        let cream = particles
            .iter()
            .filter(|p| p.kind() == ParticleKind::Cream)
            .count();
        assert_eq!(coffee, NUM_COFFEE);
        assert_eq!(cream, NUM_CREAM);
    }

    #[test]
    fn resting_layout_stays_inside_the_glass() {
        for particle in resting_layout() {
            assert!(particle.radial_distance() <= GLASS_RADIUS);
            assert!(particle.position.y.abs() <= GLASS_HEIGHT / 2.0);
            assert_eq!(particle.speed(), 0.0);
        }
    }

    #[test]
    fn repeated_layouts_keep_layer_means_in_band() {
        // The sampling is randomized, so positions differ between resets, but
        // the per-kind mean heights must land inside the seeded bands.
        for _ in 0..3 {
            let particles = resting_layout();

            let mean_height = |kind: ParticleKind| {
                let (sum, count) = particles
                    .iter()
                    .filter(|p| p.kind() == kind)
                    .fold((0.0f64, 0usize), |(s, c), p| {
                        (s + f64::from(p.position.y), c + 1)
                    });
                (sum / count as f64) as f32
            };

            let coffee_mean = mean_height(ParticleKind::Coffee);
            assert!((-1.9..=0.1).contains(&coffee_mean), "coffee mean {coffee_mean}");

            let cream_mean = mean_height(ParticleKind::Cream);
            assert!((0.4..=1.8).contains(&cream_mean), "cream mean {cream_mean}");
        }
    }

    #[test]
    fn phase_hash_is_deterministic_and_normalized() {
        for i in 0..10_000u32 {
            let a = hash01(i);
            let b = hash01(i);
            assert_eq!(a, b);
            assert!((0.0..=1.0).contains(&a));
        }
        // Neighbouring indices should not collapse onto each other.
        let distinct: std::collections::HashSet<u32> =
            (0..1_000u32).map(|i| hash01(i).to_bits()).collect();
        assert!(distinct.len() > 990);
    }
}
