pub mod particle;
pub mod simulator;

pub use particle::{
    hash01, resting_layout, Particle, ParticleKind, SimUniforms, GLASS_HEIGHT, GLASS_RADIUS,
    MAX_SPEED, NUM_COFFEE, NUM_CREAM, NUM_PARTICLES, PARTICLE_RADIUS,
};
pub use simulator::FluidSimulator;
