//! Particle animation.
//!
//! Particles are dropped at random defined points of a [`Field`](vector_field::Field)
//! and advected by its vectors, one step per frame. Each frame fades the previous
//! trails and strokes the new segments, grouped by speed into gray intensity styles.

pub mod animate;
pub mod config;
pub mod particles;

pub use animate::{animate, FrameSink, NoFrames};
pub use config::AnimatorConfig;
pub use particles::{Particle, ParticleSystem};
