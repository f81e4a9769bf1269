//! Configuration for the particle animator.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Particle population, trail styling and frame timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnimatorConfig {
    /// Particles per pixel of globe width.
    pub particle_multiplier: f64,

    /// Population factor on the mobile profile.
    pub particle_reduction: f64,

    /// Use the reduced mobile population.
    pub mobile: bool,

    /// Frames a particle lives before it is respawned.
    pub max_particle_age: u32,

    /// Gray level step between intensity styles.
    pub intensity_scale_step: u16,

    /// Alpha kept by existing trails each frame.
    pub fade_alpha: f32,

    /// Trail line width in pixels.
    pub line_width: f32,

    /// Delay between frames.
    pub frame_interval_ms: u64,

    /// Stop after this many frames. Runs until cancelled when absent.
    pub max_frames: Option<u64>,

    /// Seed for particle placement. Random when absent.
    pub seed: Option<u64>,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            particle_multiplier: 7.0,
            particle_reduction: 0.75,
            mobile: false,
            max_particle_age: 100,
            intensity_scale_step: 10,
            fade_alpha: 0.97,
            line_width: 1.0,
            frame_interval_ms: 40,
            max_frames: None,
            seed: None,
        }
    }
}

impl AnimatorConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Population for a globe `width` pixels wide.
    pub fn particle_count(&self, width: usize) -> usize {
        let count = (width as f64 * self.particle_multiplier).round();
        if self.mobile {
            (count * self.particle_reduction).ceil() as usize
        } else {
            count as usize
        }
    }
}
