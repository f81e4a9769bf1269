//! Particle population and per-frame stepping.

use flow_common::Bounds;
use rand::Rng;
use renderer::{Canvas, Segment, WindIntensityScale};
use vector_field::{Field, FieldSample};

use crate::AnimatorConfig;

/// An animated tracer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub age: u32,
    /// Where the particle moves on the next draw, when its path is visible.
    pub target: Option<(f64, f64)>,
}

/// The particles of one animation run, bucketed by intensity style each frame.
#[derive(Debug)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    /// Indices into `particles`, one bucket per intensity style.
    buckets: Vec<Vec<usize>>,
    styles: WindIntensityScale,
    bounds: Bounds,
    max_age: u32,
    fade_alpha: f32,
    line_width: f32,
    segments: Vec<Segment>,
}

impl ParticleSystem {
    /// Place `count` particles at random points of `field` with random ages.
    pub fn new<R: Rng>(
        field: &Field,
        bounds: Bounds,
        styles: WindIntensityScale,
        count: usize,
        config: &AnimatorConfig,
        rng: &mut R,
    ) -> Self {
        let max_age = config.max_particle_age;
        let particles = (0..count)
            .map(|_| {
                let (x, y) = field.randomize(rng);
                Particle {
                    x,
                    y,
                    age: rng.gen_range(0..=max_age),
                    target: None,
                }
            })
            .collect();
        Self {
            particles,
            buckets: vec![Vec::new(); styles.len()],
            styles,
            bounds,
            max_age,
            fade_alpha: config.fade_alpha,
            line_width: config.line_width,
            segments: Vec::new(),
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Number of particles queued for drawing in each style.
    pub fn bucket_sizes(&self) -> Vec<usize> {
        self.buckets.iter().map(Vec::len).collect()
    }

    /// Advance every particle one step through `field`.
    ///
    /// Old particles are respawned. A particle on an undefined sample is aged out so it
    /// respawns next frame. A particle whose next position is defined gets a target and
    /// is queued for drawing; otherwise it jumps there without a trail.
    pub fn evolve<R: Rng>(&mut self, field: &Field, rng: &mut R) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }

        for (i, particle) in self.particles.iter_mut().enumerate() {
            particle.target = None;
            if particle.age > self.max_age {
                let (x, y) = field.randomize(rng);
                particle.x = x;
                particle.y = y;
                particle.age = 0;
            }

            match field.sample(particle.x, particle.y) {
                FieldSample::Vector(wind) => {
                    let xt = particle.x + wind.u;
                    let yt = particle.y + wind.v;
                    if field.is_defined(xt, yt) {
                        particle.target = Some((xt, yt));
                        self.buckets[self.styles.index_for(wind.magnitude)].push(i);
                    } else {
                        particle.x = xt;
                        particle.y = yt;
                    }
                }
                FieldSample::Hole | FieldSample::Missing => particle.age = self.max_age,
            }
            particle.age += 1;
        }
    }

    /// Fade old trails, then stroke each bucket's segments and move those particles
    /// to their targets.
    pub fn draw(&mut self, canvas: &mut Canvas) {
        canvas.fade(&self.bounds, self.fade_alpha);

        for (style, bucket) in self.styles.styles().iter().zip(&self.buckets) {
            if bucket.is_empty() {
                continue;
            }
            self.segments.clear();
            for &i in bucket {
                let particle = &mut self.particles[i];
                if let Some((xt, yt)) = particle.target.take() {
                    self.segments.push((particle.x, particle.y, xt, yt));
                    particle.x = xt;
                    particle.y = yt;
                }
            }
            canvas.stroke_segments(*style, self.line_width, &self.segments);
        }
    }
}
