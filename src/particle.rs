use glam::Vec2;
use rand::Rng;

use crate::config::FieldConfig;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
}

impl Particle {
    /// Moves by one frame of velocity, then flips the velocity on every axis
    /// that ended up out of `bounds`.
    ///
    /// The position is not clamped, so a particle can be drawn up to one
    /// frame outside the bounds before it heads back in.
    pub fn advance(&mut self, bounds: Vec2) {
        self.position += self.velocity;

        if self.position.x > bounds.x || self.position.x < 0.0 {
            self.velocity.x = -self.velocity.x;
        }
        if self.position.y > bounds.y || self.position.y < 0.0 {
            self.velocity.y = -self.velocity.y;
        }
    }
}

pub fn generate_particles<R: Rng>(rng: &mut R, bounds: Vec2, config: &FieldConfig) -> Vec<Particle> {
    (0..config.particle_count)
        .map(|_| Particle {
            // `gen::<f32>()` is in [0, 1), which keeps a zero sized axis valid
            position: Vec2::new(rng.gen::<f32>() * bounds.x, rng.gen::<f32>() * bounds.y),
            velocity: Vec2::new(
                rng.gen_range(-config.max_speed..=config.max_speed),
                rng.gen_range(-config.max_speed..=config.max_speed),
            ),
            radius: rng.gen_range(config.min_radius..=config.max_radius),
        })
        .collect()
}
