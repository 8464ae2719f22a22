use glam::Vec2;
use log::{info, warn};
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    config::FieldConfig,
    particle::{generate_particles, Particle},
    surface::{DisplaySurface, SurfaceError},
};

/// Decides when the next frame runs.
pub trait FrameClock {
    /// Waits for the next frame, returns `false` once the host is done
    fn next_frame(&mut self) -> bool;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub particles: usize,
    pub links: usize,
    pub pointer_links: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub links: u64,
    pub pointer_links: u64,
}

pub struct ParticleField<S> {
    surface: S,
    config: FieldConfig,
    rng: StdRng,

    particles: Vec<Particle>,
    bounds: Vec2,
    pointer: Option<Vec2>,
}

impl<S: DisplaySurface> ParticleField<S> {
    /// Builds and initializes a field on `surface`.
    ///
    /// Without a surface there is nothing to draw on and the field is never
    /// created.
    pub fn attach(surface: Option<S>, config: FieldConfig, seed: Option<u64>) -> Option<Self> {
        let Some(surface) = surface else {
            warn!("No display surface available, constellation disabled");
            return None;
        };

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut field = Self {
            surface,
            config,
            rng,

            particles: Vec::new(),
            bounds: Vec2::ZERO,
            pointer: None,
        };
        if let Err(err) = field.init() {
            warn!("Display surface can't be drawn on, constellation disabled: {err}");
            return None;
        }

        Some(field)
    }

    /// Resizes the surface to the host's viewport, replaces the whole
    /// population and redraws it in place, so nothing of the previous
    /// population stays on the surface.
    pub fn init(&mut self) -> Result<(), SurfaceError> {
        let size = self.surface.viewport_size();
        self.surface.resize(size);
        self.bounds = size;

        self.particles = generate_particles(&mut self.rng, size, &self.config);

        info!(
            "Constellation initialized: {{ particles: {}, width: {}, height: {} }}",
            self.particles.len(),
            size.x,
            size.y
        );

        self.draw()?;
        Ok(())
    }

    pub fn animate(&mut self) -> Result<FrameStats, SurfaceError> {
        for particle in &mut self.particles {
            particle.advance(self.bounds);
        }

        self.draw()
    }

    /// Redraws the current positions without moving anything
    pub fn draw(&mut self) -> Result<FrameStats, SurfaceError> {
        let mut stats = FrameStats::default();
        self.surface.clear()?;

        for particle in &self.particles {
            self.surface.fill_circle(
                particle.position,
                particle.radius,
                self.config.particle_color,
            )?;
            stats.particles += 1;
        }

        for (i, a) in self.particles.iter().enumerate() {
            for b in &self.particles[i + 1..] {
                let distance = a.position.distance(b.position);
                if distance < self.config.link_distance {
                    let opacity = 1.0 - distance / self.config.link_distance;
                    self.surface.stroke_line(
                        a.position,
                        b.position,
                        self.config.edge_color.with_alpha(opacity),
                    )?;
                    stats.links += 1;
                }
            }

            if let Some(pointer) = self.pointer {
                let distance = a.position.distance(pointer);
                if distance < self.config.pointer_distance {
                    let opacity = 1.0 - distance / self.config.pointer_distance;
                    self.surface.stroke_line(
                        a.position,
                        pointer,
                        self.config.edge_color.with_alpha(opacity),
                    )?;
                    stats.pointer_links += 1;
                }
            }
        }

        Ok(stats)
    }

    /// Animates once per frame of `clock` until it stops or the surface fails
    pub fn run<C: FrameClock>(&mut self, clock: &mut C) -> Result<RunSummary, SurfaceError> {
        let mut summary = RunSummary::default();

        while clock.next_frame() {
            let stats = self.animate()?;
            summary.frames += 1;
            summary.links += stats.links as u64;
            summary.pointer_links += stats.pointer_links as u64;
        }

        Ok(summary)
    }

    pub fn set_pointer(&mut self, pointer: Option<Vec2>) {
        self.pointer = pointer;
    }

    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    #[cfg(test)]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    #[cfg(test)]
    fn particles_mut(&mut self) -> &mut Vec<Particle> {
        &mut self.particles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{Canvas, DrawCommand};

    const EPSILON: f32 = 1e-5;

    /// Hands out a fixed number of frames
    struct ManualFrames(u32);

    impl FrameClock for ManualFrames {
        fn next_frame(&mut self) -> bool {
            if self.0 == 0 {
                return false;
            }

            self.0 -= 1;
            true
        }
    }

    fn field(width: f32, height: f32, seed: u64) -> ParticleField<Canvas> {
        ParticleField::attach(
            Some(Canvas::new(Vec2::new(width, height))),
            FieldConfig::default(),
            Some(seed),
        )
        .unwrap()
    }

    fn still(x: f32, y: f32) -> Particle {
        Particle {
            position: Vec2::new(x, y),
            velocity: Vec2::ZERO,
            radius: 1.5,
        }
    }

    fn line_alphas(canvas: &Canvas) -> Vec<(Vec2, Vec2, f32)> {
        canvas
            .lines()
            .map(|c| match *c {
                DrawCommand::Line { from, to, color } => (from, to, color.a),
                _ => unreachable!(),
            })
            .collect()
    }

    #[test]
    fn attach_without_surface_is_a_no_op() {
        let field = ParticleField::<Canvas>::attach(None, FieldConfig::default(), Some(1));
        assert!(field.is_none());
    }

    #[test]
    fn attach_initializes_to_viewport() {
        let field = field(800.0, 600.0, 3);

        assert_eq!(field.surface().size(), Vec2::new(800.0, 600.0));
        assert_eq!(field.particles().len(), 80);
        assert!(field.particles().iter().all(|p| {
            p.position.x >= 0.0 && p.position.x < 800.0 && p.position.y >= 0.0 && p.position.y < 600.0
        }));
    }

    #[test]
    fn count_is_stable_across_frames() {
        let mut field = field(800.0, 600.0, 11);
        field.set_pointer(Some(Vec2::new(10.0, 10.0)));

        for _ in 0..500 {
            let stats = field.animate().unwrap();
            assert_eq!(stats.particles, 80);
            assert_eq!(field.particles().len(), 80);
            assert_eq!(field.surface().circles().count(), 80);
        }
    }

    #[test]
    fn init_follows_resized_viewport() {
        let mut field = field(800.0, 600.0, 5);
        field.surface_mut().set_viewport(Vec2::new(300.0, 200.0));
        field.init().unwrap();

        assert_eq!(field.surface().size(), Vec2::new(300.0, 200.0));
        assert!(field
            .particles()
            .iter()
            .all(|p| p.position.x < 300.0 && p.position.y < 200.0));
    }

    #[test]
    fn init_twice_gives_independent_populations() {
        let mut field = field(800.0, 600.0, 9);
        let first = field.particles().to_vec();
        field.init().unwrap();
        let second = field.particles().to_vec();

        assert_eq!(first.len(), 80);
        assert_eq!(second.len(), 80);
        assert_ne!(first, second);
        for p in first.iter().chain(&second) {
            assert!(p.radius >= 1.0 && p.radius <= 2.5);
            assert!(p.velocity.x.abs() <= 0.75 && p.velocity.y.abs() <= 0.75);
        }
    }

    #[test]
    fn seed_makes_population_reproducible() {
        assert_eq!(field(800.0, 600.0, 42).particles(), field(800.0, 600.0, 42).particles());
    }

    #[test]
    fn links_fade_linearly_and_stop_at_threshold() {
        let mut field = field(800.0, 600.0, 1);
        *field.particles_mut() = vec![
            still(100.0, 100.0),
            still(100.0, 165.0),
            still(500.0, 100.0),
            still(500.0, 230.0),
        ];

        let stats = field.animate().unwrap();

        assert_eq!(stats.links, 1);
        assert_eq!(stats.pointer_links, 0);
        let lines = line_alphas(field.surface());
        assert_eq!(lines.len(), 1);
        let (from, to, alpha) = lines[0];
        assert_eq!(from, Vec2::new(100.0, 100.0));
        assert_eq!(to, Vec2::new(100.0, 165.0));
        assert!((alpha - 0.5).abs() < EPSILON);
    }

    #[test]
    fn pointer_lines_end_to_end() {
        let mut field = field(800.0, 600.0, 1);
        *field.particles_mut() = vec![still(400.0, 250.0), still(400.0, 450.0)];
        field.set_pointer(Some(Vec2::new(400.0, 300.0)));

        let stats = field.animate().unwrap();

        assert_eq!(
            stats,
            FrameStats {
                particles: 2,
                links: 0,
                pointer_links: 2,
            }
        );

        let lines = line_alphas(field.surface());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].0, Vec2::new(400.0, 250.0));
        assert_eq!(lines[0].1, Vec2::new(400.0, 300.0));
        assert!((lines[0].2 - (1.0 - 50.0 / 180.0)).abs() < EPSILON);
        assert_eq!(lines[1].0, Vec2::new(400.0, 450.0));
        assert!((lines[1].2 - (1.0 - 150.0 / 180.0)).abs() < EPSILON);
    }

    #[test]
    fn pointer_at_threshold_or_absent_draws_nothing() {
        let mut field = field(800.0, 600.0, 1);
        *field.particles_mut() = vec![still(0.0, 0.0)];

        field.set_pointer(Some(Vec2::new(180.0, 0.0)));
        assert_eq!(field.animate().unwrap().pointer_links, 0);

        field.set_pointer(None);
        assert_eq!(field.animate().unwrap().pointer_links, 0);
        assert_eq!(field.surface().lines().count(), 0);
    }

    #[test]
    fn pointer_on_origin_is_still_a_pointer() {
        let mut field = field(800.0, 600.0, 1);
        *field.particles_mut() = vec![still(30.0, 40.0)];
        field.set_pointer(Some(Vec2::ZERO));

        assert_eq!(field.animate().unwrap().pointer_links, 1);
        let lines = line_alphas(field.surface());
        assert!((lines[0].2 - (1.0 - 50.0 / 180.0)).abs() < EPSILON);
    }

    #[test]
    fn draws_after_reflecting() {
        let mut field = field(100.0, 100.0, 1);
        *field.particles_mut() = vec![Particle {
            position: Vec2::new(99.5, 50.0),
            velocity: Vec2::new(0.75, 0.0),
            radius: 2.0,
        }];

        field.animate().unwrap();

        assert_eq!(field.particles()[0].velocity.x, -0.75);
        let circle = field.surface().circles().next().copied();
        assert!(matches!(
            circle,
            Some(DrawCommand::Circle { center, radius, .. })
                if center == Vec2::new(100.25, 50.0) && radius == 2.0
        ));
    }

    #[test]
    fn run_counts_frames() {
        let mut field = field(800.0, 600.0, 2);
        let summary = field.run(&mut ManualFrames(30)).unwrap();

        assert_eq!(summary.frames, 30);
        assert_eq!(field.particles().len(), 80);
    }

    #[test]
    fn run_surfaces_detached_surface() {
        let mut field = field(800.0, 600.0, 2);
        field.surface_mut().detach();

        let mut clock = ManualFrames(10);
        assert!(matches!(field.run(&mut clock), Err(SurfaceError::Detached)));
        // stopped at the first failing frame
        assert_eq!(clock.0, 9);
    }

    #[test]
    fn init_replaces_previous_frame_on_surface() {
        let mut field = field(800.0, 600.0, 6);
        field.set_pointer(Some(Vec2::new(400.0, 300.0)));
        field.animate().unwrap();

        field.surface_mut().set_viewport(Vec2::new(200.0, 100.0));
        field.set_pointer(None);
        field.init().unwrap();

        let canvas = field.surface();
        assert_eq!(canvas.circles().count(), 80);
        assert!(canvas.circles().all(|c| matches!(
            *c,
            DrawCommand::Circle { center, .. }
                if center.x >= 0.0 && center.x < 200.0 && center.y >= 0.0 && center.y < 100.0
        )));
        assert!(line_alphas(canvas)
            .iter()
            .all(|(from, to, _)| from.x < 200.0 && to.x < 200.0 && from.y < 100.0 && to.y < 100.0));
    }

    #[test]
    fn init_on_detached_surface_fails() {
        let mut field = field(800.0, 600.0, 6);
        field.surface_mut().detach();

        assert!(matches!(field.init(), Err(SurfaceError::Detached)));
    }

    #[test]
    fn pointer_edge_follows_pair_edges() {
        let mut field = field(800.0, 600.0, 1);
        *field.particles_mut() = vec![
            still(100.0, 100.0),
            still(100.0, 150.0),
            still(100.0, 200.0),
        ];
        let pointer = Vec2::new(100.0, 120.0);
        field.set_pointer(Some(pointer));

        let stats = field.draw().unwrap();
        assert_eq!(stats.links, 3);
        assert_eq!(stats.pointer_links, 3);

        let a = Vec2::new(100.0, 100.0);
        let b = Vec2::new(100.0, 150.0);
        let c = Vec2::new(100.0, 200.0);
        let order: Vec<(Vec2, Vec2)> = line_alphas(field.surface())
            .into_iter()
            .map(|(from, to, _)| (from, to))
            .collect();
        assert_eq!(
            order,
            vec![(a, b), (a, c), (a, pointer), (b, c), (b, pointer), (c, pointer)]
        );
    }

    #[test]
    fn draw_does_not_move_particles() {
        let mut field = field(800.0, 600.0, 4);
        let before = field.particles().to_vec();

        field.draw().unwrap();

        assert_eq!(field.particles(), &before[..]);
        assert_eq!(field.surface().circles().count(), 80);
    }
}
