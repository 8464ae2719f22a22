use crate::surface::Color;

/// Tunables of the constellation field.
///
/// The defaults are the look of the portfolio background and are what every
/// host uses; the struct exists so tests can shrink or reshape the field.
#[derive(Clone, Debug)]
pub struct FieldConfig {
    pub particle_count: usize,

    /// Largest absolute velocity per axis, in pixels per frame
    pub max_speed: f32,
    pub min_radius: f32,
    pub max_radius: f32,

    /// Particles closer than this are joined by an edge
    pub link_distance: f32,
    /// Particles closer than this to the pointer are joined to it
    pub pointer_distance: f32,

    pub particle_color: Color,
    pub edge_color: Color,
    pub background: Color,
    pub line_width: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            particle_count: 80,

            max_speed: 0.75,
            min_radius: 1.0,
            max_radius: 2.5,

            link_distance: 130.0,
            pointer_distance: 180.0,

            particle_color: Color::ACCENT.with_alpha(0.8),
            edge_color: Color::ACCENT,
            background: Color::rgb8(10, 10, 15),
            line_width: 1.0,
        }
    }
}
