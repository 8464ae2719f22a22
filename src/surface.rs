use glam::Vec2;

/// Straight (non premultiplied) RGBA color, channels in `0.0..=1.0`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const ACCENT: Color = Color {
        r: 1.0,
        g: 154.0 / 255.0,
        b: 86.0 / 255.0,
        a: 1.0,
    };

    pub fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: 1.0,
        }
    }

    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("the display surface was detached from its host")]
    Detached,
}

pub trait DisplaySurface {
    /// Size the host currently offers, e.g. the window's inner size
    fn viewport_size(&self) -> Vec2;

    /// Size of the backing raster
    fn size(&self) -> Vec2;

    fn resize(&mut self, size: Vec2);

    fn clear(&mut self) -> Result<(), SurfaceError>;

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) -> Result<(), SurfaceError>;

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Color) -> Result<(), SurfaceError>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawCommand {
    Circle {
        center: Vec2,
        radius: f32,
        color: Color,
    },
    Line {
        from: Vec2,
        to: Vec2,
        color: Color,
    },
}

/// Records the draw commands issued since the last [`DisplaySurface::clear`].
///
/// The windowed host tessellates the recorded commands onto the GPU, the
/// headless host and the tests inspect them directly.
pub struct Canvas {
    viewport: Vec2,
    size: Vec2,
    commands: Vec<DrawCommand>,
    detached: bool,
}

impl Canvas {
    pub fn new(viewport: Vec2) -> Self {
        Self {
            viewport,
            size: Vec2::ZERO,
            commands: Vec::new(),
            detached: false,
        }
    }

    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = viewport;
    }

    /// Every drawing call after this fails with [`SurfaceError::Detached`]
    pub fn detach(&mut self) {
        self.detached = true;
        self.commands.clear();
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn circles(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Circle { .. }))
    }

    pub fn lines(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Line { .. }))
    }

    fn record(&mut self, command: DrawCommand) -> Result<(), SurfaceError> {
        if self.detached {
            return Err(SurfaceError::Detached);
        }

        self.commands.push(command);
        Ok(())
    }
}

impl DisplaySurface for Canvas {
    fn viewport_size(&self) -> Vec2 {
        self.viewport
    }

    fn size(&self) -> Vec2 {
        self.size
    }

    fn resize(&mut self, size: Vec2) {
        self.size = size;
    }

    fn clear(&mut self) -> Result<(), SurfaceError> {
        if self.detached {
            return Err(SurfaceError::Detached);
        }

        self.commands.clear();
        Ok(())
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) -> Result<(), SurfaceError> {
        self.record(DrawCommand::Circle {
            center,
            radius,
            color,
        })
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Color) -> Result<(), SurfaceError> {
        self.record(DrawCommand::Line { from, to, color })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accent_matches_page_color() {
        let c = Color::ACCENT.with_alpha(0.8);
        assert_eq!(c.to_array(), [1.0, 154.0 / 255.0, 86.0 / 255.0, 0.8]);
    }

    #[test]
    fn clear_drops_previous_frame() {
        let mut canvas = Canvas::new(Vec2::new(10.0, 10.0));
        canvas
            .fill_circle(Vec2::ONE, 1.0, Color::ACCENT)
            .unwrap();
        canvas
            .stroke_line(Vec2::ZERO, Vec2::ONE, Color::ACCENT)
            .unwrap();
        assert_eq!(canvas.circles().count(), 1);
        assert_eq!(canvas.lines().count(), 1);

        canvas.clear().unwrap();
        assert!(canvas.commands().is_empty());
    }

    #[test]
    fn resize_is_separate_from_viewport() {
        let mut canvas = Canvas::new(Vec2::new(640.0, 480.0));
        assert_eq!(canvas.size(), Vec2::ZERO);

        canvas.resize(canvas.viewport_size());
        canvas.set_viewport(Vec2::new(1.0, 1.0));
        assert_eq!(canvas.size(), Vec2::new(640.0, 480.0));
    }

    #[test]
    fn detached_canvas_rejects_drawing() {
        let mut canvas = Canvas::new(Vec2::new(10.0, 10.0));
        canvas.detach();

        assert!(matches!(canvas.clear(), Err(SurfaceError::Detached)));
        assert!(matches!(
            canvas.fill_circle(Vec2::ZERO, 1.0, Color::ACCENT),
            Err(SurfaceError::Detached)
        ));
        assert!(canvas.commands().is_empty());
    }
}
