use clap::Parser;

/// A reactive constellation of drifting particles
#[derive(Parser)]
#[command()]
pub struct Args {
    /// The framerate the field will be limited to
    ///
    /// if default the field runs at the display's refresh rate
    /// (or as fast as possible when headless)
    #[arg(short, long)]
    pub framerate: Option<u32>,

    /// Seed for the particle generator, random if omitted
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Run this many frames without a window and log a summary
    #[arg(long, value_name = "FRAMES")]
    pub headless: Option<u64>,

    /// Canvas width when headless
    #[arg(long, default_value_t = 800)]
    pub width: u32,

    /// Canvas height when headless
    #[arg(long, default_value_t = 600)]
    pub height: u32,

    /// Fixed pointer position when headless
    #[arg(long, num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true)]
    pub pointer: Option<Vec<f32>>,

    /// Show the diagnostics overlay on startup [o]
    #[arg(long)]
    pub overlay: bool,
}

impl Args {
    pub fn pointer(&self) -> Option<glam::Vec2> {
        match self.pointer.as_deref() {
            Some([x, y]) => Some(glam::Vec2::new(*x, *y)),
            _ => None,
        }
    }
}
