use glam::Vec2;
use log::info;

use crate::{
    cli::Args,
    config::FieldConfig,
    field::{ParticleField, RunSummary},
    framepace::PacedClock,
    surface::Canvas,
};

pub fn run(args: &Args, frames: u64) -> anyhow::Result<Option<RunSummary>> {
    let canvas = Canvas::new(Vec2::new(args.width as f32, args.height as f32));
    let Some(mut field) = ParticleField::attach(Some(canvas), FieldConfig::default(), args.seed)
    else {
        return Ok(None);
    };
    field.set_pointer(args.pointer());

    let mut clock = PacedClock::new(frames, args.framerate.unwrap_or(0));
    let summary = field.run(&mut clock)?;

    let per_frame = |total: u64| {
        if summary.frames == 0 {
            0.0
        } else {
            total as f64 / summary.frames as f64
        }
    };
    info!(
        "Headless run finished: {{ frames: {}, links/frame: {:.1}, pointer links/frame: {:.1}, last fps: {:.1} }}",
        summary.frames,
        per_frame(summary.links),
        per_frame(summary.pointer_links),
        clock.framerate()
    );

    Ok(Some(summary))
}
