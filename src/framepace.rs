use std::time::{Duration, Instant};

use crate::field::FrameClock;

pub struct Framepacer {
    frame_start: Instant,
    last_frametime: f32,
}

impl Framepacer {
    pub fn new() -> Self {
        Self {
            frame_start: Instant::now(),
            last_frametime: 0.0,
        }
    }

    /// Duration of the last completed frame, pacing included
    pub fn frametime(&self) -> f32 {
        self.last_frametime
    }

    pub fn framerate(&self) -> f32 {
        if self.last_frametime > 0.0 {
            1.0 / self.last_frametime
        } else {
            0.0
        }
    }

    pub fn begin_frame(&mut self) {
        self.frame_start = Instant::now();
    }

    /// Sleeps out the rest of `limit_frametime`; a zero or non finite limit
    /// leaves pacing to the display.
    pub fn end_frame(&mut self, limit_frametime: f32) {
        if limit_frametime > f32::EPSILON && limit_frametime.is_finite() {
            const ACCURACY: f32 = 0.0001; // 100 microseconds
            let elapsed = self.frame_start.elapsed().as_secs_f32();
            let sleep_time = limit_frametime - elapsed - ACCURACY;

            if sleep_time > 0.0 {
                std::thread::sleep(Duration::from_secs_f32(sleep_time));
            }

            while self.frame_start.elapsed().as_secs_f32() < limit_frametime {
                std::thread::yield_now();
            }
        }

        self.last_frametime = self.frame_start.elapsed().as_secs_f32();
    }
}

/// Frame limit for a target framerate, `0` meaning unlimited
pub fn frame_limit(framerate: u32) -> f32 {
    if framerate == 0 {
        0.0
    } else {
        1.0 / framerate as f32
    }
}

/// A [`FrameClock`] that hands out a fixed number of frames, paced to a
/// frame limit.
pub struct PacedClock {
    pacer: Framepacer,
    remaining: u64,
    limit_frametime: f32,
    started: bool,
}

impl PacedClock {
    pub fn new(frames: u64, framerate: u32) -> Self {
        Self {
            pacer: Framepacer::new(),
            remaining: frames,
            limit_frametime: frame_limit(framerate),
            started: false,
        }
    }

    pub fn framerate(&self) -> f32 {
        self.pacer.framerate()
    }
}

impl FrameClock for PacedClock {
    fn next_frame(&mut self) -> bool {
        if self.started {
            self.pacer.end_frame(self.limit_frametime);
        }

        if self.remaining == 0 {
            return false;
        }

        self.remaining -= 1;
        self.started = true;
        self.pacer.begin_frame();
        true
    }
}
