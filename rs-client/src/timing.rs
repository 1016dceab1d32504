use std::time::Instant;

use bevy::prelude::Resource;

/// Stopwatch that compiles down to nothing without `perf_timing`.
#[derive(Clone, Copy, Debug)]
pub struct Timing(Option<Instant>);

impl Timing {
    #[inline]
    pub fn start() -> Self {
        #[cfg(feature = "perf_timing")]
        {
            Self(Some(Instant::now()))
        }
        #[cfg(not(feature = "perf_timing"))]
        {
            Self(None)
        }
    }

    #[inline]
    pub fn ms(&self) -> f32 {
        self.0
            .map(|t| t.elapsed().as_secs_f32() * 1000.0)
            .unwrap_or(0.0)
    }
}

/// Last measured cost of the entity passes.
#[derive(Debug, Default, Resource)]
pub struct EntityTimings {
    pub tick_ms: f32,
    pub render_ms: f32,
    pub peak_tick_ms: f32,
    pub peak_render_ms: f32,
}

impl EntityTimings {
    pub fn record_tick(&mut self, ms: f32) {
        self.tick_ms = ms;
        self.peak_tick_ms = self.peak_tick_ms.max(ms);
    }

    pub fn record_render(&mut self, ms: f32) {
        self.render_ms = ms;
        self.peak_render_ms = self.peak_render_ms.max(ms);
    }
}
