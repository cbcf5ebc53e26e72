use std::env;

use evoview_core::constants::DEFAULT_FRAME_INTERVAL_MS;

pub const DEFAULT_WIDTH: u32 = 1600;
pub const DEFAULT_HEIGHT: u32 = 900;
pub const DEFAULT_GRID_RESOLUTION: usize = 120;
pub const DEFAULT_SURFACE_STRIDE: usize = 3;
pub const DEFAULT_CONTOUR_LEVELS: usize = 12;
// Below this the three panels no longer fit side by side.
pub const MIN_WIDTH: u32 = 320;
pub const MIN_HEIGHT: u32 = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub frame_interval_ms: u64,
    /// Samples per axis when a benchmark landscape is generated.
    pub grid_resolution: usize,
    /// Every n-th landscape row/column becomes a surface mesh cell.
    pub surface_stride: usize,
    pub contour_levels: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            grid_resolution: DEFAULT_GRID_RESOLUTION,
            surface_stride: DEFAULT_SURFACE_STRIDE,
            contour_levels: DEFAULT_CONTOUR_LEVELS,
        }
    }
}

impl RenderSettings {
    pub fn from_env() -> Self {
        Self {
            width: read_env_u32("EVOVIEW_WIDTH", DEFAULT_WIDTH),
            height: read_env_u32("EVOVIEW_HEIGHT", DEFAULT_HEIGHT),
            frame_interval_ms: read_env_u64("EVOVIEW_FRAME_INTERVAL_MS", DEFAULT_FRAME_INTERVAL_MS),
            grid_resolution: read_env_usize("EVOVIEW_GRID_RESOLUTION", DEFAULT_GRID_RESOLUTION),
            surface_stride: read_env_usize("EVOVIEW_SURFACE_STRIDE", DEFAULT_SURFACE_STRIDE),
            contour_levels: read_env_usize("EVOVIEW_CONTOUR_LEVELS", DEFAULT_CONTOUR_LEVELS),
        }
        .sanitized()
    }

    /// Falls back to defaults for combinations that cannot be rendered.
    pub fn sanitized(mut self) -> Self {
        if self.width < MIN_WIDTH || self.height < MIN_HEIGHT {
            tracing::warn!(
                "frame size {}x{} is below {}x{}. Falling back to defaults.",
                self.width,
                self.height,
                MIN_WIDTH,
                MIN_HEIGHT
            );
            self.width = DEFAULT_WIDTH;
            self.height = DEFAULT_HEIGHT;
        }
        if self.grid_resolution < 2 {
            tracing::warn!(
                "grid resolution {} is below 2. Falling back to {}.",
                self.grid_resolution,
                DEFAULT_GRID_RESOLUTION
            );
            self.grid_resolution = DEFAULT_GRID_RESOLUTION;
        }
        if self.surface_stride >= self.grid_resolution {
            tracing::warn!(
                "surface stride ({}) >= grid resolution ({}). Falling back to 1.",
                self.surface_stride,
                self.grid_resolution
            );
            self.surface_stride = 1;
        }
        self
    }
}

pub fn read_env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

pub fn read_env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

pub fn read_env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}
