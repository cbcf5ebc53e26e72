use std::ops::Range;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use evoview_core::constants::DEFAULT_TITLE;
use evoview_core::{ComparisonView, Landscape, LineUpdate, ParseMode, ViewOptions};

use crate::config::RenderSettings;
use crate::gif::GifSurface;
use crate::landscape::{benchmark_landscape, load_landscape_csv, Benchmark};
use crate::loader::{load_trajectory, resolve_statistics, StatisticsSource};
use crate::util::parse_frame_range;

#[derive(Debug, Clone, PartialEq)]
pub enum LandscapeSource {
    Benchmark {
        benchmark: Benchmark,
        bounds: Option<(f64, f64)>,
    },
    Csv {
        path: PathBuf,
        bounds: (f64, f64),
    },
}

impl LandscapeSource {
    pub fn load(&self, resolution: usize) -> Result<Landscape> {
        match self {
            Self::Benchmark { benchmark, bounds } => benchmark_landscape(
                *benchmark,
                bounds.unwrap_or_else(|| benchmark.default_bounds()),
                resolution,
            ),
            Self::Csv { path, bounds } => load_landscape_csv(path, *bounds),
        }
    }

    fn default_title(&self) -> &'static str {
        match self {
            Self::Benchmark { benchmark, .. } => benchmark.title(),
            Self::Csv { .. } => DEFAULT_TITLE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub trajectory: PathBuf,
    pub statistics: StatisticsSource,
    pub landscape: LandscapeSource,
    pub output: PathBuf,
    pub title: Option<String>,
    pub extra_text: Option<String>,
    pub x_limits: Option<(f64, f64)>,
    pub y_limits: Option<(f64, f64)>,
    /// `a..b` style sub-range; every generation when absent.
    pub frames: Option<String>,
    pub parse_mode: ParseMode,
    pub line_update: LineUpdate,
    pub settings: RenderSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutcome {
    pub output: PathBuf,
    pub generations: usize,
    pub frames: Range<usize>,
    pub frames_presented: usize,
    pub dropped_records: usize,
    pub statistics_rows: Option<usize>,
}

/// Frames animated after the opening frame 0 drawn by setup.
fn playback(range: &Range<usize>) -> Range<usize> {
    range.start.max(1)..range.end
}

pub fn render_comparison(request: &RenderRequest) -> Result<RenderOutcome> {
    let parsed = load_trajectory(&request.trajectory, request.parse_mode)?;
    let evolution = parsed.evolution;
    let statistics = resolve_statistics(&request.statistics, &evolution)?;
    let statistics_rows = statistics.as_ref().map(|table| table.len());
    let generations = evolution.len();
    let frames = match &request.frames {
        Some(range) => parse_frame_range(range, generations)?,
        None => 0..generations,
    };

    let settings = request.settings;
    let landscape = request.landscape.load(settings.grid_resolution)?;
    let options = ViewOptions {
        title: request
            .title
            .clone()
            .unwrap_or_else(|| request.landscape.default_title().to_string()),
        extra_text: request.extra_text.clone(),
        x_limits: request.x_limits,
        y_limits: request.y_limits,
        line_update: request.line_update,
        interval: Duration::from_millis(settings.frame_interval_ms),
        ..ViewOptions::default()
    };

    let mut view = ComparisonView::new(evolution, statistics, options);
    let mut surface = GifSurface::new(settings);
    view.setup(&mut surface, &landscape)
        .context("failed to set up comparison view")?;
    for frame in playback(&frames) {
        view.advance(&mut surface, frame)
            .with_context(|| format!("failed to draw frame {frame}"))?;
        tracing::debug!(frame, "presented frame");
    }
    view.finalize(&mut surface, &request.output)
        .with_context(|| format!("failed to export {}", request.output.display()))?;

    tracing::info!(
        output = %request.output.display(),
        frames = view.frames_presented(),
        "rendered comparison"
    );
    Ok(RenderOutcome {
        output: request.output.clone(),
        generations,
        frames,
        frames_presented: view.frames_presented(),
        dropped_records: parsed.report.dropped.len(),
        statistics_rows,
    })
}
