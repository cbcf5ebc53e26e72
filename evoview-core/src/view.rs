use core::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_FRAME_INTERVAL_MS, DEFAULT_TITLE};
use crate::error::ViewError;
use crate::frame::{FrameState, FrameSynchronizer, VisibleStatistics};
use crate::statistics::{Channel, StatisticsTable};
use crate::surface::{
    DrawHandle, Landscape, LineStyle, MarkerStyle, Panel, StatisticsAxes, Surface, SurfaceLayout,
};
use crate::trajectory::Evolution;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewState {
    Uninitialized,
    Ready,
    Animating,
    Finalized,
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready => "ready",
            Self::Animating => "animating",
            Self::Finalized => "finalized",
        })
    }
}

/// How statistics lines follow the frame. Scatter drawables are always
/// replaced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineUpdate {
    #[default]
    Replace,
    InPlace,
}

#[derive(Clone, Debug)]
pub struct ViewOptions {
    pub title: String,
    pub extra_text: Option<String>,
    pub x_limits: Option<(f64, f64)>,
    pub y_limits: Option<(f64, f64)>,
    pub line_update: LineUpdate,
    pub interval: Duration,
    pub population_style: MarkerStyle,
    pub best_style: MarkerStyle,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            extra_text: None,
            x_limits: None,
            y_limits: None,
            line_update: LineUpdate::Replace,
            interval: Duration::from_millis(DEFAULT_FRAME_INTERVAL_MS),
            population_style: MarkerStyle::POPULATION,
            best_style: MarkerStyle::BEST,
        }
    }
}

/// Animated comparison of a recorded run against its benchmark landscape.
///
/// Owns the trajectory and the optional statistics table for its lifetime,
/// plus the handles of whatever the current frame has drawn.
pub struct ComparisonView {
    evolution: Evolution,
    statistics: Option<StatisticsTable>,
    options: ViewOptions,
    state: ViewState,
    /// Scatter handles of the current frame, recorded as soon as each is drawn.
    drawables: Vec<DrawHandle>,
    lines: Vec<(Channel, DrawHandle)>,
    current_frame: Option<usize>,
    frames_presented: usize,
}

impl ComparisonView {
    pub fn new(
        evolution: Evolution,
        statistics: Option<StatisticsTable>,
        options: ViewOptions,
    ) -> Self {
        Self {
            evolution,
            statistics,
            options,
            state: ViewState::Uninitialized,
            drawables: Vec::new(),
            lines: Vec::new(),
            current_frame: None,
            frames_presented: 0,
        }
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn current_frame(&self) -> Option<usize> {
        self.current_frame
    }

    pub fn frames_presented(&self) -> usize {
        self.frames_presented
    }

    pub fn frame_count(&self) -> usize {
        self.evolution.len()
    }

    pub fn evolution(&self) -> &Evolution {
        &self.evolution
    }

    pub fn statistics(&self) -> Option<&StatisticsTable> {
        self.statistics.as_ref()
    }

    pub fn synchronizer(&self) -> FrameSynchronizer<'_> {
        FrameSynchronizer::new(&self.evolution, self.statistics.as_ref())
    }

    pub fn overlay_text(&self) -> String {
        let population_size = self.evolution.population(0).map_or(0, |g| g.len());
        let mut text = format!(
            "Population Size: {population_size}\nMaximum generations: {}\n",
            self.evolution.len()
        );
        if let Some(extra) = &self.options.extra_text {
            text.push_str(extra);
        }
        text
    }

    pub fn layout(&self, landscape: &Landscape) -> SurfaceLayout {
        let statistics = self.statistics.as_ref().map(|table| StatisticsAxes {
            generations: table.len(),
            fitness_max: table.max(Channel::AverageFitness).unwrap_or(1.0),
        });
        SurfaceLayout {
            title: self.options.title.clone(),
            overlay: Some(self.overlay_text()),
            x_limits: self.options.x_limits.unwrap_or_else(|| landscape.x_range()),
            y_limits: self.options.y_limits.unwrap_or_else(|| landscape.y_range()),
            z_limits: landscape.z_range(),
            statistics,
        }
    }

    /// Draws the static landscape and frame 0.
    pub fn setup<S: Surface>(
        &mut self,
        surface: &mut S,
        landscape: &Landscape,
    ) -> Result<(), ViewError> {
        self.expect_state("set up", &[ViewState::Uninitialized])?;
        if self.evolution.is_empty() {
            return Err(ViewError::EmptyEvolution);
        }
        if let Some(table) = &self.statistics {
            table.check_alignment(self.evolution.len())?;
        }

        let frame = self.synchronizer().frame(0)?;
        let layout = self.layout(landscape);
        surface
            .create_surface(&layout, landscape)
            .map_err(surface_error)?;
        self.draw_frame(surface, &frame)?;
        self.state = ViewState::Ready;
        Ok(())
    }

    /// Replaces everything drawn for the previous frame with frame `frame`.
    /// Frames may be visited in any order.
    pub fn advance<S: Surface>(&mut self, surface: &mut S, frame: usize) -> Result<(), ViewError> {
        self.expect_state("advance", &[ViewState::Ready, ViewState::Animating])?;
        // Derive first so a bad frame leaves the previous one on screen.
        let state = self.synchronizer().frame(frame)?;
        self.draw_frame(surface, &state)?;
        self.state = ViewState::Animating;
        Ok(())
    }

    /// Advances through `frames` in order, stopping at the first failure.
    pub fn play<S, I>(&mut self, surface: &mut S, frames: I) -> Result<usize, ViewError>
    where
        S: Surface,
        I: IntoIterator<Item = usize>,
    {
        let mut played = 0;
        for frame in frames {
            self.advance(surface, frame)?;
            played += 1;
        }
        Ok(played)
    }

    pub fn finalize<S: Surface>(&mut self, surface: &mut S, target: &Path) -> Result<(), ViewError> {
        self.expect_state("finalize", &[ViewState::Ready, ViewState::Animating])?;
        surface
            .export(target, self.frames_presented, self.options.interval)
            .map_err(surface_error)?;
        self.state = ViewState::Finalized;
        Ok(())
    }

    fn draw_frame<S: Surface>(&mut self, surface: &mut S, frame: &FrameState) -> Result<(), ViewError> {
        while let Some(handle) = self.drawables.pop() {
            surface.remove(handle).map_err(surface_error)?;
        }

        let population = frame.population.points();
        let best = [(frame.best.x(), frame.best.y(), frame.best.fitness())];
        let population_style = self.options.population_style;
        let best_style = self.options.best_style;
        for (panel, points, style) in [
            (Panel::Surface3d, population.as_slice(), population_style),
            (Panel::Contour2d, population.as_slice(), population_style),
            (Panel::Surface3d, best.as_slice(), best_style),
            (Panel::Contour2d, best.as_slice(), best_style),
        ] {
            // Tracked as drawn.
            let handle = surface
                .draw_scatter(panel, points, style)
                .map_err(surface_error)?;
            self.drawables.push(handle);
        }

        if let Some(statistics) = &frame.statistics {
            self.update_lines(surface, statistics)?;
        }

        surface.present_frame().map_err(surface_error)?;
        self.frames_presented += 1;
        self.current_frame = Some(frame.frame);
        Ok(())
    }

    fn update_lines<S: Surface>(
        &mut self,
        surface: &mut S,
        statistics: &VisibleStatistics,
    ) -> Result<(), ViewError> {
        if self.options.line_update == LineUpdate::InPlace && !self.lines.is_empty() {
            for (channel, handle) in &self.lines {
                surface
                    .set_line_data(handle, statistics.series(*channel))
                    .map_err(surface_error)?;
            }
            return Ok(());
        }

        while let Some((_, handle)) = self.lines.pop() {
            surface.remove(handle).map_err(surface_error)?;
        }
        for channel in Channel::ALL {
            let handle = surface
                .draw_line(statistics.series(channel), &LineStyle::for_channel(channel))
                .map_err(surface_error)?;
            self.lines.push((channel, handle));
        }
        Ok(())
    }

    fn expect_state(
        &self,
        operation: &'static str,
        allowed: &[ViewState],
    ) -> Result<(), ViewError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(ViewError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }
}

fn surface_error<E: fmt::Display>(err: E) -> ViewError {
    ViewError::Surface(err.to_string())
}
