use core::fmt;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::error::ViewError;
use crate::statistics::Channel;

pub type Point3 = (f64, f64, f64);

/// Token for one drawable on a surface. Not `Clone`: removing a drawable
/// consumes its handle.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct DrawHandle(u64);

impl DrawHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Panel {
    Surface3d,
    Contour2d,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const RED: Rgb = Rgb(220, 20, 20);
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const GRAY: Rgb = Rgb(128, 128, 128);
    pub const BLUE: Rgb = Rgb(30, 60, 220);
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MarkerStyle {
    pub color: Rgb,
    pub size: u32,
}

impl MarkerStyle {
    pub const POPULATION: MarkerStyle = MarkerStyle {
        color: Rgb::RED,
        size: 4,
    };
    pub const BEST: MarkerStyle = MarkerStyle {
        color: Rgb::BLACK,
        size: 6,
    };
}

/// Which vertical axis of the statistics panel a line is plotted against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum LineAxis {
    Fitness,
    SelectionPressure,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LineStyle {
    pub channel: Channel,
    pub color: Rgb,
    pub axis: LineAxis,
}

impl LineStyle {
    pub fn for_channel(channel: Channel) -> Self {
        match channel {
            Channel::AverageFitness => Self {
                channel,
                color: Rgb::GRAY,
                axis: LineAxis::Fitness,
            },
            Channel::BestFitness => Self {
                channel,
                color: Rgb::BLACK,
                axis: LineAxis::Fitness,
            },
            Channel::SelectionPressure => Self {
                channel,
                color: Rgb::BLUE,
                axis: LineAxis::SelectionPressure,
            },
        }
    }
}

/// Static benchmark surface as three equal-shaped grids, `zs[r][c]` being
/// the objective at `(xs[r][c], ys[r][c])`.
#[derive(Clone, Debug, PartialEq)]
pub struct Landscape {
    xs: Vec<Vec<f64>>,
    ys: Vec<Vec<f64>>,
    zs: Vec<Vec<f64>>,
}

impl Landscape {
    pub fn new(
        xs: Vec<Vec<f64>>,
        ys: Vec<Vec<f64>>,
        zs: Vec<Vec<f64>>,
    ) -> Result<Self, ViewError> {
        let shape = grid_shape("x", &xs)?;
        for (name, grid) in [("y", &ys), ("z", &zs)] {
            let other = grid_shape(name, grid)?;
            if other != shape {
                return Err(ViewError::InvalidLandscape(format!(
                    "{name} grid is {}x{}, x grid is {}x{}",
                    other.0, other.1, shape.0, shape.1
                )));
            }
        }
        Ok(Self { xs, ys, zs })
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.zs.len(), self.zs[0].len())
    }

    pub fn xs(&self) -> &[Vec<f64>] {
        &self.xs
    }

    pub fn ys(&self) -> &[Vec<f64>] {
        &self.ys
    }

    pub fn zs(&self) -> &[Vec<f64>] {
        &self.zs
    }

    pub fn point(&self, row: usize, col: usize) -> Point3 {
        (self.xs[row][col], self.ys[row][col], self.zs[row][col])
    }

    pub fn x_range(&self) -> (f64, f64) {
        finite_range(&self.xs).unwrap_or((0.0, 1.0))
    }

    pub fn y_range(&self) -> (f64, f64) {
        finite_range(&self.ys).unwrap_or((0.0, 1.0))
    }

    pub fn z_range(&self) -> (f64, f64) {
        finite_range(&self.zs).unwrap_or((0.0, 1.0))
    }
}

fn grid_shape(name: &str, grid: &[Vec<f64>]) -> Result<(usize, usize), ViewError> {
    let cols = grid.first().map_or(0, Vec::len);
    if cols == 0 {
        return Err(ViewError::InvalidLandscape(format!("{name} grid is empty")));
    }
    if let Some(row) = grid.iter().position(|row| row.len() != cols) {
        return Err(ViewError::InvalidLandscape(format!(
            "{name} grid row {row} has {} columns, expected {cols}",
            grid[row].len()
        )));
    }
    Ok((grid.len(), cols))
}

fn finite_range(grid: &[Vec<f64>]) -> Option<(f64, f64)> {
    grid.iter()
        .flatten()
        .copied()
        .filter(|value| value.is_finite())
        .fold(None, |acc, value| match acc {
            None => Some((value, value)),
            Some((lo, hi)) => Some((f64::min(lo, value), f64::max(hi, value))),
        })
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct StatisticsAxes {
    /// Length of every statistics series (the table's row count).
    pub generations: usize,
    pub fitness_max: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SurfaceLayout {
    pub title: String,
    pub overlay: Option<String>,
    pub x_limits: (f64, f64),
    pub y_limits: (f64, f64),
    pub z_limits: (f64, f64),
    pub statistics: Option<StatisticsAxes>,
}

/// Retained-mode rendering target driven by a comparison view.
///
/// Scatter drawables are only ever created and removed. Lines may also be
/// updated in place through [`Surface::set_line_data`].
pub trait Surface {
    type Error: fmt::Display;

    fn create_surface(
        &mut self,
        layout: &SurfaceLayout,
        landscape: &Landscape,
    ) -> Result<(), Self::Error>;

    fn draw_scatter(
        &mut self,
        panel: Panel,
        points: &[Point3],
        style: MarkerStyle,
    ) -> Result<DrawHandle, Self::Error>;

    fn remove(&mut self, handle: DrawHandle) -> Result<(), Self::Error>;

    fn draw_line(&mut self, series: &[f64], style: &LineStyle) -> Result<DrawHandle, Self::Error>;

    fn set_line_data(&mut self, handle: &DrawHandle, series: &[f64]) -> Result<(), Self::Error>;

    /// Captures the current drawable set as the next animation frame.
    fn present_frame(&mut self) -> Result<(), Self::Error>;

    fn export(
        &mut self,
        target: &Path,
        frame_count: usize,
        interval: Duration,
    ) -> Result<(), Self::Error>;
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum SurfaceCall {
    CreateSurface {
        rows: usize,
        cols: usize,
    },
    DrawScatter {
        handle: u64,
        panel: Panel,
        points: usize,
    },
    Remove {
        handle: u64,
    },
    DrawLine {
        handle: u64,
        channel: Channel,
    },
    SetLineData {
        handle: u64,
    },
    PresentFrame,
    Export {
        target: PathBuf,
        frame_count: usize,
        interval: Duration,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Drawable {
    Scatter {
        panel: Panel,
        points: Vec<Point3>,
        style: MarkerStyle,
    },
    Line {
        style: LineStyle,
        series: Vec<f64>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordingError {
    NotCreated,
    UnknownHandle(u64),
    NotALine(u64),
    FrameCountMismatch { expected: usize, found: usize },
}

impl fmt::Display for RecordingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotCreated => write!(f, "surface used before create_surface"),
            Self::UnknownHandle(id) => write!(f, "unknown drawable handle {id}"),
            Self::NotALine(id) => write!(f, "drawable {id} is not a line"),
            Self::FrameCountMismatch { expected, found } => write!(
                f,
                "export requested {expected} frames but {found} were presented"
            ),
        }
    }
}

/// In-memory surface that logs every protocol call and tracks the live
/// drawable set.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    calls: Vec<SurfaceCall>,
    live: BTreeMap<u64, Drawable>,
    next_handle: u64,
    frames: Vec<Vec<Drawable>>,
    created: bool,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[SurfaceCall] {
        &self.calls
    }

    pub fn live(&self) -> impl Iterator<Item = (u64, &Drawable)> {
        self.live.iter().map(|(id, drawable)| (*id, drawable))
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn scatters(&self, panel: Panel) -> Vec<&[Point3]> {
        self.live
            .values()
            .filter_map(|drawable| match drawable {
                Drawable::Scatter {
                    panel: p, points, ..
                } if *p == panel => Some(points.as_slice()),
                _ => None,
            })
            .collect()
    }

    pub fn line(&self, channel: Channel) -> Option<&[f64]> {
        self.live.values().find_map(|drawable| match drawable {
            Drawable::Line { style, series } if style.channel == channel => {
                Some(series.as_slice())
            }
            _ => None,
        })
    }

    /// Drawable snapshots captured by each `present_frame`.
    pub fn frames(&self) -> &[Vec<Drawable>] {
        &self.frames
    }

    fn ensure_created(&self) -> Result<(), RecordingError> {
        if self.created {
            Ok(())
        } else {
            Err(RecordingError::NotCreated)
        }
    }

    fn insert(&mut self, drawable: Drawable) -> DrawHandle {
        let id = self.next_handle;
        self.next_handle += 1;
        self.live.insert(id, drawable);
        DrawHandle::new(id)
    }
}

impl Surface for RecordingSurface {
    type Error = RecordingError;

    fn create_surface(
        &mut self,
        _layout: &SurfaceLayout,
        landscape: &Landscape,
    ) -> Result<(), Self::Error> {
        let (rows, cols) = landscape.shape();
        self.calls.push(SurfaceCall::CreateSurface { rows, cols });
        self.created = true;
        Ok(())
    }

    fn draw_scatter(
        &mut self,
        panel: Panel,
        points: &[Point3],
        style: MarkerStyle,
    ) -> Result<DrawHandle, Self::Error> {
        self.ensure_created()?;
        let handle = self.insert(Drawable::Scatter {
            panel,
            points: points.to_vec(),
            style,
        });
        self.calls.push(SurfaceCall::DrawScatter {
            handle: handle.id(),
            panel,
            points: points.len(),
        });
        Ok(handle)
    }

    fn remove(&mut self, handle: DrawHandle) -> Result<(), Self::Error> {
        self.live
            .remove(&handle.id())
            .ok_or(RecordingError::UnknownHandle(handle.id()))?;
        self.calls.push(SurfaceCall::Remove {
            handle: handle.id(),
        });
        Ok(())
    }

    fn draw_line(&mut self, series: &[f64], style: &LineStyle) -> Result<DrawHandle, Self::Error> {
        self.ensure_created()?;
        let handle = self.insert(Drawable::Line {
            style: *style,
            series: series.to_vec(),
        });
        self.calls.push(SurfaceCall::DrawLine {
            handle: handle.id(),
            channel: style.channel,
        });
        Ok(handle)
    }

    fn set_line_data(&mut self, handle: &DrawHandle, series: &[f64]) -> Result<(), Self::Error> {
        match self.live.get_mut(&handle.id()) {
            Some(Drawable::Line { series: data, .. }) => {
                *data = series.to_vec();
            }
            Some(_) => return Err(RecordingError::NotALine(handle.id())),
            None => return Err(RecordingError::UnknownHandle(handle.id())),
        }
        self.calls.push(SurfaceCall::SetLineData {
            handle: handle.id(),
        });
        Ok(())
    }

    fn present_frame(&mut self) -> Result<(), Self::Error> {
        self.ensure_created()?;
        self.frames.push(self.live.values().cloned().collect());
        self.calls.push(SurfaceCall::PresentFrame);
        Ok(())
    }

    fn export(
        &mut self,
        target: &Path,
        frame_count: usize,
        interval: Duration,
    ) -> Result<(), Self::Error> {
        if frame_count != self.frames.len() {
            return Err(RecordingError::FrameCountMismatch {
                expected: frame_count,
                found: self.frames.len(),
            });
        }
        self.calls.push(SurfaceCall::Export {
            target: target.to_path_buf(),
            frame_count,
            interval,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: usize, cols: usize, value: f64) -> Vec<Vec<f64>> {
        vec![vec![value; cols]; rows]
    }

    #[test]
    fn landscape_requires_matching_shapes() {
        assert!(Landscape::new(grid(2, 3, 0.0), grid(2, 3, 0.0), grid(2, 3, 1.0)).is_ok());
        assert!(matches!(
            Landscape::new(grid(2, 3, 0.0), grid(3, 3, 0.0), grid(2, 3, 1.0)),
            Err(ViewError::InvalidLandscape(_))
        ));
        assert!(matches!(
            Landscape::new(Vec::new(), Vec::new(), Vec::new()),
            Err(ViewError::InvalidLandscape(_))
        ));
    }

    #[test]
    fn landscape_rejects_ragged_rows() {
        let ragged = vec![vec![0.0, 1.0], vec![0.0]];
        assert!(matches!(
            Landscape::new(ragged.clone(), ragged.clone(), ragged),
            Err(ViewError::InvalidLandscape(_))
        ));
    }

    #[test]
    fn z_range_skips_non_finite_values() {
        let zs = vec![vec![f64::NAN, 2.0], vec![-1.0, f64::INFINITY]];
        let landscape = Landscape::new(grid(2, 2, 0.0), grid(2, 2, 0.0), zs).unwrap();
        assert_eq!(landscape.z_range(), (-1.0, 2.0));
        assert_eq!(landscape.shape(), (2, 2));
    }

    #[test]
    fn recording_surface_rejects_unknown_handles() {
        let mut surface = RecordingSurface::new();
        assert_eq!(
            surface.remove(DrawHandle::new(7)),
            Err(RecordingError::UnknownHandle(7))
        );
        assert_eq!(
            surface.draw_line(&[1.0], &LineStyle::for_channel(Channel::BestFitness)),
            Err(RecordingError::NotCreated)
        );
    }

    #[test]
    fn selection_pressure_uses_twin_axis() {
        assert_eq!(
            LineStyle::for_channel(Channel::SelectionPressure).axis,
            LineAxis::SelectionPressure
        );
        assert_eq!(
            LineStyle::for_channel(Channel::AverageFitness).axis,
            LineAxis::Fitness
        );
    }
}
