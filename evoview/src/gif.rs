use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use evoview_core::surface::{
    DrawHandle, Drawable, Landscape, LineAxis, LineStyle, MarkerStyle, Panel, Point3, Rgb,
    Surface, SurfaceLayout,
};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::config::RenderSettings;

/// Captions, tick labels and the overlay need a font stack.
const DRAW_TEXT: bool = cfg!(feature = "text");
const SURFACE_ALPHA: f64 = 0.3;
const CONTOUR_MAX_CELLS_PER_AXIS: usize = 150;

// Sampled from matplotlib's viridis.
const VIRIDIS: [(f64, (u8, u8, u8)); 5] = [
    (0.0, (68, 1, 84)),
    (0.25, (59, 82, 139)),
    (0.5, (33, 145, 140)),
    (0.75, (94, 201, 98)),
    (1.0, (253, 231, 37)),
];

pub fn viridis(t: f64) -> RGBColor {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    for pair in VIRIDIS.windows(2) {
        let (t0, c0) = pair[0];
        let (t1, c1) = pair[1];
        if t <= t1 {
            let w = (t - t0) / (t1 - t0);
            let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * w).round() as u8;
            return RGBColor(lerp(c0.0, c1.0), lerp(c0.1, c1.1), lerp(c0.2, c1.2));
        }
    }
    let (_, last) = VIRIDIS[VIRIDIS.len() - 1];
    RGBColor(last.0, last.1, last.2)
}

/// Index of the contour band `value` falls into, in `0..levels`.
pub fn band_level(value: f64, (lo, hi): (f64, f64), levels: usize) -> usize {
    let levels = levels.max(1);
    if !(hi > lo) || !value.is_finite() {
        return 0;
    }
    let t = ((value - lo) / (hi - lo)).clamp(0.0, 1.0);
    ((t * levels as f64) as usize).min(levels - 1)
}

fn lighten(color: RGBColor, amount: f64) -> RGBColor {
    let mix = |c: u8| (c as f64 + (255.0 - c as f64) * amount).round() as u8;
    RGBColor(mix(color.0), mix(color.1), mix(color.2))
}

fn rgb(color: Rgb) -> RGBColor {
    RGBColor(color.0, color.1, color.2)
}

fn normalize(value: f64, (lo, hi): (f64, f64)) -> f64 {
    if hi > lo {
        (value - lo) / (hi - lo)
    } else {
        0.0
    }
}

/// Widens degenerate ranges so the coordinate mapping stays finite.
fn padded((lo, hi): (f64, f64)) -> Range<f64> {
    if hi > lo {
        lo..hi
    } else {
        (lo - 0.5)..(hi + 0.5)
    }
}

/// Consecutive revealed values of a series as `(index, value)` polylines.
pub fn finite_runs(series: &[f64]) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for (index, value) in series.iter().enumerate() {
        if value.is_finite() {
            current.push((index as f64, *value));
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

pub fn partial_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "animation".into());
    name.push(".partial");
    target.with_file_name(name)
}

fn plot_error<E: fmt::Display>(err: E) -> anyhow::Error {
    anyhow!("plotting failed: {err}")
}

struct MeshCell {
    // (x, fitness, y): plotters' 3D vertical axis is the second one
    corners: [Point3; 4],
    color: RGBColor,
}

struct Band {
    corners: [(f64, f64); 2],
    color: RGBColor,
}

/// Static part of every frame, prepared once from the landscape.
struct Scene {
    layout: SurfaceLayout,
    mesh: Vec<MeshCell>,
    bands: Vec<Band>,
}

impl Scene {
    fn build(layout: &SurfaceLayout, landscape: &Landscape, settings: &RenderSettings) -> Self {
        let (rows, cols) = landscape.shape();
        let z_limits = layout.z_limits;

        let mut mesh = Vec::new();
        for (r, r2, c, c2) in cells(rows, cols, settings.surface_stride.max(1)) {
            let corners = [
                landscape.point(r, c),
                landscape.point(r, c2),
                landscape.point(r2, c2),
                landscape.point(r2, c),
            ];
            if corners.iter().any(|(x, y, z)| !(x.is_finite() && y.is_finite() && z.is_finite())) {
                continue;
            }
            let z_mean = corners.iter().map(|p| p.2).sum::<f64>() / 4.0;
            mesh.push(MeshCell {
                corners: corners.map(|(x, y, z)| (x, z, y)),
                color: viridis(normalize(z_mean, z_limits)),
            });
        }

        let levels = settings.contour_levels.max(2);
        let contour_stride = (rows.max(cols) / CONTOUR_MAX_CELLS_PER_AXIS).max(1);
        let mut bands = Vec::new();
        for (r, r2, c, c2) in cells(rows, cols, contour_stride) {
            let (x0, y0, z0) = landscape.point(r, c);
            let (x1, y1, z1) = landscape.point(r2, c2);
            let level = band_level((z0 + z1) / 2.0, z_limits, levels);
            bands.push(Band {
                corners: [(x0, y0), (x1, y1)],
                color: lighten(viridis(level as f64 / (levels - 1) as f64), 0.35),
            });
        }

        Self {
            layout: layout.clone(),
            mesh,
            bands,
        }
    }
}

/// `(row, next_row, col, next_col)` for every grid cell at `stride`.
fn cells(rows: usize, cols: usize, stride: usize) -> Vec<(usize, usize, usize, usize)> {
    if rows < 2 || cols < 2 {
        return Vec::new();
    }
    let mut out = Vec::new();
    for r in (0..rows - 1).step_by(stride) {
        let r2 = (r + stride).min(rows - 1);
        for c in (0..cols - 1).step_by(stride) {
            let c2 = (c + stride).min(cols - 1);
            out.push((r, r2, c, c2));
        }
    }
    out
}

/// Animated GIF target. Drawables are retained between calls; every
/// `present_frame` snapshots them and `export` renders all snapshots.
pub struct GifSurface {
    settings: RenderSettings,
    scene: Option<Scene>,
    live: BTreeMap<u64, Drawable>,
    next_handle: u64,
    frames: Vec<Vec<Drawable>>,
}

impl GifSurface {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            scene: None,
            live: BTreeMap::new(),
            next_handle: 0,
            frames: Vec::new(),
        }
    }

    pub fn frames_captured(&self) -> usize {
        self.frames.len()
    }

    pub fn live_drawables(&self) -> usize {
        self.live.len()
    }

    fn insert(&mut self, drawable: Drawable) -> Result<DrawHandle> {
        if self.scene.is_none() {
            return Err(anyhow!("surface used before create_surface"));
        }
        let id = self.next_handle;
        self.next_handle += 1;
        self.live.insert(id, drawable);
        Ok(DrawHandle::new(id))
    }
}

impl Surface for GifSurface {
    type Error = anyhow::Error;

    fn create_surface(&mut self, layout: &SurfaceLayout, landscape: &Landscape) -> Result<()> {
        let scene = Scene::build(layout, landscape, &self.settings);
        tracing::debug!(
            mesh_cells = scene.mesh.len(),
            contour_cells = scene.bands.len(),
            "prepared landscape"
        );
        self.scene = Some(scene);
        Ok(())
    }

    fn draw_scatter(
        &mut self,
        panel: Panel,
        points: &[Point3],
        style: MarkerStyle,
    ) -> Result<DrawHandle> {
        self.insert(Drawable::Scatter {
            panel,
            points: points.to_vec(),
            style,
        })
    }

    fn remove(&mut self, handle: DrawHandle) -> Result<()> {
        self.live
            .remove(&handle.id())
            .map(|_| ())
            .ok_or_else(|| anyhow!("unknown drawable handle {}", handle.id()))
    }

    fn draw_line(&mut self, series: &[f64], style: &LineStyle) -> Result<DrawHandle> {
        self.insert(Drawable::Line {
            style: *style,
            series: series.to_vec(),
        })
    }

    fn set_line_data(&mut self, handle: &DrawHandle, series: &[f64]) -> Result<()> {
        match self.live.get_mut(&handle.id()) {
            Some(Drawable::Line { series: data, .. }) => {
                *data = series.to_vec();
                Ok(())
            }
            Some(_) => Err(anyhow!("drawable {} is not a line", handle.id())),
            None => Err(anyhow!("unknown drawable handle {}", handle.id())),
        }
    }

    fn present_frame(&mut self) -> Result<()> {
        if self.scene.is_none() {
            return Err(anyhow!("surface used before create_surface"));
        }
        self.frames.push(self.live.values().cloned().collect());
        Ok(())
    }

    fn export(&mut self, target: &Path, frame_count: usize, interval: Duration) -> Result<()> {
        let scene = self
            .scene
            .as_ref()
            .ok_or_else(|| anyhow!("export before create_surface"))?;
        if frame_count == 0 || frame_count != self.frames.len() {
            return Err(anyhow!(
                "export requested {frame_count} frames but {} were presented",
                self.frames.len()
            ));
        }
        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed creating directory {}", parent.display()))?;
            }
        }

        let partial = partial_path(target);
        let delay_ms = u32::try_from(interval.as_millis()).unwrap_or(u32::MAX);
        let size = (self.settings.width, self.settings.height);
        tracing::info!(
            target = %target.display(),
            frames = frame_count,
            delay_ms,
            "encoding animation"
        );

        let result = render_gif(&partial, scene, &self.frames, size, delay_ms).and_then(|()| {
            fs::rename(&partial, target).with_context(|| {
                format!(
                    "failed moving {} to {}",
                    partial.display(),
                    target.display()
                )
            })
        });
        if result.is_err() {
            // Leave nothing half-written behind.
            let _ = fs::remove_file(&partial);
        }
        result
    }
}

fn render_gif(
    path: &Path,
    scene: &Scene,
    frames: &[Vec<Drawable>],
    size: (u32, u32),
    delay_ms: u32,
) -> Result<()> {
    let root = BitMapBackend::gif(path, size, delay_ms)
        .map_err(plot_error)?
        .into_drawing_area();
    for (index, drawables) in frames.iter().enumerate() {
        draw_frame(&root, scene, drawables).with_context(|| format!("rendering frame {index}"))?;
        root.present().map_err(plot_error)?;
    }
    Ok(())
}

fn draw_frame<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    scene: &Scene,
    drawables: &[Drawable],
) -> Result<()> {
    root.fill(&WHITE).map_err(plot_error)?;
    let body = if DRAW_TEXT {
        let body = root
            .titled(&scene.layout.title, ("sans-serif", 36))
            .map_err(plot_error)?;
        if let Some(overlay) = &scene.layout.overlay {
            for (line, text) in overlay.lines().enumerate() {
                root.draw(&Text::new(
                    text.to_string(),
                    (20, 50 + 18 * line as i32),
                    ("sans-serif", 15),
                ))
                .map_err(plot_error)?;
            }
        }
        body
    } else {
        root.clone()
    };

    let (body_width, body_height) = body.dim_in_pixel();
    let (top, bottom) = match scene.layout.statistics {
        Some(_) => {
            let (top, bottom) = body.split_vertically(body_height * 3 / 4);
            (top, Some(bottom))
        }
        None => (body, None),
    };
    let (left, right) = top.split_horizontally(body_width / 2);

    draw_surface_panel(&left, scene, drawables)?;
    draw_contour_panel(&right, scene, drawables)?;
    if let Some(area) = bottom {
        draw_statistics_panel(&area, scene, drawables)?;
    }
    Ok(())
}

fn scatters(
    drawables: &[Drawable],
    wanted: Panel,
) -> impl Iterator<Item = (&[Point3], MarkerStyle)> + '_ {
    drawables.iter().filter_map(move |drawable| match drawable {
        Drawable::Scatter {
            panel,
            points,
            style,
        } if *panel == wanted => Some((points.as_slice(), *style)),
        _ => None,
    })
}

fn finite_points(points: &[Point3]) -> impl Iterator<Item = Point3> + '_ {
    points
        .iter()
        .copied()
        .filter(|(x, y, z)| x.is_finite() && y.is_finite() && z.is_finite())
}

fn draw_surface_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    scene: &Scene,
    drawables: &[Drawable],
) -> Result<()> {
    let layout = &scene.layout;
    let mut chart = ChartBuilder::on(area)
        .margin(20)
        .build_cartesian_3d(
            padded(layout.x_limits),
            padded(layout.z_limits),
            padded(layout.y_limits),
        )
        .map_err(plot_error)?;
    chart.with_projection(|mut pb| {
        pb.yaw = 0.6;
        pb.pitch = 0.35;
        pb.scale = 0.85;
        pb.into_matrix()
    });
    if DRAW_TEXT {
        chart.configure_axes().draw().map_err(plot_error)?;
    }

    chart
        .draw_series(scene.mesh.iter().map(|cell| {
            Polygon::new(
                cell.corners.to_vec(),
                cell.color.mix(SURFACE_ALPHA).filled(),
            )
        }))
        .map_err(plot_error)?;

    for (points, style) in scatters(drawables, Panel::Surface3d) {
        let color = rgb(style.color);
        chart
            .draw_series(finite_points(points).map(|(x, y, z)| {
                Cross::new((x, z, y), style.size as i32, color.stroke_width(2))
            }))
            .map_err(plot_error)?;
    }
    Ok(())
}

fn draw_contour_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    scene: &Scene,
    drawables: &[Drawable],
) -> Result<()> {
    let layout = &scene.layout;
    let x_range = padded(layout.x_limits);
    let y_range = padded(layout.y_limits);
    let label_area = if DRAW_TEXT { 40 } else { 0 };
    let mut chart = ChartBuilder::on(area)
        .margin(20)
        .x_label_area_size(label_area)
        .y_label_area_size(label_area)
        .build_cartesian_2d(x_range.clone(), y_range.clone())
        .map_err(plot_error)?;
    if DRAW_TEXT {
        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc("X")
            .y_desc("Y")
            .draw()
            .map_err(plot_error)?;
    }

    chart
        .draw_series(
            scene
                .bands
                .iter()
                .map(|band| Rectangle::new(band.corners, band.color.filled())),
        )
        .map_err(plot_error)?;
    chart
        .draw_series(std::iter::once(Rectangle::new(
            [(x_range.start, y_range.start), (x_range.end, y_range.end)],
            BLACK.stroke_width(1),
        )))
        .map_err(plot_error)?;

    for (points, style) in scatters(drawables, Panel::Contour2d) {
        let color = rgb(style.color);
        chart
            .draw_series(
                finite_points(points)
                    .map(|(x, y, _)| Cross::new((x, y), style.size as i32, color.stroke_width(2))),
            )
            .map_err(plot_error)?;
    }
    Ok(())
}

fn draw_statistics_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    scene: &Scene,
    drawables: &[Drawable],
) -> Result<()> {
    let Some(axes) = scene.layout.statistics else {
        return Ok(());
    };
    let generations = axes.generations.max(1) as f64;
    let fitness_max = if axes.fitness_max.is_finite() && axes.fitness_max > 0.0 {
        axes.fitness_max * 1.05
    } else {
        1.0
    };
    let label_area = if DRAW_TEXT { 45 } else { 0 };

    let mut chart = ChartBuilder::on(area)
        .margin(15)
        .x_label_area_size(label_area)
        .y_label_area_size(label_area)
        .right_y_label_area_size(label_area)
        .build_cartesian_2d(0f64..generations, 0f64..fitness_max)
        .map_err(plot_error)?
        .set_secondary_coord(0f64..generations, 0f64..1f64);

    if DRAW_TEXT {
        chart
            .configure_mesh()
            .x_desc("Generations")
            .y_desc("Fitness Value")
            .draw()
            .map_err(plot_error)?;
        chart
            .configure_secondary_axes()
            .y_desc("Selection Pressure")
            .draw()
            .map_err(plot_error)?;
    } else {
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(0.0, 0.0), (generations, fitness_max)],
                BLACK.stroke_width(1),
            )))
            .map_err(plot_error)?;
    }

    for drawable in drawables {
        let Drawable::Line { style, series } = drawable else {
            continue;
        };
        let color = rgb(style.color);
        for (run_index, run) in finite_runs(series).into_iter().enumerate() {
            let line = LineSeries::new(run, color.stroke_width(2));
            let annotation = match style.axis {
                LineAxis::Fitness => chart.draw_series(line).map_err(plot_error)?,
                LineAxis::SelectionPressure => {
                    chart.draw_secondary_series(line).map_err(plot_error)?
                }
            };
            if DRAW_TEXT && run_index == 0 {
                annotation.label(style.channel.label()).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
            }
        }
    }

    if DRAW_TEXT {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(plot_error)?;
    }
    Ok(())
}
