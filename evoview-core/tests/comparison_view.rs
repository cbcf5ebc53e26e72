use std::path::Path;
use std::time::Duration;

use evoview_core::statistics::{Channel, StatisticsRow, StatisticsTable};
use evoview_core::surface::{
    DrawHandle, Drawable, Landscape, LineStyle, MarkerStyle, Panel, Point3, RecordingSurface,
    Surface, SurfaceCall, SurfaceLayout,
};
use evoview_core::trajectory::{Evolution, Generation, Individual};
use evoview_core::{ComparisonView, LineUpdate, ViewError, ViewOptions, ViewState};

fn landscape() -> Landscape {
    let axis = [-1.0, 0.0, 1.0];
    let xs: Vec<Vec<f64>> = axis.iter().map(|_| axis.to_vec()).collect();
    let ys: Vec<Vec<f64>> = axis.iter().map(|y| vec![*y; 3]).collect();
    let zs: Vec<Vec<f64>> = xs
        .iter()
        .zip(&ys)
        .map(|(xr, yr)| xr.iter().zip(yr).map(|(x, y)| x * x + y * y).collect())
        .collect();
    Landscape::new(xs, ys, zs).unwrap()
}

fn evolution(generations: usize) -> Evolution {
    Evolution::from_generations(
        (0..generations)
            .map(|g| {
                let spread = 1.0 / (g as f64 + 1.0);
                Generation::new(vec![
                    Individual::new(spread, spread, 2.0 * spread * spread),
                    Individual::new(-spread, 0.0, spread * spread),
                    Individual::new(0.0, -spread, spread * spread),
                ])
            })
            .collect(),
    )
}

fn table(rows: usize) -> StatisticsTable {
    StatisticsTable::from_rows(
        (0..rows)
            .map(|g| StatisticsRow {
                average_fitness: 4.0 / (g as f64 + 1.0),
                best_fitness: 1.0 / (g as f64 + 1.0),
                selection_pressure: 0.25,
            })
            .collect(),
    )
}

/// Fails the `fail_at`-th scatter draw and delegates everything else.
struct FlakySurface {
    inner: RecordingSurface,
    scatter_calls: usize,
    fail_at: usize,
}

impl Surface for FlakySurface {
    type Error = String;

    fn create_surface(
        &mut self,
        layout: &SurfaceLayout,
        landscape: &Landscape,
    ) -> Result<(), String> {
        self.inner
            .create_surface(layout, landscape)
            .map_err(|err| err.to_string())
    }

    fn draw_scatter(
        &mut self,
        panel: Panel,
        points: &[Point3],
        style: MarkerStyle,
    ) -> Result<DrawHandle, String> {
        self.scatter_calls += 1;
        if self.scatter_calls == self.fail_at {
            return Err("scatter rejected".to_string());
        }
        self.inner
            .draw_scatter(panel, points, style)
            .map_err(|err| err.to_string())
    }

    fn remove(&mut self, handle: DrawHandle) -> Result<(), String> {
        self.inner.remove(handle).map_err(|err| err.to_string())
    }

    fn draw_line(&mut self, series: &[f64], style: &LineStyle) -> Result<DrawHandle, String> {
        self.inner
            .draw_line(series, style)
            .map_err(|err| err.to_string())
    }

    fn set_line_data(&mut self, handle: &DrawHandle, series: &[f64]) -> Result<(), String> {
        self.inner
            .set_line_data(handle, series)
            .map_err(|err| err.to_string())
    }

    fn present_frame(&mut self) -> Result<(), String> {
        self.inner.present_frame().map_err(|err| err.to_string())
    }

    fn export(
        &mut self,
        target: &Path,
        frame_count: usize,
        interval: Duration,
    ) -> Result<(), String> {
        self.inner
            .export(target, frame_count, interval)
            .map_err(|err| err.to_string())
    }
}

fn annotated_view(generations: usize, line_update: LineUpdate) -> ComparisonView {
    let options = ViewOptions {
        title: "Sphere Function".to_string(),
        line_update,
        ..ViewOptions::default()
    };
    ComparisonView::new(evolution(generations), Some(table(generations)), options)
}

#[test]
fn each_frame_keeps_exactly_one_set_of_drawables() {
    let mut view = annotated_view(4, LineUpdate::Replace);
    let mut surface = RecordingSurface::new();
    view.setup(&mut surface, &landscape()).unwrap();

    for k in [1, 2, 3] {
        view.advance(&mut surface, k).unwrap();
        // 4 scatters + 3 statistics lines
        assert_eq!(surface.live_count(), 7);
        assert_eq!(surface.scatters(Panel::Surface3d).len(), 2);
        assert_eq!(surface.scatters(Panel::Contour2d).len(), 2);
    }
    assert_eq!(view.state(), ViewState::Animating);
    assert_eq!(view.frames_presented(), 4);
}

#[test]
fn scatters_show_current_population_and_best() {
    let mut view = annotated_view(3, LineUpdate::Replace);
    let mut surface = RecordingSurface::new();
    view.setup(&mut surface, &landscape()).unwrap();
    view.advance(&mut surface, 2).unwrap();

    let expected_best = evolution(3).best(2).copied().unwrap();
    let scatters = surface.scatters(Panel::Surface3d);
    assert!(scatters.iter().any(|points| points.len() == 3));
    let best_point = (
        expected_best.x(),
        expected_best.y(),
        expected_best.fitness(),
    );
    assert!(scatters
        .iter()
        .any(|points| points.len() == 1 && points[0] == best_point));
}

#[test]
fn statistics_lines_track_the_current_frame() {
    let mut view = annotated_view(5, LineUpdate::Replace);
    let mut surface = RecordingSurface::new();
    view.setup(&mut surface, &landscape()).unwrap();

    for k in [3, 1, 4, 0] {
        view.advance(&mut surface, k).unwrap();
        for channel in Channel::ALL {
            let series = surface.line(channel).unwrap();
            assert_eq!(series.len(), 5);
            let revealed = series.iter().filter(|v| !v.is_nan()).count();
            assert_eq!(revealed, k + 1, "{channel} at frame {k}");
        }
    }
}

#[test]
fn replace_mode_removes_old_handles_before_drawing() {
    let mut view = annotated_view(2, LineUpdate::Replace);
    let mut surface = RecordingSurface::new();
    view.setup(&mut surface, &landscape()).unwrap();
    let after_setup = surface.calls().len();
    view.advance(&mut surface, 1).unwrap();

    let frame_calls = &surface.calls()[after_setup..];
    let removes = frame_calls
        .iter()
        .filter(|c| matches!(c, SurfaceCall::Remove { .. }))
        .count();
    let set_data = frame_calls
        .iter()
        .filter(|c| matches!(c, SurfaceCall::SetLineData { .. }))
        .count();
    assert_eq!(removes, 7);
    assert_eq!(set_data, 0);
    assert_eq!(frame_calls.last(), Some(&SurfaceCall::PresentFrame));
}

#[test]
fn in_place_mode_updates_lines_without_new_handles() {
    let mut view = annotated_view(3, LineUpdate::InPlace);
    let mut surface = RecordingSurface::new();
    view.setup(&mut surface, &landscape()).unwrap();
    let line_ids: Vec<u64> = surface
        .live()
        .filter(|(_, d)| matches!(d, Drawable::Line { .. }))
        .map(|(id, _)| id)
        .collect();

    view.advance(&mut surface, 2).unwrap();
    let still_live: Vec<u64> = surface
        .live()
        .filter(|(_, d)| matches!(d, Drawable::Line { .. }))
        .map(|(id, _)| id)
        .collect();
    assert_eq!(line_ids, still_live);
    assert_eq!(
        surface
            .calls()
            .iter()
            .filter(|c| matches!(c, SurfaceCall::SetLineData { .. }))
            .count(),
        3
    );
    assert!(surface.line(Channel::BestFitness).unwrap()[2].is_finite());
}

#[test]
fn minimal_view_draws_no_lines() {
    let mut view = ComparisonView::new(evolution(2), None, ViewOptions::default());
    let mut surface = RecordingSurface::new();
    view.setup(&mut surface, &landscape()).unwrap();
    view.advance(&mut surface, 1).unwrap();
    assert_eq!(surface.live_count(), 4);
    assert!(surface.line(Channel::AverageFitness).is_none());
}

#[test]
fn short_statistics_table_fails_setup() {
    let mut view = ComparisonView::new(evolution(3), Some(table(2)), ViewOptions::default());
    let mut surface = RecordingSurface::new();
    assert_eq!(
        view.setup(&mut surface, &landscape()),
        Err(ViewError::StatisticsAlignment {
            requested: 3,
            available: 2
        })
    );
    assert_eq!(view.state(), ViewState::Uninitialized);
}

#[test]
fn excess_statistics_rows_are_ignored() {
    let mut view = ComparisonView::new(evolution(2), Some(table(5)), ViewOptions::default());
    let mut surface = RecordingSurface::new();
    view.setup(&mut surface, &landscape()).unwrap();
    view.advance(&mut surface, 1).unwrap();
    let series = surface.line(Channel::BestFitness).unwrap();
    assert_eq!(series.len(), 5);
    assert_eq!(series.iter().filter(|v| !v.is_nan()).count(), 2);
}

#[test]
fn empty_generation_halts_playback_and_keeps_previous_frame() {
    let mut generations: Vec<Generation> = evolution(2).generations().cloned().collect();
    generations.push(Generation::default());
    generations.push(Generation::new(vec![Individual::new(0.0, 0.0, 0.0)]));
    let mut view = ComparisonView::new(
        Evolution::from_generations(generations),
        None,
        ViewOptions::default(),
    );
    let mut surface = RecordingSurface::new();
    view.setup(&mut surface, &landscape()).unwrap();

    let result = view.play(&mut surface, 0..4);
    assert_eq!(result, Err(ViewError::EmptyPopulation { generation: 2 }));
    assert_eq!(view.current_frame(), Some(1));
    assert_eq!(surface.live_count(), 4);
}

#[test]
fn out_of_range_advance_is_surfaced() {
    let mut view = annotated_view(2, LineUpdate::Replace);
    let mut surface = RecordingSurface::new();
    view.setup(&mut surface, &landscape()).unwrap();
    assert_eq!(
        view.advance(&mut surface, 2),
        Err(ViewError::IndexOutOfRange { index: 2, len: 2 })
    );
}

#[test]
fn finalize_exports_presented_frames_and_locks_the_view() {
    let mut view = annotated_view(3, LineUpdate::Replace);
    let mut surface = RecordingSurface::new();
    view.setup(&mut surface, &landscape()).unwrap();
    assert_eq!(view.play(&mut surface, 0..3), Ok(3));
    view.finalize(&mut surface, Path::new("run.gif")).unwrap();

    assert_eq!(view.state(), ViewState::Finalized);
    assert_eq!(
        surface.calls().last(),
        Some(&SurfaceCall::Export {
            target: "run.gif".into(),
            frame_count: 4,
            interval: Duration::from_millis(200),
        })
    );
    assert_eq!(
        view.advance(&mut surface, 0),
        Err(ViewError::InvalidState {
            operation: "advance",
            state: ViewState::Finalized
        })
    );
    assert!(matches!(
        view.finalize(&mut surface, Path::new("again.gif")),
        Err(ViewError::InvalidState { .. })
    ));
}

#[test]
fn failed_scatter_draw_leaves_no_orphaned_drawables() {
    let mut view = ComparisonView::new(evolution(3), None, ViewOptions::default());
    // setup draws scatters 1..=4; the third of frame 1 fails
    let mut surface = FlakySurface {
        inner: RecordingSurface::new(),
        scatter_calls: 0,
        fail_at: 7,
    };
    view.setup(&mut surface, &landscape()).unwrap();

    let result = view.advance(&mut surface, 1);
    assert!(matches!(result, Err(ViewError::Surface(_))));
    assert_eq!(surface.inner.live_count(), 2);

    view.advance(&mut surface, 2).unwrap();
    assert_eq!(surface.inner.live_count(), 4);
    assert_eq!(view.current_frame(), Some(2));
}
