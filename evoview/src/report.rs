use std::ops::Range;

use anyhow::{anyhow, Context, Result};
use evoview_core::trajectory::{Bounds, ParsedEvolution};
use evoview_core::{Channel, Evolution, FrameSynchronizer, Individual, StatisticsTable, ViewError};
use rayon::prelude::*;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct InspectSummary {
    pub generations: usize,
    pub min_population: usize,
    pub max_population: usize,
    pub dropped_records: usize,
    pub blank_lines: usize,
    pub empty_generations: Vec<usize>,
    pub final_best: Option<Individual>,
    pub bounds: Option<Bounds>,
    pub statistics_rows: Option<usize>,
}

pub fn inspect(parsed: &ParsedEvolution, statistics: Option<&StatisticsTable>) -> InspectSummary {
    let evolution = &parsed.evolution;
    let (min_population, max_population) = evolution.population_size_range().unwrap_or((0, 0));
    InspectSummary {
        generations: evolution.len(),
        min_population,
        max_population,
        dropped_records: parsed.report.dropped.len(),
        blank_lines: parsed.report.skipped_blank_lines,
        empty_generations: parsed.report.empty_generations.clone(),
        final_best: evolution
            .len()
            .checked_sub(1)
            .and_then(|last| evolution.best(last).ok().copied()),
        bounds: evolution.bounds(),
        statistics_rows: statistics.map(StatisticsTable::len),
    }
}

/// Statistics values revealed at a frame. Missing cells serialize as null.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevealedStatistics {
    pub revealed: usize,
    pub average_fitness: Option<f64>,
    pub best_fitness: Option<f64>,
    pub selection_pressure: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSummary {
    pub frame: usize,
    pub population_size: usize,
    pub best: Individual,
    pub statistics: Option<RevealedStatistics>,
}

fn summarize_frame(sync: &FrameSynchronizer<'_>, frame: usize) -> Result<FrameSummary, ViewError> {
    let state = sync.frame(frame)?;
    let statistics = state.statistics.map(|visible| {
        let at = |channel: Channel| {
            visible
                .series(channel)
                .get(frame)
                .copied()
                .filter(|value| value.is_finite())
        };
        RevealedStatistics {
            revealed: visible.revealed,
            average_fitness: at(Channel::AverageFitness),
            best_fitness: at(Channel::BestFitness),
            selection_pressure: at(Channel::SelectionPressure),
        }
    });
    Ok(FrameSummary {
        frame: state.frame,
        population_size: state.population.len(),
        best: state.best,
        statistics,
    })
}

/// Derives every frame in `frames` in parallel. Results come back in frame
/// order and the lowest failing frame decides the error.
pub fn summarize_frames(
    evolution: &Evolution,
    statistics: Option<&StatisticsTable>,
    frames: Range<usize>,
    jobs: Option<usize>,
) -> Result<Vec<FrameSummary>> {
    let sync = FrameSynchronizer::new(evolution, statistics);
    let indices: Vec<usize> = frames.collect();
    let run_one = |frame: &usize| summarize_frame(&sync, *frame);

    let results: Vec<Result<FrameSummary, ViewError>> = if let Some(jobs) = jobs {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("failed to build rayon threadpool")?;
        pool.install(|| indices.par_iter().map(run_one).collect())
    } else {
        indices.par_iter().map(run_one).collect()
    };

    let summaries = results
        .into_iter()
        .zip(&indices)
        .map(|(result, frame)| result.map_err(|err| anyhow!("frame {frame}: {err}")))
        .collect::<Result<Vec<_>>>()?;
    tracing::info!(frames = summaries.len(), jobs = ?jobs, "derived frame summaries");
    Ok(summaries)
}
