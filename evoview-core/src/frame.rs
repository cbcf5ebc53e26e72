use serde::Serialize;

use crate::error::ViewError;
use crate::statistics::{Channel, StatisticsTable};
use crate::trajectory::{Evolution, Individual, PopulationCoordinates};

/// Statistics series as they should appear at one frame: full table length,
/// values revealed up to and including the frame, NaN afterwards.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VisibleStatistics {
    /// Leading rows revealed, `frame + 1`. Revealed cells may still be NaN.
    pub revealed: usize,
    pub average_fitness: Vec<f64>,
    pub best_fitness: Vec<f64>,
    pub selection_pressure: Vec<f64>,
}

impl VisibleStatistics {
    pub fn series(&self, channel: Channel) -> &[f64] {
        match channel {
            Channel::AverageFitness => &self.average_fitness,
            Channel::BestFitness => &self.best_fitness,
            Channel::SelectionPressure => &self.selection_pressure,
        }
    }
}

/// Everything visible at frame `frame`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameState {
    pub frame: usize,
    pub population: PopulationCoordinates,
    pub best: Individual,
    pub statistics: Option<VisibleStatistics>,
}

/// Stateless mapping from a frame index to its [`FrameState`].
#[derive(Clone, Copy, Debug)]
pub struct FrameSynchronizer<'a> {
    evolution: &'a Evolution,
    statistics: Option<&'a StatisticsTable>,
}

impl<'a> FrameSynchronizer<'a> {
    pub fn new(evolution: &'a Evolution, statistics: Option<&'a StatisticsTable>) -> Self {
        Self {
            evolution,
            statistics,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.evolution.len()
    }

    fn check_frame(&self, frame: usize) -> Result<(), ViewError> {
        if frame >= self.evolution.len() {
            return Err(ViewError::IndexOutOfRange {
                index: frame,
                len: self.evolution.len(),
            });
        }
        Ok(())
    }

    pub fn visible_population(&self, frame: usize) -> Result<PopulationCoordinates, ViewError> {
        self.evolution.population_coordinates(frame)
    }

    pub fn visible_best(&self, frame: usize) -> Result<Individual, ViewError> {
        self.evolution.best(frame).copied()
    }

    pub fn visible_statistics(
        &self,
        frame: usize,
    ) -> Result<Option<VisibleStatistics>, ViewError> {
        self.check_frame(frame)?;
        let Some(table) = self.statistics else {
            return Ok(None);
        };
        // frame < len, so this cannot overflow
        let revealed = frame + 1;
        Ok(Some(VisibleStatistics {
            revealed,
            average_fitness: table.prefix(Channel::AverageFitness, revealed)?,
            best_fitness: table.prefix(Channel::BestFitness, revealed)?,
            selection_pressure: table.prefix(Channel::SelectionPressure, revealed)?,
        }))
    }

    pub fn frame(&self, frame: usize) -> Result<FrameState, ViewError> {
        self.check_frame(frame)?;

        Ok(FrameState {
            frame,
            population: self.visible_population(frame)?,
            best: self.visible_best(frame)?,
            statistics: self.visible_statistics(frame)?,
        })
    }
}
