use core::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{
    AVERAGE_FITNESS_COLUMN, BEST_FITNESS_COLUMN, FIELD_SEPARATOR, SELECTION_PRESSURE_COLUMN,
};
use crate::error::{StatisticsError, ViewError};
use crate::trajectory::Evolution;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    AverageFitness,
    BestFitness,
    SelectionPressure,
}

impl Channel {
    pub const ALL: [Channel; 3] = [
        Channel::AverageFitness,
        Channel::BestFitness,
        Channel::SelectionPressure,
    ];

    pub fn column_name(self) -> &'static str {
        match self {
            Self::AverageFitness => AVERAGE_FITNESS_COLUMN,
            Self::BestFitness => BEST_FITNESS_COLUMN,
            Self::SelectionPressure => SELECTION_PRESSURE_COLUMN,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::AverageFitness => "Average Fitness",
            Self::BestFitness => "Best Fitness",
            Self::SelectionPressure => "Selection Pressure",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatisticsRow {
    pub average_fitness: f64,
    pub best_fitness: f64,
    pub selection_pressure: f64,
}

impl StatisticsRow {
    pub fn get(&self, channel: Channel) -> f64 {
        match channel {
            Channel::AverageFitness => self.average_fitness,
            Channel::BestFitness => self.best_fitness,
            Channel::SelectionPressure => self.selection_pressure,
        }
    }
}

/// Per-generation aggregate series, row `g` describing generation `g`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatisticsTable {
    rows: Vec<StatisticsRow>,
}

impl StatisticsTable {
    pub fn from_rows(rows: Vec<StatisticsRow>) -> Self {
        Self { rows }
    }

    /// Reads a comma-separated table with a header row. Columns are found by
    /// name; unknown columns are ignored and empty cells read as NaN.
    pub fn from_csv_str(text: &str) -> Result<Self, StatisticsError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(index, line)| (index + 1, line))
            .filter(|(_, line)| !line.trim().is_empty());

        let (_, header) = lines.next().ok_or(StatisticsError::MissingHeader)?;
        let columns: Vec<&str> = header
            .split(FIELD_SEPARATOR)
            .map(|cell| cell.trim().trim_matches('"'))
            .collect();
        let locate = |channel: Channel| {
            columns
                .iter()
                .position(|column| *column == channel.column_name())
                .ok_or(StatisticsError::MissingColumn(channel.column_name()))
        };
        let average_column = locate(Channel::AverageFitness)?;
        let best_column = locate(Channel::BestFitness)?;
        let pressure_column = locate(Channel::SelectionPressure)?;

        let mut rows = Vec::new();
        for (line, text) in lines {
            let cells: Vec<&str> = text.split(FIELD_SEPARATOR).map(str::trim).collect();
            if cells.len() != columns.len() {
                return Err(StatisticsError::RowWidth {
                    line,
                    expected: columns.len(),
                    found: cells.len(),
                });
            }
            let cell = |column: usize, channel: Channel| parse_cell(cells[column], line, channel);
            rows.push(StatisticsRow {
                average_fitness: cell(average_column, Channel::AverageFitness)?,
                best_fitness: cell(best_column, Channel::BestFitness)?,
                selection_pressure: cell(pressure_column, Channel::SelectionPressure)?,
            });
        }

        Ok(Self { rows })
    }

    /// Recomputes the aggregates from the trajectory itself: best is the
    /// minimum fitness, average the mean, and selection pressure their ratio.
    pub fn from_evolution(evolution: &Evolution) -> Result<Self, ViewError> {
        let mut rows = Vec::with_capacity(evolution.len());
        for generation in 0..evolution.len() {
            let population = evolution.population(generation)?;
            let best_fitness = evolution.best(generation)?.fitness();
            let average_fitness =
                population.iter().map(|i| i.fitness()).sum::<f64>() / population.len() as f64;
            let selection_pressure = if average_fitness == 0.0 {
                0.0
            } else {
                best_fitness / average_fitness
            };
            rows.push(StatisticsRow {
                average_fitness,
                best_fitness,
                selection_pressure,
            });
        }
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[StatisticsRow] {
        &self.rows
    }

    pub fn channel(&self, channel: Channel) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(move |row| row.get(channel))
    }

    /// Largest recorded value of `channel`, ignoring NaN.
    pub fn max(&self, channel: Channel) -> Option<f64> {
        self.channel(channel)
            .filter(|value| !value.is_nan())
            .fold(None, |acc: Option<f64>, value| {
                Some(acc.map_or(value, |current| current.max(value)))
            })
    }

    /// Full-length series with the first `length` values revealed and the
    /// rest set to NaN.
    pub fn prefix(&self, channel: Channel, length: usize) -> Result<Vec<f64>, ViewError> {
        if length > self.rows.len() {
            return Err(ViewError::StatisticsAlignment {
                requested: length,
                available: self.rows.len(),
            });
        }

        let mut data = vec![f64::NAN; self.rows.len()];
        for (slot, value) in data.iter_mut().zip(self.channel(channel)).take(length) {
            *slot = value;
        }
        Ok(data)
    }

    pub fn check_alignment(&self, generations: usize) -> Result<(), ViewError> {
        if self.rows.len() < generations {
            return Err(ViewError::StatisticsAlignment {
                requested: generations,
                available: self.rows.len(),
            });
        }
        Ok(())
    }
}

fn parse_cell(text: &str, line: usize, channel: Channel) -> Result<f64, StatisticsError> {
    let text = text.trim_matches('"');
    if text.is_empty() {
        return Ok(f64::NAN);
    }
    text.parse::<f64>()
        .map_err(|_| StatisticsError::InvalidNumber {
            line,
            column: channel.column_name(),
            text: text.to_string(),
        })
}
