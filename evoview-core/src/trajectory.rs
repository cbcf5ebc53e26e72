use serde::{Deserialize, Serialize};

use crate::constants::{FIELD_SEPARATOR, GENERATION_SEPARATOR, RECORD_FIELDS};
use crate::error::{ParseError, RecordError, ViewError};

/// One candidate solution: a 2D genome and its evaluated fitness (lower is better).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    x: f64,
    y: f64,
    fitness: f64,
}

impl Individual {
    pub fn new(x: f64, y: f64, fitness: f64) -> Self {
        Self { x, y, fitness }
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.y
    }

    #[inline]
    pub fn fitness(&self) -> f64 {
        self.fitness
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Generation {
    individuals: Vec<Individual>,
}

impl Generation {
    pub fn new(individuals: Vec<Individual>) -> Self {
        Self { individuals }
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    pub fn iter(&self) -> impl Iterator<Item = &Individual> {
        self.individuals.iter()
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }
}

impl From<Vec<Individual>> for Generation {
    fn from(individuals: Vec<Individual>) -> Self {
        Self::new(individuals)
    }
}

/// Parallel coordinate columns of one population, in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PopulationCoordinates {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub fitnesses: Vec<f64>,
}

impl PopulationCoordinates {
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn points(&self) -> Vec<(f64, f64, f64)> {
        self.xs
            .iter()
            .zip(&self.ys)
            .zip(&self.fitnesses)
            .map(|((x, y), z)| (*x, *y, *z))
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Bounds {
    pub x: (f64, f64),
    pub y: (f64, f64),
    pub fitness: (f64, f64),
}

/// The recorded trajectory of a run: generation `g` lives at index `g`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Evolution {
    generations: Vec<Generation>,
}

impl Evolution {
    pub fn from_generations(generations: Vec<Generation>) -> Self {
        Self { generations }
    }

    pub fn len(&self) -> usize {
        self.generations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }

    pub fn generations(&self) -> impl Iterator<Item = &Generation> {
        self.generations.iter()
    }

    pub fn population(&self, generation: usize) -> Result<&Generation, ViewError> {
        self.generations
            .get(generation)
            .ok_or(ViewError::IndexOutOfRange {
                index: generation,
                len: self.generations.len(),
            })
    }

    /// Lowest-fitness individual of `generation`; ties keep the earliest one.
    pub fn best(&self, generation: usize) -> Result<&Individual, ViewError> {
        let population = self.population(generation)?;
        let mut best: Option<&Individual> = None;
        for individual in population.iter() {
            best = match best {
                None => Some(individual),
                Some(current)
                    if individual.fitness < current.fitness
                        || (current.fitness.is_nan() && !individual.fitness.is_nan()) =>
                {
                    Some(individual)
                }
                keep => keep,
            };
        }
        best.ok_or(ViewError::EmptyPopulation { generation })
    }

    pub fn population_coordinates(
        &self,
        generation: usize,
    ) -> Result<PopulationCoordinates, ViewError> {
        let population = self.population(generation)?;
        if population.is_empty() {
            return Err(ViewError::EmptyPopulation { generation });
        }

        let mut coordinates = PopulationCoordinates {
            xs: Vec::with_capacity(population.len()),
            ys: Vec::with_capacity(population.len()),
            fitnesses: Vec::with_capacity(population.len()),
        };
        for individual in population.iter() {
            coordinates.xs.push(individual.x);
            coordinates.ys.push(individual.y);
            coordinates.fitnesses.push(individual.fitness);
        }
        Ok(coordinates)
    }

    /// Reports the first generation that has no individuals.
    pub fn validate(&self) -> Result<(), ViewError> {
        if self.generations.is_empty() {
            return Err(ViewError::EmptyEvolution);
        }
        match self.generations.iter().position(Generation::is_empty) {
            Some(generation) => Err(ViewError::EmptyPopulation { generation }),
            None => Ok(()),
        }
    }

    pub fn population_size_range(&self) -> Option<(usize, usize)> {
        let sizes = self.generations.iter().map(Generation::len);
        let min = sizes.clone().min()?;
        let max = sizes.max()?;
        Some((min, max))
    }

    /// Bounding box over every individual, ignoring NaN coordinates.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut x = Extent::default();
        let mut y = Extent::default();
        let mut fitness = Extent::default();
        for individual in self.generations.iter().flat_map(Generation::iter) {
            x.include(individual.x);
            y.include(individual.y);
            fitness.include(individual.fitness);
        }
        Some(Bounds {
            x: x.range()?,
            y: y.range()?,
            fitness: fitness.range()?,
        })
    }
}

#[derive(Default)]
struct Extent(Option<(f64, f64)>);

impl Extent {
    fn include(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        self.0 = Some(match self.0 {
            None => (value, value),
            Some((lo, hi)) => (lo.min(value), hi.max(value)),
        });
    }

    fn range(self) -> Option<(f64, f64)> {
        self.0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Drop malformed records and report them.
    #[default]
    Lenient,
    /// Fail on the first malformed record.
    Strict,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DroppedRecord {
    pub line: usize,
    pub record: usize,
    pub reason: RecordError,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub dropped: Vec<DroppedRecord>,
    pub skipped_blank_lines: usize,
    /// Indices of generations that ended up with no valid record.
    pub empty_generations: Vec<usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParsedEvolution {
    pub evolution: Evolution,
    pub report: ParseReport,
}

pub fn parse_record(text: &str) -> Result<Individual, RecordError> {
    let fields: Vec<&str> = text.split(FIELD_SEPARATOR).map(str::trim).collect();
    if fields.len() != RECORD_FIELDS {
        return Err(RecordError::FieldCount {
            found: fields.len(),
        });
    }

    Ok(Individual {
        x: parse_field(fields[0], "x")?,
        y: parse_field(fields[1], "y")?,
        fitness: parse_field(fields[2], "fitness")?,
    })
}

fn parse_field(text: &str, field: &'static str) -> Result<f64, RecordError> {
    text.parse::<f64>()
        .map_err(|_| RecordError::InvalidNumber {
            field,
            text: text.to_string(),
        })
}

/// Per-record results of one generation line, keyed by record position.
///
/// Empty records are skipped: the writer terminates every individual with
/// the separator, so each line ends in one.
pub fn parse_generation_records(line: &str) -> Vec<(usize, Result<Individual, RecordError>)> {
    line.split(GENERATION_SEPARATOR)
        .enumerate()
        .filter(|(_, record)| !record.trim().is_empty())
        .map(|(index, record)| (index, parse_record(record)))
        .collect()
}

pub fn parse_evolution(text: &str, mode: ParseMode) -> Result<ParsedEvolution, ParseError> {
    let mut generations = Vec::new();
    let mut report = ParseReport::default();

    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        if line.trim().is_empty() {
            report.skipped_blank_lines += 1;
            continue;
        }

        let mut individuals = Vec::new();
        for (record, result) in parse_generation_records(line) {
            match result {
                Ok(individual) => individuals.push(individual),
                Err(reason) => match mode {
                    ParseMode::Strict => {
                        return Err(ParseError::MalformedRecord {
                            line: line_number,
                            record,
                            reason,
                        })
                    }
                    ParseMode::Lenient => report.dropped.push(DroppedRecord {
                        line: line_number,
                        record,
                        reason,
                    }),
                },
            }
        }

        if individuals.is_empty() {
            report.empty_generations.push(generations.len());
        }
        generations.push(Generation::new(individuals));
    }

    Ok(ParsedEvolution {
        evolution: Evolution::from_generations(generations),
        report,
    })
}

pub fn serialize_evolution(evolution: &Evolution) -> String {
    let mut out = String::new();
    for generation in evolution.generations() {
        if generation.is_empty() {
            // A lone separator reads back as an empty generation; a blank
            // line would be skipped.
            out.push(GENERATION_SEPARATOR);
        }
        for individual in generation.iter() {
            out.push_str(&format!(
                "{}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}{}{GENERATION_SEPARATOR}",
                individual.x, individual.y, individual.fitness
            ));
        }
        out.push('\n');
    }
    out
}
