use core::fmt;

use crate::view::ViewState;

/// Why a single `x,y,fitness` record could not be read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordError {
    FieldCount { found: usize },
    InvalidNumber { field: &'static str, text: String },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldCount { found } => {
                write!(f, "expected 3 fields (x,y,fitness), found {found}")
            }
            Self::InvalidNumber { field, text } => {
                write!(f, "field {field} is not a number: {text:?}")
            }
        }
    }
}

impl std::error::Error for RecordError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    MalformedRecord {
        line: usize,
        record: usize,
        reason: RecordError,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedRecord {
                line,
                record,
                reason,
            } => write!(f, "malformed record {record} on line {line}: {reason}"),
        }
    }
}

impl std::error::Error for ParseError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatisticsError {
    MissingHeader,
    MissingColumn(&'static str),
    RowWidth {
        line: usize,
        expected: usize,
        found: usize,
    },
    InvalidNumber {
        line: usize,
        column: &'static str,
        text: String,
    },
}

impl fmt::Display for StatisticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHeader => write!(f, "statistics table has no header row"),
            Self::MissingColumn(column) => {
                write!(f, "statistics table is missing column {column}")
            }
            Self::RowWidth {
                line,
                expected,
                found,
            } => write!(
                f,
                "statistics row on line {line} has {found} cells, header has {expected}"
            ),
            Self::InvalidNumber { line, column, text } => write!(
                f,
                "statistics cell {column} on line {line} is not a number: {text:?}"
            ),
        }
    }
}

impl std::error::Error for StatisticsError {}

/// Failures surfaced while querying a trajectory or driving a view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewError {
    IndexOutOfRange {
        index: usize,
        len: usize,
    },
    EmptyPopulation {
        generation: usize,
    },
    StatisticsAlignment {
        requested: usize,
        available: usize,
    },
    InvalidState {
        operation: &'static str,
        state: ViewState,
    },
    InvalidLandscape(String),
    EmptyEvolution,
    Surface(String),
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexOutOfRange { index, len } => {
                write!(f, "generation index {index} out of range (length {len})")
            }
            Self::EmptyPopulation { generation } => {
                write!(f, "generation {generation} has an empty population")
            }
            Self::StatisticsAlignment {
                requested,
                available,
            } => write!(
                f,
                "statistics misaligned: {requested} rows requested, {available} available"
            ),
            Self::InvalidState { operation, state } => {
                write!(f, "cannot {operation} while view is {state}")
            }
            Self::InvalidLandscape(reason) => write!(f, "invalid landscape: {reason}"),
            Self::EmptyEvolution => write!(f, "trajectory has no generations"),
            Self::Surface(reason) => write!(f, "rendering surface failed: {reason}"),
        }
    }
}

impl std::error::Error for ViewError {}
