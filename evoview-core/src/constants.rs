/// Separates individual records within one generation line.
pub const GENERATION_SEPARATOR: char = ';';
/// Separates the `x,y,fitness` fields of one record.
pub const FIELD_SEPARATOR: char = ',';
pub const RECORD_FIELDS: usize = 3;

pub const AVERAGE_FITNESS_COLUMN: &str = "average_fitness";
pub const BEST_FITNESS_COLUMN: &str = "best_fitness";
pub const SELECTION_PRESSURE_COLUMN: &str = "selection_pressure";

pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 200;
pub const DEFAULT_TITLE: &str = "Evolution";
