pub mod constants;
pub mod error;
pub mod frame;
pub mod statistics;
pub mod surface;
pub mod trajectory;
pub mod view;

pub use error::{ParseError, RecordError, StatisticsError, ViewError};
pub use frame::{FrameState, FrameSynchronizer, VisibleStatistics};
pub use statistics::{Channel, StatisticsRow, StatisticsTable};
pub use surface::{DrawHandle, Landscape, Panel, Surface, SurfaceLayout};
pub use trajectory::{
    parse_evolution, serialize_evolution, Evolution, Generation, Individual, ParseMode,
    ParseReport, ParsedEvolution, PopulationCoordinates,
};
pub use view::{ComparisonView, LineUpdate, ViewOptions, ViewState};
