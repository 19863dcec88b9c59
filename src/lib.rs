pub mod engine;
pub mod food_web;
pub mod scenario;
pub mod simulator;
pub mod store;

pub use engine::{Engine, HistoryReport, OverrideError};
pub use food_web::{FoodWeb, FoodWebError, Species, SpeciesSpec};
pub use scenario::{Scenario, ScenarioLoader};
pub use simulator::{PopulationSimulator, SimulationError};
pub use store::{SeriesObserver, SeriesUpdate, TimeSeriesStore, YearObserver, YearWindow};
