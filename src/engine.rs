use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::{
    food_web::{FoodWeb, FoodWebError},
    scenario::Scenario,
    simulator::{PopulationSimulator, SimulationError},
    store::{TimeSeriesStore, YearWindow},
};

/// Rejection of a user-supplied population override. The store is left
/// untouched when one of these is returned.
#[derive(Debug, Error)]
pub enum OverrideError {
    #[error("population must be a non-negative whole number")]
    Negative,
    #[error("unknown species '{0}'")]
    UnknownSpecies(String),
}

/// Full simulated history, suitable for JSON output.
#[derive(Debug, Serialize)]
pub struct HistoryReport {
    pub scenario: String,
    pub start_year: i32,
    pub end_year: i32,
    pub series: BTreeMap<String, Vec<u64>>,
}

pub struct Engine {
    scenario_name: String,
    simulator: PopulationSimulator,
    store: TimeSeriesStore,
}

impl Engine {
    /// Builds the food web, then seeds a store at the scenario's start year
    /// with one series per species holding its initial population.
    pub fn from_scenario(scenario: &Scenario) -> Result<Self, FoodWebError> {
        let web = scenario.build_food_web()?;
        let mut store = TimeSeriesStore::new(scenario.start_year);
        for id in web.species_ids() {
            store.add_time_series(id);
        }
        store.set_current_values(&scenario.initial_populations());
        Ok(Self {
            scenario_name: scenario.name.clone(),
            simulator: PopulationSimulator::new(web),
            store,
        })
    }

    /// One tick: simulate from the latest stored values, and only on
    /// success advance the year and write the result back. A rejected step
    /// leaves the store untouched.
    pub fn step(&mut self) -> Result<(), SimulationError> {
        let current = self.store.current_values();
        let next = self.simulator.simulate(&current)?;
        self.store.advance_year();
        self.store.set_current_values(&next);
        Ok(())
    }

    pub fn run(&mut self, years: u64) -> Result<(), SimulationError> {
        for _ in 0..years {
            self.step()?;
        }
        Ok(())
    }

    /// Like [`Engine::run`], invoking the hook with the store's window after
    /// each completed step.
    pub fn run_with_hook(
        &mut self,
        years: u64,
        mut hook: impl FnMut(&YearWindow),
    ) -> Result<(), SimulationError> {
        for _ in 0..years {
            self.step()?;
            let window = YearWindow {
                start_year: self.store.start_year(),
                end_year: self.store.current_year(),
            };
            hook(&window);
        }
        Ok(())
    }

    /// Applies a user override to the latest year of one species. Negative
    /// values and unknown ids are rejected without touching the store; a
    /// successful write fires the normal series notification.
    pub fn set_population(&mut self, id: &str, value: i64) -> Result<(), OverrideError> {
        if value < 0 {
            return Err(OverrideError::Negative);
        }
        if self.simulator.food_web().species(id).is_none() {
            return Err(OverrideError::UnknownSpecies(id.to_string()));
        }
        self.store.set_series_value(id, value as u64, None);
        Ok(())
    }

    pub fn scenario_name(&self) -> &str {
        &self.scenario_name
    }

    pub fn food_web(&self) -> &FoodWeb {
        self.simulator.food_web()
    }

    pub fn store(&self) -> &TimeSeriesStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TimeSeriesStore {
        &mut self.store
    }

    pub fn history_report(&self) -> HistoryReport {
        let mut series = BTreeMap::new();
        for id in self.store.series_ids() {
            if let Some(values) = self.store.series_values(id) {
                series.insert(id.clone(), values.to_vec());
            }
        }
        HistoryReport {
            scenario: self.scenario_name.clone(),
            start_year: self.store.start_year(),
            end_year: self.store.current_year(),
            series,
        }
    }
}
