//! Per-tick population update for the food web.
//!
//! One call to [`PopulationSimulator::simulate`] advances every population by
//! one year. The update runs in five strict stages over the whole web:
//! biomass accounting, predator biomass allocation, food-availability
//! growth/decline, predation-pressure damping, and integerization. Scratch
//! state lives in per-call [`PopulationRecord`]s and never survives the call.

use std::collections::HashMap;

use thiserror::Error;

use crate::food_web::FoodWeb;

/// Damping below this never helps prey growth.
const MIN_PREDATION_FACTOR: f64 = 1.0;
/// Damping above this is capped for stability.
const MAX_PREDATION_FACTOR: f64 = 1.5;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("population snapshot is missing species '{0}'")]
    MissingSpecies(String),
}

/// Scratch state for one species during a single step.
#[derive(Debug, Default)]
struct PopulationRecord {
    population: u64,
    population_biomass: f64,
    total_predator_biomass: f64,
    /// Share of this species' biomass allocated to each predator.
    biomass_per_predator: HashMap<String, f64>,
    /// Pressure each food-limited predator exerts on this species.
    predation_pressure: HashMap<String, f64>,
    change_factor: f64,
}

pub struct PopulationSimulator {
    web: FoodWeb,
}

impl PopulationSimulator {
    pub fn new(web: FoodWeb) -> Self {
        Self { web }
    }

    pub fn food_web(&self) -> &FoodWeb {
        &self.web
    }

    /// Computes next-year populations from the previous year's snapshot.
    ///
    /// The snapshot must contain every species of the web; missing entries
    /// fail the whole step. Ids outside the web are carried through
    /// unchanged, so the output key set always equals the input key set.
    /// Deterministic: no clock, no randomness.
    pub fn simulate(
        &self,
        previous: &HashMap<String, u64>,
    ) -> Result<HashMap<String, u64>, SimulationError> {
        let mut records = self.build_records(previous)?;
        self.allocate_predator_biomass(&mut records);
        self.apply_food_availability(&mut records);
        self.apply_predation_damping(&mut records);

        let mut next = HashMap::with_capacity(previous.len());
        for id in self.web.species_ids() {
            let record = &records[id.as_str()];
            next.insert(id.clone(), integerize(record.population, record.change_factor));
        }
        for (id, population) in previous {
            if !next.contains_key(id) {
                next.insert(id.clone(), *population);
            }
        }
        Ok(next)
    }

    /// Stage 1: population biomass for every species.
    fn build_records(
        &self,
        previous: &HashMap<String, u64>,
    ) -> Result<HashMap<String, PopulationRecord>, SimulationError> {
        let mut records = HashMap::with_capacity(self.web.len());
        for id in self.web.species_ids() {
            let species = match self.web.species(id) {
                Some(species) => species,
                None => continue,
            };
            let population = match previous.get(id) {
                Some(population) => *population,
                None => return Err(SimulationError::MissingSpecies(id.clone())),
            };
            records.insert(
                id.clone(),
                PopulationRecord {
                    population,
                    population_biomass: population as f64 * species.individual_biomass,
                    change_factor: 1.0,
                    ..PopulationRecord::default()
                },
            );
        }
        Ok(records)
    }

    /// Stage 2: split each species' biomass among its predators in
    /// proportion to predator biomass. Nothing is allocated when the
    /// predators hold no biomass at all.
    fn allocate_predator_biomass(&self, records: &mut HashMap<String, PopulationRecord>) {
        for id in self.web.species_ids() {
            let species = match self.web.species(id) {
                Some(species) => species,
                None => continue,
            };
            let total_predator_biomass: f64 = species
                .predators
                .iter()
                .map(|p| records[p.as_str()].population_biomass)
                .sum();

            let mut shares = Vec::new();
            if total_predator_biomass > 0.0 {
                let own_biomass = records[id.as_str()].population_biomass;
                for predator_id in &species.predators {
                    let predator_biomass = records[predator_id.as_str()].population_biomass;
                    if predator_biomass > 0.0 {
                        shares.push((
                            predator_id.clone(),
                            own_biomass * predator_biomass / total_predator_biomass,
                        ));
                    }
                }
            }

            let record = records
                .get_mut(id.as_str())
                .expect("record exists for every species");
            record.total_predator_biomass = total_predator_biomass;
            record.biomass_per_predator = shares.into_iter().collect();
        }
    }

    /// Stage 3: grow or decline each species by comparing the population
    /// the allocated prey biomass can support against the current one, and
    /// record the pressure food-limited species put on their prey.
    fn apply_food_availability(&self, records: &mut HashMap<String, PopulationRecord>) {
        for id in self.web.species_ids() {
            let species = match self.web.species(id) {
                Some(species) => species,
                None => continue,
            };
            let (population, population_biomass) = {
                let record = &records[id.as_str()];
                (record.population, record.population_biomass)
            };
            // Extinction is terminal: no adjustment for an empty population.
            if population == 0 {
                continue;
            }

            if species.prey.is_empty() {
                // Primary producer with no food dependency: unconstrained growth.
                let record = records
                    .get_mut(id.as_str())
                    .expect("record exists for every species");
                record.change_factor *= species.growth_rate_factor;
                continue;
            }

            let total_available_biomass: f64 = species
                .prey
                .iter()
                .map(|prey_id| {
                    records[prey_id.as_str()]
                        .biomass_per_predator
                        .get(id)
                        .copied()
                        .unwrap_or(0.0)
                })
                .sum();
            let total_required_biomass = population_biomass * species.required_biomass_factor;

            if total_available_biomass > 0.0 {
                let pressure = total_required_biomass / total_available_biomass;
                for prey_id in &species.prey {
                    records
                        .get_mut(prey_id.as_str())
                        .expect("record exists for every species")
                        .predation_pressure
                        .insert(id.clone(), pressure);
                }
            }

            let required_biomass_for_individual =
                species.individual_biomass * species.required_biomass_factor;
            // Guard against a zero food requirement: no ceiling can be
            // derived, so the comparison is skipped outright.
            if required_biomass_for_individual > 0.0 {
                let carrying_capacity =
                    (total_available_biomass / required_biomass_for_individual).floor() as u64;
                let record = records
                    .get_mut(id.as_str())
                    .expect("record exists for every species");
                if carrying_capacity < population {
                    record.change_factor *= species.decline_rate_factor;
                } else if carrying_capacity > population {
                    record.change_factor *= species.growth_rate_factor;
                }
            }
        }
    }

    /// Stage 4: throttle prey growth by the biomass-weighted average of the
    /// pressures its predators recorded, clamped to
    /// [`MIN_PREDATION_FACTOR`, `MAX_PREDATION_FACTOR`].
    fn apply_predation_damping(&self, records: &mut HashMap<String, PopulationRecord>) {
        for id in self.web.species_ids() {
            let species = match self.web.species(id) {
                Some(species) => species,
                None => continue,
            };
            if species.predators.is_empty() {
                continue;
            }

            let damping = {
                let record = &records[id.as_str()];
                if record.population == 0 || record.total_predator_biomass <= 0.0 {
                    continue;
                }
                // Predators that recorded no pressure contribute zero,
                // diluting the average.
                let mut weighted_pressure = 0.0;
                for predator_id in &species.predators {
                    if let Some(pressure) = record.predation_pressure.get(predator_id) {
                        let predator_biomass = records[predator_id.as_str()].population_biomass;
                        weighted_pressure +=
                            pressure * (predator_biomass / record.total_predator_biomass);
                    }
                }
                weighted_pressure.clamp(MIN_PREDATION_FACTOR, MAX_PREDATION_FACTOR)
            };

            records
                .get_mut(id.as_str())
                .expect("record exists for every species")
                .change_factor /= damping;
        }
    }
}

/// Stage 5: floor the scaled population, then force at least one unit of
/// movement in the direction of a non-unit factor so small populations do
/// not stall on integer rounding.
fn integerize(population: u64, change_factor: f64) -> u64 {
    let mut next = (population as f64 * change_factor).floor() as u64;
    if next == population {
        if change_factor > 1.0 {
            next += 1;
        } else if change_factor < 1.0 && population > 0 {
            next -= 1;
        }
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integerize_forces_movement_on_non_unit_factors() {
        assert_eq!(integerize(10, 1.01), 11);
        assert_eq!(integerize(10, 1.2), 12);
        assert_eq!(integerize(100, 1.1), 110);
        assert_eq!(integerize(10, 0.99), 9);
        assert_eq!(integerize(1, 0.9), 0);
        assert_eq!(integerize(0, 1.0), 0);
        assert_eq!(integerize(0, 0.5), 0);
        assert_eq!(integerize(7, 1.0), 7);
    }
}
