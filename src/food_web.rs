//! Static food-web configuration: species parameters and predator/prey edges.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Static parameters and edges for one species in the web.
///
/// Predator and prey lists are kept symmetric across the whole table:
/// `a` listing `b` as prey implies `b` listing `a` as predator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Species {
    pub id: String,
    /// Food biomass needed per unit of own biomass for healthy growth.
    pub required_biomass_factor: f64,
    /// Mass of one individual.
    pub individual_biomass: f64,
    /// Multiplier applied when food is abundant (> 1).
    pub growth_rate_factor: f64,
    /// Multiplier applied when food is scarce (inside (0, 1)).
    pub decline_rate_factor: f64,
    pub predators: Vec<String>,
    pub prey: Vec<String>,
}

/// Input to [`FoodWeb::assemble`]. Only the prey side of the relation is
/// declared; predator lists are derived by inverting it.
#[derive(Debug, Clone)]
pub struct SpeciesSpec {
    pub id: String,
    pub required_biomass_factor: f64,
    pub individual_biomass: f64,
    pub growth_rate_factor: f64,
    pub decline_rate_factor: f64,
    pub prey: Vec<String>,
}

#[derive(Debug, Error)]
pub enum FoodWebError {
    #[error("food web must define at least one species")]
    Empty,
    #[error("species '{0}' defined more than once")]
    DuplicateSpecies(String),
    #[error("species '{species}' lists unknown prey '{prey}'")]
    UnknownPrey { species: String, prey: String },
    #[error("species '{species}': {message}")]
    InvalidParameter { species: String, message: String },
}

/// Immutable species table. Built once via [`FoodWeb::assemble`] and never
/// mutated afterwards; the simulator only reads from it.
#[derive(Debug, Clone)]
pub struct FoodWeb {
    order: Vec<String>,
    species: HashMap<String, Species>,
}

impl FoodWeb {
    /// Validates the specs, derives predator lists from the prey lists and
    /// freezes the table. Fails fast on any configuration error.
    pub fn assemble(specs: Vec<SpeciesSpec>) -> Result<FoodWeb, FoodWebError> {
        if specs.is_empty() {
            return Err(FoodWebError::Empty);
        }

        let mut order = Vec::with_capacity(specs.len());
        let mut species: HashMap<String, Species> = HashMap::with_capacity(specs.len());
        for spec in &specs {
            if species.contains_key(&spec.id) {
                return Err(FoodWebError::DuplicateSpecies(spec.id.clone()));
            }
            validate_parameters(spec)?;
            order.push(spec.id.clone());
            species.insert(
                spec.id.clone(),
                Species {
                    id: spec.id.clone(),
                    required_biomass_factor: spec.required_biomass_factor,
                    individual_biomass: spec.individual_biomass,
                    growth_rate_factor: spec.growth_rate_factor,
                    decline_rate_factor: spec.decline_rate_factor,
                    predators: Vec::new(),
                    prey: spec.prey.clone(),
                },
            );
        }

        for spec in &specs {
            for prey_id in &spec.prey {
                match species.get_mut(prey_id) {
                    Some(prey) => prey.predators.push(spec.id.clone()),
                    None => {
                        return Err(FoodWebError::UnknownPrey {
                            species: spec.id.clone(),
                            prey: prey_id.clone(),
                        })
                    }
                }
            }
        }

        Ok(FoodWeb { order, species })
    }

    /// Species ids in declaration order.
    pub fn species_ids(&self) -> &[String] {
        &self.order
    }

    pub fn species(&self, id: &str) -> Option<&Species> {
        self.species.get(id)
    }

    pub fn predators_of(&self, id: &str) -> Option<&[String]> {
        self.species.get(id).map(|s| s.predators.as_slice())
    }

    pub fn prey_of(&self, id: &str) -> Option<&[String]> {
        self.species.get(id).map(|s| s.prey.as_slice())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

fn validate_parameters(spec: &SpeciesSpec) -> Result<(), FoodWebError> {
    let fail = |message: &str| {
        Err(FoodWebError::InvalidParameter {
            species: spec.id.clone(),
            message: message.to_string(),
        })
    };
    if !(spec.required_biomass_factor >= 0.0) {
        return fail("required_biomass_factor must be >= 0");
    }
    if !(spec.individual_biomass > 0.0) {
        return fail("individual_biomass must be > 0");
    }
    if !(spec.growth_rate_factor > 1.0) {
        return fail("growth_rate_factor must be > 1");
    }
    if !(spec.decline_rate_factor > 0.0 && spec.decline_rate_factor < 1.0) {
        return fail("decline_rate_factor must be inside (0, 1)");
    }
    Ok(())
}
