use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::food_web::{FoodWeb, FoodWebError, SpeciesSpec};

fn default_start_year() -> i32 {
    0
}

fn default_required_biomass_factor() -> f64 {
    2.0
}

fn default_individual_biomass() -> f64 {
    1.0
}

fn default_growth_rate() -> f64 {
    1.1
}

fn default_decline_rate() -> f64 {
    0.9
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "default_start_year")]
    pub start_year: i32,
    #[serde(default)]
    pub years: Option<u64>,
    pub species: Vec<ScenarioSpecies>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioSpecies {
    pub id: String,
    pub initial_population: u64,
    #[serde(default = "default_required_biomass_factor")]
    pub required_biomass_factor: f64,
    #[serde(default = "default_individual_biomass")]
    pub individual_biomass: f64,
    #[serde(default = "default_growth_rate")]
    pub growth_rate_factor: f64,
    #[serde(default = "default_decline_rate")]
    pub decline_rate_factor: f64,
    #[serde(default)]
    pub prey: Vec<String>,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    /// Assembles and validates the food web declared by this scenario.
    /// Predator lists are derived from the prey declarations.
    pub fn build_food_web(&self) -> Result<FoodWeb, FoodWebError> {
        let specs = self
            .species
            .iter()
            .map(|species| SpeciesSpec {
                id: species.id.clone(),
                required_biomass_factor: species.required_biomass_factor,
                individual_biomass: species.individual_biomass,
                growth_rate_factor: species.growth_rate_factor,
                decline_rate_factor: species.decline_rate_factor,
                prey: species.prey.clone(),
            })
            .collect();
        FoodWeb::assemble(specs)
    }

    pub fn initial_populations(&self) -> HashMap<String, u64> {
        self.species
            .iter()
            .map(|species| (species.id.clone(), species.initial_population))
            .collect()
    }

    pub fn years(&self, override_years: Option<u64>) -> u64 {
        override_years.or(self.years).unwrap_or(120)
    }

    /// The built-in default: a ten-species river ecosystem, from algae and
    /// mayflies up to trout, heron, osprey and otter.
    pub fn river() -> Self {
        let species = |id: &str,
                       initial_population: u64,
                       required_biomass_factor: f64,
                       individual_biomass: f64,
                       growth_rate_factor: f64,
                       decline_rate_factor: f64,
                       prey: &[&str]| ScenarioSpecies {
            id: id.to_string(),
            initial_population,
            required_biomass_factor,
            individual_biomass,
            growth_rate_factor,
            decline_rate_factor,
            prey: prey.iter().map(|p| p.to_string()).collect(),
        };

        Scenario {
            name: "river".to_string(),
            description: Some("Freshwater food web around a trout stream".to_string()),
            start_year: 2024,
            years: Some(50),
            species: vec![
                species("Osprey", 40, 6.0, 1.6, 1.08, 0.9, &["Trout"]),
                species("Heron", 80, 5.0, 2.0, 1.1, 0.9, &["Trout", "Frog"]),
                species("Mosquito", 80_000, 0.0, 0.00002, 1.6, 0.65, &[]),
                species("Mayfly", 50_000, 2.0, 0.0001, 1.5, 0.7, &["Algae"]),
                species("Frog", 4_000, 3.0, 0.05, 1.25, 0.8, &["Mosquito", "Mayfly"]),
                species("Trout", 1_500, 4.0, 1.2, 1.2, 0.8, &["Mayfly", "Mosquito"]),
                species("Otter", 60, 4.5, 8.0, 1.12, 0.88, &["Frog", "Trout", "Mussels"]),
                species("Algae", 100_000, 0.0, 0.001, 1.4, 0.6, &[]),
                species("Mussels", 8_000, 1.5, 0.05, 1.15, 0.85, &["Algae"]),
                species("Catfish", 400, 3.0, 2.5, 1.1, 0.85, &["Algae"]),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn river_scenario_builds_a_symmetric_web() {
        let scenario = Scenario::river();
        let web = scenario.build_food_web().unwrap();
        assert_eq!(web.len(), scenario.species.len());
        assert_eq!(
            web.predators_of("Trout").unwrap(),
            ["Osprey", "Heron", "Otter"]
        );
        assert_eq!(
            web.predators_of("Algae").unwrap(),
            ["Mayfly", "Mussels", "Catfish"]
        );
        assert!(web.predators_of("Osprey").unwrap().is_empty());
        assert_eq!(scenario.initial_populations()["Trout"], 1_500);
    }

    #[test]
    fn years_prefers_the_override() {
        let scenario = Scenario::river();
        assert_eq!(scenario.years(None), 50);
        assert_eq!(scenario.years(Some(7)), 7);
    }

    #[test]
    fn loads_yaml_with_field_defaults() {
        let yaml = r#"
name: pond
start_year: 1990
species:
  - id: Algae
    initial_population: 1000
  - id: Snail
    initial_population: 50
    required_biomass_factor: 1.5
    prey: [Algae]
"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pond.yaml");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let scenario = ScenarioLoader::new(dir.path()).load("pond.yaml").unwrap();
        assert_eq!(scenario.name, "pond");
        assert_eq!(scenario.start_year, 1990);
        assert_eq!(scenario.years(None), 120);

        let snail = &scenario.species[1];
        assert_eq!(snail.required_biomass_factor, 1.5);
        assert_eq!(snail.individual_biomass, 1.0);
        assert_eq!(snail.growth_rate_factor, 1.1);
        assert_eq!(snail.decline_rate_factor, 0.9);

        let web = scenario.build_food_web().unwrap();
        assert_eq!(web.prey_of("Snail").unwrap(), ["Algae"]);
    }

    #[test]
    fn missing_scenario_file_reports_the_path() {
        let err = ScenarioLoader::new(".")
            .load("does/not/exist.yaml")
            .unwrap_err();
        assert!(err.to_string().contains("does/not/exist.yaml"));
    }
}
