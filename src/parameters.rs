use crate::error::ModelError;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path};

/// A named district and the closed ring of `[x, y]` vertices bounding it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DistrictDefinition {
    pub name: String,
    pub boundary: Vec<[f64; 2]>,
}

/// Fixed parameters of a run. Tables are nine rows (age groups) by one column per district, in
/// the order the districts are listed.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Parameters {
    /// The random seed for the simulation.
    pub seed: u64,
    pub districts: Vec<DistrictDefinition>,

    // Virus-host parameters
    pub transmission_rate: Vec<Vec<f64>>,
    pub incubation_rate: Vec<Vec<f64>>,
    pub mortality_rate: Vec<Vec<f64>>,
    pub recovery_rate: Vec<Vec<f64>>,
    /// Mean of the recovery horizon drawn at every status check.
    pub recovery_period: f64,
    /// One multiplier per age group, applied to `incubation_rate` at initialization.
    pub as_infection_expectation: Vec<f64>,

    // Behavioral and disease-resistance factors
    pub wearing_mask_percentage: f64,
    pub wearing_mask_protection: f64,
    pub physical_distancing_percentage: f64,
    pub physical_distancing_protection: f64,
    pub with_low_immunity_percentage: f64,

    // Quarantine age-restriction policy; bounds are inclusive
    pub min_age_restriction: u8,
    pub max_age_restriction: u8,

    // Movement
    /// Fraction of people aged 18 to 60 who are mobile workers.
    pub mobile_worker_percentage: f64,
    pub agent_exposure_distance: f64,
    pub agent_mobility_range: i64,
}

/// Number of people initially in each compartment, by age group and district.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InitialPopulation {
    pub susceptible: Vec<Vec<u64>>,
    pub exposed: Vec<Vec<u64>>,
    pub infected: Vec<Vec<u64>>,
    pub removed: Vec<Vec<u64>>,
}

fn load_json<T: DeserializeOwned>(file_path: &Path) -> Result<T, ModelError> {
    let reader = BufReader::new(File::open(file_path)?);
    Ok(serde_json::from_reader(reader)?)
}

pub fn load_parameters_from_json(file_path: &Path) -> Result<Parameters, ModelError> {
    load_json(file_path)
}

pub fn load_population_from_json(file_path: &Path) -> Result<InitialPopulation, ModelError> {
    load_json(file_path)
}
