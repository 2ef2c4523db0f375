/*!

Running aggregates shared by all people in a run.

 - live compartment counts by age group and district, adjusted on every transition and never
   recomputed by scanning people
 - per-district peaks of the Exposed and Infected counts and the step each was reached
 - per-district lifetime totals of exposures, infections, deaths and recoveries
 - dead and recovered counts by age group and district

People's step logic is the only writer.

*/

use crate::{
    agent::Compartment,
    context::Context,
    error::ModelError,
    log::trace,
    matrix::{AgeDistrictMatrix, AgeGroup, DistrictId},
    parameters::InitialPopulation,
};
use serde::Serialize;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum PeakKind {
    Exposed,
    Infected,
}

impl PeakKind {
    fn compartment(self) -> Compartment {
        match self {
            PeakKind::Exposed => Compartment::Exposed,
            PeakKind::Infected => Compartment::Infected,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TotalKind {
    Exposed,
    Infected,
    Dead,
    Recovered,
}

/// Historical maxima of a district's aggregate Exposed and Infected counts.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Serialize)]
pub struct PeakSummary {
    pub max_exposed: u64,
    pub max_exposed_time: usize,
    pub max_infected: u64,
    pub max_infected_time: usize,
}

/// Lifetime event counts of a district. These only ever grow.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Serialize)]
pub struct TotalSummary {
    pub total_exposed: u64,
    pub total_infected: u64,
    pub total_dead: u64,
    pub total_recovered: u64,
}

pub struct AggregationState {
    // Indexed by `Compartment::index()`
    live: [AgeDistrictMatrix<u64>; Compartment::COUNT],
    initial: AgeDistrictMatrix<u64>,
    peaks: Vec<PeakSummary>,
    totals: Vec<TotalSummary>,
    dead: AgeDistrictMatrix<u64>,
    recovered: AgeDistrictMatrix<u64>,
}

impl AggregationState {
    /// Seeds the live counts from the initial population. Every district's stored peaks start at
    /// the initial Exposed and Infected counts of the whole city, at step 0.
    pub fn new(population: &InitialPopulation, districts: usize) -> Result<Self, ModelError> {
        let live = [
            AgeDistrictMatrix::from_rows("susceptible", &population.susceptible, districts)?,
            AgeDistrictMatrix::from_rows("exposed", &population.exposed, districts)?,
            AgeDistrictMatrix::from_rows("infected", &population.infected, districts)?,
            AgeDistrictMatrix::from_rows("removed", &population.removed, districts)?,
        ];

        let mut initial = AgeDistrictMatrix::zeros(districts);
        for layer in &live {
            for (age_group, district, count) in layer.iter() {
                initial[(age_group, district)] += *count;
            }
        }

        let initial_peak = PeakSummary {
            max_exposed: live[Compartment::Exposed.index()].total(),
            max_exposed_time: 0,
            max_infected: live[Compartment::Infected.index()].total(),
            max_infected_time: 0,
        };

        Ok(AggregationState {
            live,
            initial,
            peaks: vec![initial_peak; districts],
            totals: vec![TotalSummary::default(); districts],
            dead: AgeDistrictMatrix::zeros(districts),
            recovered: AgeDistrictMatrix::zeros(districts),
        })
    }

    #[must_use]
    pub fn district_count(&self) -> usize {
        self.initial.district_count()
    }

    #[must_use]
    pub fn count(&self, compartment: Compartment, age_group: AgeGroup, district: DistrictId) -> u64 {
        self.live[compartment.index()].get(age_group, district)
    }

    /// The compartment's count summed over the age groups of `district`.
    #[must_use]
    pub fn district_count_of(&self, compartment: Compartment, district: DistrictId) -> u64 {
        self.live[compartment.index()].district_total(district)
    }

    /// The compartment's count summed over the whole city.
    #[must_use]
    pub fn city_count_of(&self, compartment: Compartment) -> u64 {
        self.live[compartment.index()].total()
    }

    /// The number of people assigned to each cell at initialization.
    #[must_use]
    pub fn initial_population(&self) -> &AgeDistrictMatrix<u64> {
        &self.initial
    }

    /// Moves one person of `(age_group, district)` from one compartment to another.
    pub fn apply_transition(
        &mut self,
        district: DistrictId,
        age_group: AgeGroup,
        from: Compartment,
        to: Compartment,
    ) {
        assert_ne!(from, to, "a transition must change compartment");
        trace!("{age_group} in district {}: {from:?} -> {to:?}", district.index());

        let source = &mut self.live[from.index()][(age_group, district)];
        *source = source.checked_sub(1).unwrap_or_else(|| {
            panic!(
                "{from:?} count for {age_group} in district {} would become negative",
                district.index()
            )
        });
        self.live[to.index()][(age_group, district)] += 1;
    }

    /// Stores the district's current aggregate as the new peak if it is strictly greater than
    /// the stored one. Returns whether the peak changed.
    pub fn record_peak_if_exceeded(
        &mut self,
        district: DistrictId,
        kind: PeakKind,
        current_step: usize,
    ) -> bool {
        let current = self.district_count_of(kind.compartment(), district);
        let peak = &mut self.peaks[district.index()];
        let (max, time) = match kind {
            PeakKind::Exposed => (&mut peak.max_exposed, &mut peak.max_exposed_time),
            PeakKind::Infected => (&mut peak.max_infected, &mut peak.max_infected_time),
        };

        if current > *max {
            *max = current;
            *time = current_step;
            true
        } else {
            false
        }
    }

    pub fn increment_total(&mut self, district: DistrictId, kind: TotalKind) {
        let totals = &mut self.totals[district.index()];
        match kind {
            TotalKind::Exposed => totals.total_exposed += 1,
            TotalKind::Infected => totals.total_infected += 1,
            TotalKind::Dead => totals.total_dead += 1,
            TotalKind::Recovered => totals.total_recovered += 1,
        }
    }

    pub fn record_death(&mut self, age_group: AgeGroup, district: DistrictId) {
        self.dead[(age_group, district)] += 1;
    }

    pub fn record_recovery(&mut self, age_group: AgeGroup, district: DistrictId) {
        self.recovered[(age_group, district)] += 1;
    }

    #[must_use]
    pub fn peaks(&self) -> &[PeakSummary] {
        &self.peaks
    }

    #[must_use]
    pub fn totals(&self) -> &[TotalSummary] {
        &self.totals
    }

    #[must_use]
    pub fn dead(&self) -> &AgeDistrictMatrix<u64> {
        &self.dead
    }

    #[must_use]
    pub fn recovered(&self) -> &AgeDistrictMatrix<u64> {
        &self.recovered
    }

    /// Whether S + E + I + R still equals the initial population of every cell.
    #[must_use]
    pub fn is_conserved(&self) -> bool {
        self.initial.iter().all(|(age_group, district, initial)| {
            self.live
                .iter()
                .map(|layer| layer.get(age_group, district))
                .sum::<u64>()
                == *initial
        })
    }
}

pub trait ContextAggregationExt {
    fn get_aggregation(&self) -> &AggregationState;

    /// True once nobody in the city is Exposed or Infected.
    fn is_epidemic_over(&self) -> bool;
}

impl ContextAggregationExt for Context {
    fn get_aggregation(&self) -> &AggregationState {
        self.expect_data_container::<AggregationState>()
    }

    fn is_epidemic_over(&self) -> bool {
        let aggregation = self.get_aggregation();
        aggregation.city_count_of(Compartment::Exposed) == 0
            && aggregation.city_count_of(Compartment::Infected) == 0
    }
}
