/*!

The people of a run. People live in an arena indexed by [`AgentId`]; removing a person leaves a
tombstone so ids are never reused and a removed id simply stops resolving.

*/

use crate::{
    agent::{Compartment, PersonAgent},
    context::{Context, DataPlugin},
    district::{ContextDistrictExt, Point},
    error::ModelError,
    log::info,
    matrix::{AgeDistrictMatrix, AgeGroup, DistrictId},
    parameters::{InitialPopulation, Parameters},
    random::{ContextRandomExt, SimulationRng},
    spatial_index::SpatialIndex,
    AgentId,
};

/// Only people in this age range can be mobile workers.
const WORKING_AGES: std::ops::RangeInclusive<u8> = 18..=60;

#[derive(Default)]
pub(crate) struct AgentStore {
    agents: Vec<Option<PersonAgent>>,
    live_count: usize,
}

impl DataPlugin for AgentStore {
    const new: &'static dyn Fn() -> Self = &AgentStore::default;
}

impl AgentStore {
    fn next_id(&self) -> AgentId {
        AgentId(self.agents.len())
    }

    fn push(&mut self, agent: PersonAgent) {
        debug_assert_eq!(agent.id, self.next_id());
        self.agents.push(Some(agent));
        self.live_count += 1;
    }

    #[must_use]
    pub(crate) fn get(&self, id: AgentId) -> Option<&PersonAgent> {
        self.agents.get(id.0).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, id: AgentId) -> Option<&mut PersonAgent> {
        self.agents.get_mut(id.0).and_then(Option::as_mut)
    }

    fn remove(&mut self, id: AgentId) -> Option<PersonAgent> {
        let removed = self.agents.get_mut(id.0).and_then(Option::take);
        if removed.is_some() {
            self.live_count -= 1;
        }
        removed
    }

    #[must_use]
    pub(crate) fn live_count(&self) -> usize {
        self.live_count
    }

    /// Live people in ascending id order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &PersonAgent> {
        self.agents.iter().flatten()
    }
}

/// The behavioral attributes of a person that are drawn at creation.
#[derive(Copy, Clone, PartialEq, Debug)]
pub(crate) struct NewPerson {
    pub(crate) district: DistrictId,
    pub(crate) age: u8,
    pub(crate) compartment: Compartment,
    pub(crate) wearing_mask: bool,
    pub(crate) physical_distancing: bool,
    pub(crate) mobile_worker: bool,
    pub(crate) position: Point,
}

/// Read-only access to the people of a run.
pub trait ContextPopulationExt {
    fn get_agent(&self, id: AgentId) -> Option<&PersonAgent>;
    fn live_agent_count(&self) -> usize;
    fn live_agent_ids(&self) -> Vec<AgentId>;
}

/// Changes to the population. Every change must be mirrored in `AggregationState`, so only the
/// step logic and initialization make them.
pub(crate) trait ContextPopulationExtInternal {
    /// Adds a person to the population and the spatial index.
    fn add_agent(&mut self, person: NewPerson) -> AgentId;
    fn get_agent_mut(&mut self, id: AgentId) -> Option<&mut PersonAgent>;
    /// Deletes a person from the population and the spatial index.
    fn remove_agent(&mut self, id: AgentId) -> Option<PersonAgent>;
    /// Creates one person for every Susceptible, Exposed and Infected count. Removed counts are
    /// only recorded in the aggregates.
    fn instantiate_population(
        &mut self,
        parameters: &Parameters,
        population: &InitialPopulation,
    ) -> Result<(), ModelError>;
}

impl ContextPopulationExt for Context {
    fn get_agent(&self, id: AgentId) -> Option<&PersonAgent> {
        self.get_data_container::<AgentStore>()
            .and_then(|store| store.get(id))
    }

    fn live_agent_count(&self) -> usize {
        self.get_data_container::<AgentStore>()
            .map_or(0, AgentStore::live_count)
    }

    fn live_agent_ids(&self) -> Vec<AgentId> {
        self.get_data_container::<AgentStore>()
            .map(|store| store.iter().map(|agent| agent.id).collect())
            .unwrap_or_default()
    }
}

impl ContextPopulationExtInternal for Context {
    fn add_agent(&mut self, person: NewPerson) -> AgentId {
        let store = self.get_data_container_mut::<AgentStore>();
        let id = store.next_id();
        store.push(PersonAgent {
            id,
            district: person.district,
            age: person.age,
            age_group: AgeGroup::from_age(person.age),
            compartment: person.compartment,
            wearing_mask: person.wearing_mask,
            physical_distancing: person.physical_distancing,
            mobile_worker: person.mobile_worker,
            days_infected: 0,
            position: person.position,
        });
        self.expect_data_container_mut::<SpatialIndex>()
            .insert(id, person.position);
        id
    }

    fn get_agent_mut(&mut self, id: AgentId) -> Option<&mut PersonAgent> {
        self.get_data_container_mut::<AgentStore>().get_mut(id)
    }

    fn remove_agent(&mut self, id: AgentId) -> Option<PersonAgent> {
        self.expect_data_container_mut::<SpatialIndex>().remove(id);
        self.get_data_container_mut::<AgentStore>().remove(id)
    }

    fn instantiate_population(
        &mut self,
        parameters: &Parameters,
        population: &InitialPopulation,
    ) -> Result<(), ModelError> {
        let districts = self.get_districts().len();
        let groups = [
            (Compartment::Susceptible, "susceptible", &population.susceptible),
            (Compartment::Exposed, "exposed", &population.exposed),
            (Compartment::Infected, "infected", &population.infected),
        ];

        for (compartment, table, rows) in groups {
            let counts = AgeDistrictMatrix::<u64>::from_rows(table, rows, districts)?;
            let before = self.live_agent_count();

            for (age_group, district, count) in counts.iter() {
                let (min_age, max_age) = age_group.sampling_range();
                for _ in 0..*count {
                    let age = self.sample_range::<SimulationRng, _, u8>(min_age..=max_age);
                    let wearing_mask =
                        self.sample_bool::<SimulationRng>(parameters.wearing_mask_percentage);
                    let physical_distancing = self
                        .sample_bool::<SimulationRng>(parameters.physical_distancing_percentage);
                    let mobile_worker = WORKING_AGES.contains(&age)
                        && self.sample_bool::<SimulationRng>(parameters.mobile_worker_percentage);
                    let position = self.sample_point_in_district::<SimulationRng>(district);

                    self.add_agent(NewPerson {
                        district,
                        age,
                        compartment,
                        wearing_mask,
                        physical_distancing,
                        mobile_worker,
                        position,
                    });
                }
            }
            info!(
                "created {} {} people",
                self.live_agent_count() - before,
                compartment.label()
            );
        }
        Ok(())
    }
}
