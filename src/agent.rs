/*!

People and their per-step logic. Each activation runs three phases in order:

 1. status: the person's own progression (E -> I, or I -> Removed by death or recovery)
 2. interaction: an Infected person tries to expose Susceptible people within the exposure
    distance
 3. movement: a random integer step along each axis

A person who reaches Removed is deleted from the population and the spatial index on the spot
and does nothing further.

*/

use crate::{
    aggregation::{AggregationState, PeakKind, TotalKind},
    context::Context,
    district::Point,
    error::ModelError,
    log::trace,
    matrix::{AgeGroup, DistrictId},
    parameters::Parameters,
    population::{ContextPopulationExt, ContextPopulationExtInternal},
    random::{ContextRandomExt, SimulationRng},
    rate_tables::{ContextRateTablesExt, RateKind},
    scheduler::ContextSchedulerExt,
    spatial_index::SpatialIndex,
    AgentId,
};
use rand_distr::Normal;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Standard deviation of the recovery horizon, in steps.
const RECOVERY_HORIZON_STD_DEV: f64 = 3.0;

/// Epidemiological compartment. People only ever move forward through these.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub enum Compartment {
    Susceptible,
    Exposed,
    Infected,
    Removed,
}

impl Compartment {
    pub const COUNT: usize = 4;

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Compartment::Susceptible => "S",
            Compartment::Exposed => "E",
            Compartment::Infected => "I",
            Compartment::Removed => "R",
        }
    }
}

/// How a person left the Infected compartment.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TerminalOutcome {
    Died,
    Recovered,
}

/// A person as seen from outside the step logic. Everything except the compartment, the
/// infection clock and the position is fixed at creation.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct PersonAgent {
    pub(crate) id: AgentId,
    pub(crate) district: DistrictId,
    pub(crate) age: u8,
    pub(crate) age_group: AgeGroup,
    pub(crate) compartment: Compartment,
    pub(crate) wearing_mask: bool,
    pub(crate) physical_distancing: bool,
    pub(crate) mobile_worker: bool,
    pub(crate) days_infected: u32,
    pub(crate) position: Point,
}

impl PersonAgent {
    #[must_use]
    pub fn id(&self) -> AgentId {
        self.id
    }

    /// The home district. People keep it even after wandering outside its polygon.
    #[must_use]
    pub fn district(&self) -> DistrictId {
        self.district
    }

    #[must_use]
    pub fn age(&self) -> u8 {
        self.age
    }

    #[must_use]
    pub fn age_group(&self) -> AgeGroup {
        self.age_group
    }

    #[must_use]
    pub fn compartment(&self) -> Compartment {
        self.compartment
    }

    #[must_use]
    pub fn wearing_mask(&self) -> bool {
        self.wearing_mask
    }

    #[must_use]
    pub fn physical_distancing(&self) -> bool {
        self.physical_distancing
    }

    #[must_use]
    pub fn mobile_worker(&self) -> bool {
        self.mobile_worker
    }

    /// Status checks made while Infected.
    #[must_use]
    pub fn days_infected(&self) -> u32 {
        self.days_infected
    }

    #[must_use]
    pub fn position(&self) -> Point {
        self.position
    }

    #[must_use]
    pub fn is_susceptible(&self) -> bool {
        self.compartment == Compartment::Susceptible
    }

    #[must_use]
    pub fn is_infected(&self) -> bool {
        self.compartment == Compartment::Infected
    }
}

/// Run-wide settings that drive every person's step.
#[derive(Clone, Debug)]
pub struct AgentSettings {
    recovery_horizon: Normal<f64>,
    /// Mask prevalence x mask protection x distancing prevalence x distancing protection.
    protection_probability: f64,
    low_immunity_probability: f64,
    movement_ages: RangeInclusive<u8>,
    exposure_distance: f64,
    mobility_range: i64,
}

impl AgentSettings {
    pub fn new(parameters: &Parameters) -> Result<Self, ModelError> {
        let recovery_horizon = Normal::new(parameters.recovery_period, RECOVERY_HORIZON_STD_DEV)
            .map_err(|error| {
                ModelError::ModelError(format!(
                    "recovery_period {} cannot be used: {error}",
                    parameters.recovery_period
                ))
            })?;

        Ok(AgentSettings {
            recovery_horizon,
            protection_probability: parameters.wearing_mask_percentage
                * parameters.wearing_mask_protection
                * parameters.physical_distancing_percentage
                * parameters.physical_distancing_protection,
            low_immunity_probability: parameters.with_low_immunity_percentage,
            movement_ages: parameters.min_age_restriction..=parameters.max_age_restriction,
            exposure_distance: parameters.agent_exposure_distance,
            mobility_range: parameters.agent_mobility_range,
        })
    }

    #[must_use]
    pub fn protection_probability(&self) -> f64 {
        self.protection_probability
    }

    #[must_use]
    pub fn may_move(&self, age: u8) -> bool {
        self.movement_ages.contains(&age)
    }

    /// Mobile workers move twice as far.
    #[must_use]
    pub fn mobility_range(&self, mobile_worker: bool) -> i64 {
        if mobile_worker {
            self.mobility_range * 2
        } else {
            self.mobility_range
        }
    }
}

pub trait ContextAgentExt {
    /// Runs status, interaction and movement for one live person.
    fn activate_agent(&mut self, id: AgentId);
}

impl ContextAgentExt for Context {
    fn activate_agent(&mut self, id: AgentId) {
        if !update_status(self, id) {
            return;
        }
        interact(self, id);
        move_agent(self, id);
    }
}

fn expect_agent(context: &Context, id: AgentId) -> PersonAgent {
    *context
        .get_agent(id)
        .unwrap_or_else(|| panic!("{id:?} is not a live agent"))
}

fn settings(context: &Context) -> &AgentSettings {
    context.expect_data_container::<AgentSettings>()
}

/// Moves a live person to the next compartment and updates the live counts.
fn transition(context: &mut Context, id: AgentId, to: Compartment) -> PersonAgent {
    let agent = context
        .get_agent_mut(id)
        .unwrap_or_else(|| panic!("{id:?} is not a live agent"));
    let from = agent.compartment;
    agent.compartment = to;
    let agent = *agent;

    context
        .expect_data_container_mut::<AggregationState>()
        .apply_transition(agent.district, agent.age_group, from, to);
    agent
}

fn record_peak(context: &mut Context, district: DistrictId, kind: PeakKind) {
    let step = context.get_current_step();
    context
        .expect_data_container_mut::<AggregationState>()
        .record_peak_if_exceeded(district, kind, step);
}

fn increment_total(context: &mut Context, district: DistrictId, kind: TotalKind) {
    context
        .expect_data_container_mut::<AggregationState>()
        .increment_total(district, kind);
}

fn expose(context: &mut Context, id: AgentId) {
    let agent = transition(context, id, Compartment::Exposed);
    record_peak(context, agent.district, PeakKind::Exposed);
    increment_total(context, agent.district, TotalKind::Exposed);
}

fn remove(context: &mut Context, id: AgentId, outcome: TerminalOutcome) {
    let agent = transition(context, id, Compartment::Removed);
    let aggregation = context.expect_data_container_mut::<AggregationState>();
    match outcome {
        TerminalOutcome::Died => {
            aggregation.increment_total(agent.district, TotalKind::Dead);
            aggregation.record_death(agent.age_group, agent.district);
        }
        TerminalOutcome::Recovered => {
            aggregation.increment_total(agent.district, TotalKind::Recovered);
            aggregation.record_recovery(agent.age_group, agent.district);
        }
    }
    trace!("{id:?} removed: {outcome:?}");
    context.remove_agent(id);
}

/// Returns `false` if the person was removed.
fn update_status(context: &mut Context, id: AgentId) -> bool {
    let agent = expect_agent(context, id);

    match agent.compartment {
        Compartment::Exposed => {
            let incubation = context.get_rate(RateKind::Incubation, agent.age_group, agent.district);
            if context.sample_bool::<SimulationRng>(incubation) {
                transition(context, id, Compartment::Infected);
                record_peak(context, agent.district, PeakKind::Infected);
                increment_total(context, agent.district, TotalKind::Infected);
            }
            true
        }
        Compartment::Infected => {
            let days_infected = agent.days_infected + 1;
            if let Some(agent) = context.get_agent_mut(id) {
                agent.days_infected = days_infected;
            }

            // A fresh horizon is drawn on every check.
            let horizon = settings(context).recovery_horizon;
            #[allow(clippy::cast_possible_truncation)]
            let horizon = context.sample_distr::<SimulationRng, f64>(horizon).trunc() as i64;

            let (kind, outcome) = if i64::from(days_infected) < horizon {
                (RateKind::Mortality, TerminalOutcome::Died)
            } else {
                (RateKind::Recovery, TerminalOutcome::Recovered)
            };
            let p = context.get_rate(kind, agent.age_group, agent.district);
            if context.sample_bool::<SimulationRng>(p) {
                remove(context, id, outcome);
                return false;
            }
            true
        }
        Compartment::Susceptible => true,
        Compartment::Removed => false,
    }
}

fn interact(context: &mut Context, id: AgentId) {
    let agent = expect_agent(context, id);
    if !agent.is_infected() {
        return;
    }

    let AgentSettings {
        protection_probability,
        low_immunity_probability,
        exposure_distance,
        ..
    } = *settings(context);
    let neighbors = context
        .expect_data_container::<SpatialIndex>()
        .within_distance(agent.position, exposure_distance);

    for neighbor_id in neighbors {
        if neighbor_id == id {
            continue;
        }
        let Some(neighbor) = context.get_agent(neighbor_id).copied() else {
            continue;
        };
        if neighbor.position.distance_2(&agent.position) > exposure_distance * exposure_distance
            || !neighbor.is_susceptible()
            || context.sample_bool::<SimulationRng>(protection_probability)
        {
            continue;
        }

        let transmission =
            context.get_rate(RateKind::Transmission, neighbor.age_group, neighbor.district);
        if context.sample_bool::<SimulationRng>(transmission)
            || context.sample_bool::<SimulationRng>(low_immunity_probability)
        {
            expose(context, neighbor_id);
        }
    }
}

fn move_agent(context: &mut Context, id: AgentId) {
    let agent = expect_agent(context, id);
    let config = settings(context);
    if agent.compartment == Compartment::Removed || !config.may_move(agent.age) {
        return;
    }

    let range = config.mobility_range(agent.mobile_worker);
    let dx = context.sample_range::<SimulationRng, _, i64>(-range..=range);
    let dy = context.sample_range::<SimulationRng, _, i64>(-range..=range);
    if let Some(agent) = context.get_agent_mut(id) {
        #[allow(clippy::cast_precision_loss)]
        {
            agent.position.x += dx as f64;
            agent.position.y += dy as f64;
        }
    }
}
