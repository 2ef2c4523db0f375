use crate::{
    agent::AgentSettings,
    aggregation::{AggregationState, ContextAggregationExt},
    context::Context,
    district::DistrictRegistry,
    error::ModelError,
    log::info,
    parameters::{InitialPopulation, Parameters},
    population::{ContextPopulationExt, ContextPopulationExtInternal},
    random::ContextRandomExt,
    rate_tables::RateTables,
    scheduler::ContextSchedulerExt,
    spatial_index::SpatialIndex,
};

/// Builds a ready-to-step context: seeds the simulation stream, registers the districts, builds
/// the rate tables and aggregates, and creates the initial population.
pub fn initialize(
    parameters: &Parameters,
    population: &InitialPopulation,
) -> Result<Context, ModelError> {
    let mut context = Context::new();
    context.init_random(parameters.seed);

    let districts = DistrictRegistry::new(&parameters.districts)?;
    let district_count = districts.len();
    info!("registered {district_count} districts");

    context.insert_data_container(RateTables::new(parameters, district_count)?);
    context.insert_data_container(AgentSettings::new(parameters)?);
    context.insert_data_container(AggregationState::new(population, district_count)?);
    context.insert_data_container(districts);
    context.insert_data_container(SpatialIndex::new());

    context.instantiate_population(parameters, population)?;
    info!("initialized {} people", context.live_agent_count());
    Ok(context)
}

/// Steps until `max_steps` steps have run or nobody is Exposed or Infected, and returns the
/// number of steps run.
pub fn run(context: &mut Context, max_steps: usize) -> usize {
    let mut steps = 0;
    while steps < max_steps && !context.is_epidemic_over() {
        context.step();
        steps += 1;
    }
    info!("stopped after {steps} steps");
    steps
}
