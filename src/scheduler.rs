use crate::{
    agent::ContextAgentExt,
    context::{Context, DataPlugin},
    log::debug,
    population::{AgentStore, ContextPopulationExt},
    random::{ContextRandomExt, SimulationRng},
    snapshot::ContextSnapshotExt,
    spatial_index::SpatialIndex,
};

/// Step counter. Step 0 is the state right after initialization.
#[derive(Default)]
struct Scheduler {
    current_step: usize,
}

impl DataPlugin for Scheduler {
    const new: &'static dyn Fn() -> Self = &Scheduler::default;
}

pub trait ContextSchedulerExt {
    /// The index of the step in progress, or of the last completed step between steps.
    fn get_current_step(&self) -> usize;

    /// Runs one step:
    ///  1. advances the step counter
    ///  2. records the pre-pass snapshot
    ///  3. activates every live person once, in an order drawn from the simulation stream
    ///  4. rebuilds the spatial index from the positions people ended up at
    ///
    /// A person removed earlier in the pass is skipped when their turn comes.
    fn step(&mut self);
}

impl ContextSchedulerExt for Context {
    fn get_current_step(&self) -> usize {
        self.get_data_container::<Scheduler>()
            .map_or(0, |scheduler| scheduler.current_step)
    }

    fn step(&mut self) {
        let scheduler = self.get_data_container_mut::<Scheduler>();
        scheduler.current_step += 1;
        let step = scheduler.current_step;

        self.record_snapshot();

        let mut order = self.live_agent_ids();
        self.shuffle::<SimulationRng, _>(&mut order);
        debug!("step {step}: activating {} people", order.len());

        for id in order {
            if self.get_agent(id).is_some() {
                self.activate_agent(id);
            }
        }

        let positions: Vec<_> = self
            .get_data_container::<AgentStore>()
            .map(|store| store.iter().map(|agent| (agent.id, agent.position)).collect())
            .unwrap_or_default();
        self.expect_data_container_mut::<SpatialIndex>()
            .rebuild(positions);
    }
}
